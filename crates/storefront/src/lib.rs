//! Guna storefront services library.
//!
//! Serves the gift card balance endpoint used by the Shopify theme. The
//! router is built here so it can be driven in tests without a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::from_fn,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::middleware::RateLimiterLayer;
use crate::state::AppState;

/// Largest request body accepted. `{ "code": "..." }` fits many times over.
pub const MAX_BODY_BYTES: usize = 4 * 1024;

/// Build the application router.
///
/// Sentry layers are left to the binary so tests don't need a hub. The rate
/// limiter is optional; it keys on the peer address, so in-process requests
/// that go through it must carry a `ConnectInfo<SocketAddr>` extension.
pub fn app(state: AppState, rate_limiter: Option<RateLimiterLayer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes(&state, rate_limiter))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(middleware::api_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not call Shopify.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::http::{HeaderValue, StatusCode};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{GiftCardLookupConfig, ShopifyAdminConfig, StorefrontConfig};
    use crate::shopify::AdminClient;

    const ORIGIN: &str = "https://guna-am.myshopify.com";

    fn test_app() -> Router {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            shopify: ShopifyAdminConfig {
                store: "guna-am.myshopify.com".to_string(),
                api_version: "2024-01".to_string(),
                access_token: SecretString::from("shpat_test_token"),
            },
            gift_cards: GiftCardLookupConfig {
                fetch_timeout: Duration::from_secs(1),
                ..GiftCardLookupConfig::default()
            },
            allowed_origins: vec![ORIGIN.to_string()],
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            trusted_proxy_header: None,
        };
        // Nothing listens here; these tests never reach Shopify.
        let admin = AdminClient::with_endpoint(
            "http://127.0.0.1:9/graphql.json",
            &config.shopify.access_token,
            &config.gift_cards,
        )
        .unwrap();
        app(AppState::with_client(config, admin), None)
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_headers_and_request_id() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["cache-control"], "no-store");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert!(headers.contains_key(middleware::REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_kept() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header(middleware::REQUEST_ID_HEADER, "edge-1234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[middleware::REQUEST_ID_HEADER],
            HeaderValue::from_static("edge-1234")
        );
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_with_cors() {
        let body = format!(r#"{{"code":"{}"}}"#, "A".repeat(MAX_BODY_BYTES));
        let response = test_app()
            .oneshot(
                Request::post("/giftcard")
                    .header("origin", ORIGIN)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()["access-control-allow-origin"], ORIGIN);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_app()
            .oneshot(Request::get("/giftcards").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
