//! Integration tests for the Guna storefront services.
//!
//! The full router runs in-process against a wiremock stand-in for the
//! Shopify Admin GraphQL endpoint, so no store or token is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p guna-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderName, Method, Request, Response, StatusCode, header},
};
use guna_storefront::config::{GiftCardLookupConfig, ShopifyAdminConfig, StorefrontConfig};
use guna_storefront::middleware::gift_card_rate_limiter;
use guna_storefront::shopify::AdminClient;
use guna_storefront::state::AppState;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

/// Origin on the allow-list of every test app.
pub const ALLOWED_ORIGIN: &str = "https://guna-am.myshopify.com";

/// Admin token the mock server expects.
pub const ADMIN_TOKEN: &str = "shpat_integration_test_token";

/// Path of the Admin GraphQL endpoint on the mock server.
pub const GRAPHQL_PATH: &str = "/admin/api/2024-01/graphql.json";

/// Peer address used when a test doesn't pick one.
pub const DEFAULT_PEER: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));

/// A storefront router wired to a mock Shopify server.
pub struct TestContext {
    pub shopify: MockServer,
    pub app: Router,
}

impl TestContext {
    /// Start a mock Shopify server and build the app with default tuning.
    pub async fn new() -> Self {
        Self::with_lookup(GiftCardLookupConfig {
            fetch_timeout: Duration::from_secs(2),
            deadline: Duration::from_secs(5),
            ..GiftCardLookupConfig::default()
        })
        .await
    }

    /// Start a mock Shopify server and build the app with custom tuning.
    pub async fn with_lookup(lookup: GiftCardLookupConfig) -> Self {
        Self::build(lookup, false, None).await
    }

    /// Build the app with the production rate limiter installed.
    pub async fn rate_limited(trusted_proxy_header: Option<HeaderName>) -> Self {
        Self::build(
            GiftCardLookupConfig {
                fetch_timeout: Duration::from_secs(2),
                deadline: Duration::from_secs(5),
                ..GiftCardLookupConfig::default()
            },
            true,
            trusted_proxy_header,
        )
        .await
    }

    async fn build(
        lookup: GiftCardLookupConfig,
        rate_limited: bool,
        trusted_proxy_header: Option<HeaderName>,
    ) -> Self {
        let shopify = MockServer::start().await;

        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid IP"),
            port: 0,
            shopify: ShopifyAdminConfig {
                store: "guna-am.myshopify.com".to_string(),
                api_version: "2024-01".to_string(),
                access_token: SecretString::from(ADMIN_TOKEN),
            },
            gift_cards: lookup,
            allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            trusted_proxy_header,
        };

        let admin = AdminClient::with_endpoint(
            format!("{}{GRAPHQL_PATH}", shopify.uri()),
            &config.shopify.access_token,
            &config.gift_cards,
        )
        .expect("admin client builds");

        let rate_limiter = rate_limited
            .then(|| gift_card_rate_limiter(config.trusted_proxy_header.clone()));
        let app = guna_storefront::app(AppState::with_client(config, admin), rate_limiter);
        Self { shopify, app }
    }

    /// POST a raw body to `/giftcard` from the given origin.
    pub async fn post_raw(&self, origin: Option<&str>, body: impl Into<Body>) -> TestResponse {
        self.post_from(DEFAULT_PEER, origin, &[], body).await
    }

    /// POST a raw body to `/giftcard` from a given peer, with extra headers.
    pub async fn post_from(
        &self,
        peer: IpAddr,
        origin: Option<&str>,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> TestResponse {
        let mut request = Request::post("/giftcard").header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(peer, origin, request, body.into()).await
    }

    /// POST `{ "code": code }` from the allowed origin.
    pub async fn check_code(&self, code: &str) -> TestResponse {
        self.post_raw(
            Some(ALLOWED_ORIGIN),
            json!({ "code": code }).to_string(),
        )
        .await
    }

    /// OPTIONS `/giftcard` from the given origin.
    pub async fn preflight(&self, origin: Option<&str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/giftcard")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST");
        self.send(DEFAULT_PEER, origin, request, Body::empty()).await
    }

    /// Requests carry the peer address the way `axum::serve` would attach it.
    async fn send(
        &self,
        peer: IpAddr,
        origin: Option<&str>,
        mut request: axum::http::request::Builder,
        body: Body,
    ) -> TestResponse {
        if let Some(origin) = origin {
            request = request.header(header::ORIGIN, origin);
        }
        let mut request = request.body(body).expect("valid request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(peer, 40_000)));

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        TestResponse::read(response).await
    }
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    async fn read(response: Response<Body>) -> Self {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .expect("body collects")
            .to_bytes()
            .to_vec();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    /// Value of a header as a string, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// One gift card node as the Admin API returns it.
pub fn card(last_characters: &str, enabled: bool, expires_on: Option<&str>, amount: &str) -> Value {
    json!({
        "enabled": enabled,
        "expiresOn": expires_on,
        "lastCharacters": last_characters,
        "balance": { "amount": amount, "currencyCode": "EUR" }
    })
}

/// A `giftCards` connection page. Each card is paired with its cursor.
pub fn page(cards: &[(&str, Value)], has_next_page: bool) -> Value {
    let edges: Vec<Value> = cards
        .iter()
        .map(|(cursor, node)| json!({ "cursor": cursor, "node": node }))
        .collect();

    json!({
        "data": {
            "giftCards": {
                "edges": edges,
                "pageInfo": { "hasNextPage": has_next_page }
            }
        }
    })
}
