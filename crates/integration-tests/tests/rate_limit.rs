//! Per-IP rate limiting on `POST /giftcard`, with the production limiter
//! (burst of 5) installed.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::net::IpAddr;

use axum::http::{HeaderName, StatusCode};
use guna_integration_tests::{ALLOWED_ORIGIN, DEFAULT_PEER, TestContext};

const BURST: usize = 5;

/// An allowed-origin POST that stops at validation, so Shopify is never hit.
async fn post_missing_code(ctx: &TestContext, peer: IpAddr, headers: &[(&str, &str)]) -> StatusCode {
    ctx.post_from(peer, Some(ALLOWED_ORIGIN), headers, "{}")
        .await
        .status
}

async fn drain_bucket(ctx: &TestContext, peer: IpAddr) {
    for attempt in 0..BURST {
        assert_eq!(
            post_missing_code(ctx, peer, &[]).await,
            StatusCode::BAD_REQUEST,
            "attempt {attempt}"
        );
    }
}

#[tokio::test]
async fn test_foreign_origin_is_refused_before_rate_limit() {
    let ctx = TestContext::rate_limited(None).await;

    for attempt in 0..BURST + 3 {
        let response = ctx
            .post_from(DEFAULT_PEER, Some("https://evil.example"), &[], "{}")
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "attempt {attempt}");
        assert_eq!(response.header("access-control-allow-origin"), None);
    }

    // Refused requests took no tokens from the shared peer address
    drain_bucket(&ctx, DEFAULT_PEER).await;
}

#[tokio::test]
async fn test_preflights_are_not_counted() {
    let ctx = TestContext::rate_limited(None).await;

    for _ in 0..BURST * 2 {
        assert_eq!(
            ctx.preflight(Some(ALLOWED_ORIGIN)).await.status,
            StatusCode::NO_CONTENT
        );
    }

    drain_bucket(&ctx, DEFAULT_PEER).await;
    assert_eq!(
        post_missing_code(&ctx, DEFAULT_PEER, &[]).await,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_throttled_response_carries_cors_headers() {
    let ctx = TestContext::rate_limited(None).await;
    drain_bucket(&ctx, DEFAULT_PEER).await;

    let response = ctx
        .post_from(DEFAULT_PEER, Some(ALLOWED_ORIGIN), &[], "{}")
        .await;

    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some(ALLOWED_ORIGIN)
    );
    assert_eq!(response.header("vary"), Some("Origin"));
}

#[tokio::test]
async fn test_spoofed_forwarding_headers_share_the_peer_bucket() {
    let ctx = TestContext::rate_limited(None).await;

    let mut statuses = Vec::new();
    for i in 0..=BURST {
        let spoofed = format!("10.0.0.{i}");
        statuses.push(
            post_missing_code(
                &ctx,
                DEFAULT_PEER,
                &[
                    ("x-forwarded-for", spoofed.as_str()),
                    ("cf-connecting-ip", spoofed.as_str()),
                    ("x-real-ip", spoofed.as_str()),
                ],
            )
            .await,
        );
    }

    assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));
    assert!(
        statuses[..BURST]
            .iter()
            .all(|status| *status == StatusCode::BAD_REQUEST)
    );
}

#[tokio::test]
async fn test_peers_have_separate_buckets() {
    let ctx = TestContext::rate_limited(None).await;
    drain_bucket(&ctx, DEFAULT_PEER).await;

    let other: IpAddr = "192.0.2.77".parse().unwrap();
    assert_eq!(
        post_missing_code(&ctx, other, &[]).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_trusted_proxy_header_keys_on_right_most_hop() {
    let ctx = TestContext::rate_limited(Some(HeaderName::from_static("x-forwarded-for"))).await;
    // Every request arrives from the proxy; only the hop it appended counts
    let proxy = DEFAULT_PEER;

    for i in 0..BURST {
        let chain = format!("10.0.0.{i}, 198.51.100.1");
        assert_eq!(
            post_missing_code(&ctx, proxy, &[("x-forwarded-for", chain.as_str())]).await,
            StatusCode::BAD_REQUEST
        );
    }
    assert_eq!(
        post_missing_code(&ctx, proxy, &[("x-forwarded-for", "10.0.0.99, 198.51.100.1")]).await,
        StatusCode::TOO_MANY_REQUESTS
    );

    // A different client behind the same proxy has its own bucket
    assert_eq!(
        post_missing_code(&ctx, proxy, &[("x-forwarded-for", "198.51.100.2")]).await,
        StatusCode::BAD_REQUEST
    );
}
