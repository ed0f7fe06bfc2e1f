//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET     /health      - Liveness check
//!
//! # Gift cards (cross-origin, allow-listed origins only)
//! OPTIONS /giftcard    - CORS preflight
//! POST    /giftcard    - Balance check for { "code": "..." }
//! ```

pub mod gift_card;

use axum::{Router, middleware::from_fn_with_state, routing::post};

use crate::middleware::{RateLimiterLayer, origin_gate_middleware};
use crate::state::AppState;

/// Create the gift card routes router.
///
/// Layering, outermost first: origin gate, then (POST only) the per-IP rate
/// limiter, then the handler. Preflights are never counted against the
/// limit, and disallowed origins are refused before they can use it up.
pub fn gift_card_routes(
    state: &AppState,
    rate_limiter: Option<RateLimiterLayer>,
) -> Router<AppState> {
    let check_balance = post(gift_card::check_balance);
    let check_balance = match rate_limiter {
        Some(layer) => check_balance.layer(layer),
        None => check_balance,
    };

    Router::new()
        .route("/giftcard", check_balance.options(gift_card::preflight))
        .route_layer(from_fn_with_state(state.clone(), origin_gate_middleware))
}

/// Create all routes for the storefront API.
pub fn routes(state: &AppState, rate_limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new().merge(gift_card_routes(state, rate_limiter))
}
