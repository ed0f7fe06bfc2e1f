//! Gift card balance route handlers.
//!
//! Called cross-origin from the storefront theme. The flow for `POST`:
//!
//! 1. Origin gate (403, before rate limiting or reading the body)
//! 2. Parse `{ "code": "..." }` (400)
//! 3. Normalize the code to its lookup key
//! 4. Scan the Shopify gift card collection under a deadline
//! 5. 200 with balance / 404 / 502
//!
//! Only balance, currency and expiry are ever returned. The submitted code is
//! never logged or echoed; spans record the key length only.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use guna_core::{BalanceResponse, LookupKey, SearchResult};
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::cors::AllowedOrigin;
use crate::services::gift_card_lookup::PaginationScanner;
use crate::state::AppState;

/// Message for a missing, empty, or unparseable code.
pub const CODE_REQUIRED_MESSAGE: &str = "Gift card code is required";

/// Message when no eligible card matches.
pub const NOT_FOUND_MESSAGE: &str = "Invalid or expired gift card";

/// Answer a CORS preflight.
///
/// OPTIONS /giftcard
#[instrument(skip_all)]
pub async fn preflight(origin: AllowedOrigin) -> Response {
    origin.preflight_response()
}

/// Check a gift card balance.
///
/// POST /giftcard
///
/// Only reached through the origin gate layer, which adds the CORS headers
/// to every admitted response, errors included, so the storefront can read
/// the error body.
#[instrument(skip_all, fields(key_len = tracing::field::Empty))]
pub async fn check_balance(
    State(state): State<AppState>,
    origin: AllowedOrigin,
    body: Bytes,
) -> impl IntoResponse {
    (origin, lookup_balance(&state, &body).await)
}

async fn lookup_balance(state: &AppState, body: &[u8]) -> Result<Json<BalanceResponse>> {
    let code = parse_code(body)?;
    let key = LookupKey::from_code(&code);
    tracing::Span::current().record("key_len", key.len());

    let lookup = &state.config().gift_cards;
    let scanner = PaginationScanner::new(state.admin(), lookup.max_pages);

    let result = tokio::time::timeout(lookup.deadline, scanner.run(&key, Utc::now()))
        .await
        .map_err(|_| AppError::DeadlineExceeded(lookup.deadline))??;

    match result {
        SearchResult::Found(card) => {
            tracing::info!("Gift card balance returned");
            Ok(Json(BalanceResponse::from(&card)))
        }
        SearchResult::NotFound => {
            tracing::info!("No eligible gift card for key");
            Err(AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))
        }
    }
}

/// Extract the required `code` field from a JSON request body.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] if the body is not a JSON object, or
/// `code` is missing, not a string, or blank.
pub fn parse_code(body: &[u8]) -> Result<String> {
    let required = || AppError::BadRequest(CODE_REQUIRED_MESSAGE.to_string());

    let value: Value = serde_json::from_slice(body).map_err(|_| required())?;
    let code = value
        .get("code")
        .and_then(Value::as_str)
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(required)?;

    Ok(code.to_owned())
}
