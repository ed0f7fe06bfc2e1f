//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. Every error becomes a JSON body of
//! the form `{ "error": "<message>" }`. Upstream details are logged, never
//! returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::gift_card_lookup::ScanError;
use crate::shopify::ShopifyError;

/// Message returned for any upstream failure.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Unable to check gift card balance";

/// Application-level error type for the storefront API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Gift card scan ended without an answer.
    #[error("Gift card scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Gift card scan ran out of time.
    #[error("Gift card scan exceeded its {0:?} deadline")]
    DeadlineExceeded(std::time::Duration),

    /// Request origin is not on the allow-list.
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Shopify(_) | Self::Scan(_) | Self::DeadlineExceeded(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Shopify(_) | Self::Scan(_) | Self::DeadlineExceeded(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Shopify(_) | Self::Scan(_) | Self::DeadlineExceeded(_) => {
                UPSTREAM_FAILURE_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };

        (self.status(), Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
