//! Shopify Admin API client.
//!
//! # Architecture
//!
//! - Hand-written GraphQL documents sent with `reqwest`, wrapped in the
//!   `graphql_client` request/response envelope types
//! - Shopify is source of truth - NO local sync, NO caching; gift card
//!   balances change with every purchase and are always read fresh
//! - One request per call, no retries; callers decide what a failure means
//!
//! # Example
//!
//! ```rust,ignore
//! use guna_storefront::shopify::AdminClient;
//!
//! let client = AdminClient::new(&config.shopify, &config.gift_cards)?;
//!
//! let first = client.fetch_gift_card_page(None).await?;
//! if first.has_next_page {
//!     let next = client.fetch_gift_card_page(first.end_cursor()).await?;
//! }
//! ```

mod admin;

pub use admin::AdminClient;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (connect, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response parsed but contained values we cannot interpret.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The client could not be constructed.
    #[error("Client configuration error: {0}")]
    Config(String),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Access denied for giftCards field".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Throttled".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Access denied for giftCards field; Throttled"
        );
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 3, column: 5 }],
            path: vec![
                serde_json::Value::String("giftCards".to_string()),
                serde_json::Value::String("edges".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: giftCards.edges.0 at line 3:5"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = ShopifyError::GraphQL(vec![GraphQLError {
            message: String::new(),
            locations: vec![],
            path: vec![],
        }]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");

        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_status_error_display() {
        let err = ShopifyError::Status {
            status: 401,
            body: "Invalid API key or access token".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401: Invalid API key or access token");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");
    }
}
