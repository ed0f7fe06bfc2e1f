//! Shopify Admin API client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP and the `graphql_client` envelope types for
//! request bodies and responses. Authenticates with the
//! `X-Shopify-Access-Token` header.

mod gift_cards;
pub mod queries;

use std::sync::Arc;

use graphql_client::{QueryBody, Response};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};

use crate::config::{GiftCardLookupConfig, ShopifyAdminConfig};

use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};

/// Longest slice of an upstream body kept for logs and error messages.
const MAX_LOGGED_BODY_CHARS: usize = 500;

/// Client for the Shopify Admin API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    endpoint: String,
    page_size: u32,
    enabled_only: bool,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("endpoint", &self.inner.endpoint)
            .field("page_size", &self.inner.page_size)
            .field("enabled_only", &self.inner.enabled_only)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new Admin API client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(
        config: &ShopifyAdminConfig,
        lookup: &GiftCardLookupConfig,
    ) -> Result<Self, ShopifyError> {
        Self::with_endpoint(config.graphql_endpoint(), &config.access_token, lookup)
    }

    /// Create a client against an explicit GraphQL endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        access_token: &SecretString,
        lookup: &GiftCardLookupConfig,
    ) -> Result<Self, ShopifyError> {
        let mut token = HeaderValue::from_str(access_token.expose_secret())
            .map_err(|e| ShopifyError::Config(format!("invalid access token format: {e}")))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-Shopify-Access-Token", token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(lookup.fetch_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                endpoint: endpoint.into(),
                page_size: lookup.page_size,
                enabled_only: lookup.enabled_only,
            }),
        })
    }

    /// Execute a GraphQL operation and return its `data`.
    async fn execute<V, D>(&self, body: &QueryBody<V>) -> Result<D, ShopifyError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: truncate(&response_text),
            });
        }

        let response: Response<D> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&response_text),
                "Failed to parse Shopify GraphQL response"
            );
            ShopifyError::Parse(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_LOGGED_BODY_CHARS).collect()
}
