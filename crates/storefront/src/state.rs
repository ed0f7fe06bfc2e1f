//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::middleware::cors::OriginGate;
use crate::shopify::{AdminClient, ShopifyError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is built once at startup
/// and never mutated, so concurrent requests share it without locking.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    admin: AdminClient,
    origin_gate: OriginGate,
}

impl AppState {
    /// Create a new application state talking to the configured Shopify store.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ShopifyError> {
        let admin = AdminClient::new(&config.shopify, &config.gift_cards)?;
        Ok(Self::with_client(config, admin))
    }

    /// Create application state around an existing Shopify client.
    #[must_use]
    pub fn with_client(config: StorefrontConfig, admin: AdminClient) -> Self {
        let origin_gate = OriginGate::new(config.allowed_origins.iter().cloned());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                admin,
                origin_gate,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn admin(&self) -> &AdminClient {
        &self.inner.admin
    }

    /// Get a reference to the origin allow-list.
    #[must_use]
    pub fn origin_gate(&self) -> &OriginGate {
        &self.inner.origin_gate
    }
}
