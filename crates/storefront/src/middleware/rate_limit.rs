//! Rate limiting middleware using governor and `tower_governor`.
//!
//! The gift card endpoint matches on four characters only, which makes it a
//! target for enumeration. Limits are per client IP.
//!
//! The client IP is the TCP peer address unless a trusted reverse proxy
//! header is configured (`STOREFRONT_TRUSTED_PROXY_HEADER`). Forwarding
//! headers are otherwise ignored: any caller can set them, and rotating them
//! would hand out a fresh bucket per request.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor for the client IP.
///
/// With a trusted header configured, uses the right-most address in it: the
/// one appended by the proxy in front of us. Entries further left were
/// supplied by the client. Without one, or when the header is missing or
/// unparseable, uses the peer address of the TCP connection.
#[derive(Debug, Clone, Default)]
pub struct ClientIpKeyExtractor {
    trusted_header: Option<HeaderName>,
}

impl ClientIpKeyExtractor {
    /// Create an extractor, optionally trusting one proxy header.
    #[must_use]
    pub const fn new(trusted_header: Option<HeaderName>) -> Self {
        Self { trusted_header }
    }

    fn client_ip<T>(&self, req: &Request<T>) -> Option<IpAddr> {
        self.trusted_header
            .as_ref()
            .and_then(|name| proxied_ip(req.headers(), name))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        self.client_ip(req).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Right-most address in a (possibly repeated, comma-separated) header.
fn proxied_ip(headers: &HeaderMap, name: &HeaderName) -> Option<IpAddr> {
    headers
        .get_all(name)
        .iter()
        .last()
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.rsplit(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for gift card lookups: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn gift_card_rate_limiter(trusted_header: Option<HeaderName>) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trusted_header))
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}
