//! Storefront API configuration loaded from environment variables.
//!
//! Loaded once at startup into an immutable [`StorefrontConfig`] and shared
//! read-only with every request through [`crate::state::AppState`].
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ADMIN_TOKEN` - Admin API access token (needs `read_gift_cards`)
//! - `GIFTCARD_ALLOWED_ORIGINS` - Comma-separated origins allowed to call the
//!   gift card endpoint (e.g., `https://your-store.myshopify.com`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_TRUSTED_PROXY_HEADER` - Header set by the reverse proxy in
//!   front of the service carrying the client IP (e.g., `x-forwarded-for`).
//!   Unset means rate limiting keys on the TCP peer address.
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-01)
//! - `GIFTCARD_PAGE_SIZE` - Gift cards requested per page, 1-250 (default: 100)
//! - `GIFTCARD_MAX_PAGES` - Pages scanned before giving up (default: 40)
//! - `GIFTCARD_ENABLED_ONLY` - Ask Shopify for enabled cards only (default: true)
//! - `GIFTCARD_FETCH_TIMEOUT_SECS` - Timeout per Shopify request (default: 10)
//! - `GIFTCARD_DEADLINE_SECS` - Overall time budget per lookup (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Shopify caps `first` on connection fields at 250.
const MAX_PAGE_SIZE: u32 = 250;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront API configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin API configuration
    pub shopify: ShopifyAdminConfig,
    /// Gift card lookup tuning
    pub gift_cards: GiftCardLookupConfig,
    /// Origins allowed to call the gift card endpoint (exact match)
    pub allowed_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
    /// Proxy header trusted for the client IP when rate limiting
    pub trusted_proxy_header: Option<HeaderName>,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyAdminConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2024-01)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopifyAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAdminConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyAdminConfig {
    /// Admin GraphQL endpoint for the configured store and API version.
    #[must_use]
    pub fn graphql_endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.store, self.api_version
        )
    }
}

/// Gift card lookup tuning.
#[derive(Debug, Clone)]
pub struct GiftCardLookupConfig {
    /// Cards requested per page
    pub page_size: u32,
    /// Pages scanned before the lookup is abandoned
    pub max_pages: usize,
    /// Ask Shopify to return enabled cards only
    pub enabled_only: bool,
    /// Timeout for each Shopify request
    pub fetch_timeout: Duration,
    /// Time budget for a whole lookup, across all pages
    pub deadline: Duration,
}

impl Default for GiftCardLookupConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 40,
            enabled_only: true,
            fetch_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(30),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the access token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_parsed_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_env("STOREFRONT_PORT", "3000")?;

        let shopify = ShopifyAdminConfig::from_env()?;
        let gift_cards = GiftCardLookupConfig::from_env()?;
        let allowed_origins = parse_allowed_origins(
            "GIFTCARD_ALLOWED_ORIGINS",
            &get_required_env("GIFTCARD_ALLOWED_ORIGINS")?,
        )?;

        Ok(Self {
            host,
            port,
            shopify,
            gift_cards,
            allowed_origins,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: get_parsed_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
            trusted_proxy_header: get_optional_env("STOREFRONT_TRUSTED_PROXY_HEADER")
                .map(|value| parse_header_name("STOREFRONT_TRUSTED_PROXY_HEADER", &value))
                .transpose()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2024-01"),
            access_token: get_validated_secret("SHOPIFY_ADMIN_TOKEN")?,
        })
    }
}

impl GiftCardLookupConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let page_size: u32 = get_parsed_env("GIFTCARD_PAGE_SIZE", "100")?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "GIFTCARD_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE} (got {page_size})"),
            ));
        }

        let max_pages: usize = get_parsed_env("GIFTCARD_MAX_PAGES", "40")?;
        if max_pages == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "GIFTCARD_MAX_PAGES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            page_size,
            max_pages,
            enabled_only: get_parsed_env("GIFTCARD_ENABLED_ONLY", "true")?,
            fetch_timeout: get_duration_secs("GIFTCARD_FETCH_TIMEOUT_SECS", "10")?,
            deadline: get_duration_secs("GIFTCARD_DEADLINE_SECS", "30")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable (or its default) parsed into `T`.
fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a positive number of seconds as a `Duration`.
fn get_duration_secs(key: &str, default: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = get_parsed_env(key, default)?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse an HTTP header name (case-insensitive).
fn parse_header_name(key: &str, value: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::from_str(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a comma-separated list of origins.
///
/// Each entry must be a bare, canonical `scheme://host[:port]` origin, exactly
/// as a browser would send it in the `Origin` header. Anything else could
/// never match at request time, so it is rejected here instead.
fn parse_allowed_origins(key: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| validate_origin(key, origin))
        .collect::<Result<_, _>>()?;

    if origins.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "at least one origin is required".to_string(),
        ));
    }

    Ok(origins)
}

fn validate_origin(key: &str, origin: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEnvVar(key.to_string(), format!("'{origin}' {reason}"));

    let url = Url::parse(origin).map_err(|e| invalid(&format!("is not a URL ({e})")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("must use http or https"));
    }

    let canonical = url.origin().ascii_serialization();
    if canonical != origin {
        return Err(invalid(&format!(
            "must be a bare origin without path or trailing slash (did you mean '{canonical}'?)"
        )));
    }

    Ok(canonical)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real access tokens are random and have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token Shopify issued."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
