//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. API headers (no-store, nosniff, etc.)
//! 5. Origin gate (gift card route only, adds CORS headers)
//! 6. Rate limiting (governor, `POST /giftcard` only)

pub mod api_headers;
pub mod cors;
pub mod rate_limit;
pub mod request_id;

pub use api_headers::api_headers_middleware;
pub use cors::{AllowedOrigin, OriginCheck, OriginGate, origin_gate_middleware};
pub use rate_limit::{RateLimiterLayer, gift_card_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
