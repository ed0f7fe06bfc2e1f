//! Origin gate for cross-origin gift card requests.
//!
//! The gift card endpoint is called from the Shopify-hosted storefront, i.e.
//! cross-origin. Only origins on the configured allow-list may call it.
//! Matching is exact string equality on the `Origin` header (scheme, host and
//! port; case-sensitive). Allowed origins are echoed back, never wildcarded.
//!
//! [`origin_gate_middleware`] runs as a route layer in front of everything
//! else on the gift card route, rate limiting and body reading included, so a
//! rejected origin always gets a bare 403 and never uses up rate limit
//! tokens. Rejections carry no CORS headers. Every response to an allowed
//! origin gets them, whichever layer produced it (429 and 413 included).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
        },
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
};

use crate::error::AppError;
use crate::state::AppState;

/// Methods the gift card endpoint accepts cross-origin.
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Request headers the gift card endpoint accepts cross-origin.
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// Allow-list of origins permitted to call the gift card endpoint.
#[derive(Debug, Clone)]
pub struct OriginGate {
    allowed: Vec<String>,
}

/// Outcome of checking a request origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginCheck {
    /// The origin is on the allow-list.
    Allowed(AllowedOrigin),
    /// The origin is missing, malformed, or not on the allow-list.
    Forbidden,
}

impl OriginGate {
    /// Create a gate from the configured allow-list.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Check a request's `Origin` header value.
    #[must_use]
    pub fn check_origin(&self, origin: Option<&HeaderValue>) -> OriginCheck {
        let Some(value) = origin else {
            return OriginCheck::Forbidden;
        };
        let Ok(origin) = value.to_str() else {
            return OriginCheck::Forbidden;
        };

        if self.allowed.iter().any(|allowed| allowed == origin) {
            OriginCheck::Allowed(AllowedOrigin(value.clone()))
        } else {
            OriginCheck::Forbidden
        }
    }

    /// Check the `Origin` header of a request.
    #[must_use]
    pub fn check(&self, headers: &HeaderMap) -> OriginCheck {
        self.check_origin(headers.get(ORIGIN))
    }
}

/// A request origin that passed the [`OriginGate`].
///
/// As an extractor, reuses the origin admitted by [`origin_gate_middleware`]
/// or checks the gate itself, rejecting with [`AppError::Forbidden`]. As
/// response parts, adds `Access-Control-Allow-Origin` (the echoed origin) and
/// `Vary: Origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigin(HeaderValue);

impl AllowedOrigin {
    /// Add the CORS response headers. Safe to apply more than once.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.0.clone());

        let varies_on_origin = headers.get_all(VARY).iter().any(|value| {
            value.to_str().is_ok_and(|value| {
                value
                    .split(',')
                    .any(|name| name.trim().eq_ignore_ascii_case("origin"))
            })
        });
        if !varies_on_origin {
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
    }

    /// Preflight answer: 204, no body, CORS headers.
    #[must_use]
    pub fn preflight_response(self) -> Response {
        (
            StatusCode::NO_CONTENT,
            self,
            [
                (
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOWED_METHODS),
                ),
                (
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOWED_HEADERS),
                ),
            ],
        )
            .into_response()
    }
}

impl IntoResponseParts for AllowedOrigin {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.apply(res.headers_mut());
        Ok(res)
    }
}

impl FromRequestParts<AppState> for AllowedOrigin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(origin) = parts.extensions.get::<Self>() {
            return Ok(origin.clone());
        }
        admit(state.origin_gate(), &parts.headers)
    }
}

fn admit(gate: &OriginGate, headers: &HeaderMap) -> Result<AllowedOrigin, AppError> {
    match gate.check(headers) {
        OriginCheck::Allowed(origin) => Ok(origin),
        OriginCheck::Forbidden => {
            tracing::debug!(
                origin = ?headers.get(ORIGIN),
                "Rejected request from origin not on allow-list"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// Origin gate for the gift card route.
///
/// Rejects origins not on the allow-list with 403 before any inner layer
/// runs. Admitted origins are stored in the request extensions and echoed in
/// the CORS headers of whatever response comes back.
pub async fn origin_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let origin = match admit(state.origin_gate(), request.headers()) {
        Ok(origin) => origin,
        Err(rejection) => return rejection.into_response(),
    };

    request.extensions_mut().insert(origin.clone());
    let mut response = next.run(request).await;
    origin.apply(response.headers_mut());
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gate() -> OriginGate {
        OriginGate::new([
            "https://guna-am.myshopify.com".to_string(),
            "http://localhost:3000".to_string(),
        ])
    }

    fn check(origin: &str) -> OriginCheck {
        gate().check_origin(Some(&HeaderValue::from_str(origin).unwrap()))
    }

    #[test]
    fn test_listed_origin_is_allowed() {
        assert!(matches!(
            check("https://guna-am.myshopify.com"),
            OriginCheck::Allowed(_)
        ));
        assert!(matches!(check("http://localhost:3000"), OriginCheck::Allowed(_)));
    }

    #[test]
    fn test_missing_origin_is_forbidden() {
        assert_eq!(gate().check_origin(None), OriginCheck::Forbidden);
    }

    #[test]
    fn test_match_is_exact() {
        // Scheme, port, case, trailing slash and subdomain all matter
        for origin in [
            "http://guna-am.myshopify.com",
            "https://guna-am.myshopify.com:8443",
            "https://GUNA-AM.myshopify.com",
            "https://guna-am.myshopify.com/",
            "https://evil.guna-am.myshopify.com",
            "https://guna-am.myshopify.com.evil.example",
            "http://localhost:3001",
            "null",
        ] {
            assert_eq!(check(origin), OriginCheck::Forbidden, "{origin}");
        }
    }

    #[test]
    fn test_non_utf8_origin_is_forbidden() {
        let value = HeaderValue::from_bytes(b"https://\xffshop.example").unwrap();
        assert_eq!(gate().check_origin(Some(&value)), OriginCheck::Forbidden);
    }

    #[test]
    fn test_check_reads_origin_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(gate().check(&headers), OriginCheck::Forbidden);

        headers.insert(ORIGIN, HeaderValue::from_static("http://localhost:3000"));
        assert!(matches!(gate().check(&headers), OriginCheck::Allowed(_)));
    }

    #[test]
    fn test_preflight_response_echoes_origin() {
        let OriginCheck::Allowed(origin) = check("https://guna-am.myshopify.com") else {
            panic!("origin should be allowed");
        };

        let response = origin.preflight_response();
        let headers = response.headers();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://guna-am.myshopify.com"
        );
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "POST, OPTIONS");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "Content-Type");
        assert_eq!(headers.get(VARY).unwrap(), "Origin");
    }

    #[test]
    fn test_apply_is_idempotent_and_keeps_other_vary_values() {
        let OriginCheck::Allowed(origin) = check("http://localhost:3000") else {
            panic!("origin should be allowed");
        };

        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));
        origin.apply(&mut headers);
        origin.apply(&mut headers);

        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        let vary: Vec<_> = headers.get_all(VARY).iter().collect();
        assert_eq!(vary, ["Accept-Encoding", "Origin"]);
    }
}
