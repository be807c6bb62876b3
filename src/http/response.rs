//! Response decoration.
//!
//! # Responsibilities
//! - Attach rate-limit headers once the rate check has run
//! - Attach CORS headers when an allowed origin is configured
//! - Turn handler panics into the standard JSON 500
//!
//! # Design Decisions
//! - Responses are fully built before anything is written, so decoration
//!   never races a streaming body

use std::any::Any;

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::error::ProxyError;
use crate::security::RateDecision;

/// Requests left in the caller's current window.
pub const X_RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-rate-limit-remaining");

/// Unix seconds at which the caller's window resets.
pub const X_RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-rate-limit-reset");

pub fn apply_rate_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(X_RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATE_LIMIT_RESET, HeaderValue::from(decision.reset_at_secs()));
}

/// Allow one origin and mark the response as origin-dependent.
pub fn apply_cors(headers: &mut HeaderMap, origin: &HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}

/// Used by `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!(detail = %detail, "Handler panicked");
    ProxyError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_rate_headers() {
        let mut headers = HeaderMap::new();
        apply_rate_headers(
            &mut headers,
            &RateDecision {
                admitted: true,
                remaining: 41,
                reset_at_ms: 1_700_000_060_999,
            },
        );
        assert_eq!(headers[X_RATE_LIMIT_REMAINING], "41");
        assert_eq!(headers[X_RATE_LIMIT_RESET], "1700000060");
    }

    #[test]
    fn test_cors_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        apply_cors(&mut headers, &HeaderValue::from_static("https://app.example"));

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example");
        let vary: Vec<_> = headers.get_all(header::VARY).iter().collect();
        assert_eq!(vary, vec!["Accept-Encoding", "Origin"]);
    }

    #[test]
    fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
