//! Caller authentication against the configured shared secret.

use axum::http::{HeaderName, HeaderValue};
use subtle::ConstantTimeEq;

use crate::error::{ProxyError, Result};

/// Header carrying the caller's secret. Never forwarded upstream.
pub const PROXY_KEY_HEADER: HeaderName = HeaderName::from_static("x-proxy-key");

/// Compare a presented header value with the configured secret.
///
/// The value is trimmed first. Absent, empty, or mismatching values are
/// rejected. The comparison does not short-circuit on the first differing
/// byte.
pub fn authenticate(header_value: Option<&str>, configured_secret: &str) -> bool {
    let presented = match header_value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return false,
    };
    if configured_secret.is_empty() || presented.len() != configured_secret.len() {
        return false;
    }
    presented.as_bytes().ct_eq(configured_secret.as_bytes()).into()
}

/// Holds the configured secret for the lifetime of the process.
#[derive(Clone)]
pub struct Authenticator {
    secret: String,
}

impl Authenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check the raw `x-proxy-key` header. Non-ASCII values count as absent.
    pub fn authenticate(&self, header: Option<&HeaderValue>) -> Result<()> {
        let value = header.and_then(|v| v.to_str().ok());
        if authenticate(value, &self.secret) {
            Ok(())
        } else {
            Err(ProxyError::Unauthorized)
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(authenticate(Some("K"), "K"));
        assert!(authenticate(Some("  K \t"), "K"));
        assert!(!authenticate(Some("k"), "K"));
        assert!(!authenticate(Some("KK"), "K"));
    }

    #[test]
    fn test_absent_or_empty() {
        assert!(!authenticate(None, "K"));
        assert!(!authenticate(Some(""), "K"));
        assert!(!authenticate(Some("   "), "K"));
        // An unset secret never authorizes anything.
        assert!(!authenticate(Some(""), ""));
    }

    #[test]
    fn test_authenticator_header() {
        let auth = Authenticator::new("s3cret");
        let good = HeaderValue::from_static("s3cret");
        let bad = HeaderValue::from_static("nope");
        let opaque = HeaderValue::from_bytes(b"s3cr\xffet").unwrap();

        assert!(auth.authenticate(Some(&good)).is_ok());
        assert!(matches!(auth.authenticate(Some(&bad)), Err(ProxyError::Unauthorized)));
        assert!(matches!(auth.authenticate(Some(&opaque)), Err(ProxyError::Unauthorized)));
        assert!(matches!(auth.authenticate(None), Err(ProxyError::Unauthorized)));
    }

    #[test]
    fn test_debug_does_not_leak() {
        let auth = Authenticator::new("s3cret");
        assert!(!format!("{:?}", auth).contains("s3cret"));
    }
}
