//! The raw inbound view the pipeline starts from, and the small parsers
//! that turn it into a target and a client identity.

use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header, HeaderMap, HeaderName, Method, Request},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use url::{form_urlencoded, Url};

use crate::error::{ProxyError, Result};
use crate::http::request::X_REQUEST_ID;

/// Header whose first entry identifies the client for rate limiting.
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Query parameter naming the target.
pub const TARGET_PARAM: &str = "url";

/// An inbound call as received, before any checks.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
    /// Socket peer, when the server recorded one.
    pub peer: Option<SocketAddr>,
}

impl InboundRequest {
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

impl From<Request<Body>> for InboundRequest {
    fn from(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self {
            method: parts.method,
            query: parts.uri.query().map(String::from),
            headers: parts.headers,
            body,
            peer,
        }
    }
}

/// Extract and parse the `url` query parameter. The first occurrence wins.
pub fn parse_target(query: Option<&str>) -> Result<Url> {
    let raw = query.and_then(|q| {
        form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == TARGET_PARAM)
            .map(|(_, value)| value.into_owned())
    });
    let raw = match raw {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(ProxyError::MissingTarget),
    };

    let target = Url::parse(raw.trim()).map_err(|e| ProxyError::InvalidTarget {
        reason: e.to_string(),
    })?;

    if !matches!(target.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidTarget {
            reason: format!("unsupported scheme {}", target.scheme()),
        });
    }
    if target.host_str().map_or(true, str::is_empty) {
        return Err(ProxyError::InvalidTarget {
            reason: "missing host".to_string(),
        });
    }

    Ok(target)
}

/// Rate-limit identity: first `x-forwarded-for` entry, else the socket
/// peer's IP, else `"unknown"`.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(String::from)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Buffer the inbound body. Oversize bodies are 413 whether the length
/// was declared up front or only discovered while reading.
pub async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(ProxyError::PayloadTooLarge { limit });
    }

    let collected = Limited::new(body, limit).collect().await.map_err(|e| {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            ProxyError::PayloadTooLarge { limit }
        } else {
            ProxyError::BodyRead(axum::Error::new(e))
        }
    })?;
    Ok(collected.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_target() {
        let url = parse_target(Some("url=https%3A%2F%2Fexample.com%2Fx%3Fa%3D1")).unwrap();
        assert_eq!(url.as_str(), "https://example.com/x?a=1");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_first_url_value_wins() {
        let url = parse_target(Some("url=http://a.example/&url=http://b.example/")).unwrap();
        assert_eq!(url.host_str(), Some("a.example"));
    }

    #[test]
    fn test_missing_target() {
        assert!(matches!(parse_target(None), Err(ProxyError::MissingTarget)));
        assert!(matches!(parse_target(Some("x=1")), Err(ProxyError::MissingTarget)));
        assert!(matches!(parse_target(Some("url=")), Err(ProxyError::MissingTarget)));
    }

    #[test]
    fn test_invalid_target() {
        for query in ["url=not%20a%20url", "url=/relative", "url=ftp://example.com/", "url=mailto:a@b.c"] {
            assert!(
                matches!(parse_target(Some(query)), Err(ProxyError::InvalidTarget { .. })),
                "{query} should be invalid"
            );
        }
    }

    #[test]
    fn test_client_identity() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers, Some(peer)), "10.0.0.9");
        assert_eq!(client_identity(&headers, None), "unknown");

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        assert_eq!(client_identity(&headers, Some(peer)), "203.0.113.7");

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" , 10.0.0.1"));
        assert_eq!(client_identity(&headers, Some(peer)), "10.0.0.9");
    }

    #[tokio::test]
    async fn test_read_body_limits() {
        let mut headers = HeaderMap::new();
        let body = read_body(&headers, Body::from("hello"), 16).await.unwrap();
        assert_eq!(&body[..], b"hello");

        // No declared length: the limit trips while reading.
        assert!(matches!(
            read_body(&headers, Body::from("0123456789abcdefXYZ"), 16).await,
            Err(ProxyError::PayloadTooLarge { limit: 16 })
        ));

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("17"));
        assert!(matches!(
            read_body(&headers, Body::empty(), 16).await,
            Err(ProxyError::PayloadTooLarge { limit: 16 })
        ));
    }

    #[test]
    fn test_from_request() {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/proxy?url=http://example.com/")
            .header("x-request-id", "abc")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        let inbound = InboundRequest::from(request);
        assert_eq!(inbound.method, Method::POST);
        assert_eq!(inbound.query.as_deref(), Some("url=http://example.com/"));
        assert_eq!(inbound.peer, Some(peer));
        assert_eq!(inbound.request_id(), Some("abc"));
    }
}
