//! Outbound request execution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::redirect;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{ProxyError, Result};
use crate::observability::metrics;
use crate::security::Whitelist;

/// A sanitized request ready to leave the proxy.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub target: Url,
    /// Headers after inbound filtering. Never contains `x-proxy-key`.
    pub headers: HeaderMap,
    /// Present only for methods that carry a body.
    pub body: Option<Bytes>,
    /// Rate-limit identity of the caller.
    pub client: String,
}

/// Whether a request body means anything for `method`.
pub fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// What came back from upstream, fully buffered.
#[derive(Debug, Clone)]
pub struct ForwardOutcome {
    /// Method of the request that produced this outcome.
    pub method: Method,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for ForwardOutcome {
    fn into_response(self) -> Response {
        let mut headers = self.headers;
        // A HEAD response keeps the length the upstream declared; anything
        // else is reframed from the buffered body.
        if self.method != Method::HEAD {
            headers.remove(header::CONTENT_LENGTH);
        }

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

/// Performs the upstream call for a sanitized request.
#[async_trait]
pub trait Forwarder: Send + Sync + 'static {
    async fn forward(&self, request: ProxyRequest) -> Result<ForwardOutcome>;
}

/// Forwarder backed by a shared `reqwest` client.
///
/// Redirects are followed inside the client, so callers only ever see the
/// final response. Each hop must stay on the whitelist.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(config: &UpstreamConfig, whitelist: Arc<Whitelist>) -> Result<Self> {
        let max_redirects = config.max_redirects;
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                return attempt.error("too many redirects");
            }
            let allowed = attempt
                .url()
                .host_str()
                .is_some_and(|host| whitelist.is_allowed(host));
            if allowed {
                attempt.follow()
            } else {
                attempt.error("redirect target is not whitelisted")
            }
        });

        let client = reqwest::Client::builder()
            .redirect(policy)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .no_proxy()
            .build()
            .map_err(ProxyError::ClientBuild)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ProxyRequest) -> Result<ForwardOutcome> {
        let start = Instant::now();
        let host = request.target.host_str().unwrap_or_default().to_string();
        // Drop the URL from transport errors so query strings stay out of logs.
        let upstream_error = |source: reqwest::Error| ProxyError::Upstream {
            host: host.clone(),
            source: source.without_url(),
        };

        let mut headers = request.headers;
        headers.remove(header::CONTENT_LENGTH);

        let method = request.method;
        let mut builder = self
            .client
            .request(method.clone(), request.target)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(upstream_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        // Buffer everything before a status is committed to the caller.
        let body = response.bytes().await.map_err(upstream_error)?;

        metrics::record_upstream(status.as_u16(), start);
        Ok(ForwardOutcome {
            method,
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_methods() {
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::HEAD));
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::PATCH));
        assert!(carries_body(&Method::DELETE));
    }

    #[tokio::test]
    async fn test_outcome_into_response() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        headers.insert(header::CONTENT_LENGTH, "999".parse().unwrap());

        let response = ForwardOutcome {
            method: Method::GET,
            status: StatusCode::CREATED,
            headers,
            body: Bytes::from_static(b"made"),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"made");
    }

    #[test]
    fn test_head_outcome_keeps_declared_length() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, "1234".parse().unwrap());

        let response = ForwardOutcome {
            method: Method::HEAD,
            status: StatusCode::OK,
            headers,
            body: Bytes::new(),
        }
        .into_response();

        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1234");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_upstream_error() {
        let whitelist = Arc::new(Whitelist::new(["127.0.0.1"]));
        let config = UpstreamConfig {
            connect_timeout_secs: 1,
            timeout_secs: 2,
            ..UpstreamConfig::default()
        };
        let forwarder = HttpForwarder::new(&config, whitelist).unwrap();

        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = forwarder
            .forward(ProxyRequest {
                method: Method::GET,
                target: Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap(),
                headers: HeaderMap::new(),
                body: None,
                client: "test".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::Upstream { .. }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
