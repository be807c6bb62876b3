//! The admission pipeline: one type that walks every request through the
//! stages in order and turns the result into a response.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::response::{apply_cors, apply_rate_headers};
use crate::observability::metrics;
use crate::pipeline::inbound::{client_identity, parse_target, read_body, InboundRequest};
use crate::pipeline::stage::{Rejection, Stage};
use crate::security::{
    Authenticator, HeaderFilter, RateDecision, RateLimiter, Whitelist, PROXY_KEY_HEADER,
};
use crate::upstream::{carries_body, ForwardOutcome, Forwarder, ProxyRequest};

/// Orchestrates authentication, target checks, rate limiting, header
/// sanitization, and forwarding.
pub struct AdmissionPipeline {
    authenticator: Authenticator,
    whitelist: Arc<Whitelist>,
    rate_limiter: RateLimiter,
    header_filter: HeaderFilter,
    forwarder: Arc<dyn Forwarder>,
    allowed_origin: Option<HeaderValue>,
    max_body_bytes: usize,
}

impl AdmissionPipeline {
    /// Build from validated configuration with an in-memory rate store.
    pub fn new(
        config: &ProxyConfig,
        whitelist: Arc<Whitelist>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        let allowed_origin = config
            .response
            .allowed_origin
            .as_deref()
            .and_then(|origin| HeaderValue::from_str(origin).ok());

        Self {
            authenticator: Authenticator::new(config.auth.secret.clone()),
            whitelist,
            rate_limiter: RateLimiter::new(config.rate_limit.max_requests_per_minute),
            header_filter: HeaderFilter::new(&config.response),
            forwarder,
            allowed_origin,
            max_body_bytes: config.upstream.max_body_bytes,
        }
    }

    /// Swap in a limiter with a different store or clock.
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Run one request to completion. Never fails: every rejection becomes
    /// a JSON error response.
    pub async fn admit(&self, inbound: InboundRequest) -> Response {
        let start = Instant::now();
        let method = inbound.method.clone();
        let span = tracing::info_span!(
            "admit",
            request_id = inbound.request_id().unwrap_or("unknown"),
            method = %method,
        );

        async move {
            let mut rate = None;
            let mut response = match self.run(inbound, &mut rate).await {
                Ok(outcome) => {
                    tracing::debug!(status = outcome.status.as_u16(), "Relaying upstream response");
                    outcome.into_response()
                }
                Err(rejection) => rejection.into_response(),
            };

            if let Some(decision) = rate {
                apply_rate_headers(response.headers_mut(), &decision);
            }
            if let Some(origin) = &self.allowed_origin {
                apply_cors(response.headers_mut(), origin);
            }

            metrics::record_request(method.as_str(), response.status().as_u16(), start);
            response
        }
        .instrument(span)
        .await
    }

    /// The stages, in order. `rate` is filled in as soon as the rate check
    /// has run so its headers reach rejections too.
    async fn run(
        &self,
        inbound: InboundRequest,
        rate: &mut Option<RateDecision>,
    ) -> Result<ForwardOutcome, Rejection> {
        let InboundRequest {
            method,
            query,
            headers,
            body,
            peer,
        } = inbound;

        // Authenticate
        self.authenticator
            .authenticate(headers.get(PROXY_KEY_HEADER))
            .map_err(Rejection::at(Stage::Authenticate))?;

        // ParseTarget
        let target = parse_target(query.as_deref()).map_err(Rejection::at(Stage::ParseTarget))?;

        // CheckWhitelist
        let host = target.host_str().unwrap_or_default();
        if !self.whitelist.is_allowed(host) {
            return Err(Rejection::new(
                Stage::CheckWhitelist,
                ProxyError::HostNotWhitelisted {
                    host: host.to_string(),
                },
            ));
        }

        // CheckRate
        let client = client_identity(&headers, peer);
        let decision = self.rate_limiter.check(&client);
        *rate = Some(decision);
        if !decision.admitted {
            return Err(Rejection::new(Stage::CheckRate, ProxyError::RateLimited));
        }

        // FilterInbound
        let forwarded = self.header_filter.filter_inbound(&headers);
        let body = if carries_body(&method) {
            let bytes = read_body(&headers, body, self.max_body_bytes)
                .await
                .map_err(Rejection::at(Stage::FilterInbound))?;
            Some(bytes)
        } else {
            None
        };

        tracing::debug!(
            host = target.host_str().unwrap_or_default(),
            client = %client,
            remaining = decision.remaining,
            "Forwarding request"
        );

        // Forward
        let mut outcome = self
            .forwarder
            .forward(ProxyRequest {
                method,
                target,
                headers: forwarded,
                body,
                client,
            })
            .await
            .map_err(Rejection::at(Stage::Forward))?;

        // FilterOutbound
        outcome.headers = self.header_filter.filter_outbound(&outcome.headers);

        Ok(outcome)
    }
}
