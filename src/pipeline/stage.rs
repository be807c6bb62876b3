//! Pipeline stages and stage-tagged rejections.

use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::observability::metrics;

/// Every state a request passes through, in the only order allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Authenticate,
    ParseTarget,
    CheckWhitelist,
    CheckRate,
    FilterInbound,
    Forward,
    FilterOutbound,
    Respond,
}

impl Stage {
    pub const ORDER: [Stage; 9] = [
        Stage::Start,
        Stage::Authenticate,
        Stage::ParseTarget,
        Stage::CheckWhitelist,
        Stage::CheckRate,
        Stage::FilterInbound,
        Stage::Forward,
        Stage::FilterOutbound,
        Stage::Respond,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Authenticate => "authenticate",
            Stage::ParseTarget => "parse_target",
            Stage::CheckWhitelist => "check_whitelist",
            Stage::CheckRate => "check_rate",
            Stage::FilterInbound => "filter_inbound",
            Stage::Forward => "forward",
            Stage::FilterOutbound => "filter_outbound",
            Stage::Respond => "respond",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request terminated at `stage`.
#[derive(Debug)]
pub struct Rejection {
    pub stage: Stage,
    pub error: ProxyError,
}

impl Rejection {
    pub fn new(stage: Stage, error: ProxyError) -> Self {
        Self { stage, error }
    }

    /// Adapter for `map_err`.
    pub fn at(stage: Stage) -> impl FnOnce(ProxyError) -> Rejection {
        move |error| Rejection::new(stage, error)
    }

    fn log(&self) {
        let stage = self.stage.as_str();
        match &self.error {
            ProxyError::Upstream { host, source } => {
                tracing::error!(stage, host = %host, error = %source, "Upstream request failed");
            }
            ProxyError::Internal(detail) => {
                tracing::error!(stage, detail = %detail, "Internal failure");
            }
            ProxyError::HostNotWhitelisted { host } => {
                tracing::warn!(stage, host = %host, "Target host not whitelisted");
            }
            ProxyError::Unauthorized | ProxyError::RateLimited => {
                tracing::warn!(stage, error = %self.error, "Request rejected");
            }
            ProxyError::InvalidTarget { reason } => {
                tracing::debug!(stage, reason = %reason, "Invalid target URL");
            }
            other => {
                tracing::debug!(stage, error = %other, "Request rejected");
            }
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.log();
        metrics::record_rejection(self.stage.as_str());
        self.error.into_response()
    }
}
