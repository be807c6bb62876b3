//! Error taxonomy for the admission pipeline.
//!
//! Every variant maps to exactly one HTTP status. The `Display` text is what
//! the caller sees in the `{"error": ...}` body, so it never carries the
//! secret or transport details; those are logged instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors that terminate a proxied request.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Missing url parameter. Use /proxy?url=https://example.com")]
    MissingTarget,

    #[error("Invalid url parameter")]
    InvalidTarget { reason: String },

    #[error("Unauthorized - invalid proxy key")]
    Unauthorized,

    #[error("Forbidden - host not whitelisted")]
    HostNotWhitelisted { host: String },

    #[error("Too Many Requests")]
    RateLimited,

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body")]
    BodyRead(#[source] axum::Error),

    #[error("Upstream request failed")]
    Upstream {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build upstream client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Internal Server Error")]
    Internal(String),
}

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget
            | ProxyError::InvalidTarget { .. }
            | ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::HostNotWhitelisted { .. } => StatusCode::FORBIDDEN,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Upstream { .. }
            | ProxyError::ClientBuild(_)
            | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
