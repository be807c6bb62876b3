//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limit > 0, addresses parse)
//! - Check header names and values the proxy will emit
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("auth.secret must be set (PROXY_API_KEY)")]
    MissingSecret,

    #[error("rate_limit.max_requests_per_minute must be greater than zero")]
    ZeroRateLimit,

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("{field} is not a socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("response.allowed_origin is not a valid header value: {0}")]
    InvalidOrigin(String),

    #[error("response.strip_headers contains an invalid header name: {0}")]
    InvalidHeaderName(String),
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.secret.trim().is_empty() {
        errors.push(ValidationError::MissingSecret);
    }

    if config.rate_limit.max_requests_per_minute == 0 {
        errors.push(ValidationError::ZeroRateLimit);
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "upstream.timeout_secs",
        });
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "upstream.connect_timeout_secs",
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Some(origin) = &config.response.allowed_origin {
        if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    for name in &config.response.strip_headers {
        if HeaderName::from_bytes(name.trim().as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
