//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable carrying the shared secret.
pub const ENV_SECRET: &str = "PROXY_API_KEY";
/// Comma-separated target hostnames.
pub const ENV_WHITELIST: &str = "WHITELIST_HOSTS";
/// Per-client requests per minute.
pub const ENV_MAX_PER_MIN: &str = "MAX_PER_MIN";
/// CORS allow-origin value.
pub const ENV_ALLOW_ORIGIN: &str = "ALLOW_ORIGIN";

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, overlay the process
/// environment, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts the environment so tests don't touch process state.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup(ENV_SECRET) {
        config.auth.secret = secret;
    }

    if let Some(raw) = lookup(ENV_WHITELIST) {
        config.whitelist.hosts = split_hosts(&raw);
    }

    if let Some(raw) = lookup(ENV_MAX_PER_MIN) {
        config.rate_limit.max_requests_per_minute =
            raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Env {
                var: ENV_MAX_PER_MIN,
                reason: e.to_string(),
            })?;
    }

    if let Some(origin) = lookup(ENV_ALLOW_ORIGIN) {
        let origin = origin.trim();
        config.response.allowed_origin = (!origin.is_empty()).then(|| origin.to_string());
    }

    Ok(())
}

/// Split a comma-separated host list, trimming entries and dropping empties.
pub fn split_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
