//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Caller authentication.
    pub auth: AuthConfig,

    /// Target hosts the proxy may reach.
    pub whitelist: WhitelistConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Response header policy.
    pub response: ResponseConfig,

    /// Outbound client behaviour.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Caller authentication.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret expected in the `x-proxy-key` header.
    pub secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Host whitelist.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WhitelistConfig {
    /// Exact hostnames. Entries are trimmed; empty entries are ignored.
    pub hosts: Vec<String>,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per client in each 60 second window.
    pub max_requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: 60,
        }
    }
}

/// What the proxy does to upstream response headers beyond hop-by-hop removal.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Value for `Access-Control-Allow-Origin`. No CORS headers when unset.
    pub allowed_origin: Option<String>,

    /// Upstream headers removed because they interfere with consuming the
    /// response under the proxy's origin.
    pub strip_headers: Vec<String>,

    /// Relay upstream `Set-Cookie` headers to the caller.
    pub relay_set_cookie: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            allowed_origin: None,
            strip_headers: vec!["content-security-policy".to_string()],
            relay_set_cookie: false,
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total time allowed for one upstream exchange, redirects included.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Redirect hops followed before giving up.
    pub max_redirects: usize,

    /// Largest inbound body forwarded upstream.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [auth]
            secret = "k"

            [whitelist]
            hosts = ["example.com"]
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.secret, "k");
        assert_eq!(config.whitelist.hosts, vec!["example.com"]);
        assert_eq!(config.rate_limit.max_requests_per_minute, 60);
        assert_eq!(config.response.strip_headers, vec!["content-security-policy"]);
        assert!(!config.response.relay_set_cookie);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = AuthConfig {
            secret: "hunter2".into(),
        };
        let printed = format!("{:?}", auth);
        assert!(!printed.contains("hunter2"));
    }
}
