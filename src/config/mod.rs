//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (overlay PROXY_API_KEY, WHITELIST_HOSTS, MAX_PER_MIN, ALLOW_ORIGIN)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → consumed once at startup to build the pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the whitelist never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, RateLimitConfig,
    ResponseConfig, UpstreamConfig, WhitelistConfig,
};
