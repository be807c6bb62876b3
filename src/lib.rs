//! Keyed forward proxy library.
//!
//! A small authenticated forward proxy: callers present a shared secret,
//! name a target URL, and get the upstream response back with hop-by-hop
//! and configured sensitive headers removed. Only whitelisted hosts are
//! reachable and each client is held to a per-minute request budget.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::AdmissionPipeline;
