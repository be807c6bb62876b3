//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyRequest (sanitized, whitelisted, rate-admitted)
//!     → forwarder.rs (reqwest call, redirects followed on-whitelist, timeout)
//!     → ForwardOutcome (status, raw headers, buffered body)
//! ```
//!
//! # Design Decisions
//! - One forwarder implementation; tests substitute the `Forwarder` trait
//! - Transport failures become `ProxyError::Upstream`, never partial bodies
//! - No retries: the caller retries out-of-band

pub mod forwarder;

pub use forwarder::{carries_body, ForwardOutcome, Forwarder, HttpForwarder, ProxyRequest};
