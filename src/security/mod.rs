//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (x-proxy-key against the configured secret)
//!     → whitelist.rs (target hostname membership)
//!     → rate_limit.rs (per-client fixed window)
//!     → headers.rs (strip hop-by-hop and the secret)
//!     → Forward upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop and policy headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Authentication runs before anything that leaks state or spends budget

pub mod auth;
pub mod headers;
pub mod rate_limit;
pub mod whitelist;

pub use auth::{Authenticator, PROXY_KEY_HEADER};
pub use headers::HeaderFilter;
pub use rate_limit::{RateDecision, RateLimiter};
pub use whitelist::Whitelist;
