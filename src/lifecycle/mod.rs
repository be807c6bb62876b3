//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! Rate windows are process memory only; a restart starts every client
//! with a fresh window.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
