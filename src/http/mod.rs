//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, /proxy and /api/proxy)
//!     → request.rs (request ID)
//!     → pipeline (admission, forwarding)
//!     → response.rs (rate and CORS headers, panic fallback)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
