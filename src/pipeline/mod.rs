//! Request admission pipeline.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → Authenticate     (401 on failure)
//!     → ParseTarget      (400)
//!     → CheckWhitelist   (403)
//!     → CheckRate        (429; rate headers attached from here on)
//!     → FilterInbound    (400/413 on unreadable or oversize body)
//!     → Forward          (500 on transport failure)
//!     → FilterOutbound
//!     → Respond
//! ```
//!
//! # Design Decisions
//! - The order is fixed in one function; no stage can be skipped
//! - An unauthenticated caller spends no rate budget and learns nothing
//!   about the whitelist
//! - The first rejection ends the request

pub mod admission;
pub mod inbound;
pub mod stage;

pub use admission::AdmissionPipeline;
pub use inbound::InboundRequest;
pub use stage::{Rejection, Stage};
