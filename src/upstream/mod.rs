//! Upstream proxy subsystem.
//!
//! # Data Flow
//! ```text
//! admitted request
//!     → chat.rs  (validate, single POST to the completion API,
//!                 translate status codes, verify response shape)
//!     → image.rs (sanitize prompt, build a deterministic image URL
//!                 that is never fetched server-side)
//!     → error.rs (taxonomy of user-facing failure categories)
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream call per chat request; retries are a caller
//!   concern
//! - Raw upstream error bodies are logged, never relayed to clients
//! - A 2xx with no usable choice is still a failure
//!   (`malformed_upstream_response`)

pub mod chat;
pub mod error;
pub mod image;

pub use chat::{ChatClient, ChatMessage, CompletionRequest};
pub use error::GatewayError;
pub use image::{ImageComposer, ImageLink, ImageRequest};
