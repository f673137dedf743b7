//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum setup, middleware, handlers)
//!     → quota gate (admit / reject with 429 + reset time)
//!     → upstream proxy (chat call or image URL composition)
//!     → response.rs (rejection and health payload shapes)
//! ```

pub mod response;
pub mod server;

pub use server::HttpServer;
