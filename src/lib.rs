//! AI Gateway Library
//!
//! A rate-limiting HTTP gateway that sits between a web frontend and two
//! external AI services: a chat-completion API and an image-generation API.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod quota;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
