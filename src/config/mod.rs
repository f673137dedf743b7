//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets (the chat API key) can come from the environment instead
//!   of the config file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::ChatUpstreamConfig;
pub use schema::GatewayConfig;
pub use schema::IdentityConfig;
pub use schema::ImageUpstreamConfig;
pub use schema::ListenerConfig;
pub use schema::RateLimitConfig;
