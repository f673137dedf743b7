//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, dimensions > 0)
//! - Check addresses and URLs actually parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug)]
pub enum ValidationError {
    /// rate_limit.max_requests must be at least 1.
    ZeroRequestLimit,
    /// rate_limit.window_secs must be at least 1.
    ZeroWindow,
    /// A base URL failed to parse.
    InvalidUrl { field: &'static str, reason: String },
    /// Image dimensions must be non-zero.
    ZeroImageDimension,
    /// A trusted proxy entry is not a valid IP address.
    InvalidTrustedProxy(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::ZeroRequestLimit => {
                write!(f, "rate_limit.max_requests must be greater than zero")
            }
            ValidationError::ZeroWindow => {
                write!(f, "rate_limit.window_secs must be greater than zero")
            }
            ValidationError::InvalidUrl { field, reason } => {
                write!(f, "{} is not a valid URL: {}", field, reason)
            }
            ValidationError::ZeroImageDimension => {
                write!(f, "image.width and image.height must be greater than zero")
            }
            ValidationError::InvalidTrustedProxy(entry) => {
                write!(f, "identity.trusted_proxies entry '{}' is not an IP address", entry)
            }
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::ZeroRequestLimit);
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }

    if let Err(e) = Url::parse(&config.chat.base_url) {
        errors.push(ValidationError::InvalidUrl {
            field: "chat.base_url",
            reason: e.to_string(),
        });
    }
    if let Err(e) = Url::parse(&config.image.base_url) {
        errors.push(ValidationError::InvalidUrl {
            field: "image.base_url",
            reason: e.to_string(),
        });
    }

    if config.image.width == 0 || config.image.height == 0 {
        errors.push(ValidationError::ZeroImageDimension);
    }

    for entry in &config.identity.trusted_proxies {
        if entry.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::InvalidTrustedProxy(entry.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
