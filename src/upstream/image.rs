//! Image URL composition.
//!
//! # Responsibilities
//! - Sanitize prompts down to a whitelist (word characters, whitespace,
//!   comma, hyphen)
//! - Build a deterministic upstream URL with fixed dimension and quality
//!   parameters
//!
//! # Design Decisions
//! - The gateway never fetches the image; the frontend follows the URL
//!   directly, so image bytes never cross this process

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ImageUpstreamConfig;
use crate::upstream::error::GatewayError;

/// Inbound image request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
}

/// What the frontend gets back: where to fetch and what was actually asked.
#[derive(Debug, Clone, Serialize)]
pub struct ImageLink {
    pub image_url: String,
    pub prompt: String,
}

/// Builds image URLs against the configured upstream.
pub struct ImageComposer {
    config: ImageUpstreamConfig,
}

impl ImageComposer {
    pub fn new(config: ImageUpstreamConfig) -> Self {
        Self { config }
    }

    /// Sanitize the prompt and build the upstream URL.
    ///
    /// The only failure here is an empty prompt (before or after
    /// sanitization); no upstream interaction occurs.
    pub fn compose(&self, request: &ImageRequest) -> Result<ImageLink, GatewayError> {
        let prompt = sanitize_prompt(&request.prompt);
        if prompt.is_empty() {
            return Err(GatewayError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            GatewayError::Configuration(format!("invalid image base URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::Configuration("image base URL cannot carry a path".to_string())
            })?
            .push(&prompt);
        url.query_pairs_mut()
            .append_pair("width", &self.config.width.to_string())
            .append_pair("height", &self.config.height.to_string())
            .append_pair("quality", &self.config.quality);

        Ok(ImageLink {
            image_url: url.to_string(),
            prompt,
        })
    }
}

/// Strip everything outside [word characters, whitespace, comma, hyphen],
/// then collapse whitespace runs and trim.
pub fn sanitize_prompt(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace() || *c == ',' || *c == '-'
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
