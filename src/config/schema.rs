//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the AI gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Chat-completion upstream settings.
    pub chat: ChatUpstreamConfig,

    /// Image-generation upstream settings.
    pub image: ImageUpstreamConfig,

    /// Per-client rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Client identity derivation settings.
    pub identity: IdentityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Chat-completion upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatUpstreamConfig {
    /// Base URL of the OpenAI-compatible API (no trailing path).
    pub base_url: String,

    /// API key sent as a Bearer token. May be left empty in the file and
    /// supplied via the `GATEWAY_CHAT_API_KEY` environment variable.
    pub api_key: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Token ceiling per completion.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatUpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

/// Image-generation upstream configuration.
///
/// The gateway never fetches images server-side; it only builds a
/// deterministic URL the frontend fetches directly.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageUpstreamConfig {
    /// Base URL the prompt is appended to as a path segment.
    pub base_url: String,

    /// Fixed image width in pixels.
    pub width: u32,

    /// Fixed image height in pixels.
    pub height: u32,

    /// Fixed quality parameter passed through to the upstream.
    pub quality: String,
}

impl Default for ImageUpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://image.pollinations.ai/prompt".to_string(),
            width: 1024,
            height: 1024,
            quality: "standard".to_string(),
        }
    }
}

/// Per-client rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per client per window.
    pub max_requests: u32,

    /// Window duration in seconds.
    pub window_secs: u64,

    /// Enable the background sweep of stale quota records.
    pub sweep_enabled: bool,

    /// Sweep interval in seconds.
    pub sweep_interval_secs: u64,

    /// How long after window expiry an idle record is kept before the
    /// sweep removes it.
    pub idle_grace_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 50,
            window_secs: 3600,
            sweep_enabled: true,
            sweep_interval_secs: 300,
            idle_grace_secs: 600,
        }
    }
}

/// Client identity derivation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Peer addresses whose `x-forwarded-for` header is trusted.
    /// Forwarded headers from any other peer are ignored.
    pub trusted_proxies: Vec<String>,
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for an inbound request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
