//! Chat-completion proxy.
//!
//! # Responsibilities
//! - Validate preconditions (credential configured, messages non-empty)
//!   before any network activity
//! - Send exactly one upstream call with the configured model, token
//!   ceiling and temperature, streaming disabled
//! - Translate upstream failures into the gateway error taxonomy
//! - Verify the success body carries at least one choice with a message

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ChatUpstreamConfig;
use crate::upstream::error::GatewayError;

/// One entry of the chat transcript sent by the frontend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Inbound chat request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

/// Client for the OpenAI-compatible completion upstream.
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatUpstreamConfig,
}

impl ChatClient {
    pub fn new(config: ChatUpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Forward a completion request and return the upstream payload
    /// unchanged, or a categorized failure.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<Value, GatewayError> {
        if self.config.api_key.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "chat API key is not set".to_string(),
            ));
        }
        if request.messages.is_empty() {
            return Err(GatewayError::InvalidInput(
                "messages must not be empty".to_string(),
            ));
        }

        let body = json!({
            "model": self.config.model,
            "messages": request.messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stream": false,
        });
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::UpstreamTimeout
                } else {
                    tracing::error!(error = %e, "Chat upstream unreachable");
                    GatewayError::Upstream { status: None }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %detail,
                "Chat upstream returned error status"
            );
            return Err(categorize_status(status.as_u16()));
        }

        let payload: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::UpstreamTimeout
            } else {
                tracing::warn!(error = %e, "Chat upstream body is not JSON");
                GatewayError::MalformedResponse
            }
        })?;

        if !has_completion(&payload) {
            tracing::warn!("Chat upstream returned success without a usable choice");
            return Err(GatewayError::MalformedResponse);
        }

        Ok(payload)
    }
}

/// Map a non-success upstream status to a failure category.
fn categorize_status(status: u16) -> GatewayError {
    match status {
        401 => GatewayError::AuthFailure { status },
        429 => GatewayError::UpstreamOverloaded { status },
        400 => GatewayError::InvalidInput("the AI service rejected the request".to_string()),
        other => GatewayError::Upstream {
            status: Some(other),
        },
    }
}

/// A success payload must contain at least one choice with a message.
fn has_completion(payload: &Value) -> bool {
    payload
        .get("choices")
        .and_then(Value::as_array)
        .map(|choices| {
            choices
                .iter()
                .any(|choice| choice.get("message").is_some_and(|m| !m.is_null()))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_categorization() {
        assert!(matches!(
            categorize_status(401),
            GatewayError::AuthFailure { status: 401 }
        ));
        assert!(matches!(
            categorize_status(429),
            GatewayError::UpstreamOverloaded { status: 429 }
        ));
        assert!(matches!(categorize_status(400), GatewayError::InvalidInput(_)));
        assert!(matches!(
            categorize_status(503),
            GatewayError::Upstream { status: Some(503) }
        ));
    }

    #[test]
    fn test_has_completion_accepts_choice_with_message() {
        let payload = json!({
            "choices": [{"message": {"role": "assistant", "content": "hi"}}]
        });
        assert!(has_completion(&payload));
    }

    #[test]
    fn test_has_completion_rejects_bad_shapes() {
        assert!(!has_completion(&json!({})));
        assert!(!has_completion(&json!({"choices": []})));
        assert!(!has_completion(&json!({"choices": [{"text": "hi"}]})));
        assert!(!has_completion(&json!({"choices": [{"message": null}]})));
        assert!(!has_completion(&json!({"choices": "not-an-array"})));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_call() {
        let client = ChatClient::new(ChatUpstreamConfig {
            api_key: String::new(),
            // Unroutable: reaching it would hang, proving no call is made.
            base_url: "http://192.0.2.1".to_string(),
            ..ChatUpstreamConfig::default()
        });
        let request = CompletionRequest {
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "hi".into(),
            }],
        };

        let err = client.complete(&request).await.unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[tokio::test]
    async fn test_empty_messages_fail_before_any_call() {
        let client = ChatClient::new(ChatUpstreamConfig {
            api_key: "test-key".to_string(),
            base_url: "http://192.0.2.1".to_string(),
            ..ChatUpstreamConfig::default()
        });

        let err = client
            .complete(&CompletionRequest { messages: vec![] })
            .await
            .unwrap_err();
        assert_eq!(err.category(), "invalid_input");
    }
}
