//! HTTP-backed inference provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{IntelError, IntelResult};
use crate::provider::{ChatMessage, ChatRole, Completion, GenerateOptions, InferenceProvider};

/// Environment variable for the inference endpoint URL.
pub const ENV_INTEL_API_URL: &str = "INTEL_API_URL";
/// Environment variable for the inference API key.
pub const ENV_INTEL_API_KEY: &str = "INTEL_API_KEY";

/// Default model when the caller does not override it.
pub const DEFAULT_MODEL: &str = "threat-classifier-large";

const DEFAULT_MAX_TOKENS: u32 = 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire request for the completion endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

/// Wire response content block.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: String,
}

/// Wire response from the completion endpoint.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: Vec<ContentBlock>,
    model: String,
}

/// Structured error payload from the endpoint, when it sends one.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: RemoteErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorDetail {
    message: String,
}

/// Inference provider backed by a hosted completion endpoint.
///
/// The credential is sent verbatim in the `x-api-key` header, matching
/// the endpoint's observed contract (no scheme prefix).
pub struct RemoteProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteProvider {
    /// Create a provider from environment variables.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(ENV_INTEL_API_URL).ok()?;
        let api_key = std::env::var(ENV_INTEL_API_KEY).ok();
        Some(Self::new(base_url, api_key))
    }

    /// Create a provider for a specific endpoint.
    #[must_use]
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Pull the system prompt out of the message list; the endpoint takes
    /// it as a separate field.
    fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<WireMessage>) {
        let mut system = None;
        let mut wire = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role {
                ChatRole::System => system = Some(message.content.clone()),
                ChatRole::User => wire.push(WireMessage {
                    role: "user".to_string(),
                    content: message.content.clone(),
                }),
                ChatRole::Assistant => wire.push(WireMessage {
                    role: "assistant".to_string(),
                    content: message.content.clone(),
                }),
            }
        }

        (system, wire)
    }
}

#[async_trait]
impl InferenceProvider for RemoteProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> IntelResult<Completion> {
        if !self.is_configured() {
            return Err(IntelError::NotConfigured(format!(
                "{ENV_INTEL_API_URL} is empty"
            )));
        }

        let (system, wire_messages) = Self::split_system(messages);

        let request = CompletionRequest {
            model: model.to_string(),
            messages: wire_messages,
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature: options.temperature,
        };

        let mut builder = self
            .client
            .post(&self.base_url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<RemoteErrorBody>(&body)
                .map_or_else(|_| body.clone(), |e| e.error.message);
            return Err(IntelError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| IntelError::Malformed {
                reason: format!("completion response did not match wire shape: {e}"),
            })?;

        let text = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(IntelError::Malformed {
                reason: "completion response contained no text blocks".to_string(),
            });
        }

        Ok(Completion {
            text,
            model: parsed.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "content": [{"type": "text", "text": text}],
            "model": "threat-classifier-large",
        })
    }

    #[tokio::test]
    async fn test_complete_sends_raw_api_key_and_system() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "secret-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "threat-classifier-large",
                "system": "be terse",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("done")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(server.uri(), Some("secret-key".to_string()));
        let messages = vec![ChatMessage::system("be terse"), ChatMessage::user("hello")];
        let completion = provider
            .complete(DEFAULT_MODEL, &messages, &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(completion.text, "done");
    }

    #[tokio::test]
    async fn test_complete_maps_remote_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "rate limited"},
            })))
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(server.uri(), None);
        let err = provider
            .complete(DEFAULT_MODEL, &[ChatMessage::user("x")], &GenerateOptions::default())
            .await
            .unwrap_err();
        match err {
            IntelError::Remote { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("expected remote rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_maps_transport_failure() {
        // Nothing listens on this port.
        let provider = RemoteProvider::new("http://127.0.0.1:9".to_string(), None);
        let err = provider
            .complete(DEFAULT_MODEL, &[ChatMessage::user("x")], &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_complete_flags_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(server.uri(), None);
        let err = provider
            .complete(DEFAULT_MODEL, &[ChatMessage::user("x")], &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IntelError::Malformed { .. }));
    }
}
