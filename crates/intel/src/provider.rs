//! Inference provider trait and common types.
//!
//! Defines the interface the classification gateway uses to talk to a
//! hosted completion endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{IntelError, IntelResult};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
    /// Assistant message (model response)
    Assistant,
}

/// A message in a conversation with a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: ChatRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Options for text generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Whether to request JSON output
    pub json_mode: bool,
}

/// Response from a completion call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text content
    pub text: String,
    /// Model that generated the response
    pub model: String,
}

/// Trait for inference providers.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// Check if the provider has the configuration it needs.
    fn is_configured(&self) -> bool;

    /// Generate a completion from messages.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> IntelResult<Completion>;
}

/// Parse a structured object out of model output.
///
/// Models sometimes wrap JSON in markdown code fences; those are stripped
/// before parsing. A standalone function rather than a trait method
/// because generic methods are not dyn-compatible.
pub fn parse_model_json<T: for<'de> Deserialize<'de>>(text: &str) -> IntelResult<T> {
    let text = text.trim();

    let json_text = if text.starts_with("```json") {
        text.strip_prefix("```json")
            .and_then(|s| s.strip_suffix("```"))
            .unwrap_or(text)
            .trim()
    } else if text.starts_with("```") {
        text.strip_prefix("```")
            .and_then(|s| s.strip_suffix("```"))
            .unwrap_or(text)
            .trim()
    } else {
        text
    };

    serde_json::from_str(json_text).map_err(|e| IntelError::Malformed {
        reason: format!("model output is not valid JSON: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        score: f32,
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("ctx").role, ChatRole::System);
        assert_eq!(ChatMessage::user("hi").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("ok").role, ChatRole::Assistant);
    }

    #[test]
    fn test_parse_plain_json() {
        let parsed: Sample = parse_model_json(r#"{"score": 0.5}"#).unwrap();
        assert_eq!(parsed, Sample { score: 0.5 });
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let fenced = "```json\n{\"score\": 0.9}\n```";
        let parsed: Sample = parse_model_json(fenced).unwrap();
        assert_eq!(parsed, Sample { score: 0.9 });

        let bare_fence = "```\n{\"score\": 0.1}\n```";
        let parsed: Sample = parse_model_json(bare_fence).unwrap();
        assert_eq!(parsed, Sample { score: 0.1 });
    }

    #[test]
    fn test_parse_rejects_garbage_as_malformed() {
        let err = parse_model_json::<Sample>("not json at all").unwrap_err();
        assert!(matches!(err, IntelError::Malformed { .. }));
    }
}
