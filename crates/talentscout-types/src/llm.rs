//! LLM request/response types for TalentScout.
//!
//! These types model the data shapes for a single text-generation call:
//! the request, the response, usage tracking, and provider error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Model => write!(f, "model"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "model" | "assistant" => Ok(MessageRole::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to an LLM provider for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model override; empty means the provider's configured model.
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from an LLM provider for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    pub usage: Usage,
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// How a failed call should be treated by the failover logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Per-key quota or rate limit. The key cools down; siblings may serve.
    RateLimit,
    /// Timeout, network failure, overloaded backend. Worth another attempt.
    Transient,
    /// The credential itself was refused. The key is retired.
    KeyRejected,
    /// The request is wrong no matter which key sends it.
    Permanent,
}

/// Errors from LLM provider operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Classify this error for the key failover logic.
    pub fn class(&self) -> ErrorClass {
        match self {
            LlmError::RateLimited { .. } => ErrorClass::RateLimit,
            LlmError::Provider { .. }
            | LlmError::Deserialization(_)
            | LlmError::Overloaded(_)
            | LlmError::Network(_)
            | LlmError::Timeout { .. } => ErrorClass::Transient,
            LlmError::AuthenticationFailed(_) => ErrorClass::KeyRejected,
            LlmError::InvalidRequest(_) => ErrorClass::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Model] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_assistant_alias_parses_as_model() {
        assert_eq!("assistant".parse::<MessageRole>().unwrap(), MessageRole::Model);
    }

    #[test]
    fn test_usage_default() {
        let usage = Usage::default();
        assert_eq!(usage.input_tokens, 0);
        assert_eq!(usage.output_tokens, 0);
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            LlmError::RateLimited {
                retry_after_ms: None
            }
            .class(),
            ErrorClass::RateLimit
        );
        assert_eq!(
            LlmError::Timeout { after_ms: 100 }.class(),
            ErrorClass::Transient
        );
        assert_eq!(
            LlmError::Network("reset".to_string()).class(),
            ErrorClass::Transient
        );
        assert_eq!(
            LlmError::Overloaded("busy".to_string()).class(),
            ErrorClass::Transient
        );
        assert_eq!(
            LlmError::AuthenticationFailed("revoked".to_string()).class(),
            ErrorClass::KeyRejected
        );
        assert_eq!(
            LlmError::InvalidRequest("bad".to_string()).class(),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Timeout { after_ms: 30_000 };
        assert!(err.to_string().contains("30000"));
    }
}
