//! LlmProvider trait definition.
//!
//! The provider is credential-agnostic: the key for each call is chosen by the
//! `KeyPool` and passed in, so one provider instance serves every key.

use secrecy::SecretString;

use talentscout_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in talentscout-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model used when the request leaves `model` empty.
    fn model(&self) -> &str;

    /// Send a completion request authenticated with `api_key`.
    fn complete(
        &self,
        api_key: &SecretString,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
