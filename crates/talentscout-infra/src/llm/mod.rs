//! LLM provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait
//! defined in `talentscout-core` for Google Gemini, and a factory
//! ([`create_provider`]) that builds it from [`ProviderSettings`].
//!
//! [`LlmProvider`]: talentscout_core::llm::provider::LlmProvider

pub mod gemini;

use talentscout_core::llm::box_provider::BoxLlmProvider;
use talentscout_types::config::ProviderSettings;
use talentscout_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] from [`ProviderSettings`].
///
/// Credentials are not part of the provider; they are supplied per call by
/// the key pool.
pub fn create_provider(settings: &ProviderSettings) -> Result<BoxLlmProvider, LlmError> {
    if settings.model.trim().is_empty() {
        return Err(LlmError::InvalidRequest("no model configured".to_string()));
    }

    let mut provider = GeminiProvider::new(settings.model.trim())?;
    if let Some(base_url) = settings.base_url.as_deref() {
        provider = provider.with_base_url(base_url);
    }

    tracing::debug!(
        provider = "gemini",
        model = %settings.model,
        base_url = settings.base_url.as_deref().unwrap_or(gemini::client::DEFAULT_BASE_URL),
        "Created LLM provider"
    );
    Ok(BoxLlmProvider::new(provider))
}
