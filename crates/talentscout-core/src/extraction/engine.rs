//! Turn-level profile extraction.
//!
//! `ExtractionEngine` asks the model for a JSON object over the profile
//! fields (temperature from config, 0 by default), recovers the object from
//! whatever the model wrapped it in, validates each field on its own, and
//! then lets the pattern fallback fill whatever the model left empty.
//!
//! Field-level failures never fail the turn: a malformed field is discarded
//! with a warning and becomes a candidate for the fallback.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use talentscout_types::config::ExtractionSettings;
use talentscout_types::error::GenerationError;
use talentscout_types::profile::{ExtractionResult, ExtractionSource, ProfileField};

use crate::llm::resilient::{GenerationRequest, ResilientClient};

use super::fallback;
use super::json::parse_object;
use super::prompt::{EXTRACTION_SYSTEM_PROMPT, build_extraction_prompt};
use super::validate::decode_field;

/// Confidence for a field the model returned without an explicit confidence.
pub const LLM_CONFIDENCE: f32 = 0.9;

/// Decode a model reply into an extraction result tagged `Llm`.
///
/// Returns an empty result (with a warning) when no JSON object can be
/// recovered. Unknown keys are ignored.
pub fn parse_model_output(raw: &str) -> ExtractionResult {
    let mut result = ExtractionResult::new();

    let object = match parse_object(raw) {
        Ok(object) => object,
        Err(e) => {
            let raw = raw.trim();
            let preview: String = raw.chars().take(200).collect();
            tracing::warn!(
                error = %e,
                content_preview = %preview,
                "Failed to parse extraction JSON; falling back to pattern matching"
            );
            return result;
        }
    };

    for (key, raw_value) in &object {
        let Ok(field) = key.parse::<ProfileField>() else {
            tracing::debug!(key = %key, "Ignoring unknown extraction key");
            continue;
        };

        // Corrections arrive as {"value": ..., "confidence": ...}.
        let (raw_value, confidence) = match raw_value {
            Value::Object(wrapped) if wrapped.contains_key("value") => {
                let confidence = wrapped
                    .get("confidence")
                    .and_then(Value::as_f64)
                    .map(|c| c as f32)
                    .unwrap_or(LLM_CONFIDENCE);
                (&wrapped["value"], confidence)
            }
            other => (other, LLM_CONFIDENCE),
        };

        match decode_field(field, raw_value) {
            Ok(Some(value)) => {
                result.insert(field, value, confidence, ExtractionSource::Llm);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(field = %field, error = %e, "Discarding malformed extracted field");
            }
        }
    }

    result
}

/// Extracts profile fields from one candidate utterance.
pub struct ExtractionEngine {
    client: Arc<ResilientClient>,
    settings: ExtractionSettings,
}

impl ExtractionEngine {
    pub fn new(client: Arc<ResilientClient>, settings: ExtractionSettings) -> Self {
        Self { client, settings }
    }

    /// Extract whatever the utterance states. Never fails.
    ///
    /// If the model cannot be reached at all, the result comes from the
    /// pattern fallback alone.
    pub async fn extract(&self, utterance: &str, known: &BTreeSet<ProfileField>) -> ExtractionResult {
        match self.try_extract(utterance, known).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Extraction call failed; using pattern fallback only");
                Self::fallback_only(utterance, known)
            }
        }
    }

    /// Like [`Self::extract`], but surfaces generation failures so a caller
    /// can refuse to act on a turn the model never saw.
    #[tracing::instrument(
        name = "extract_profile",
        skip(self, utterance, known),
        fields(utterance_len = utterance.len(), known_fields = known.len())
    )]
    pub async fn try_extract(
        &self,
        utterance: &str,
        known: &BTreeSet<ProfileField>,
    ) -> Result<ExtractionResult, GenerationError> {
        if utterance.trim().is_empty() {
            return Ok(ExtractionResult::new());
        }

        let request = GenerationRequest {
            prompt: build_extraction_prompt(utterance, known),
            system: Some(EXTRACTION_SYSTEM_PROMPT.to_string()),
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            cacheable: false,
        };
        let response = self
            .client
            .generate_request(&request, self.settings.max_attempts)
            .await?;

        let mut result = parse_model_output(&response.text);
        fallback::fill_missing(utterance, &mut result, known);

        tracing::debug!(
            key_id = %response.key_id,
            llm_fields = ?result.fields_from(ExtractionSource::Llm),
            fallback_fields = ?result.fields_from(ExtractionSource::RegexFallback),
            "Extraction complete"
        );
        Ok(result)
    }

    /// Pattern-only extraction, without any model call.
    pub fn fallback_only(utterance: &str, known: &BTreeSet<ProfileField>) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        fallback::fill_missing(utterance, &mut result, known);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{ScriptedProvider, test_client, test_pool};
    use talentscout_types::llm::LlmError;
    use talentscout_types::profile::FieldValue;

    fn engine(provider: ScriptedProvider) -> ExtractionEngine {
        ExtractionEngine::new(
            Arc::new(test_client(test_pool(1), provider)),
            ExtractionSettings::default(),
        )
    }

    fn none() -> BTreeSet<ProfileField> {
        BTreeSet::new()
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_extraction_tags_source() {
        let provider = ScriptedProvider::replying(
            r#"{"full_name": "Asha", "email": null, "years_experience": 4, "tech_stack": ["Go", "Postgres"]}"#,
        );
        let result = engine(provider)
            .extract("I'm Asha, 4 years experience with Go and Postgres", &none())
            .await;

        assert_eq!(result.len(), 3);
        for field in [
            ProfileField::FullName,
            ProfileField::YearsExperience,
            ProfileField::TechStack,
        ] {
            let value = result.get(field).unwrap();
            assert_eq!(value.source, ExtractionSource::Llm);
            assert_eq!(value.confidence, LLM_CONFIDENCE);
        }
        assert_eq!(
            result.get(ProfileField::TechStack).unwrap().value,
            FieldValue::set_from(["Go", "Postgres"])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fenced_output_with_chatter_parses() {
        let provider = ScriptedProvider::replying(
            "Here you go:\n```json\n{\"location\": \"Pune\"}\n```",
        );
        let result = engine(provider).extract("I live in Pune", &none()).await;
        assert_eq!(
            result.get(ProfileField::Location).unwrap().source,
            ExtractionSource::Llm
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_output_falls_back_to_patterns() {
        let provider = ScriptedProvider::replying("tech_stack: Rust (sorry, no JSON today");
        let result = engine(provider).extract("also know Rust", &none()).await;

        let stack = result.get(ProfileField::TechStack).unwrap();
        assert_eq!(stack.source, ExtractionSource::RegexFallback);
        assert_eq!(stack.value, FieldValue::set_from(["Rust"]));
        assert_eq!(result.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_field_filled_by_fallback_only() {
        let provider = ScriptedProvider::replying(
            r#"{"email": "asha at example dot com", "tech_stack": ["Go"]}"#,
        );
        let result = engine(provider)
            .extract("mail asha@example.com, I use Go", &none())
            .await;

        let email = result.get(ProfileField::Email).unwrap();
        assert_eq!(email.source, ExtractionSource::RegexFallback);
        assert_eq!(email.value, FieldValue::Text("asha@example.com".to_string()));
        assert_eq!(
            result.get(ProfileField::TechStack).unwrap().source,
            ExtractionSource::Llm
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_never_overrides_llm_value() {
        let provider = ScriptedProvider::replying(r#"{"tech_stack": ["Go"]}"#);
        let result = engine(provider).extract("Go and Rust", &none()).await;

        let stack = result.get(ProfileField::TechStack).unwrap();
        assert_eq!(stack.source, ExtractionSource::Llm);
        assert_eq!(stack.value, FieldValue::set_from(["Go"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unstructured_text_yields_empty_result() {
        let provider = ScriptedProvider::replying(
            r#"{"full_name": null, "email": null, "phone": null, "years_experience": null, "desired_positions": null, "location": null, "tech_stack": null}"#,
        );
        let result = engine(provider)
            .extract("hmm, let me think about that for a second", &none())
            .await;
        assert!(result.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_failure_degrades_to_fallback() {
        let provider = ScriptedProvider::failing(LlmError::RateLimited {
            retry_after_ms: None,
        });
        let engine = engine(provider);

        let result = engine.extract("reach me at asha@example.com", &none()).await;
        assert_eq!(
            result.get(ProfileField::Email).unwrap().source,
            ExtractionSource::RegexFallback
        );

        let err = engine
            .try_extract("reach me at asha@example.com", &none())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::PoolExhausted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_is_deterministic_and_scoped() {
        let provider = ScriptedProvider::replying("{}");
        let known: BTreeSet<ProfileField> = [ProfileField::FullName].into();
        engine(provider.clone()).extract("Pune", &known).await;

        let request = &provider.requests()[0];
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.system.as_deref(), Some(EXTRACTION_SYSTEM_PROMPT));
        assert!(request.messages[0].content.contains("full_name"));
        assert!(request.messages[0].content.contains("Pune"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extraction_never_served_from_response_cache() {
        let provider = ScriptedProvider::replying(r#"{"location": "Pune"}"#);
        let client = test_client(test_pool(1), provider.clone()).with_response_cache();
        let engine = ExtractionEngine::new(Arc::new(client), ExtractionSettings::default());

        engine.extract("I live in Pune", &none()).await;
        engine.extract("I live in Pune", &none()).await;
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_utterance_skips_model_call() {
        let provider = ScriptedProvider::replying("{}");
        let result = engine(provider.clone()).extract("   ", &none()).await;
        assert!(result.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bare_name_only_while_name_unknown() {
        let provider = ScriptedProvider::replying("{}");
        let engine = engine(provider);

        let result = engine.extract("asha rao", &none()).await;
        let name = result.get(ProfileField::FullName).unwrap();
        assert_eq!(name.value, FieldValue::Text("Asha Rao".to_string()));
        assert_eq!(name.source, ExtractionSource::RegexFallback);

        let known: BTreeSet<ProfileField> = [ProfileField::FullName].into();
        assert!(engine.extract("asha rao", &known).await.is_empty());
    }

    #[test]
    fn test_explicit_confidence_honored() {
        let result = parse_model_output(
            r#"{"email": {"value": "new@example.com", "confidence": 1.0}, "phone": "+1 555 010 9999"}"#,
        );
        assert_eq!(result.get(ProfileField::Email).unwrap().confidence, 1.0);
        assert_eq!(result.get(ProfileField::Phone).unwrap().confidence, LLM_CONFIDENCE);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let result = parse_model_output(r#"{"salary": "lots", "location": "Berlin"}"#);
        assert_eq!(result.len(), 1);
        assert!(result.contains(ProfileField::Location));
    }
}
