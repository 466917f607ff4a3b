//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends requests to `/v1beta/models/{model}:generateContent`. The provider
//! holds no credential of its own: every call is authenticated with the key
//! the `KeyPool` selected, passed in the `x-goog-api-key` header.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};

use talentscout_core::llm::provider::LlmProvider;
use talentscout_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::types::{
    GeminiContent, GeminiErrorEnvelope, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig,
};

/// Default endpoint for the Gemini API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Outer bound on a single HTTP exchange. The resilient client applies its
/// own, usually shorter, per-call timeout on top of this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Google Gemini LLM provider.
///
/// One instance serves every key in the pool; the key for a call is an
/// argument to [`LlmProvider::complete`] and is only exposed when building
/// the request header.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a provider for `model` against the public endpoint.
    pub fn new(model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the `generateContent` URL for a model.
    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    /// Convert a generic [`CompletionRequest`] into a [`GeminiRequest`].
    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(m.role.to_string()),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: request.system.as_ref().map(|system| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system.clone(),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

// GeminiProvider does not derive Debug; keys never live on it, but the
// request path handles them and stays out of Debug output entirely.

/// Map a non-success HTTP response onto an [`LlmError`].
///
/// `retry_after_ms` is the parsed `Retry-After` header, if any.
pub fn map_error_status(status: StatusCode, retry_after_ms: Option<u64>, body: &str) -> LlmError {
    let envelope = serde_json::from_str::<GeminiErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let resource_exhausted = envelope
        .as_ref()
        .is_some_and(|e| e.error.status == "RESOURCE_EXHAUSTED")
        || body.contains("RESOURCE_EXHAUSTED");

    if status == StatusCode::TOO_MANY_REQUESTS || resource_exhausted {
        let retry_after_ms =
            retry_after_ms.or_else(|| envelope.as_ref().and_then(|e| e.error.retry_delay_ms()));
        return LlmError::RateLimited { retry_after_ms };
    }

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed(message),
        400 if body.contains("API_KEY_INVALID") || body.contains("API key not valid") => {
            LlmError::AuthenticationFailed(message)
        }
        400 | 404 => LlmError::InvalidRequest(message),
        500 | 502 | 503 | 504 => LlmError::Overloaded(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout {
            after_ms: HTTP_TIMEOUT.as_millis() as u64,
        }
    } else {
        LlmError::Network(format!("HTTP request failed: {e}"))
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        api_key: &SecretString,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        let body = Self::to_gemini_request(request);

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status, retry_after_ms, &error_body));
        }

        let gemini_resp: GeminiResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let candidate = gemini_resp.candidates.first();
        let content = candidate
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        let finish_reason = candidate.and_then(|c| c.finish_reason.clone());

        // A reply with no text (safety block, empty candidate list) is worth
        // another attempt rather than an empty extraction.
        if content.trim().is_empty() {
            return Err(LlmError::Deserialization(format!(
                "response contained no text (finish reason: {})",
                finish_reason.as_deref().unwrap_or("none")
            )));
        }

        let usage = gemini_resp.usage_metadata.unwrap_or_default();
        Ok(CompletionResponse {
            content,
            model: gemini_resp
                .model_version
                .unwrap_or_else(|| model.to_string()),
            finish_reason,
            usage: Usage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
            },
        })
    }
}
