//! Resilient text generation over a rotating key pool.
//!
//! `ResilientClient::generate` turns a prompt into text, surviving rate limits,
//! rejected keys, and transient failures by failing over between the pool's
//! keys within a bounded attempt budget. Every call runs under a timeout; a
//! timed-out call is a transient failure like any other.
//!
//! A client built `with_response_cache` answers repeated cacheable requests
//! from memory. Only successful responses are stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use tokio::time::Instant;

use talentscout_types::config::{ProviderSettings, RetrySettings};
use talentscout_types::error::GenerationError;
use talentscout_types::key::KeyStatus;
use talentscout_types::llm::{CompletionRequest, CompletionResponse, LlmError, Message};

use super::box_provider::BoxLlmProvider;
use super::key_pool::{FailureReason, KeyPool};

/// Attempt budget and pacing for one logical generation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt budget callers use when they have no specific one.
    pub max_attempts: u32,
    /// Bound on a single model call.
    pub call_timeout: Duration,
    /// Delay before the second attempt; doubles per further attempt.
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            call_timeout: Duration::from_millis(settings.call_timeout_ms),
            initial_delay: Duration::from_millis(settings.retry_delay_ms),
            max_delay: Duration::from_millis(settings.max_retry_delay_ms),
        }
    }

    /// Delay to wait before `attempt` (1-based). Zero before the first.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let shift = (attempt - 2).min(31);
        self.initial_delay
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

/// A generation call with optional overrides of the client defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// May be answered from the response cache, if the client has one.
    pub cacheable: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn cached(mut self) -> Self {
        self.cacheable = true;
        self
    }
}

/// Cache identity of a request: prompt, system prompt and effective temperature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    prompt: String,
    system: Option<String>,
    temperature_bits: Option<u64>,
}

/// Successful generation plus the diagnostics of how it was obtained.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    /// Id of the key that served the call (never the secret).
    pub key_id: String,
    pub latency_ms: u64,
    pub attempts: u32,
}

/// Outcome of probing one key directly.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub key_id: String,
    pub result: Result<u64, LlmError>,
}

/// Text generation with key failover, retry, and per-call timeouts.
///
/// Cheap to share: the pool and provider are behind `Arc`s, and the client
/// holds no per-call state beyond the optional response cache.
pub struct ResilientClient {
    pool: Arc<KeyPool>,
    provider: Arc<BoxLlmProvider>,
    policy: RetryPolicy,
    default_temperature: Option<f64>,
    default_max_tokens: u32,
    cache: Option<Mutex<HashMap<CacheKey, GenerationResponse>>>,
}

impl ResilientClient {
    pub fn new(pool: Arc<KeyPool>, provider: Arc<BoxLlmProvider>, policy: RetryPolicy) -> Self {
        let defaults = ProviderSettings::default();
        Self {
            pool,
            provider,
            policy,
            default_temperature: Some(defaults.temperature),
            default_max_tokens: defaults.max_tokens,
            cache: None,
        }
    }

    /// Remember successful responses to cacheable requests for the life of
    /// the client.
    pub fn with_response_cache(mut self) -> Self {
        self.cache = Some(Mutex::new(HashMap::new()));
        self
    }

    /// Apply the configured sampling defaults.
    pub fn with_generation_defaults(mut self, settings: &ProviderSettings) -> Self {
        self.default_temperature = Some(settings.temperature);
        self.default_max_tokens = settings.max_tokens;
        self
    }

    pub fn pool(&self) -> &Arc<KeyPool> {
        &self.pool
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate text for `prompt` within `max_attempts` model calls.
    ///
    /// Served from the response cache when the client has one.
    pub async fn generate(&self, prompt: &str, max_attempts: u32) -> Result<String, GenerationError> {
        self.generate_request(&GenerationRequest::new(prompt).cached(), max_attempts)
            .await
            .map(|response| response.text)
    }

    /// Generate with full control over the request, returning diagnostics.
    ///
    /// - rate limit: the key cools down, the next attempt uses another key
    /// - rejected key: the key is retired, the next attempt uses another key
    /// - transient failure: the next attempt uses the next selected key
    /// - malformed request: aborts at once; no key is penalized
    ///
    /// `PoolExhausted` propagates as soon as no key is usable, without waiting
    /// out the retry delay. Once the budget is spent, the result is
    /// `PoolExhausted` if the pool has run dry, else `Unavailable` carrying
    /// the last error.
    ///
    /// A cache hit reports zero attempts and zero latency.
    pub async fn generate_request(
        &self,
        request: &GenerationRequest,
        max_attempts: u32,
    ) -> Result<GenerationResponse, GenerationError> {
        let completion = self.completion_request(request);
        let cache_key = request.cacheable.then(|| CacheKey {
            prompt: request.prompt.clone(),
            system: completion.system.clone(),
            temperature_bits: completion.temperature.map(f64::to_bits),
        });

        if let Some(hit) = cache_key.as_ref().and_then(|key| self.cache_lookup(key)) {
            tracing::debug!(key_id = %hit.key_id, "Generation served from cache");
            return Ok(hit);
        }

        let response = self.generate_uncached(&completion, max_attempts).await?;
        if let Some(key) = cache_key {
            self.store(key, &response);
        }
        Ok(response)
    }

    async fn generate_uncached(
        &self,
        completion: &CompletionRequest,
        max_attempts: u32,
    ) -> Result<GenerationResponse, GenerationError> {
        let max_attempts = max_attempts.max(1);
        let mut last_error: Option<LlmError> = None;

        for attempt in 1..=max_attempts {
            let key = self.pool.next()?;
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let outcome = self.call_with_timeout(key.secret(), completion).await;
            let latency = start.elapsed();

            match outcome {
                Ok(response) => {
                    self.pool.report_success(&key, latency);
                    tracing::debug!(
                        key_id = %key.id(),
                        attempt,
                        latency_ms = latency.as_millis() as u64,
                        "Generation succeeded"
                    );
                    return Ok(GenerationResponse {
                        text: response.content,
                        key_id: key.id().to_string(),
                        latency_ms: latency.as_millis() as u64,
                        attempts: attempt,
                    });
                }
                Err(err) => match FailureReason::from_error(&err) {
                    Some(reason) => {
                        tracing::warn!(
                            key_id = %key.id(),
                            attempt,
                            max_attempts,
                            error = %err,
                            "Generation attempt failed, failing over"
                        );
                        self.pool.report_failure(&key, reason);
                        last_error = Some(err);
                    }
                    None => {
                        tracing::error!(
                            key_id = %key.id(),
                            attempt,
                            error = %err,
                            "Permanent generation error, not retrying"
                        );
                        return Err(GenerationError::Unavailable {
                            attempts: attempt,
                            last_error: err,
                        });
                    }
                },
            }
        }

        if self.pool.available_count() == 0 {
            return Err(GenerationError::PoolExhausted {
                retry_after_ms: self.pool.next_recovery_in().map(|d| d.as_millis() as u64),
            });
        }

        Err(GenerationError::Unavailable {
            attempts: max_attempts,
            last_error: last_error.unwrap_or(LlmError::Provider {
                message: "no attempt was made".to_string(),
            }),
        })
    }

    /// Send one tiny request through every non-failed key, reporting outcomes
    /// to the pool. Used by `tscout keys --probe`.
    pub async fn probe(&self) -> Vec<ProbeOutcome> {
        let request = self.completion_request(&GenerationRequest {
            prompt: "Reply with the single word: ok".to_string(),
            max_tokens: Some(8),
            temperature: Some(0.0),
            ..Default::default()
        });

        let mut outcomes = Vec::new();
        for info in self.pool.status() {
            if info.status == KeyStatus::Failed {
                continue;
            }
            let Some(key) = self.pool.get(&info.id) else {
                continue;
            };

            let start = Instant::now();
            let outcome = self.call_with_timeout(key.secret(), &request).await;
            let latency = start.elapsed();

            let result = match outcome {
                Ok(_) => {
                    self.pool.report_success(&key, latency);
                    Ok(latency.as_millis() as u64)
                }
                Err(err) => {
                    if let Some(reason) = FailureReason::from_error(&err) {
                        self.pool.report_failure(&key, reason);
                    }
                    Err(err)
                }
            };
            tracing::info!(key_id = %info.id, ok = result.is_ok(), "Probed API key");
            outcomes.push(ProbeOutcome {
                key_id: info.id,
                result,
            });
        }
        outcomes
    }

    fn cache_lookup(&self, key: &CacheKey) -> Option<GenerationResponse> {
        let cache = self.cache.as_ref()?;
        let entries = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).map(|response| GenerationResponse {
            attempts: 0,
            latency_ms: 0,
            ..response.clone()
        })
    }

    fn store(&self, key: CacheKey, response: &GenerationResponse) {
        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(key, response.clone());
        }
    }

    async fn call_with_timeout(
        &self,
        api_key: &SecretString,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        match tokio::time::timeout(self.policy.call_timeout, self.provider.complete(api_key, request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                after_ms: self.policy.call_timeout.as_millis() as u64,
            }),
        }
    }

    fn completion_request(&self, request: &GenerationRequest) -> CompletionRequest {
        CompletionRequest {
            model: String::new(), // Provider uses its configured model
            messages: vec![Message::user(request.prompt.clone())],
            system: request.system.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            temperature: request.temperature.or(self.default_temperature),
        }
    }
}
