//! Configuration types for TalentScout.
//!
//! `ScreeningConfig` represents the top-level `config.toml`. Every section and
//! field has a default, so an empty file (or no file) is a valid configuration.
//! API credentials are never read from this file; they come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the screening core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreeningConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cooldown: CooldownSettings,

    #[serde(default)]
    pub extraction: ExtractionSettings,
}

/// Which model to call and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the provider's base URL (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sampling temperature for free-form generation.
    #[serde(default = "default_generation_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Answer repeated free-form prompts from memory. Extraction calls always
    /// reach the model.
    #[serde(default)]
    pub cache_responses: bool,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_generation_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            temperature: default_generation_temperature(),
            max_tokens: default_max_tokens(),
            cache_responses: false,
        }
    }
}

/// Attempt budget and pacing for a single logical generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Default number of model calls per `generate`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-call timeout; a timed-out call counts as a transient failure.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Delay before the second attempt; doubles per attempt.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound for the delay between attempts.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_max_retry_delay_ms() -> u64 {
    2_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            call_timeout_ms: default_call_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

/// Cooldown applied to a rate-limited key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownSettings {
    /// Cooldown after the first consecutive exhaustion; doubles after each one.
    #[serde(default = "default_cooldown_base_ms")]
    pub base_ms: u64,

    #[serde(default = "default_cooldown_cap_ms")]
    pub cap_ms: u64,
}

fn default_cooldown_base_ms() -> u64 {
    30_000
}

fn default_cooldown_cap_ms() -> u64 {
    600_000
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            base_ms: default_cooldown_base_ms(),
            cap_ms: default_cooldown_cap_ms(),
        }
    }
}

/// Structured extraction call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    #[serde(default)]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Attempt budget for the extraction call (kept small to bound turn latency).
    #[serde(default = "default_extraction_attempts")]
    pub max_attempts: u32,
}

fn default_extraction_attempts() -> u32 {
    2
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            max_attempts: default_extraction_attempts(),
        }
    }
}
