//! Application state wiring the screening core together.
//!
//! AppState holds the process-wide key pool (inside the resilient client) and
//! the extraction engine that every session shares.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use talentscout_core::extraction::engine::ExtractionEngine;
use talentscout_core::llm::key_pool::{BackoffPolicy, KeyPool};
use talentscout_core::llm::resilient::{ResilientClient, RetryPolicy};
use talentscout_infra::config::load_effective_config;
use talentscout_infra::credentials::load_api_keys;
use talentscout_infra::llm::create_provider;
use talentscout_types::config::ScreeningConfig;

/// Shared application state.
pub struct AppState {
    pub config: ScreeningConfig,
    pub client: Arc<ResilientClient>,
    pub engine: Arc<ExtractionEngine>,
}

impl AppState {
    /// Load config and credentials, then build pool, provider, client and engine.
    pub async fn init(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = load_effective_config(config_path).await;

        let keys = load_api_keys().context(
            "no usable API keys; set TALENTSCOUT_API_KEYS or GOOGLE_API_KEY (a .env file works)",
        )?;
        let pool = KeyPool::from_labeled(keys, BackoffPolicy::from_settings(&config.cooldown))
            .context("failed to build the API key pool")?;

        let provider = create_provider(&config.provider).context("failed to create LLM provider")?;

        let mut client = ResilientClient::new(
            Arc::new(pool),
            Arc::new(provider),
            RetryPolicy::from_settings(&config.retry),
        )
        .with_generation_defaults(&config.provider);
        if config.provider.cache_responses {
            client = client.with_response_cache();
        }
        let client = Arc::new(client);
        let engine = Arc::new(ExtractionEngine::new(
            Arc::clone(&client),
            config.extraction.clone(),
        ));

        tracing::info!(
            provider = client.provider_name(),
            model = %config.provider.model,
            keys = client.pool().len(),
            "TalentScout initialized"
        );

        Ok(Self {
            config,
            client,
            engine,
        })
    }
}
