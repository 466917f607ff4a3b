//! Configuration loader for TalentScout.
//!
//! Reads `config.toml` (from `--config`, else the data directory,
//! `~/.talentscout/` by default) and deserializes it into [`ScreeningConfig`].
//! Falls back to defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use talentscout_types::config::ScreeningConfig;

pub const DATA_DIR_VAR: &str = "TALENTSCOUT_DATA_DIR";
pub const MODEL_VAR: &str = "TALENTSCOUT_MODEL";
pub const BASE_URL_VAR: &str = "TALENTSCOUT_BASE_URL";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `TALENTSCOUT_DATA_DIR` environment variable
/// 2. `~/.talentscout`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_VAR) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".talentscout");
    }

    // Last resort: current directory
    PathBuf::from(".talentscout")
}

/// The config file to read: an explicit path, else `config.toml` in the data dir.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => resolve_data_dir().join("config.toml"),
    }
}

/// Load the screening config from `config_path`.
///
/// A missing file yields defaults; an unreadable or malformed one yields
/// defaults with a warning. Never fails.
pub async fn load_config(config_path: &Path) -> ScreeningConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return ScreeningConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ScreeningConfig::default();
        }
    };

    match toml::from_str::<ScreeningConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ScreeningConfig::default()
        }
    }
}

/// Apply `TALENTSCOUT_MODEL` / `TALENTSCOUT_BASE_URL` through `lookup`.
pub fn apply_env_overrides(config: &mut ScreeningConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
        tracing::debug!(model = %model, "Model overridden from environment");
        config.provider.model = model.trim().to_string();
    }
    if let Some(base_url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
        config.provider.base_url = Some(base_url.trim().to_string());
    }
}

/// Load the config and apply environment overrides from the process env.
pub async fn load_effective_config(explicit: Option<&Path>) -> ScreeningConfig {
    let path = resolve_config_path(explicit);
    let mut config = load_config(&path).await;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}
