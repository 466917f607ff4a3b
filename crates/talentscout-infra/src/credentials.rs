//! API credential loading from the environment.
//!
//! Sources, in priority order:
//! 1. `TALENTSCOUT_API_KEYS`: comma-separated list, labelled `key-1`, `key-2`, ...
//! 2. `GOOGLE_API_KEY`, then `GOOGLE_API_KEY_1` .. `GOOGLE_API_KEY_32`,
//!    each labelled with its variable name
//!
//! Credentials are wrapped in [`SecretString`] as soon as they are read. An
//! empty result is [`KeyPoolError::NoKeysConfigured`]; a variable that is set
//! but blank is [`KeyPoolError::BlankCredential`].

use std::collections::HashSet;

use secrecy::{ExposeSecret, SecretString};

use talentscout_types::error::KeyPoolError;

pub const API_KEYS_VAR: &str = "TALENTSCOUT_API_KEYS";
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Highest numbered `GOOGLE_API_KEY_N` that is looked up.
const MAX_NUMBERED_KEYS: usize = 32;

/// Load `(id, credential)` pairs from the process environment.
pub fn load_api_keys() -> Result<Vec<(String, SecretString)>, KeyPoolError> {
    api_keys_from(|name| std::env::var(name).ok())
}

/// Load `(id, credential)` pairs through an arbitrary variable lookup.
pub fn api_keys_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<(String, SecretString)>, KeyPoolError> {
    let candidates = match lookup(API_KEYS_VAR) {
        Some(list) if !list.trim().is_empty() => list
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .enumerate()
            .map(|(i, k)| (format!("key-{}", i + 1), k.to_string()))
            .collect::<Vec<_>>(),
        _ => {
            let numbered = (1..=MAX_NUMBERED_KEYS).map(|i| format!("{GOOGLE_API_KEY_VAR}_{i}"));
            std::iter::once(GOOGLE_API_KEY_VAR.to_string())
                .chain(numbered)
                .filter_map(|name| lookup(&name).map(|value| (name, value.trim().to_string())))
                .collect()
        }
    };

    let mut seen = HashSet::new();
    let mut keys = Vec::with_capacity(candidates.len());
    for (id, value) in candidates {
        if value.is_empty() {
            return Err(KeyPoolError::BlankCredential { id });
        }
        let secret = SecretString::from(value);
        if !seen.insert(secret.expose_secret().to_string()) {
            tracing::warn!(key_id = %id, "Skipping duplicate API key");
            continue;
        }
        keys.push((id, secret));
    }

    if keys.is_empty() {
        return Err(KeyPoolError::NoKeysConfigured);
    }

    tracing::debug!(
        keys = keys.len(),
        ids = ?keys.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
        "Loaded API keys from environment"
    );
    Ok(keys)
}
