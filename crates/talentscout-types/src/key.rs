//! API key health types shared between the key pool and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of a single API credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// Usable for the next call.
    Healthy,
    /// Rate-limited or out of quota; usable again once its cooldown elapses.
    Exhausted,
    /// Rejected by the provider; unusable until the process restarts.
    Failed,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStatus::Healthy => write!(f, "healthy"),
            KeyStatus::Exhausted => write!(f, "exhausted"),
            KeyStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Status information for one key in the pool (for CLI display).
///
/// Never carries the secret itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyStatusInfo {
    pub id: String,
    pub status: KeyStatus,
    /// Milliseconds until an exhausted key becomes selectable again.
    pub cooldown_remaining_ms: Option<u64>,
    pub consecutive_exhaustions: u32,
    pub last_error: Option<String>,
    pub last_latency_ms: Option<u64>,
    pub total_calls: u64,
    pub total_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_status_serde() {
        let json = serde_json::to_string(&KeyStatus::Exhausted).unwrap();
        assert_eq!(json, "\"exhausted\"");
        let parsed: KeyStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, KeyStatus::Failed);
    }

    #[test]
    fn test_key_status_display_matches_serde() {
        for status in [KeyStatus::Healthy, KeyStatus::Exhausted, KeyStatus::Failed] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
