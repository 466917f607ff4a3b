//! API key pool with per-key health tracking.
//!
//! Keys are selected round-robin among the Healthy ones. A rate-limited key is
//! marked Exhausted with an exponential, capped cooldown and is lazily restored
//! by the first selection that observes the cooldown has elapsed. A key the
//! provider rejects is marked Failed and stays out of rotation until restart.
//!
//! The pool is shared process-wide behind an `Arc`. Every transition of one
//! key's record happens under that key's mutex, so concurrent sessions never
//! observe a half-updated record.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use talentscout_types::config::CooldownSettings;
use talentscout_types::error::{GenerationError, KeyPoolError};
use talentscout_types::key::{KeyStatus, KeyStatusInfo};
use talentscout_types::llm::{ErrorClass, LlmError};

/// Exponential cooldown schedule for rate-limited keys.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Cooldown after the first consecutive exhaustion.
    pub base: Duration,
    /// Upper bound for any cooldown, including provider hints.
    pub cap: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap: cap.max(base),
        }
    }

    pub fn from_settings(settings: &CooldownSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.base_ms),
            Duration::from_millis(settings.cap_ms),
        )
    }

    /// Cooldown for the `consecutive`-th exhaustion in a row (1-based):
    /// `base * 2^(consecutive - 1)`, capped.
    pub fn cooldown_for(&self, consecutive: u32) -> Duration {
        let shift = consecutive.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << shift)
            .unwrap_or(self.cap)
            .min(self.cap)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_settings(&CooldownSettings::default())
    }
}

/// Why a call on a key failed, as far as the key's health is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Rate limit or quota; the key cools down.
    RateLimited { retry_after_ms: Option<u64> },
    /// Timeout, network, or backend failure; the key stays Healthy.
    Transient(String),
    /// The provider refused the credential; the key is retired.
    Rejected(String),
}

impl FailureReason {
    /// Map a provider error to its effect on the key.
    ///
    /// Returns `None` for permanent request errors, which say nothing about
    /// the key that sent them.
    pub fn from_error(error: &LlmError) -> Option<Self> {
        match error.class() {
            ErrorClass::RateLimit => {
                let retry_after_ms = match error {
                    LlmError::RateLimited { retry_after_ms } => *retry_after_ms,
                    _ => None,
                };
                Some(FailureReason::RateLimited { retry_after_ms })
            }
            ErrorClass::Transient => Some(FailureReason::Transient(error.to_string())),
            ErrorClass::KeyRejected => Some(FailureReason::Rejected(error.to_string())),
            ErrorClass::Permanent => None,
        }
    }
}

/// One credential and its health record.
///
/// Only mutated through `KeyPool::report_success` / `KeyPool::report_failure`.
#[derive(Debug)]
struct ApiKeyRecord {
    id: String,
    secret: Arc<SecretString>,
    status: KeyStatus,
    cooldown_until: Option<Instant>,
    consecutive_exhaustions: u32,
    consecutive_transient: u32,
    last_error: Option<String>,
    last_latency_ms: Option<u64>,
    total_calls: u64,
    total_failures: u64,
}

impl ApiKeyRecord {
    fn new(id: String, secret: SecretString) -> Self {
        Self {
            id,
            secret: Arc::new(secret),
            status: KeyStatus::Healthy,
            cooldown_until: None,
            consecutive_exhaustions: 0,
            consecutive_transient: 0,
            last_error: None,
            last_latency_ms: None,
            total_calls: 0,
            total_failures: 0,
        }
    }

    /// Status as of `now`, treating an elapsed cooldown as Healthy.
    fn effective_status(&self, now: Instant) -> KeyStatus {
        match (self.status, self.cooldown_until) {
            (KeyStatus::Exhausted, Some(until)) if now >= until => KeyStatus::Healthy,
            (status, _) => status,
        }
    }

    /// Restore an Exhausted key whose cooldown has elapsed.
    fn restore_if_cooled(&mut self, now: Instant) {
        if self.status == KeyStatus::Exhausted && self.effective_status(now) == KeyStatus::Healthy {
            self.status = KeyStatus::Healthy;
            self.cooldown_until = None;
            tracing::info!(key_id = %self.id, "API key cooldown elapsed, back in rotation");
        }
    }

    fn remaining_cooldown(&self, now: Instant) -> Option<Duration> {
        match (self.status, self.cooldown_until) {
            (KeyStatus::Exhausted, Some(until)) if until > now => Some(until - now),
            _ => None,
        }
    }
}

/// A key handed out by [`KeyPool::next`]. Pass it back when reporting the outcome.
#[derive(Debug, Clone)]
pub struct SelectedKey {
    index: usize,
    id: String,
    secret: Arc<SecretString>,
}

impl SelectedKey {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

/// Ordered set of API credentials with per-key health.
pub struct KeyPool {
    slots: Vec<Mutex<ApiKeyRecord>>,
    cursor: AtomicUsize,
    backoff: BackoffPolicy,
}

impl KeyPool {
    /// Build a pool from bare credentials, labelled `key-1`, `key-2`, ...
    pub fn new(credentials: Vec<SecretString>, backoff: BackoffPolicy) -> Result<Self, KeyPoolError> {
        let labeled = credentials
            .into_iter()
            .enumerate()
            .map(|(i, secret)| (format!("key-{}", i + 1), secret))
            .collect();
        Self::from_labeled(labeled, backoff)
    }

    /// Build a pool from `(id, credential)` pairs, preserving order.
    pub fn from_labeled(
        keys: Vec<(String, SecretString)>,
        backoff: BackoffPolicy,
    ) -> Result<Self, KeyPoolError> {
        if keys.is_empty() {
            return Err(KeyPoolError::NoKeysConfigured);
        }

        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(keys.len());
        for (id, secret) in keys {
            if secret.expose_secret().trim().is_empty() {
                return Err(KeyPoolError::BlankCredential { id });
            }
            if !seen.insert(id.clone()) {
                return Err(KeyPoolError::DuplicateId(id));
            }
            slots.push(Mutex::new(ApiKeyRecord::new(id, secret)));
        }

        tracing::debug!(keys = slots.len(), "Key pool initialized");

        Ok(Self {
            slots,
            cursor: AtomicUsize::new(0),
            backoff,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn lock(&self, index: usize) -> MutexGuard<'_, ApiKeyRecord> {
        // A poisoned record is still internally consistent: every transition
        // is a handful of field assignments with no panicking code between them.
        self.slots[index]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Select the next Healthy key, round-robin.
    ///
    /// Exhausted keys whose cooldown has elapsed are restored on the way.
    /// Fails with `PoolExhausted` when no key is usable; never waits.
    pub fn next(&self) -> Result<SelectedKey, GenerationError> {
        let n = self.slots.len();
        let start = self.cursor.load(Ordering::Relaxed) % n;
        let now = Instant::now();

        for offset in 0..n {
            let index = (start + offset) % n;
            let mut record = self.lock(index);
            record.restore_if_cooled(now);
            if record.status == KeyStatus::Healthy {
                self.cursor.store((index + 1) % n, Ordering::Relaxed);
                return Ok(SelectedKey {
                    index,
                    id: record.id.clone(),
                    secret: Arc::clone(&record.secret),
                });
            }
        }

        let retry_after_ms = self.next_recovery_in().map(|d| d.as_millis() as u64);
        tracing::warn!(keys = n, ?retry_after_ms, "No usable API key in pool");
        Err(GenerationError::PoolExhausted { retry_after_ms })
    }

    /// Look up a key by id regardless of its status (for targeted probes).
    pub fn get(&self, id: &str) -> Option<SelectedKey> {
        (0..self.slots.len()).find_map(|index| {
            let record = self.lock(index);
            (record.id == id).then(|| SelectedKey {
                index,
                id: record.id.clone(),
                secret: Arc::clone(&record.secret),
            })
        })
    }

    /// Record a successful call: clears the consecutive failure counters.
    pub fn report_success(&self, key: &SelectedKey, latency: Duration) {
        let mut record = self.lock(key.index);
        record.total_calls += 1;
        record.consecutive_exhaustions = 0;
        record.consecutive_transient = 0;
        record.last_latency_ms = Some(latency.as_millis() as u64);
    }

    /// Record a failed call and apply its effect on the key's status.
    pub fn report_failure(&self, key: &SelectedKey, reason: FailureReason) {
        let now = Instant::now();
        let mut record = self.lock(key.index);
        record.total_calls += 1;
        record.total_failures += 1;

        match reason {
            FailureReason::RateLimited { retry_after_ms } => {
                record.consecutive_exhaustions += 1;
                record.last_error = Some("rate limited".to_string());
                if record.status == KeyStatus::Failed {
                    return;
                }

                let mut cooldown = self.backoff.cooldown_for(record.consecutive_exhaustions);
                if let Some(hint) = retry_after_ms.map(Duration::from_millis) {
                    cooldown = cooldown.max(hint).min(self.backoff.cap);
                }
                record.status = KeyStatus::Exhausted;
                record.cooldown_until = Some(now + cooldown);

                tracing::warn!(
                    key_id = %record.id,
                    consecutive = record.consecutive_exhaustions,
                    cooldown_ms = cooldown.as_millis() as u64,
                    "API key rate limited, cooling down"
                );
            }
            FailureReason::Transient(message) => {
                record.consecutive_transient += 1;
                tracing::debug!(
                    key_id = %record.id,
                    consecutive = record.consecutive_transient,
                    error = %message,
                    "Transient failure on API key"
                );
                record.last_error = Some(message);
            }
            FailureReason::Rejected(message) => {
                record.status = KeyStatus::Failed;
                record.cooldown_until = None;
                tracing::error!(
                    key_id = %record.id,
                    error = %message,
                    "API key rejected by provider, removing from rotation"
                );
                record.last_error = Some(message);
            }
        }
    }

    /// Snapshot of every key's health (for CLI display). Never includes secrets.
    pub fn status(&self) -> Vec<KeyStatusInfo> {
        let now = Instant::now();
        (0..self.slots.len())
            .map(|i| {
                let record = self.lock(i);
                KeyStatusInfo {
                    id: record.id.clone(),
                    status: record.effective_status(now),
                    cooldown_remaining_ms: record
                        .remaining_cooldown(now)
                        .map(|d| d.as_millis() as u64),
                    consecutive_exhaustions: record.consecutive_exhaustions,
                    last_error: record.last_error.clone(),
                    last_latency_ms: record.last_latency_ms,
                    total_calls: record.total_calls,
                    total_failures: record.total_failures,
                }
            })
            .collect()
    }

    /// Number of keys `next()` could hand out right now.
    pub fn available_count(&self) -> usize {
        let now = Instant::now();
        (0..self.slots.len())
            .filter(|&i| self.lock(i).effective_status(now) == KeyStatus::Healthy)
            .count()
    }

    /// Time until the soonest Exhausted key cools down. `None` when no key
    /// is cooling down (all Healthy, or all Failed).
    pub fn next_recovery_in(&self) -> Option<Duration> {
        let now = Instant::now();
        (0..self.slots.len())
            .filter_map(|i| self.lock(i).remaining_cooldown(now))
            .min()
    }
}

impl std::fmt::Debug for KeyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPool")
            .field("keys", &self.slots.len())
            .field("backoff", &self.backoff)
            .finish()
    }
}
