use thiserror::Error;

use crate::llm::LlmError;

/// Errors surfaced by a resilient generation call.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Every credential is exhausted or failed. Retry on a later turn.
    #[error("all API keys are exhausted or failed")]
    PoolExhausted {
        /// Time until the soonest exhausted key cools down, if any will.
        retry_after_ms: Option<u64>,
    },

    /// The call failed beyond the attempt budget, or hit a permanent error.
    #[error("generation unavailable after {attempts} attempt(s): {last_error}")]
    Unavailable { attempts: u32, last_error: LlmError },
}

/// Errors building a key pool.
#[derive(Debug, Error)]
pub enum KeyPoolError {
    #[error("no API keys configured")]
    NoKeysConfigured,

    #[error("API key '{id}' is blank")]
    BlankCredential { id: String },

    #[error("duplicate API key id '{0}'")]
    DuplicateId(String),
}
