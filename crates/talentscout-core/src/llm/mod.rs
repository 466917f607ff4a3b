//! LLM invocation layer.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `KeyPool`: credential rotation with per-key health and cooldown
//! - `ResilientClient`: failover and retry over the pool

pub mod box_provider;
pub mod key_pool;
pub mod provider;
pub mod resilient;

#[cfg(test)]
pub(crate) mod testing;
