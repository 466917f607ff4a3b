//! Screening core for TalentScout.
//!
//! - `llm`: provider trait, key pool, and the resilient generation client
//! - `extraction`: turn-by-turn profile extraction with a pattern fallback
//! - `profile`: the provenance-aware profile merge
//! - `session`: the sequential per-session turn pipeline

pub mod extraction;
pub mod llm;
pub mod profile;
pub mod session;
