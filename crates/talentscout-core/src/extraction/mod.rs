//! Profile extraction from candidate utterances.
//!
//! - `engine`: model-based extraction with per-field validation
//! - `fallback`: deterministic patterns for fields the model missed
//! - `json`: JSON object recovery from free-form model output
//! - `vocabulary`: the closed technology vocabulary and its categories

pub mod engine;
pub mod fallback;
pub mod json;
pub mod prompt;
pub mod validate;
pub mod vocabulary;
