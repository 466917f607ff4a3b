//! Shared domain types for TalentScout.
//!
//! This crate contains the types exchanged between the screening core, the
//! provider implementations, and the CLI: LLM request/response shapes, key
//! health snapshots, the candidate profile, and configuration.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod config;
pub mod error;
pub mod key;
pub mod llm;
pub mod profile;
