//! Infrastructure layer for TalentScout.
//!
//! Contains the concrete implementations behind the traits defined in
//! `talentscout-core`: the Gemini HTTP provider, plus loading of
//! `config.toml` and of API credentials from the environment.

pub mod config;
pub mod credentials;
pub mod llm;
