//! Observability setup for TalentScout binaries.

pub mod tracing_setup;
