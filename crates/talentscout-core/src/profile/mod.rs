//! Candidate profile maintenance.

pub mod merger;
