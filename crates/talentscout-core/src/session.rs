//! Per-session screening pipeline.
//!
//! A `ScreeningSession` owns the authoritative `CandidateProfile` for one
//! candidate. Each utterance runs extract then merge, in that order, and
//! `process_turn` takes `&mut self`, so a session can never have two turns in
//! flight. Nothing is written to the profile until the merge of a turn; a turn
//! whose model call fails leaves the profile exactly as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use talentscout_types::error::GenerationError;
use talentscout_types::profile::{
    CandidateProfile, DifficultyLevel, ExtractionSource, FieldValue, ProfileField,
};

use crate::extraction::engine::ExtractionEngine;
use crate::extraction::vocabulary::{TechCategory, categorize};
use crate::profile::merger::ProfileMerger;

/// A field written by a turn.
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub field: ProfileField,
    pub value: FieldValue,
    pub source: ExtractionSource,
    pub confidence: f32,
}

/// What one turn did to the profile.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub turn: u32,
    /// Fields the extraction produced, whether or not they were merged.
    pub extracted: usize,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Error)]
pub enum TurnError {
    /// The model could not be reached; the profile is unchanged and the
    /// session accepts the next utterance.
    #[error("could not process this turn: {0}")]
    CouldNotProcess(#[source] GenerationError),
}

impl TurnError {
    /// Milliseconds until a key is expected to be usable again, if known.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            TurnError::CouldNotProcess(GenerationError::PoolExhausted { retry_after_ms }) => {
                *retry_after_ms
            }
            TurnError::CouldNotProcess(_) => None,
        }
    }
}

/// End-of-session (or in-progress) overview of a screening.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub turns: u32,
    pub failed_turns: u32,
    pub completion_percentage: u8,
    pub is_complete: bool,
    pub missing_fields: Vec<ProfileField>,
    pub difficulty: DifficultyLevel,
    pub tech_by_category: BTreeMap<TechCategory, Vec<String>>,
}

/// One candidate's screening conversation.
pub struct ScreeningSession {
    id: Uuid,
    engine: Arc<ExtractionEngine>,
    profile: CandidateProfile,
    turn: u32,
    failed_turns: u32,
    started_at: DateTime<Utc>,
}

impl ScreeningSession {
    pub fn new(engine: Arc<ExtractionEngine>) -> Self {
        Self {
            id: Uuid::now_v7(),
            engine,
            profile: CandidateProfile::new(),
            turn: 0,
            failed_turns: 0,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Read-only view of the current profile.
    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    /// Number of utterances received so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Run one utterance through extract and merge.
    #[tracing::instrument(
        name = "screening_turn",
        skip(self, utterance),
        fields(session_id = %self.id, turn = self.turn + 1)
    )]
    pub async fn process_turn(&mut self, utterance: &str) -> Result<TurnReport, TurnError> {
        self.turn += 1;
        let turn = self.turn;

        let known = self.profile.known_fields();
        let partial = match self.engine.try_extract(utterance, &known).await {
            Ok(partial) => partial,
            Err(e) => {
                self.failed_turns += 1;
                tracing::warn!(error = %e, "Turn not processed; profile unchanged");
                return Err(TurnError::CouldNotProcess(e));
            }
        };

        let changed = ProfileMerger::apply(&mut self.profile, &partial, turn);
        let changes = changed
            .into_iter()
            .filter_map(|field| {
                let entry = self.profile.get(field)?;
                Some(FieldChange {
                    field,
                    value: entry.value.clone(),
                    source: entry.source,
                    confidence: entry.confidence,
                })
            })
            .collect::<Vec<_>>();

        tracing::info!(
            extracted = partial.len(),
            changed = changes.len(),
            completion = self.profile.completion_percentage(),
            "Turn processed"
        );

        Ok(TurnReport {
            turn,
            extracted: partial.len(),
            changes,
        })
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            duration_secs: (Utc::now() - self.started_at).num_seconds(),
            turns: self.turn,
            failed_turns: self.failed_turns,
            completion_percentage: self.profile.completion_percentage(),
            is_complete: self.profile.is_complete(),
            missing_fields: self.profile.missing_fields(),
            difficulty: self.profile.difficulty_level(),
            tech_by_category: categorize(self.profile.tech_stack()),
        }
    }
}
