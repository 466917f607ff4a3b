//! Candidate profile types.
//!
//! `CandidateProfile` is the authoritative, per-session record of what the
//! candidate has told us. `ExtractionResult` is the transient, per-turn partial
//! record produced by extraction, with per-field provenance so the merge rules
//! can be a pure function of explicit state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named field of the candidate profile.
///
/// Declaration order is the order the screening collects fields in, and the
/// iteration order of every profile map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    Email,
    Phone,
    YearsExperience,
    DesiredPositions,
    Location,
    TechStack,
}

impl ProfileField {
    pub const ALL: [ProfileField; 7] = [
        ProfileField::FullName,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::YearsExperience,
        ProfileField::DesiredPositions,
        ProfileField::Location,
        ProfileField::TechStack,
    ];

    /// Fields a screening cannot finish without.
    pub const REQUIRED: [ProfileField; 3] = [
        ProfileField::FullName,
        ProfileField::Email,
        ProfileField::TechStack,
    ];

    /// Collection order of the fields not in `known`: required ones first,
    /// optional ones only once every required field is known.
    pub fn missing_from(known: &BTreeSet<ProfileField>) -> Vec<ProfileField> {
        let missing_required: Vec<ProfileField> = ProfileField::REQUIRED
            .into_iter()
            .filter(|f| !known.contains(f))
            .collect();
        if !missing_required.is_empty() {
            return missing_required;
        }
        ProfileField::ALL
            .into_iter()
            .filter(|f| !f.is_required() && !known.contains(f))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::FullName => "full_name",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
            ProfileField::YearsExperience => "years_experience",
            ProfileField::DesiredPositions => "desired_positions",
            ProfileField::Location => "location",
            ProfileField::TechStack => "tech_stack",
        }
    }

    /// Human-readable label (e.g. "years of experience").
    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::FullName => "full name",
            ProfileField::Email => "email address",
            ProfileField::Phone => "phone number",
            ProfileField::YearsExperience => "years of experience",
            ProfileField::DesiredPositions => "desired positions",
            ProfileField::Location => "location",
            ProfileField::TechStack => "tech stack",
        }
    }

    /// Set-valued fields grow by union and never lose tokens on merge.
    pub fn is_set_valued(&self) -> bool {
        matches!(self, ProfileField::DesiredPositions | ProfileField::TechStack)
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_name" | "name" => Ok(ProfileField::FullName),
            "email" => Ok(ProfileField::Email),
            "phone" => Ok(ProfileField::Phone),
            "years_experience" | "experience_years" => Ok(ProfileField::YearsExperience),
            "desired_positions" => Ok(ProfileField::DesiredPositions),
            "location" => Ok(ProfileField::Location),
            "tech_stack" => Ok(ProfileField::TechStack),
            other => Err(format!("unknown profile field: '{other}'")),
        }
    }
}

/// Where an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// Parsed from the model's structured output.
    Llm,
    /// Found by the deterministic pattern matchers.
    RegexFallback,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionSource::Llm => write!(f, "llm"),
            ExtractionSource::RegexFallback => write!(f, "regex_fallback"),
        }
    }
}

/// The value held by a profile field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Years(f32),
    /// Insertion-ordered, case-insensitively distinct tokens.
    Set(Vec<String>),
}

impl FieldValue {
    /// Build a set value, dropping blanks and case-insensitive duplicates.
    pub fn set_from<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            if !out.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                out.push(token.to_string());
            }
        }
        FieldValue::Set(out)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Years(y) => !y.is_finite(),
            FieldValue::Set(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_years(&self) -> Option<f32> {
        match self {
            FieldValue::Years(y) => Some(*y),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&[String]> {
        match self {
            FieldValue::Set(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Years(y) if y.fract() == 0.0 => write!(f, "{y:.0}"),
            FieldValue::Years(y) => write!(f, "{y}"),
            FieldValue::Set(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// One field as produced by a single extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedValue {
    pub value: FieldValue,
    /// 0.0..=1.0
    pub confidence: f32,
    pub source: ExtractionSource,
}

/// Partial profile extracted from one utterance.
///
/// Transient: produced and consumed within one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: BTreeMap<ProfileField, ExtractedValue>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: ProfileField) -> Option<&ExtractedValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: ProfileField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Insert a value unless it is empty. Returns whether it was stored.
    pub fn insert(
        &mut self,
        field: ProfileField,
        value: FieldValue,
        confidence: f32,
        source: ExtractionSource,
    ) -> bool {
        if value.is_empty() {
            return false;
        }
        self.fields.insert(
            field,
            ExtractedValue {
                value,
                confidence: confidence.clamp(0.0, 1.0),
                source,
            },
        );
        true
    }

    /// Fields that came from the given source.
    pub fn fields_from(&self, source: ExtractionSource) -> Vec<ProfileField> {
        self.fields
            .iter()
            .filter(|(_, v)| v.source == source)
            .map(|(f, _)| *f)
            .collect()
    }
}

/// A committed profile field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub value: FieldValue,
    pub confidence: f32,
    pub source: ExtractionSource,
    pub last_updated_turn: u32,
}

/// Interview difficulty derived from years of experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner => write!(f, "beginner"),
            DifficultyLevel::Intermediate => write!(f, "intermediate"),
            DifficultyLevel::Advanced => write!(f, "advanced"),
        }
    }
}

/// The authoritative candidate profile for one screening session.
///
/// Collaborators (UI, export) read snapshots of this between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub fields: BTreeMap<ProfileField, ProfileEntry>,
}

impl CandidateProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: ProfileField) -> Option<&ProfileEntry> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: ProfileField) -> Option<&FieldValue> {
        self.fields.get(&field).map(|e| &e.value)
    }

    pub fn is_set(&self, field: ProfileField) -> bool {
        self.fields
            .get(&field)
            .is_some_and(|e| !e.value.is_empty())
    }

    pub fn insert(&mut self, field: ProfileField, entry: ProfileEntry) {
        self.fields.insert(field, entry);
    }

    /// Fields currently holding a value.
    pub fn known_fields(&self) -> BTreeSet<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|f| self.is_set(*f))
            .collect()
    }

    pub fn full_name(&self) -> Option<&str> {
        self.value(ProfileField::FullName).and_then(FieldValue::as_text)
    }

    pub fn years_experience(&self) -> Option<f32> {
        self.value(ProfileField::YearsExperience)
            .and_then(FieldValue::as_years)
    }

    pub fn tech_stack(&self) -> &[String] {
        self.value(ProfileField::TechStack)
            .and_then(FieldValue::as_set)
            .unwrap_or(&[])
    }

    /// Rough progress of the screening: required fields count 15 each,
    /// optional fields 5 each, capped at 100.
    pub fn completion_percentage(&self) -> u8 {
        let score: u32 = ProfileField::ALL
            .into_iter()
            .filter(|f| self.is_set(*f))
            .map(|f| if f.is_required() { 15 } else { 5 })
            .sum();
        score.min(100) as u8
    }

    /// Fields still to collect: required ones first, optional ones only once
    /// every required field is present.
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        ProfileField::missing_from(&self.known_fields())
    }

    pub fn is_complete(&self) -> bool {
        ProfileField::ALL.into_iter().all(|f| self.is_set(f))
    }

    /// Question difficulty for the technical stage of the screening.
    pub fn difficulty_level(&self) -> DifficultyLevel {
        match self.years_experience() {
            Some(y) if y < 2.0 => DifficultyLevel::Beginner,
            Some(y) if y < 5.0 => DifficultyLevel::Intermediate,
            Some(_) => DifficultyLevel::Advanced,
            None => DifficultyLevel::Intermediate,
        }
    }

    /// Plain `field -> value` view, used as prompt context and for export.
    pub fn to_value_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .filter(|(_, e)| !e.value.is_empty())
            .map(|(f, e)| {
                let value = serde_json::to_value(&e.value).unwrap_or(serde_json::Value::Null);
                (f.as_str().to_string(), value)
            })
            .collect()
    }
}
