//! Provenance-aware merge of a turn's extraction into the profile.
//!
//! Rules, per field of the incoming partial:
//! - empty values are ignored
//! - an unset field adopts the incoming value
//! - a scalar is overwritten only when the incoming value is model-extracted
//!   and the existing one came from the pattern fallback, or when the
//!   incoming confidence is strictly greater; an equal value is never rewritten
//! - a set field takes the case-insensitive union and never loses tokens; it
//!   is rewritten only when at least one token is new
//!
//! Every write stamps the turn number. Applying the same partial twice gives
//! the same profile as applying it once.

use talentscout_types::profile::{
    CandidateProfile, ExtractedValue, ExtractionResult, ExtractionSource, FieldValue, ProfileEntry,
    ProfileField,
};

/// Stateless merge of extraction results into a candidate profile.
pub struct ProfileMerger;

impl ProfileMerger {
    /// Return the profile with `partial` merged in at `turn`. Pure.
    pub fn merge(profile: &CandidateProfile, partial: &ExtractionResult, turn: u32) -> CandidateProfile {
        let mut merged = profile.clone();
        Self::apply(&mut merged, partial, turn);
        merged
    }

    /// Merge `partial` into `profile` in place, returning the fields written.
    pub fn apply(
        profile: &mut CandidateProfile,
        partial: &ExtractionResult,
        turn: u32,
    ) -> Vec<ProfileField> {
        let mut changed = Vec::new();

        for (&field, incoming) in &partial.fields {
            if incoming.value.is_empty() {
                continue;
            }

            let entry = match profile.get(field) {
                Some(existing) if !existing.value.is_empty() => {
                    match (field.is_set_valued(), &existing.value, &incoming.value) {
                        (true, FieldValue::Set(current), FieldValue::Set(tokens)) => {
                            merge_set(existing, current, tokens, incoming, turn)
                        }
                        _ => merge_scalar(existing, incoming, turn),
                    }
                }
                _ => Some(adopt(incoming, turn)),
            };

            if let Some(entry) = entry {
                tracing::debug!(
                    field = %field,
                    source = %entry.source,
                    confidence = entry.confidence,
                    turn,
                    "Profile field updated"
                );
                profile.insert(field, entry);
                changed.push(field);
            }
        }

        changed
    }
}

fn adopt(incoming: &ExtractedValue, turn: u32) -> ProfileEntry {
    ProfileEntry {
        value: incoming.value.clone(),
        confidence: incoming.confidence,
        source: incoming.source,
        last_updated_turn: turn,
    }
}

fn merge_scalar(existing: &ProfileEntry, incoming: &ExtractedValue, turn: u32) -> Option<ProfileEntry> {
    if existing.value == incoming.value {
        return None;
    }
    let upgrades_provenance = incoming.source == ExtractionSource::Llm
        && existing.source == ExtractionSource::RegexFallback;
    let more_confident = incoming.confidence > existing.confidence;

    (upgrades_provenance || more_confident).then(|| adopt(incoming, turn))
}

fn merge_set(
    existing: &ProfileEntry,
    current: &[String],
    tokens: &[String],
    incoming: &ExtractedValue,
    turn: u32,
) -> Option<ProfileEntry> {
    let added: Vec<&String> = tokens
        .iter()
        .filter(|t| !current.iter().any(|c| c.eq_ignore_ascii_case(t)))
        .collect();
    if added.is_empty() {
        return None;
    }

    let source = if existing.source == ExtractionSource::Llm || incoming.source == ExtractionSource::Llm {
        ExtractionSource::Llm
    } else {
        ExtractionSource::RegexFallback
    };

    Some(ProfileEntry {
        value: FieldValue::set_from(current.iter().chain(added)),
        confidence: existing.confidence.max(incoming.confidence),
        source,
        last_updated_turn: turn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LLM: ExtractionSource = ExtractionSource::Llm;
    const REGEX: ExtractionSource = ExtractionSource::RegexFallback;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn partial(items: Vec<(ProfileField, FieldValue, f32, ExtractionSource)>) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        for (field, value, confidence, source) in items {
            result.insert(field, value, confidence, source);
        }
        result
    }

    #[test]
    fn test_unset_field_adopted_and_stamped() {
        let profile = CandidateProfile::new();
        let merged = ProfileMerger::merge(
            &profile,
            &partial(vec![(ProfileField::Email, text("a@b.io"), 0.8, REGEX)]),
            3,
        );

        let entry = merged.get(ProfileField::Email).unwrap();
        assert_eq!(entry.value, text("a@b.io"));
        assert_eq!(entry.source, REGEX);
        assert_eq!(entry.last_updated_turn, 3);
        assert!(profile.get(ProfileField::Email).is_none());
    }

    #[test]
    fn test_llm_overrides_fallback_even_with_lower_confidence() {
        let profile = ProfileMerger::merge(
            &CandidateProfile::new(),
            &partial(vec![(ProfileField::FullName, text("Asha Rao"), 0.8, REGEX)]),
            1,
        );
        let merged = ProfileMerger::merge(
            &profile,
            &partial(vec![(ProfileField::FullName, text("Asha"), 0.5, LLM)]),
            2,
        );
        let entry = merged.get(ProfileField::FullName).unwrap();
        assert_eq!(entry.value, text("Asha"));
        assert_eq!(entry.source, LLM);
        assert_eq!(entry.last_updated_turn, 2);
    }

    #[test]
    fn test_fallback_never_overrides_llm_at_lower_confidence() {
        let profile = ProfileMerger::merge(
            &CandidateProfile::new(),
            &partial(vec![(ProfileField::Phone, text("+1 555 010 9999"), 0.9, LLM)]),
            1,
        );
        let merged = ProfileMerger::merge(
            &profile,
            &partial(vec![(ProfileField::Phone, text("555 010 1234 5"), 0.6, REGEX)]),
            2,
        );
        assert_eq!(merged, profile);
    }

    #[test]
    fn test_strictly_greater_confidence_required() {
        let profile = ProfileMerger::merge(
            &CandidateProfile::new(),
            &partial(vec![(ProfileField::Location, text("Pune"), 0.9, LLM)]),
            1,
        );

        let equal = ProfileMerger::merge(
            &profile,
            &partial(vec![(ProfileField::Location, text("Mumbai"), 0.9, LLM)]),
            2,
        );
        assert_eq!(equal.value(ProfileField::Location), Some(&text("Pune")));

        let greater = ProfileMerger::merge(
            &profile,
            &partial(vec![(ProfileField::Location, text("Mumbai"), 1.0, LLM)]),
            2,
        );
        assert_eq!(greater.value(ProfileField::Location), Some(&text("Mumbai")));
        assert_eq!(greater.get(ProfileField::Location).unwrap().last_updated_turn, 2);
    }

    #[test]
    fn test_equal_value_not_rewritten() {
        let profile = ProfileMerger::merge(
            &CandidateProfile::new(),
            &partial(vec![(ProfileField::YearsExperience, FieldValue::Years(4.0), 0.6, REGEX)]),
            1,
        );
        let mut next = profile.clone();
        let changed = ProfileMerger::apply(
            &mut next,
            &partial(vec![(ProfileField::YearsExperience, FieldValue::Years(4.0), 0.9, LLM)]),
            2,
        );
        assert!(changed.is_empty());
        assert_eq!(next.get(ProfileField::YearsExperience).unwrap().last_updated_turn, 1);
    }

    #[test]
    fn test_set_union_is_case_insensitive_and_monotonic() {
        let profile = ProfileMerger::merge(
            &CandidateProfile::new(),
            &partial(vec![(ProfileField::TechStack, FieldValue::set_from(["Go", "Postgres"]), 0.9, LLM)]),
            1,
        );

        let merged = ProfileMerger::merge(
            &profile,
            &partial(vec![(ProfileField::TechStack, FieldValue::set_from(["go", "Rust"]), 0.5, REGEX)]),
            2,
        );
        let entry = merged.get(ProfileField::TechStack).unwrap();
        assert_eq!(entry.value, FieldValue::set_from(["Go", "Postgres", "Rust"]));
        assert_eq!(entry.source, LLM);
        assert_eq!(entry.confidence, 0.9);
        assert_eq!(entry.last_updated_turn, 2);

        let unchanged = ProfileMerger::merge(
            &merged,
            &partial(vec![(ProfileField::TechStack, FieldValue::set_from(["RUST"]), 1.0, LLM)]),
            3,
        );
        assert_eq!(unchanged, merged);
    }

    #[test]
    fn test_empty_values_ignored() {
        let mut result = ExtractionResult::new();
        result.fields.insert(
            ProfileField::Location,
            ExtractedValue {
                value: text("  "),
                confidence: 1.0,
                source: LLM,
            },
        );
        let profile = ProfileMerger::merge(
            &CandidateProfile::new(),
            &partial(vec![(ProfileField::Location, text("Pune"), 0.5, REGEX)]),
            1,
        );
        assert_eq!(ProfileMerger::merge(&profile, &result, 2), profile);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let base = ProfileMerger::merge(
            &CandidateProfile::new(),
            &partial(vec![
                (ProfileField::FullName, text("Asha"), 0.4, REGEX),
                (ProfileField::TechStack, FieldValue::set_from(["Go"]), 0.5, REGEX),
                (ProfileField::Location, text("Pune"), 0.9, LLM),
            ]),
            1,
        );
        let incoming = partial(vec![
            (ProfileField::FullName, text("Asha Rao"), 0.9, LLM),
            (ProfileField::TechStack, FieldValue::set_from(["Rust", "go"]), 0.9, LLM),
            (ProfileField::Location, text("Mumbai"), 0.6, REGEX),
            (ProfileField::Email, text("asha@example.com"), 0.8, REGEX),
        ]);

        let once = ProfileMerger::merge(&base, &incoming, 2);
        let twice = ProfileMerger::merge(&once, &incoming, 2);
        assert_eq!(once, twice);

        let mut again = once.clone();
        assert!(ProfileMerger::apply(&mut again, &incoming, 3).is_empty());
    }

    #[test]
    fn test_apply_reports_changed_fields_in_field_order() {
        let mut profile = CandidateProfile::new();
        let changed = ProfileMerger::apply(
            &mut profile,
            &partial(vec![
                (ProfileField::TechStack, FieldValue::set_from(["Go"]), 0.9, LLM),
                (ProfileField::FullName, text("Asha"), 0.9, LLM),
            ]),
            1,
        );
        assert_eq!(changed, vec![ProfileField::FullName, ProfileField::TechStack]);
    }
}
