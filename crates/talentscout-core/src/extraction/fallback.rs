//! Deterministic pattern extraction.
//!
//! Runs after the model-based pass and only fills fields that pass left
//! empty. Every value it produces is tagged `RegexFallback` with a confidence
//! below any model-extracted value.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use talentscout_types::profile::{ExtractionResult, ExtractionSource, FieldValue, ProfileField};

use super::validate::{is_valid_name, is_valid_phone, parse_years};
use super::vocabulary::find_tech_terms;

pub const EMAIL_CONFIDENCE: f32 = 0.8;
pub const INTRO_NAME_CONFIDENCE: f32 = 0.6;
pub const PHONE_CONFIDENCE: f32 = 0.6;
pub const YEARS_CONFIDENCE: f32 = 0.6;
pub const TECH_CONFIDENCE: f32 = 0.5;
pub const BARE_NAME_CONFIDENCE: f32 = 0.4;
pub const CONTEXT_CONFIDENCE: f32 = 0.3;

/// Longest reply the context heuristic will take as a whole answer.
const CONTEXT_MAX_WORDS: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)*\.[A-Za-z]{2,}").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d\s().-]{8,}\d").expect("valid phone regex"));

/// "4 years", "5+ yrs", "2.5 years"; group 2 catches "years old".
static YEARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?\s*\+?)\s*(?:years?|yrs?)\b(\s+old\b)?")
        .expect("valid years regex")
});

/// "my name is asha rao", "call me Asha".
static NAME_IS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\bmy name is|\bcall me|\bname's)\s+([A-Za-z][A-Za-z'-]+(?:\s+[A-Za-z][A-Za-z'-]+){0,2})")
        .expect("valid name regex")
});

/// "I'm Asha", "I am Asha Rao", "this is Asha": capitalised words only.
static SELF_INTRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\bi'm|\bi am|\bthis is|\bit's)\s+([A-Z][A-Za-z'-]+(?:\s+[A-Z][A-Za-z'-]+){0,2})")
        .expect("valid self-intro regex")
});

/// Lead-ins stripped from a reply to "which role are you after?".
static POSITION_LEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:i am|i'm|looking for|interested in|apply for|wanted to be a|an|a)\s+)+")
        .expect("valid position lead-in regex")
});

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+$|\d+\s*(?:year|yr)").expect("valid numeric regex")
});

const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "good", "morning", "afternoon", "evening", "dear", "sir", "madam",
];

/// Words that disqualify a short reply or an introduction from being a name.
const NOT_NAME_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "also", "am", "is", "are", "i", "me", "my", "you", "it",
    "yes", "no", "ok", "okay", "sure", "thanks", "thank", "fine", "great", "nothing", "none",
    "maybe", "know", "not", "please", "help", "bye", "what", "why", "how", "who", "from",
    "in", "at", "here", "looking", "interested", "currently", "working", "based", "available",
    "very", "just", "new", "experienced", "senior", "junior", "fresher", "developer",
    "engineer", "student",
];

fn is_disqualified_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    GREETINGS.contains(&lower.as_str()) || NOT_NAME_WORDS.contains(&lower.as_str())
}

/// Upper-case the first letter of each word, lower-case the rest.
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Keep the leading run of words that could be part of a name.
fn trim_name_candidate(candidate: &str) -> Option<String> {
    let words: Vec<&str> = candidate
        .split_whitespace()
        .take_while(|w| !is_disqualified_word(w))
        .collect();
    if words.is_empty() {
        return None;
    }
    let name = words.join(" ");
    if !is_valid_name(&name) || !find_tech_terms(&name).is_empty() {
        return None;
    }
    Some(name)
}

pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn find_phone(text: &str) -> Option<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .find(|candidate| is_valid_phone(candidate))
}

pub fn find_years(text: &str) -> Option<f32> {
    YEARS_RE
        .captures_iter(text)
        .filter(|caps| caps.get(2).is_none())
        .find_map(|caps| parse_years(caps.get(1)?.as_str()))
}

/// A name introduced explicitly ("my name is ...", "I'm ...").
pub fn find_introduced_name(text: &str) -> Option<String> {
    [&*NAME_IS_RE, &*SELF_INTRO_RE]
        .into_iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| trim_name_candidate(caps.get(1)?.as_str()))
        .map(|name| title_case(&name))
}

/// A short reply that is plausibly just a name, e.g. "asha rao".
///
/// One to three alphabetic words of two or more letters, none of them a
/// greeting, a filler word, or a technology.
pub fn bare_name(text: &str) -> Option<String> {
    let text = text.trim().trim_end_matches(['.', '!']);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words.len() > 3 {
        return None;
    }
    let plausible = words.iter().all(|w| {
        w.chars().count() >= 2 && w.chars().all(char::is_alphabetic) && !is_disqualified_word(w)
    });
    if !plausible || !find_tech_terms(text).is_empty() {
        return None;
    }
    Some(title_case(&words.join(" ")))
}

/// A short reply taken as the answer to the question for `next`.
///
/// Only desired positions and location are answered this way; anything with
/// a bare number or a years figure is left alone.
pub fn contextual_answer(text: &str, next: ProfileField) -> Option<FieldValue> {
    let text = text.trim();
    let words = text.split_whitespace().count();
    if words == 0 || words > CONTEXT_MAX_WORDS || NUMERIC_RE.is_match(text) {
        return None;
    }
    let strip = |s: &str| s.trim().trim_matches(['"', '.']).trim().to_string();
    match next {
        ProfileField::DesiredPositions => {
            let position = strip(&POSITION_LEAD_RE.replace(text, ""));
            (!position.is_empty()).then(|| FieldValue::set_from([position]))
        }
        ProfileField::Location => {
            let location = strip(text);
            (!location.is_empty()).then_some(FieldValue::Text(location))
        }
        _ => None,
    }
}

/// Fill fields missing from `result` using the pattern matchers.
///
/// Never touches a field `result` already holds. The bare-name heuristic only
/// runs while the profile has no name yet (`known` lacks `FullName`). When
/// nothing at all was extracted, a short reply is taken as the answer for the
/// next field the screening collects.
pub fn fill_missing(
    utterance: &str,
    result: &mut ExtractionResult,
    known: &BTreeSet<ProfileField>,
) {
    let source = ExtractionSource::RegexFallback;

    if !result.contains(ProfileField::Email) {
        if let Some(email) = find_email(utterance) {
            result.insert(ProfileField::Email, FieldValue::Text(email), EMAIL_CONFIDENCE, source);
        }
    }

    if !result.contains(ProfileField::Phone) {
        if let Some(phone) = find_phone(utterance) {
            result.insert(ProfileField::Phone, FieldValue::Text(phone), PHONE_CONFIDENCE, source);
        }
    }

    if !result.contains(ProfileField::YearsExperience) {
        if let Some(years) = find_years(utterance) {
            result.insert(
                ProfileField::YearsExperience,
                FieldValue::Years(years),
                YEARS_CONFIDENCE,
                source,
            );
        }
    }

    if !result.contains(ProfileField::TechStack) {
        let terms = find_tech_terms(utterance);
        if !terms.is_empty() {
            result.insert(
                ProfileField::TechStack,
                FieldValue::set_from(terms.iter().map(|t| t.name)),
                TECH_CONFIDENCE,
                source,
            );
        }
    }

    if !result.contains(ProfileField::FullName) {
        let name = find_introduced_name(utterance)
            .map(|n| (n, INTRO_NAME_CONFIDENCE))
            .or_else(|| {
                if known.contains(&ProfileField::FullName) {
                    None
                } else {
                    bare_name(utterance).map(|n| (n, BARE_NAME_CONFIDENCE))
                }
            });
        if let Some((name, confidence)) = name {
            result.insert(ProfileField::FullName, FieldValue::Text(name), confidence, source);
        }
    }

    if result.is_empty() {
        let next = ProfileField::missing_from(known).into_iter().next();
        if let Some((field, value)) =
            next.and_then(|field| contextual_answer(utterance, field).map(|v| (field, v)))
        {
            result.insert(field, value, CONTEXT_CONFIDENCE, source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(utterance: &str) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        fill_missing(utterance, &mut result, &BTreeSet::new());
        result
    }

    fn text(result: &ExtractionResult, field: ProfileField) -> Option<String> {
        result.get(field).map(|v| v.value.to_string())
    }

    #[test]
    fn test_email_and_phone() {
        let result = run("Reach me at asha.rao@example.com or +91 98765 43210.");
        assert_eq!(
            text(&result, ProfileField::Email).as_deref(),
            Some("asha.rao@example.com")
        );
        assert_eq!(
            text(&result, ProfileField::Phone).as_deref(),
            Some("+91 98765 43210")
        );
        assert!(
            result
                .fields
                .values()
                .all(|v| v.source == ExtractionSource::RegexFallback)
        );
    }

    #[test]
    fn test_short_digit_runs_are_not_phones() {
        assert_eq!(find_phone("I have 4 years and 12 projects"), None);
    }

    #[test]
    fn test_years_patterns() {
        assert_eq!(find_years("4 years experience"), Some(4.0));
        assert_eq!(find_years("about 5+ yrs in backend"), Some(5.0));
        assert_eq!(find_years("2.5 Years"), Some(2.5));
        assert_eq!(find_years("I am 25 years old"), None);
        assert_eq!(find_years("I am 25 years old with 3 years of Go"), Some(3.0));
    }

    #[test]
    fn test_introduced_names() {
        assert_eq!(
            find_introduced_name("I'm Asha, 4 years experience with Go").as_deref(),
            Some("Asha")
        );
        assert_eq!(
            find_introduced_name("hello, my name is asha rao").as_deref(),
            Some("Asha Rao")
        );
        assert_eq!(find_introduced_name("I am a backend developer"), None);
        assert_eq!(find_introduced_name("I'm Looking for roles"), None);
        assert_eq!(find_introduced_name("I am Python developer"), None);
    }

    #[test]
    fn test_bare_name_heuristic() {
        assert_eq!(bare_name("asha rao").as_deref(), Some("Asha Rao"));
        assert_eq!(bare_name("Asha.").as_deref(), Some("Asha"));
        assert_eq!(bare_name("good morning"), None);
        assert_eq!(bare_name("also know Rust"), None);
        assert_eq!(bare_name("yes"), None);
        assert_eq!(bare_name("a"), None);
        assert_eq!(bare_name("I have four years"), None);
        assert_eq!(bare_name("R2D2"), None);
    }

    #[test]
    fn test_bare_name_skipped_when_name_known() {
        let known: BTreeSet<ProfileField> = [ProfileField::FullName].into();
        let mut result = ExtractionResult::new();
        fill_missing("Pune", &mut result, &known);
        assert!(!result.contains(ProfileField::FullName));
    }

    #[test]
    fn test_never_overwrites_existing_fields() {
        let mut result = ExtractionResult::new();
        result.insert(
            ProfileField::TechStack,
            FieldValue::set_from(["Go"]),
            0.9,
            ExtractionSource::Llm,
        );
        fill_missing("also know Rust", &mut result, &BTreeSet::new());

        let stack = result.get(ProfileField::TechStack).unwrap();
        assert_eq!(stack.source, ExtractionSource::Llm);
        assert_eq!(stack.value, FieldValue::set_from(["Go"]));
    }

    #[test]
    fn test_tech_terms_collected() {
        let result = run("also know Rust and some Kubernetes");
        let stack = result.get(ProfileField::TechStack).unwrap();
        assert_eq!(stack.value, FieldValue::set_from(["Rust", "Kubernetes"]));
        assert_eq!(stack.confidence, TECH_CONFIDENCE);
    }

    #[test]
    fn test_lowercase_tech_stack() {
        let result = run("i know react, swift and go");
        let stack = result.get(ProfileField::TechStack).unwrap();
        assert_eq!(stack.value, FieldValue::set_from(["React", "Swift", "Go"]));
    }

    fn answering(utterance: &str, known: &[ProfileField]) -> ExtractionResult {
        let known: BTreeSet<ProfileField> = known.iter().copied().collect();
        let mut result = ExtractionResult::new();
        fill_missing(utterance, &mut result, &known);
        result
    }

    const CONTACT_STACK_YEARS: [ProfileField; 5] = [
        ProfileField::FullName,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::TechStack,
        ProfileField::YearsExperience,
    ];

    #[test]
    fn test_short_reply_answers_desired_positions() {
        let result = answering("Backend Developer", &CONTACT_STACK_YEARS);
        let positions = result.get(ProfileField::DesiredPositions).unwrap();
        assert_eq!(positions.value, FieldValue::set_from(["Backend Developer"]));
        assert_eq!(positions.source, ExtractionSource::RegexFallback);
        assert!(positions.confidence < BARE_NAME_CONFIDENCE);
        assert_eq!(result.len(), 1);

        let result = answering("looking for a Data Engineer.", &CONTACT_STACK_YEARS);
        assert_eq!(
            result.get(ProfileField::DesiredPositions).unwrap().value,
            FieldValue::set_from(["Data Engineer"])
        );
    }

    #[test]
    fn test_short_reply_answers_location() {
        let mut known = CONTACT_STACK_YEARS.to_vec();
        known.push(ProfileField::DesiredPositions);
        let result = answering("Bangalore, India", &known);
        let location = result.get(ProfileField::Location).unwrap();
        assert_eq!(location.value, FieldValue::Text("Bangalore, India".into()));
        assert_eq!(location.confidence, CONTEXT_CONFIDENCE);
        assert!(!result.contains(ProfileField::DesiredPositions));
    }

    #[test]
    fn test_context_answer_guards() {
        let position = ProfileField::DesiredPositions;
        assert_eq!(contextual_answer("4 years", position), None);
        assert_eq!(contextual_answer("42", position), None);
        assert_eq!(
            contextual_answer("well I have been thinking about many things lately", position),
            None
        );
        assert_eq!(contextual_answer("Bangalore", ProfileField::Email), None);

        // A years figure is extracted as years, never as a position.
        let result = answering("4 years", &CONTACT_STACK_YEARS[..4]);
        assert!(result.contains(ProfileField::YearsExperience));
        assert!(!result.contains(ProfileField::DesiredPositions));

        // Anything else extracted in the pass wins over the context guess.
        let result = answering("Rust Developer", &CONTACT_STACK_YEARS);
        assert!(result.contains(ProfileField::TechStack));
        assert!(!result.contains(ProfileField::DesiredPositions));

        // Required fields are never guessed from context.
        assert!(answering("Bangalore", &[ProfileField::FullName]).is_empty());
    }

    #[test]
    fn test_unstructured_text_yields_nothing() {
        assert!(run("hmm, let me think about that for a second").is_empty());
    }
}
