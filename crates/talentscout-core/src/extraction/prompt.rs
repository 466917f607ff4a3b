//! Prompt for the structured extraction call.

use std::collections::BTreeSet;

use talentscout_types::profile::ProfileField;

/// System prompt for the extraction call.
///
/// Asks for a single JSON object over the profile field names, filled only
/// from the current message.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You extract candidate details from one message in a job screening conversation.

Return ONLY a JSON object, no prose and no markdown, with exactly these keys:
- "full_name": string
- "email": string
- "phone": string
- "years_experience": number (total years of professional experience)
- "desired_positions": array of strings
- "location": string
- "tech_stack": array of strings (languages, frameworks, databases, tools)

Rules:
1. Use ONLY information stated in the candidate's message. Never guess or infer.
2. Use null for any key the message does not mention.
3. Keep names of technologies as the candidate wrote them (e.g. "Postgres", "Go").
4. If the candidate explicitly corrects a detail they gave earlier, give that key as
   {"value": <corrected value>, "confidence": 1.0}.

Example message: "I'm Asha, 4 years experience with Go and Postgres"
Example output:
{"full_name": "Asha", "email": null, "phone": null, "years_experience": 4, "desired_positions": null, "location": null, "tech_stack": ["Go", "Postgres"]}"#;

/// Build the user prompt for one utterance.
///
/// `known` lists the fields the profile already holds, so the model can tell
/// a correction from a first mention.
pub fn build_extraction_prompt(utterance: &str, known: &BTreeSet<ProfileField>) -> String {
    let mut prompt = String::new();
    if !known.is_empty() {
        let names: Vec<&str> = known.iter().map(ProfileField::as_str).collect();
        prompt.push_str(&format!(
            "Details already collected earlier: {}.\n\n",
            names.join(", ")
        ));
    }
    prompt.push_str("Candidate message:\n\"\"\"\n");
    prompt.push_str(utterance.trim());
    prompt.push_str("\n\"\"\"");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_known_fields() {
        let prompt = build_extraction_prompt("  I'm Asha ", &BTreeSet::new());
        assert!(!prompt.contains("already collected"));
        assert!(prompt.contains("\"\"\"\nI'm Asha\n\"\"\""));
    }

    #[test]
    fn test_prompt_lists_known_fields() {
        let known: BTreeSet<ProfileField> = [ProfileField::TechStack, ProfileField::FullName].into();
        let prompt = build_extraction_prompt("also Rust", &known);
        assert!(prompt.starts_with("Details already collected earlier: full_name, tech_stack."));
    }

    #[test]
    fn test_system_prompt_names_every_field() {
        for field in ProfileField::ALL {
            assert!(EXTRACTION_SYSTEM_PROMPT.contains(&format!("\"{}\"", field.as_str())));
        }
    }
}
