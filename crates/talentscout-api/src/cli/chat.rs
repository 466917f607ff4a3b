//! Interactive screening session on stdin.
//!
//! Each line is one candidate utterance. After every turn the fields that
//! changed are printed with their source, followed by a nudge for the next
//! missing field. The session ends on EOF or an exit phrase, and prints the
//! session summary.

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use talentscout_core::session::{ScreeningSession, SessionSummary, TurnReport};
use talentscout_types::profile::{CandidateProfile, ExtractionSource, ProfileField};

use crate::state::AppState;

const EXIT_PHRASES: &[&str] = &[
    "exit interview",
    "quit screening",
    "end chat",
    "end conversation",
];

const EXIT_WORDS: &[&str] = &["bye", "goodbye", "exit", "quit", "stop"];

/// Whether the candidate asked to end the conversation.
pub fn is_exit_intent(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    let first_word = lower
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default();
    EXIT_WORDS.contains(&first_word) || EXIT_PHRASES.iter().any(|p| lower.contains(p))
}

/// Question asking for a field the profile still lacks.
pub fn question_for(field: ProfileField) -> String {
    match field {
        ProfileField::FullName => "What's your full name?".to_string(),
        ProfileField::Email => "What email address can we reach you at?".to_string(),
        ProfileField::TechStack => {
            "Which languages, frameworks and tools do you work with?".to_string()
        }
        ProfileField::YearsExperience => "How many years of experience do you have?".to_string(),
        other => format!("Could you share your {}?", other.label()),
    }
}

pub async fn run_chat(state: &AppState, json: bool) -> Result<()> {
    let mut session = ScreeningSession::new(state.engine.clone());

    if !json {
        println!();
        println!(
            "  {} TalentScout screening ({} keys, model {})",
            style("▶").cyan().bold(),
            state.client.pool().len(),
            style(&state.config.provider.model).cyan()
        );
        println!(
            "  {}",
            style("Type your answers; 'bye' or Ctrl+D ends the session.").dim()
        );
        println!();
        println!("  {}", question_for(ProfileField::FullName));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        if is_exit_intent(utterance) {
            break;
        }

        let spinner = (!json).then(|| super::spinner("Thinking..."));
        let outcome = session.process_turn(utterance).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match outcome {
            Ok(report) if json => println!("{}", serde_json::to_string(&report)?),
            Ok(report) => print_turn(&report, session.profile()),
            Err(e) => {
                tracing::debug!(error = ?e, "Turn failed");
                if json {
                    let failure = serde_json::json!({
                        "turn": session.turn(),
                        "error": e.to_string(),
                        "retry_after_ms": e.retry_after_ms(),
                    });
                    println!("{failure}");
                } else {
                    let hint = e
                        .retry_after_ms()
                        .map(|ms| format!(" (keys recover in ~{}s)", ms.div_ceil(1000)))
                        .unwrap_or_default();
                    println!(
                        "  {} Could not process this turn{hint}. Please try again.",
                        style("!").yellow().bold()
                    );
                    println!();
                }
            }
        }

        if session.profile().is_complete() {
            break;
        }
    }

    let summary = session.summary();
    if json {
        let out = serde_json::json!({
            "summary": summary,
            "profile": session.profile().to_value_map(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_summary(&summary, session.profile());
    }
    Ok(())
}

fn print_turn(report: &TurnReport, profile: &CandidateProfile) {
    for change in &report.changes {
        let source = match change.source {
            ExtractionSource::Llm => style("model").green(),
            ExtractionSource::RegexFallback => style("pattern").yellow(),
        };
        println!(
            "  {} {}: {} {}",
            style("✓").green(),
            style(change.field.label()).bold(),
            change.value,
            style(format!("({source}, {:.0}%)", change.confidence * 100.0)).dim()
        );
    }

    if let Some(next) = profile.missing_fields().first() {
        println!();
        println!("  {}", question_for(*next));
    }
    println!();
}

fn print_summary(summary: &SessionSummary, profile: &CandidateProfile) {
    println!();
    println!("  {}", style("Session summary").bold());
    println!();
    for field in ProfileField::ALL {
        let value = profile
            .value(field)
            .map(|v| v.to_string())
            .unwrap_or_else(|| style("-").dim().to_string());
        println!("  {:<20} {}", style(field.label()).dim(), value);
    }
    println!();
    println!(
        "  {:<20} {}%",
        style("completion").dim(),
        summary.completion_percentage
    );
    println!("  {:<20} {}", style("difficulty").dim(), summary.difficulty);
    for (category, tokens) in &summary.tech_by_category {
        println!(
            "  {:<20} {}",
            style(category.to_string()).dim(),
            tokens.join(", ")
        );
    }
    println!(
        "  {:<20} {} ({} failed) in {}s",
        style("turns").dim(),
        summary.turns,
        summary.failed_turns,
        summary.duration_secs
    );
    if !summary.missing_fields.is_empty() {
        let missing: Vec<&str> = summary.missing_fields.iter().map(|f| f.label()).collect();
        println!("  {:<20} {}", style("missing").dim(), missing.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_intent() {
        assert!(is_exit_intent("bye"));
        assert!(is_exit_intent("Goodbye, thanks!"));
        assert!(is_exit_intent("  QUIT "));
        assert!(is_exit_intent("can we end conversation now"));
        assert!(!is_exit_intent("I stopped using PHP"));
        assert!(!is_exit_intent("my exit strategy is Rust"));
        assert!(!is_exit_intent("I'm Asha"));
    }

    #[test]
    fn test_questions_cover_every_field() {
        for field in ProfileField::ALL {
            assert!(question_for(field).ends_with('?'));
        }
        assert_eq!(
            question_for(ProfileField::Location),
            "Could you share your location?"
        );
    }
}
