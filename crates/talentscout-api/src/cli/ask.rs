//! Free-form generation: `tscout ask "<prompt>"`.

use anyhow::{Context, Result};
use console::style;

use talentscout_core::llm::resilient::GenerationRequest;

use crate::state::AppState;

pub async fn ask(state: &AppState, prompt: &str, attempts: Option<u32>, json: bool) -> Result<()> {
    let max_attempts = attempts.unwrap_or(state.client.policy().max_attempts);

    let spinner = (!json).then(|| super::spinner("Generating..."));
    let outcome = state
        .client
        .generate_request(&GenerationRequest::new(prompt).cached(), max_attempts)
        .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let response = outcome.context("generation failed")?;

    if json {
        let out = serde_json::json!({
            "text": response.text,
            "key_id": response.key_id,
            "latency_ms": response.latency_ms,
            "attempts": response.attempts,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!("{}", response.text.trim());
        println!();
        println!(
            "  {}",
            style(format!(
                "{} in {}ms, {} attempt(s)",
                response.key_id, response.latency_ms, response.attempts
            ))
            .dim()
        );
    }
    Ok(())
}
