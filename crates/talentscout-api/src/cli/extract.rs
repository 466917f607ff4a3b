//! One-shot extraction: `tscout extract "<utterance>"`.

use std::collections::BTreeSet;

use anyhow::Result;
use console::style;

use talentscout_core::extraction::engine::ExtractionEngine;
use talentscout_types::profile::{ExtractionResult, ExtractionSource};

use crate::state::AppState;

pub async fn extract(state: &AppState, utterance: &str, json: bool) -> Result<()> {
    let spinner = (!json).then(|| super::spinner("Extracting..."));
    let result = state.engine.extract(utterance, &BTreeSet::new()).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    print_result(&result, json)
}

/// Pattern-only extraction; needs no API keys.
pub fn extract_fallback_only(utterance: &str, json: bool) -> Result<()> {
    let result = ExtractionEngine::fallback_only(utterance, &BTreeSet::new());
    print_result(&result, json)
}

fn print_result(result: &ExtractionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!();
    if result.is_empty() {
        println!("  {} Nothing to extract.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    for (field, extracted) in &result.fields {
        let source = match extracted.source {
            ExtractionSource::Llm => style(extracted.source.to_string()).green(),
            ExtractionSource::RegexFallback => style(extracted.source.to_string()).yellow(),
        };
        println!(
            "  {:<22} {}  {} {}",
            style(field.as_str()).bold(),
            extracted.value,
            source,
            style(format!("{:.2}", extracted.confidence)).dim()
        );
    }
    println!();
    Ok(())
}
