//! Key pool status: `tscout keys [--probe]`.
//!
//! Without `--probe` every key shows as healthy (pool state is in-memory and
//! starts fresh per process); probing sends a tiny generation through each
//! key so the table reflects what the provider says right now.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use talentscout_types::key::{KeyStatus, KeyStatusInfo};

use crate::state::AppState;

pub async fn show_keys(state: &AppState, probe: bool, json: bool) -> Result<()> {
    let mut probe_errors = Vec::new();
    if probe {
        let spinner = (!json).then(|| super::spinner("Probing keys..."));
        for outcome in state.client.probe().await {
            if let Err(e) = outcome.result {
                probe_errors.push((outcome.key_id, e.to_string()));
            }
        }
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
    }

    let statuses = state.client.pool().status();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} ({} of {} available)",
        style("API Key Pool").bold(),
        state.client.pool().available_count(),
        statuses.len()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Cooldown").fg(Color::White),
        Cell::new("Latency").fg(Color::White),
        Cell::new("Calls").fg(Color::White),
        Cell::new("Failures").fg(Color::White),
        Cell::new("Last Error").fg(Color::White),
    ]);

    for info in &statuses {
        table.add_row(vec![
            Cell::new(&info.id),
            status_cell(info.status),
            Cell::new(format_cooldown(info)),
            Cell::new(
                info.last_latency_ms
                    .map(|ms| format!("{ms}ms"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(info.total_calls),
            Cell::new(info.total_failures),
            Cell::new(truncate(info.last_error.as_deref().unwrap_or("-"), 40)),
        ]);
    }

    println!("{table}");

    for (key_id, error) in &probe_errors {
        println!("  {} {key_id}: {error}", style("✗").red());
    }
    println!();
    Ok(())
}

fn status_cell(status: KeyStatus) -> Cell {
    match status {
        KeyStatus::Healthy => Cell::new("healthy").fg(Color::Green),
        KeyStatus::Exhausted => Cell::new("exhausted").fg(Color::Yellow),
        KeyStatus::Failed => Cell::new("FAILED").fg(Color::Red),
    }
}

fn format_cooldown(info: &KeyStatusInfo) -> String {
    match info.cooldown_remaining_ms {
        Some(ms) => format!("{}s", ms.div_ceil(1000)),
        None => "-".to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
