//! TalentScout screening CLI entry point.
//!
//! Binary name: `tscout`
//!
//! Loads `.env`, parses CLI arguments, sets up tracing, wires the key pool,
//! provider and extraction engine, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use state::AppState;
use talentscout_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Pattern-only extraction needs neither keys nor config.
    if let Commands::Extract {
        utterance,
        fallback_only: true,
    } = &cli.command
    {
        return cli::extract::extract_fallback_only(utterance, cli.json);
    }

    let state = AppState::init(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Chat => cli::chat::run_chat(&state, cli.json).await,
        Commands::Extract { utterance, .. } => {
            cli::extract::extract(&state, &utterance, cli.json).await
        }
        Commands::Ask { prompt, attempts } => {
            cli::ask::ask(&state, &prompt, attempts, cli.json).await
        }
        Commands::Keys { probe } => cli::keys::show_keys(&state, probe, cli.json).await,
    }
}
