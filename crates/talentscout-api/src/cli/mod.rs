//! CLI command definitions for the `tscout` binary.

pub mod ask;
pub mod chat;
pub mod extract;
pub mod keys;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Screen job candidates conversationally and build structured profiles.
#[derive(Parser)]
#[command(name = "tscout", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Path to config.toml (default: ~/.talentscout/config.toml).
    #[arg(long, global = true, env = "TALENTSCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an interactive screening session on stdin.
    Chat,

    /// Extract profile fields from a single utterance and print them.
    Extract {
        /// The candidate's message.
        utterance: String,

        /// Skip the model and use pattern matching only.
        #[arg(long)]
        fallback_only: bool,
    },

    /// Send a free-form prompt through the resilient client.
    Ask {
        /// Prompt text.
        prompt: String,

        /// Attempt budget (default: retry.max_attempts from config).
        #[arg(long)]
        attempts: Option<u32>,
    },

    /// Show the API key pool status.
    Keys {
        /// Send a tiny generation through each key first.
        #[arg(long)]
        probe: bool,
    },
}

/// Shared spinner style for model calls.
pub(crate) fn spinner(message: impl Into<std::borrow::Cow<'static, str>>) -> indicatif::ProgressBar {
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tscout", "keys", "--probe", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Keys { probe: true }));
    }

    #[test]
    fn test_extract_fallback_only_flag() {
        let cli = Cli::try_parse_from(["tscout", "extract", "I'm Asha", "--fallback-only"]).unwrap();
        match cli.command {
            Commands::Extract {
                utterance,
                fallback_only,
            } => {
                assert_eq!(utterance, "I'm Asha");
                assert!(fallback_only);
            }
            _ => panic!("expected extract"),
        }
    }
}
