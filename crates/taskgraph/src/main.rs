//! Taskgraph CLI binary.
//!
//! Exit status: 0 when clean, 1 when a cycle is found, 2 on any error
//! (including usage errors reported by clap).

use std::process::ExitCode;
use taskgraph::cli::{Cli, Outcome};
use tracing_subscriber::EnvFilter;

/// Exit status for failures, distinct from a found cycle.
const EXIT_ERROR: u8 = 2;

/// Main entry point for the taskgraph CLI.
///
/// Uses tokio's current_thread runtime: every command is one snapshot read
/// followed by in-memory graph work.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    // Example: RUST_LOG=taskgraph=debug taskgraph check a b
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskgraph=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting taskgraph CLI");

    let cli = Cli::parse_args();
    match cli.execute().await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Taskgraph CLI completed");
            match outcome {
                Outcome::Clean => ExitCode::SUCCESS,
                Outcome::CycleFound => ExitCode::from(1),
            }
        }
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
