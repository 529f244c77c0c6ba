//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for taskgraph using clap's
//! derive API. Every command reads a fresh snapshot of the task set.
//!
//! # Commands
//!
//! - `check`: Would adding these dependencies to a task create a cycle?
//! - `audit`: List cycles already present in the snapshot
//! - `tree`: Show the transitive dependencies of a task
//! - `ready`: Show tasks whose dependencies are all completed
//! - `blocked`: Show tasks waiting on unfinished dependencies
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--snapshot <PATH>`: Task snapshot file (JSON Lines or JSON array)
//!
//! # Example
//!
//! ```bash
//! taskgraph --snapshot tasks.jsonl check task-a task-c
//! taskgraph audit --json
//! taskgraph tree task-c --depth 2
//! ```

use crate::checker::check_circularity;
use crate::config::DEFAULT_SNAPSHOT_FILE;
use crate::domain::TaskId;
use crate::graph::SnapshotGraph;
use crate::output::{self, OutputMode};
use crate::snapshot::{FileSnapshotSource, SnapshotSource};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;

/// Taskgraph - task dependency graph analysis
///
/// Detects circular dependencies before they are saved and reports the
/// offending chain of tasks.
#[derive(Parser, Debug)]
#[command(name = "taskgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Task snapshot file (JSON Lines, or a JSON array)
    #[arg(long, global = true, default_value = DEFAULT_SNAPSHOT_FILE)]
    pub snapshot: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check whether new dependencies would create a cycle
    ///
    /// The proposed dependencies are added to the task's existing ones. The
    /// task does not need to exist yet. Exits with status 1 when a cycle
    /// would be created.
    Check(CheckArgs),

    /// List circular dependencies already in the snapshot
    ///
    /// Exits with status 1 when any cycle exists.
    Audit,

    /// Show the transitive dependencies of a task
    Tree(TreeArgs),

    /// Show tasks that are ready to work on
    Ready,

    /// Show tasks blocked by unfinished dependencies
    Blocked,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Task being edited
    #[arg(value_parser = parse_task_id)]
    pub task_id: TaskId,

    /// Proposed dependency task IDs
    #[arg(value_parser = parse_task_id)]
    pub dependencies: Vec<TaskId>,
}

/// Arguments for the tree command
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// Task whose dependencies to show
    #[arg(value_parser = parse_task_id)]
    pub task_id: TaskId,

    /// Maximum depth to traverse
    #[arg(short, long)]
    pub depth: Option<usize>,
}

/// Validate a task ID given on the command line.
fn parse_task_id(s: &str) -> std::result::Result<TaskId, String> {
    let trimmed = s.trim();
    crate::domain::validate_task_id(trimmed)?;
    Ok(TaskId::new(trimmed))
}

/// Whether a command found nothing wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No cycle found
    Clean,
    /// A cycle was found (exit status 1)
    CycleFound,
}

impl Cli {
    /// Parse CLI arguments from the environment
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded, a task is not
    /// found, or output cannot be written.
    pub async fn execute(&self) -> Result<Outcome> {
        let source = FileSnapshotSource::new(&self.snapshot);
        let snapshot = source
            .load()
            .await
            .with_context(|| format!("Failed to load snapshot {}", source.describe()))?;
        let mode = self.output_mode();

        match &self.command {
            Commands::Check(args) => {
                let result = check_circularity(&args.task_id, &args.dependencies, &snapshot.tasks)?;
                output::print_check(&args.task_id, &result, mode)?;
                Ok(if result.has_circular {
                    Outcome::CycleFound
                } else {
                    Outcome::Clean
                })
            }
            Commands::Audit => {
                let graph = SnapshotGraph::build(&snapshot.tasks);
                let cycles = graph.cycles();
                output::print_audit(&cycles, &snapshot.warnings, mode)?;
                Ok(if cycles.is_empty() {
                    Outcome::Clean
                } else {
                    Outcome::CycleFound
                })
            }
            Commands::Tree(args) => {
                let graph = SnapshotGraph::build(&snapshot.tasks);
                let root = graph
                    .get(&args.task_id)
                    .with_context(|| format!("Task not found: {}", args.task_id))?;
                let entries = graph.dependency_tree(&args.task_id, args.depth)?;
                output::write_tree(
                    &mut io::stdout().lock(),
                    root,
                    &entries,
                    |id| graph.get(id),
                    mode,
                )?;
                Ok(Outcome::Clean)
            }
            Commands::Ready => {
                let graph = SnapshotGraph::build(&snapshot.tasks);
                output::print_tasks(&graph.ready_tasks(), mode)?;
                Ok(Outcome::Clean)
            }
            Commands::Blocked => {
                let graph = SnapshotGraph::build(&snapshot.tasks);
                output::print_tasks(&graph.blocked_tasks(), mode)?;
                Ok(Outcome::Clean)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from(["taskgraph", "check", "a", "b", "c"]).unwrap();

        let Commands::Check(args) = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(args.task_id, TaskId::new("a"));
        assert_eq!(args.dependencies, vec![TaskId::new("b"), TaskId::new("c")]);
        assert_eq!(cli.snapshot, PathBuf::from(DEFAULT_SNAPSHOT_FILE));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["taskgraph", "audit", "--json", "--snapshot", "x.json"]).unwrap();

        assert!(cli.json);
        assert_eq!(cli.snapshot, PathBuf::from("x.json"));
        assert!(matches!(cli.command, Commands::Audit));
    }

    #[rstest]
    #[case(&["taskgraph", "check", " "])]
    #[case(&["taskgraph", "check", "a", ""])]
    #[case(&["taskgraph", "tree"])]
    #[case(&["taskgraph"])]
    fn test_invalid_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args.iter().copied()).is_err());
    }

    #[test]
    fn test_tree_depth() {
        let cli = Cli::try_parse_from(["taskgraph", "tree", "a", "--depth", "2"]).unwrap();
        let Commands::Tree(args) = cli.command else {
            panic!("expected tree command");
        };
        assert_eq!(args.depth, Some(2));
    }
}
