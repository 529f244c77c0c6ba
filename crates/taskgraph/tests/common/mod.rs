//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// Write snapshot content to a temporary file
pub fn snapshot_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// One JSON Lines record for a task with the given dependencies
pub fn task_line(id: &str, status: &str, deps: &[&str]) -> String {
    serde_json::json!({
        "id": id,
        "title": format!("Task {id}"),
        "status": status,
        "dependencies": deps,
    })
    .to_string()
}

/// Run the taskgraph binary against a snapshot file
pub fn run_taskgraph(snapshot: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskgraph"))
        .arg("--snapshot")
        .arg(snapshot)
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute taskgraph binary")
}
