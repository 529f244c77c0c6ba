//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.

use crate::checker::{CycleCheck, describe_path};
use crate::domain::{Task, TaskId, TaskStatus};
use crate::snapshot::LoadWarning;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

// ============================================================================
// Color Helpers
// ============================================================================

/// Apply color to status text based on task status.
fn colorize_status(status: TaskStatus) -> String {
    let text = status.to_string();
    match status {
        TaskStatus::Pending | TaskStatus::NotStarted => text.white().to_string(),
        TaskStatus::InProgress => text.yellow().to_string(),
        TaskStatus::Completed => text.green().to_string(),
    }
}

/// Colorize a task ID (cyan).
fn colorize_id(id: &TaskId) -> String {
    id.as_str().cyan().to_string()
}

/// Get a colored status icon.
fn colored_status_icon(status: TaskStatus) -> String {
    match status {
        TaskStatus::Pending | TaskStatus::NotStarted => "○".white().to_string(),
        TaskStatus::InProgress => "▶".yellow().to_string(),
        TaskStatus::Completed => "✓".green().to_string(),
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)
}

// ============================================================================
// Check
// ============================================================================

/// Write the result of a circular dependency check
pub fn write_check<W: Write>(
    w: &mut W,
    task_id: &TaskId,
    result: &CycleCheck,
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Json => write_json(w, result),
        OutputMode::Text => match result.describe() {
            Some(chain) => writeln!(
                w,
                "{} circular dependency for {}: {}",
                "✗".red(),
                colorize_id(task_id),
                chain.red().bold()
            ),
            None => writeln!(
                w,
                "{} no circular dependency for {}",
                "✓".green(),
                colorize_id(task_id)
            ),
        },
    }
}

/// Print the result of a circular dependency check
pub fn print_check(task_id: &TaskId, result: &CycleCheck, mode: OutputMode) -> io::Result<()> {
    write_check(&mut io::stdout().lock(), task_id, result, mode)
}

// ============================================================================
// Audit
// ============================================================================

#[derive(Serialize)]
struct AuditReport<'a> {
    acyclic: bool,
    cycles: &'a [Vec<TaskId>],
    warnings: Vec<String>,
}

/// Write the result of a snapshot audit
pub fn write_audit<W: Write>(
    w: &mut W,
    cycles: &[Vec<TaskId>],
    warnings: &[LoadWarning],
    mode: OutputMode,
) -> io::Result<()> {
    if mode == OutputMode::Json {
        return write_json(
            w,
            &AuditReport {
                acyclic: cycles.is_empty(),
                cycles,
                warnings: warnings.iter().map(ToString::to_string).collect(),
            },
        );
    }

    for warning in warnings {
        writeln!(w, "{} {}", "warning:".yellow(), warning)?;
    }

    if cycles.is_empty() {
        return writeln!(w, "{} no circular dependencies", "✓".green());
    }

    writeln!(
        w,
        "{} {} circular dependenc{} found:",
        "✗".red(),
        cycles.len(),
        if cycles.len() == 1 { "y" } else { "ies" }
    )?;
    for cycle in cycles {
        writeln!(w, "  {}", describe_path(cycle).red())?;
    }
    Ok(())
}

/// Print the result of a snapshot audit
pub fn print_audit(
    cycles: &[Vec<TaskId>],
    warnings: &[LoadWarning],
    mode: OutputMode,
) -> io::Result<()> {
    write_audit(&mut io::stdout().lock(), cycles, warnings, mode)
}

// ============================================================================
// Tree
// ============================================================================

#[derive(Serialize)]
struct TreeEntry<'a> {
    id: &'a TaskId,
    depth: usize,
    title: Option<&'a str>,
    status: Option<TaskStatus>,
}

/// Write a dependency tree. `lookup` resolves ids to tasks; unresolved ids
/// are shown as missing.
pub fn write_tree<'a, W, F>(
    w: &mut W,
    root: &Task,
    entries: &[(&'a TaskId, usize)],
    lookup: F,
    mode: OutputMode,
) -> io::Result<()>
where
    W: Write,
    F: Fn(&TaskId) -> Option<&'a Task>,
{
    if mode == OutputMode::Json {
        let rows: Vec<TreeEntry<'_>> = entries
            .iter()
            .map(|(id, depth)| {
                let task = lookup(*id);
                TreeEntry {
                    id: *id,
                    depth: *depth,
                    title: task.map(|t| t.title.as_str()),
                    status: task.map(|t| t.status),
                }
            })
            .collect();
        return write_json(w, &rows);
    }

    writeln!(
        w,
        "{} {} {}",
        colored_status_icon(root.status),
        colorize_id(&root.id),
        root.title.bold()
    )?;
    for (id, depth) in entries {
        let indent = "  ".repeat(*depth);
        match lookup(*id) {
            Some(task) => writeln!(
                w,
                "{indent}{} {} {} [{}]",
                colored_status_icon(task.status),
                colorize_id(id),
                task.title,
                colorize_status(task.status)
            )?,
            None => writeln!(w, "{indent}? {} {}", colorize_id(id), "(missing)".dimmed())?,
        }
    }
    Ok(())
}

// ============================================================================
// Task lists
// ============================================================================

/// Write a list of tasks
pub fn write_tasks<W: Write>(w: &mut W, tasks: &[&Task], mode: OutputMode) -> io::Result<()> {
    if mode == OutputMode::Json {
        return write_json(w, tasks);
    }

    if tasks.is_empty() {
        return writeln!(w, "No tasks found.");
    }

    for task in tasks {
        writeln!(
            w,
            "{} {} {} [{}]",
            colored_status_icon(task.status),
            colorize_id(&task.id),
            task.title,
            colorize_status(task.status)
        )?;
    }
    Ok(())
}

/// Print a list of tasks
pub fn print_tasks(tasks: &[&Task], mode: OutputMode) -> io::Result<()> {
    write_tasks(&mut io::stdout().lock(), tasks, mode)
}
