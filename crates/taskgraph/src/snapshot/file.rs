//! File-backed snapshots.
//!
//! Two formats are accepted:
//! - **JSON Lines**: one task object per line (blank lines ignored)
//! - **JSON array**: a single array of task objects, as returned by the
//!   dashboard's `GET /tasks` endpoint (detected by a leading `[`)
//!
//! Loading is resilient: a record without a usable id is skipped, a record
//! with other bad fields is kept with defaults, and both are reported as a
//! [`LoadWarning`] while the rest of the file still loads. Only failures that
//! affect the whole file (unreadable file, malformed top-level array) are
//! errors.

use super::{Snapshot, SnapshotSource};
use crate::domain::{parse_due_date, Task, TaskId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Non-fatal problems found while loading a snapshot file.
///
/// `line_number` is the 1-based line for JSON Lines files and the 1-based
/// element position for JSON arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A record could not be parsed as a task.
    ///
    /// **Effect**: the record is skipped.
    MalformedJson {
        /// Where the record is
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// A record has a blank id.
    ///
    /// **Effect**: the record is skipped.
    InvalidTask {
        /// Id of the rejected task (may be blank)
        task_id: TaskId,
        /// Where the record is
        line_number: usize,
        /// Validation message
        error: String,
    },

    /// A task has an id but some other field is missing or unreadable
    /// (unknown status, bad due date, blank title or dependency id).
    ///
    /// **Effect**: the task is kept; unreadable fields take their defaults.
    IncompleteTask {
        /// Id of the kept task
        task_id: TaskId,
        /// Where the record is
        line_number: usize,
        /// What was wrong
        error: String,
    },

    /// A task id was already seen earlier in the file.
    ///
    /// **Effect**: the later record is skipped; the first one wins.
    DuplicateTask {
        /// The repeated id
        task_id: TaskId,
        /// Where the repeated record is
        line_number: usize,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed task: {error}")
            }
            Self::InvalidTask {
                task_id,
                line_number,
                error,
            } => write!(f, "line {line_number}: invalid task '{task_id}': {error}"),
            Self::IncompleteTask {
                task_id,
                line_number,
                error,
            } => write!(
                f,
                "line {line_number}: task '{task_id}' kept with defaults: {error}"
            ),
            Self::DuplicateTask {
                task_id,
                line_number,
            } => write!(f, "line {line_number}: duplicate task '{task_id}' skipped"),
        }
    }
}

/// Fields that must parse for a record to take part in the graph.
#[derive(Deserialize)]
struct TaskSkeleton {
    #[serde(alias = "_id")]
    id: TaskId,
    #[serde(default, deserialize_with = "crate::domain::deserialize_dependencies")]
    dependencies: Vec<TaskId>,
}

fn optional_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Rebuild a task whose record failed strict parsing, keeping the id and
/// edges and defaulting whatever else is unreadable.
fn salvage_task(value: &Value) -> std::result::Result<Task, String> {
    let skeleton = TaskSkeleton::deserialize(value).map_err(|e| e.to_string())?;

    let mut task = Task::new(skeleton.id, optional_str(value, "title").unwrap_or_default())
        .with_dependencies(skeleton.dependencies)
        .with_status(
            value
                .get("status")
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_default(),
        );
    task.description = optional_str(value, "description");
    task.assignee = optional_str(value, "assignee");
    task.due_date = optional_str(value, "dueDate")
        .or_else(|| optional_str(value, "due_date"))
        .and_then(|raw| parse_due_date(&raw).ok());
    Ok(task)
}

/// Parse snapshot file contents.
///
/// A record is only skipped when it is not JSON or has no usable id. Other
/// problems (unknown status, unreadable due date, blank title) keep the task
/// with defaults and produce a [`LoadWarning::IncompleteTask`], so its
/// dependency edges still count.
///
/// # Errors
///
/// Returns `Error::Json` if the content is a JSON array that cannot be parsed
/// as a whole.
pub fn parse_tasks(content: &str) -> Result<(Vec<Task>, Vec<LoadWarning>)> {
    let records: Vec<(usize, std::result::Result<Value, String>)> =
        if content.trim_start().starts_with('[') {
            let values: Vec<Value> = serde_json::from_str(content)?;
            values
                .into_iter()
                .enumerate()
                .map(|(index, value)| (index + 1, Ok(value)))
                .collect()
        } else {
            content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(index, line)| {
                    (
                        index + 1,
                        serde_json::from_str(line).map_err(|e| e.to_string()),
                    )
                })
                .collect()
        };

    let mut tasks = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();
    let mut seen: HashSet<TaskId> = HashSet::with_capacity(records.len());

    for (line_number, record) in records {
        let value = match record {
            Ok(value) => value,
            Err(error) => {
                warnings.push(LoadWarning::MalformedJson { line_number, error });
                continue;
            }
        };

        let (task, parse_error) = match Task::deserialize(&value) {
            Ok(task) => (task, None),
            Err(strict) => match salvage_task(&value) {
                Ok(task) => (task, Some(strict.to_string())),
                Err(error) => {
                    warnings.push(LoadWarning::MalformedJson { line_number, error });
                    continue;
                }
            },
        };

        if let Err(error) = task.id.validate() {
            warnings.push(LoadWarning::InvalidTask {
                task_id: task.id,
                line_number,
                error,
            });
            continue;
        }

        if !seen.insert(task.id.clone()) {
            warnings.push(LoadWarning::DuplicateTask {
                task_id: task.id,
                line_number,
            });
            continue;
        }

        if let Some(error) = parse_error.or_else(|| task.validate().err()) {
            warnings.push(LoadWarning::IncompleteTask {
                task_id: task.id.clone(),
                line_number,
                error,
            });
        }

        tasks.push(task);
    }

    Ok((tasks, warnings))
}

/// Load tasks from a snapshot file.
///
/// # Errors
///
/// Returns `Error::Snapshot` if the file cannot be read or its top-level
/// structure is malformed.
pub async fn load_tasks_from_file(path: &Path) -> Result<(Vec<Task>, Vec<LoadWarning>)> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    parse_tasks(&content).map_err(|e| Error::Snapshot {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Snapshot source that re-reads a file on every load.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    /// Create a source for the given file. The file is not read until
    /// [`SnapshotSource::load`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn load(&self) -> Result<Snapshot> {
        let (tasks, warnings) = load_tasks_from_file(&self.path).await?;

        for warning in &warnings {
            warn!(path = %self.path.display(), "{warning}");
        }
        debug!(
            path = %self.path.display(),
            tasks = tasks.len(),
            warnings = warnings.len(),
            "Loaded snapshot"
        );

        Ok(Snapshot { tasks, warnings })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
