//! Domain types for task dependency tracking.
//!
//! This module contains the core domain types: tasks, their identifiers and
//! statuses. Dependencies are stored on the dependent task as an ordered list
//! of the task ids it depends on.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new task ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the ID is usable as a graph node.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the ID is empty or whitespace.
    pub fn validate(&self) -> Result<(), String> {
        validate_task_id(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Validate a raw task ID.
///
/// # Errors
///
/// Returns a description of the problem if the ID is empty or whitespace.
pub fn validate_task_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("Task ID cannot be empty".to_string());
    }
    Ok(())
}

/// Status of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Waiting to be picked up
    #[default]
    Pending,

    /// Not started yet (older records use this instead of `pending`)
    #[serde(alias = "not_started")]
    NotStarted,

    /// Currently being worked on
    #[serde(alias = "in_progress")]
    InProgress,

    /// Finished
    Completed,
}

impl TaskStatus {
    /// Wire representation of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "not-started" | "not_started" => Ok(Self::NotStarted),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "Invalid status '{other}'. Valid values: pending, not-started, in-progress, completed"
            )),
        }
    }
}

/// A task in the dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for the task
    #[serde(alias = "_id")]
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Task description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Assignee (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Due date (optional)
    #[serde(
        default,
        alias = "dueDate",
        deserialize_with = "deserialize_due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,

    /// Tasks that must complete before this one, in declared order
    #[serde(default, deserialize_with = "deserialize_dependencies")]
    pub dependencies: Vec<TaskId>,
}

impl Task {
    /// Create a pending task with no dependencies
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::Pending,
            assignee: None,
            due_date: None,
            dependencies: Vec::new(),
        }
    }

    /// Replace the dependency list
    #[must_use]
    pub fn with_dependencies<I, T>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the status
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Validate task data.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found: a blank ID, a blank
    /// title, or a blank dependency ID.
    pub fn validate(&self) -> Result<(), String> {
        self.id.validate()?;

        if self.title.trim().is_empty() {
            return Err(format!("Task {} has an empty title", self.id));
        }

        if self.dependencies.iter().any(|dep| dep.validate().is_err()) {
            return Err(format!("Task {} has an empty dependency ID", self.id));
        }

        Ok(())
    }
}

/// A dependency as it appears on the wire: either a bare ID or a populated
/// task object carrying its ID.
#[derive(Deserialize)]
#[serde(untagged)]
enum DependencyRef {
    Id(TaskId),
    Populated {
        #[serde(alias = "_id")]
        id: TaskId,
    },
}

impl DependencyRef {
    fn into_id(self) -> TaskId {
        match self {
            Self::Id(id) | Self::Populated { id } => id,
        }
    }
}

/// Parse a due date given either as an RFC 3339 timestamp or as a bare
/// `YYYY-MM-DD` date (taken as midnight UTC).
///
/// # Errors
///
/// Returns a description of the problem if neither form matches.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("Invalid due date '{raw}'"))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            parse_due_date(&raw).map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

pub(crate) fn deserialize_dependencies<'de, D>(deserializer: D) -> Result<Vec<TaskId>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Vec::<DependencyRef>::deserialize(deserializer)?;
    Ok(refs.into_iter().map(DependencyRef::into_id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pending", TaskStatus::Pending)]
    #[case("in-progress", TaskStatus::InProgress)]
    #[case("in_progress", TaskStatus::InProgress)]
    #[case("not-started", TaskStatus::NotStarted)]
    #[case("completed", TaskStatus::Completed)]
    fn test_status_from_str(#[case] input: &str, #[case] expected: TaskStatus) {
        assert_eq!(input.parse::<TaskStatus>().unwrap(), expected);
    }

    #[test]
    fn test_status_from_str_rejects_unknown() {
        let err = "done".parse::<TaskStatus>().unwrap_err();
        assert!(err.contains("Invalid status 'done'"));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_task_accepts_mongo_style_ids() {
        let json = r#"{"_id":"t1","title":"Write docs","status":"in-progress","dependencies":["t0"]}"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.id, TaskId::new("t1"));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.dependencies, vec![TaskId::new("t0")]);
    }

    #[test]
    fn test_task_accepts_populated_dependencies() {
        let json = r#"{
            "id": "t3",
            "title": "Ship",
            "dependencies": [{"_id": "t1", "title": "Build"}, "t2", {"id": "t0"}]
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(
            task.dependencies,
            vec![TaskId::new("t1"), TaskId::new("t2"), TaskId::new("t0")]
        );
    }

    #[test]
    fn test_task_defaults() {
        let task: Task = serde_json::from_str(r#"{"id":"t1","title":"Only"}"#).unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.dependencies.is_empty());
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_task_due_date_alias() {
        let json = r#"{"id":"t1","title":"Due","dueDate":"2030-01-15T09:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.due_date.is_some());
    }

    #[rstest]
    #[case(r#"{"id":"t1","title":"Due","dueDate":"2025-03-01"}"#, "2025-03-01T00:00:00Z")]
    #[case(r#"{"id":"t1","title":"Due","dueDate":"2025-03-01T12:30:00+02:00"}"#, "2025-03-01T10:30:00Z")]
    fn test_task_due_date_forms(#[case] json: &str, #[case] expected: &str) {
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.due_date, Some(expected.parse::<DateTime<Utc>>().unwrap()));
    }

    #[test]
    fn test_task_blank_or_null_due_date() {
        let task: Task = serde_json::from_str(r#"{"id":"t1","title":"T","dueDate":null}"#).unwrap();
        assert!(task.due_date.is_none());
        let task: Task = serde_json::from_str(r#"{"id":"t1","title":"T","dueDate":""}"#).unwrap();
        assert!(task.due_date.is_none());
        assert!(parse_due_date("next week").is_err());
    }

    #[test]
    fn test_status_not_started_serializes_kebab_case() {
        let task: Task =
            serde_json::from_str(r#"{"id":"t1","title":"T","status":"not-started"}"#).unwrap();
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.status.to_string(), "not-started");
    }

    #[rstest]
    #[case(Task::new("", "Title"), "Task ID cannot be empty")]
    #[case(Task::new("t1", "   "), "empty title")]
    #[case(Task::new("t1", "Title").with_dependencies([" "]), "empty dependency ID")]
    fn test_task_validate_rejects(#[case] task: Task, #[case] expected: &str) {
        let err = task.validate().unwrap_err();
        assert!(err.contains(expected), "unexpected error: {err}");
    }

    #[test]
    fn test_task_validate_accepts_dangling_dependency() {
        let task = Task::new("t1", "Title").with_dependencies(["missing"]);
        assert!(task.validate().is_ok());
    }
}
