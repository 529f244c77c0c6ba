//! API request and response types
//!
//! Plain serde types; no HTTP types appear here.

use serde::{Deserialize, Serialize};
use taskgraph::domain::{Task, TaskId};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Body of `POST /tasks/{id}/check-dependencies`
#[derive(Debug, Clone, Deserialize)]
pub struct CheckDependenciesRequest {
    /// Proposed dependency ids for the task
    pub dependencies: Vec<String>,

    /// Treat `dependencies` as the task's complete new set instead of
    /// additions to its current one
    #[serde(default)]
    pub replace: bool,
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Task plus its readiness flag
#[derive(Debug, Clone, Serialize)]
pub struct TaskItem {
    /// The task as stored
    #[serde(flatten)]
    pub task: Task,
    /// Waiting on at least one unfinished dependency
    pub blocked: bool,
}

/// Response for `GET /tasks`
#[derive(Debug, Clone, Serialize)]
pub struct TasksData {
    /// Every task in the snapshot, in snapshot order
    pub tasks: Vec<TaskItem>,
}

/// Response for `GET /tasks/{id}/dependencies`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependenciesData {
    /// Task whose dependencies were requested
    pub task_id: TaskId,
    /// Dependencies found in the snapshot, in declared order
    pub dependencies: Vec<Task>,
    /// Declared dependency ids with no matching task
    pub missing: Vec<TaskId>,
}

/// Response for `GET /tasks/{id}/dependents`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentsData {
    /// Task whose dependents were requested
    pub task_id: TaskId,
    /// Tasks that list it as a dependency
    pub dependents: Vec<Task>,
}

/// Response for `GET /graph/cycles`
#[derive(Debug, Clone, Serialize)]
pub struct CyclesData {
    /// No cycle exists in the snapshot
    pub acyclic: bool,
    /// One path per cycle, first id repeated at the end
    pub cycles: Vec<Vec<TaskId>>,
}

/// Response for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthData {
    /// Always `"ok"` when the snapshot loads
    pub status: &'static str,
    /// Number of tasks in the snapshot
    pub tasks: usize,
    /// Where snapshots come from
    pub source: String,
}
