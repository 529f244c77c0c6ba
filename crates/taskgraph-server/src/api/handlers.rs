//! Request handlers
//!
//! Each handler loads its own snapshot from the source, answers from it, and
//! drops it. Handlers take typed input and return `Result<T, ApiError>`; the
//! router turns that into a status code and a JSON body.

use taskgraph::checker::{self, CycleCheck, DependencyCycleChecker};
use taskgraph::domain::{Task, TaskId};
use taskgraph::graph::{GraphView, SnapshotGraph};
use taskgraph::snapshot::{Snapshot, SnapshotSource};
use tracing::{debug, error, info};

use super::error::ApiError;
use super::types::{
    CheckDependenciesRequest, CyclesData, DependenciesData, DependentsData, HealthData, TaskItem,
    TasksData,
};

async fn load_snapshot(source: &dyn SnapshotSource) -> Result<Snapshot, ApiError> {
    source.load().await.map_err(|e| {
        error!(source = %source.describe(), error = %e, "Failed to load snapshot");
        ApiError::internal(format!("Failed to load snapshot: {e}"))
    })
}

fn task_id(raw: &str) -> Result<TaskId, ApiError> {
    let id = TaskId::new(raw);
    id.validate().map_err(ApiError::bad_request)?;
    Ok(id)
}

// =============================================================================
// DEPENDENCY CHECK
// =============================================================================

/// Would giving `task_id` the requested dependencies create a cycle?
///
/// By default the requested ids are added to the task's current
/// dependencies. With `replace` set they are checked as the task's whole new
/// dependency set, as an edit form submitting every selected dependency
/// does; only then can an edit that removes the edge closing an existing
/// cycle come back acyclic.
///
/// The ids are validated before the snapshot is read. A cycle is a normal
/// answer, not an error.
///
/// # Errors
///
/// `BAD_REQUEST` for a blank task or dependency id, `INTERNAL_ERROR` when the
/// snapshot cannot be loaded.
pub async fn check_dependencies(
    source: &dyn SnapshotSource,
    task_id: &str,
    request: &CheckDependenciesRequest,
) -> Result<CycleCheck, ApiError> {
    let task_id = TaskId::new(task_id);
    let proposed: Vec<TaskId> = request
        .dependencies
        .iter()
        .map(|id| TaskId::new(id.as_str()))
        .collect();
    checker::validate_request(&task_id, &proposed)?;

    let snapshot = load_snapshot(source).await?;
    let cycle_checker = DependencyCycleChecker::new(&snapshot.tasks);
    let result = if request.replace {
        cycle_checker.check_replacing(&task_id, &proposed)?
    } else {
        cycle_checker.check(&task_id, &proposed)?
    };

    if let Some(chain) = result.describe() {
        info!(task = %task_id, cycle = %chain, "Rejected dependencies: circular");
    } else {
        debug!(task = %task_id, proposed = proposed.len(), "Dependencies accepted");
    }
    Ok(result)
}

// =============================================================================
// TASKS
// =============================================================================

/// List all tasks with their blocked flag
///
/// # Errors
///
/// `INTERNAL_ERROR` when the snapshot cannot be loaded.
pub async fn list_tasks(source: &dyn SnapshotSource) -> Result<TasksData, ApiError> {
    let snapshot = load_snapshot(source).await?;
    let graph = SnapshotGraph::build(&snapshot.tasks);

    let tasks = graph
        .tasks()
        .map(|task| TaskItem {
            task: task.clone(),
            blocked: graph.is_blocked(task),
        })
        .collect();

    Ok(TasksData { tasks })
}

/// Get a single task by id
///
/// # Errors
///
/// `NOT_FOUND` when no task has this id.
pub async fn get_task(source: &dyn SnapshotSource, id: &str) -> Result<Task, ApiError> {
    let id = task_id(id)?;
    let snapshot = load_snapshot(source).await?;

    snapshot
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("Task not found: {id}")))
}

/// Direct dependencies of a task
///
/// # Errors
///
/// `NOT_FOUND` when no task has this id.
pub async fn get_dependencies(
    source: &dyn SnapshotSource,
    id: &str,
) -> Result<DependenciesData, ApiError> {
    let id = task_id(id)?;
    let snapshot = load_snapshot(source).await?;
    let graph = SnapshotGraph::build(&snapshot.tasks);
    let direct = graph.dependencies(&id)?;

    Ok(DependenciesData {
        dependencies: direct.tasks.into_iter().cloned().collect(),
        missing: direct.missing.into_iter().cloned().collect(),
        task_id: id,
    })
}

/// Tasks that directly depend on a task
///
/// # Errors
///
/// `NOT_FOUND` when no task has this id.
pub async fn get_dependents(
    source: &dyn SnapshotSource,
    id: &str,
) -> Result<DependentsData, ApiError> {
    let id = task_id(id)?;
    let snapshot = load_snapshot(source).await?;
    let graph = SnapshotGraph::build(&snapshot.tasks);
    let dependents = graph.dependents(&id)?.into_iter().cloned().collect();

    Ok(DependentsData {
        task_id: id,
        dependents,
    })
}

// =============================================================================
// GRAPH
// =============================================================================

/// Node/link view of the whole snapshot
///
/// # Errors
///
/// `INTERNAL_ERROR` when the snapshot cannot be loaded.
pub async fn get_graph(source: &dyn SnapshotSource) -> Result<GraphView, ApiError> {
    let snapshot = load_snapshot(source).await?;
    Ok(SnapshotGraph::build(&snapshot.tasks).view())
}

/// Cycles already present in the snapshot
///
/// # Errors
///
/// `INTERNAL_ERROR` when the snapshot cannot be loaded.
pub async fn get_cycles(source: &dyn SnapshotSource) -> Result<CyclesData, ApiError> {
    let snapshot = load_snapshot(source).await?;
    let graph = SnapshotGraph::build(&snapshot.tasks);

    Ok(CyclesData {
        acyclic: graph.is_acyclic(),
        cycles: graph.cycles(),
    })
}

/// Liveness plus snapshot size
///
/// # Errors
///
/// `INTERNAL_ERROR` when the snapshot cannot be loaded.
pub async fn health(source: &dyn SnapshotSource) -> Result<HealthData, ApiError> {
    let snapshot = load_snapshot(source).await?;

    Ok(HealthData {
        status: "ok",
        tasks: snapshot.len(),
        source: source.describe(),
    })
}
