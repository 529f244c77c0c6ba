//! HTTP-agnostic API layer
//!
//! Typed request/response structures and the handlers that answer them.
//! Nothing here knows about sockets or HTTP framing: handlers take a
//! [`SnapshotSource`](taskgraph::snapshot::SnapshotSource) and typed input and
//! return `Result<T, ApiError>`, where [`ApiError`] knows its status code.

mod error;
mod handlers;
mod types;

pub use error::{ApiError, ApiErrorData, ErrorCode};
pub use handlers::{
    check_dependencies, get_cycles, get_dependencies, get_dependents, get_graph, get_task,
    health, list_tasks,
};
pub use types::{
    CheckDependenciesRequest, CyclesData, DependenciesData, DependentsData, HealthData, TaskItem,
    TasksData,
};
