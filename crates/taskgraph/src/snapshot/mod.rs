//! Task snapshot sources.
//!
//! Tasks and their dependency edges are owned by an external persistence
//! layer. Everything in this crate works on a *snapshot*: the full task set as
//! known at the time of a call. This module provides the [`SnapshotSource`]
//! trait and two implementations:
//!
//! - [`FileSnapshotSource`]: re-reads a JSON Lines (or JSON array) export on
//!   every load, so each check sees the latest export
//! - [`StaticSnapshotSource`]: an in-memory task list, replaceable at runtime
//!
//! # Staleness
//!
//! A snapshot can be outdated by the time a dependency change is written.
//! Two concurrent edits may each pass a check and still form a cycle together.
//! Closing that race (re-checking at commit time, a graph-level write lock)
//! is the persistence layer's job; sources here make no attempt to detect it.
//!
//! # Example
//!
//! ```
//! use taskgraph::domain::Task;
//! use taskgraph::snapshot::{SnapshotSource, StaticSnapshotSource};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let source = StaticSnapshotSource::new(vec![Task::new("a", "Write docs")]);
//!     let snapshot = source.load().await?;
//!     assert_eq!(snapshot.len(), 1);
//!     Ok(())
//! }
//! ```

mod file;

use crate::domain::{Task, TaskId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use file::{FileSnapshotSource, LoadWarning, load_tasks_from_file, parse_tasks};

/// The full task set at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// All tasks, in source order
    pub tasks: Vec<Task>,

    /// Non-fatal problems found while loading
    pub warnings: Vec<LoadWarning>,
}

impl Snapshot {
    /// Create a snapshot without load warnings.
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            warnings: Vec::new(),
        }
    }

    /// Find a task by id (first occurrence).
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the snapshot holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Something that can produce a fresh task snapshot.
///
/// Implementations must be `Send + Sync` so one source can serve concurrent
/// requests; every call to `load` returns an independent copy.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Load the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read as a whole. Problems
    /// with individual records are reported as warnings instead.
    async fn load(&self) -> Result<Snapshot>;

    /// Short human-readable description, used in logs.
    fn describe(&self) -> String;
}

/// In-memory snapshot source.
///
/// Cloning shares the underlying task list.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl StaticSnapshotSource {
    /// Create a source serving the given tasks.
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(tasks)),
        }
    }

    /// Replace the served tasks. Loads already in progress keep their copy.
    pub async fn replace(&self, tasks: Vec<Task>) {
        *self.tasks.write().await = tasks;
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn load(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.tasks.read().await.clone()))
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
