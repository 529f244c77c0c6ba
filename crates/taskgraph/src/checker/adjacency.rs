//! Adjacency view over a task snapshot.
//!
//! Built fresh for every check. Nodes are borrowed task ids and edges are the
//! tasks' own dependency slices, so building never copies or mutates the
//! snapshot.

use crate::domain::{Task, TaskId};
use std::collections::{HashMap, HashSet};

/// Mapping from task id to the ids it depends on, in declared order.
///
/// Ids that appear only as dependency targets (dangling references) have no
/// entry and behave as leaves.
#[derive(Debug, Default)]
pub(crate) struct Adjacency<'a> {
    edges: HashMap<&'a TaskId, &'a [TaskId]>,
}

impl<'a> Adjacency<'a> {
    /// Build the adjacency map. When a task id occurs more than once the first
    /// occurrence wins.
    pub(crate) fn from_tasks(tasks: &'a [Task]) -> Self {
        let mut edges = HashMap::with_capacity(tasks.len());
        for task in tasks {
            edges
                .entry(&task.id)
                .or_insert_with(|| task.dependencies.as_slice());
        }
        Self { edges }
    }

    /// Dependencies of `id`, empty for unknown ids.
    pub(crate) fn dependencies_of(&self, id: &TaskId) -> &'a [TaskId] {
        self.edges.get(id).copied().unwrap_or_default()
    }

    /// Number of tasks with an entry.
    pub(crate) fn node_count(&self) -> usize {
        self.edges.len()
    }
}

/// The snapshot adjacency with extra outgoing edges hypothetically added to
/// one task.
#[derive(Debug)]
pub(crate) struct Augmented<'a> {
    base: &'a Adjacency<'a>,
    root: &'a TaskId,
    root_edges: Vec<&'a TaskId>,
}

impl<'a> Augmented<'a> {
    /// Union of `root`'s current dependencies and `proposed`, existing edges
    /// first, duplicates dropped.
    pub(crate) fn new(base: &'a Adjacency<'a>, root: &'a TaskId, proposed: &'a [TaskId]) -> Self {
        let existing = base.dependencies_of(root);
        let mut seen: HashSet<&TaskId> = HashSet::with_capacity(existing.len() + proposed.len());
        let root_edges = existing
            .iter()
            .chain(proposed)
            .filter(|id| seen.insert(*id))
            .collect();

        Self {
            base,
            root,
            root_edges,
        }
    }

    /// `root`'s dependencies replaced by `dependencies`, duplicates dropped.
    pub(crate) fn replacing(
        base: &'a Adjacency<'a>,
        root: &'a TaskId,
        dependencies: &'a [TaskId],
    ) -> Self {
        let mut seen: HashSet<&TaskId> = HashSet::with_capacity(dependencies.len());
        let root_edges = dependencies.iter().filter(|id| seen.insert(*id)).collect();

        Self {
            base,
            root,
            root_edges,
        }
    }

    /// The task the extra edges start from.
    pub(crate) fn root(&self) -> &'a TaskId {
        self.root
    }

    /// The `index`-th dependency of `id`, or `None` once exhausted.
    pub(crate) fn dependency(&self, id: &TaskId, index: usize) -> Option<&'a TaskId> {
        if id == self.root {
            self.root_edges.get(index).copied()
        } else {
            self.base.dependencies_of(id).get(index)
        }
    }
}
