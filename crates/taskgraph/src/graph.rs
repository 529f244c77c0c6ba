//! Whole-snapshot dependency graph analysis using petgraph.
//!
//! The checker only looks at what is reachable from one edited task. This
//! module answers questions about the snapshot as a whole:
//! - Audit: which cycles already exist (the acyclic invariant was broken)
//! - Direct dependencies and dependents of a task
//! - Dependency tree traversal (BFS)
//! - Blocked / ready task detection
//! - A node/link view for graph rendering
//!
//! # Edge Direction Reminder
//!
//! Edges point from **dependent -> dependency**, so `Direction::Incoming`
//! finds the tasks that depend on a node. Edges to ids missing from the
//! snapshot are not added to the graph.

use crate::checker::DependencyCycleChecker;
use crate::domain::{Task, TaskId, TaskStatus};
use crate::error::{Error, Result};
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Indexed, read-only graph over a task snapshot.
#[derive(Debug)]
pub struct SnapshotGraph<'a> {
    /// The full snapshot, duplicates included, as the checker expects it
    all_tasks: &'a [Task],

    /// Nodes are task ids; node indices follow first-occurrence order.
    graph: DiGraph<&'a TaskId, ()>,

    /// Mapping from task id to graph node
    node_map: HashMap<&'a TaskId, NodeIndex>,

    /// Task for each node, indexed by `NodeIndex::index()`
    tasks: Vec<&'a Task>,
}

/// Direct dependencies of a task, split by whether they exist in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectDependencies<'a> {
    /// Dependencies present in the snapshot, in declared order
    pub tasks: Vec<&'a Task>,

    /// Declared dependency ids with no matching task
    pub missing: Vec<&'a TaskId>,
}

/// Node in the rendered dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Task id
    pub id: TaskId,
    /// Task title
    pub title: String,
    /// Task status
    pub status: TaskStatus,
}

/// Link in the rendered dependency graph.
///
/// `source` is the dependency and `target` the task depending on it, so
/// links follow the direction work flows in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    /// The dependency (must complete first)
    pub source: TaskId,
    /// The dependent task
    pub target: TaskId,
}

/// Node/link view of the snapshot for force-directed graph rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphView {
    /// One node per task
    pub nodes: Vec<GraphNode>,
    /// One link per resolved dependency edge
    pub links: Vec<GraphLink>,
}

impl<'a> SnapshotGraph<'a> {
    /// Index a snapshot. The first occurrence of a duplicated id wins.
    #[must_use]
    pub fn build(all_tasks: &'a [Task]) -> Self {
        let mut graph = DiGraph::with_capacity(all_tasks.len(), 0);
        let mut node_map = HashMap::with_capacity(all_tasks.len());
        let mut tasks = Vec::with_capacity(all_tasks.len());

        for task in all_tasks {
            if node_map.contains_key(&task.id) {
                continue;
            }
            let node = graph.add_node(&task.id);
            node_map.insert(&task.id, node);
            tasks.push(task);
        }

        for task in &tasks {
            let from = node_map[&task.id];
            for dep in &task.dependencies {
                if let Some(&to) = node_map.get(dep) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        Self {
            all_tasks,
            graph,
            node_map,
            tasks,
        }
    }

    /// Number of distinct tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the snapshot has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&'a Task> {
        self.node_map.get(id).map(|node| self.tasks[node.index()])
    }

    /// Distinct tasks in first-occurrence order.
    pub fn tasks(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.tasks.iter().copied()
    }

    fn node(&self, id: &TaskId) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| Error::TaskNotFound(id.clone()))
    }

    /// Cycles already present in the snapshot.
    ///
    /// Returns one concrete cycle per strongly connected component that
    /// contains a cycle, each starting and ending at the component's first
    /// task in snapshot order. An acyclic snapshot yields an empty list.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        let checker = DependencyCycleChecker::new(self.all_tasks);

        let mut representatives: Vec<NodeIndex> = algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .filter_map(|component| component.into_iter().min())
            .collect();
        representatives.sort();

        representatives
            .into_iter()
            .filter_map(|node| checker.existing_cycle_through(self.graph[node]))
            .collect()
    }

    /// Whether the snapshot satisfies the acyclic invariant.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        !algo::is_cyclic_directed(&self.graph)
    }

    /// Direct dependencies of a task.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task is not in the snapshot.
    pub fn dependencies(&self, id: &TaskId) -> Result<DirectDependencies<'a>> {
        let node = self.node(id)?;
        let task = self.tasks[node.index()];

        let mut resolved = DirectDependencies {
            tasks: Vec::new(),
            missing: Vec::new(),
        };
        for dep in &task.dependencies {
            match self.get(dep) {
                Some(dep_task) => resolved.tasks.push(dep_task),
                None => resolved.missing.push(dep),
            }
        }
        Ok(resolved)
    }

    /// Tasks that directly depend on the given task, in snapshot order.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task is not in the snapshot.
    pub fn dependents(&self, id: &TaskId) -> Result<Vec<&'a Task>> {
        let node = self.node(id)?;

        let mut nodes: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        nodes.sort();

        Ok(nodes.into_iter().map(|n| self.tasks[n.index()]).collect())
    }

    /// Transitive dependencies of a task with their depth.
    ///
    /// Breadth-first from the task's direct dependencies (depth 1), in
    /// declared order. Each id appears once, at its shallowest depth. Ids
    /// missing from the snapshot are listed but not expanded. `max_depth`
    /// limits how deep the traversal goes.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task is not in the snapshot.
    pub fn dependency_tree(
        &self,
        id: &TaskId,
        max_depth: Option<usize>,
    ) -> Result<Vec<(&'a TaskId, usize)>> {
        let start = self.tasks[self.node(id)?.index()];

        let mut result = Vec::new();
        let mut visited: HashSet<&TaskId> = HashSet::new();
        visited.insert(&start.id);
        let mut queue: VecDeque<(&'a Task, usize)> = VecDeque::new();
        queue.push_back((start, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }

            for dep in &current.dependencies {
                if !visited.insert(dep) {
                    continue;
                }
                result.push((dep, depth + 1));
                if let Some(dep_task) = self.get(dep) {
                    queue.push_back((dep_task, depth + 1));
                }
            }
        }

        Ok(result)
    }

    /// Tasks that cannot start yet.
    ///
    /// A task is blocked when it is not completed and at least one of its
    /// dependencies exists in the snapshot and is not completed. Dependencies
    /// missing from the snapshot do not block.
    #[must_use]
    pub fn blocked_tasks(&self) -> Vec<&'a Task> {
        self.tasks
            .iter()
            .copied()
            .filter(|task| self.is_blocked(task))
            .collect()
    }

    /// Tasks that are not completed and not blocked.
    #[must_use]
    pub fn ready_tasks(&self) -> Vec<&'a Task> {
        self.tasks
            .iter()
            .copied()
            .filter(|task| task.status != TaskStatus::Completed && !self.is_blocked(task))
            .collect()
    }

    /// Whether a task is blocked by an unfinished dependency.
    #[must_use]
    pub fn is_blocked(&self, task: &Task) -> bool {
        if task.status == TaskStatus::Completed {
            return false;
        }

        task.dependencies.iter().any(|dep| {
            self.get(dep)
                .is_some_and(|blocker| blocker.status != TaskStatus::Completed)
        })
    }

    /// Node/link view of the snapshot.
    #[must_use]
    pub fn view(&self) -> GraphView {
        let nodes = self
            .tasks
            .iter()
            .map(|task| GraphNode {
                id: task.id.clone(),
                title: task.title.clone(),
                status: task.status,
            })
            .collect();

        let links = self
            .tasks
            .iter()
            .copied()
            .flat_map(|task| {
                let mut seen: HashSet<&TaskId> = HashSet::new();
                task.dependencies
                    .iter()
                    .filter(move |dep| self.node_map.contains_key(*dep) && seen.insert(*dep))
                    .map(move |dep| GraphLink {
                        source: dep.clone(),
                        target: task.id.clone(),
                    })
            })
            .collect();

        GraphView { nodes, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn id(raw: &str) -> TaskId {
        TaskId::new(raw)
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    /// Release pipeline: `deploy -> test -> build`, `docs -> build`, `test -> lint`
    #[fixture]
    fn pipeline() -> Vec<Task> {
        vec![
            Task::new("build", "Build").with_status(TaskStatus::Completed),
            Task::new("lint", "Lint"),
            Task::new("test", "Test").with_dependencies(["build", "lint"]),
            Task::new("docs", "Docs").with_dependencies(["build"]),
            Task::new("deploy", "Deploy").with_dependencies(["test", "ghost"]),
        ]
    }

    #[rstest]
    fn test_acyclic_snapshot_has_no_cycles(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);
        assert!(graph.is_acyclic());
        assert!(graph.cycles().is_empty());
    }

    #[rstest]
    fn test_cycles_reports_each_component() {
        let tasks = vec![
            Task::new("a", "A").with_dependencies(["b"]),
            Task::new("b", "B").with_dependencies(["c"]),
            Task::new("c", "C").with_dependencies(["a"]),
            Task::new("solo", "Solo").with_dependencies(["solo"]),
            Task::new("fine", "Fine").with_dependencies(["a"]),
        ];
        let graph = SnapshotGraph::build(&tasks);

        assert!(!graph.is_acyclic());
        assert_eq!(
            graph.cycles(),
            vec![
                vec![id("a"), id("b"), id("c"), id("a")],
                vec![id("solo"), id("solo")],
            ]
        );
    }

    #[test]
    fn test_cycles_include_unvalidated_ids() {
        // In-memory snapshots are not validated, so blank ids can appear.
        let tasks = vec![
            Task::new("x", "X").with_dependencies([" "]),
            Task::new(" ", "Blank").with_dependencies(["x"]),
        ];
        let graph = SnapshotGraph::build(&tasks);

        assert!(!graph.is_acyclic());
        assert_eq!(graph.cycles(), vec![vec![id("x"), id(" "), id("x")]]);
    }

    #[rstest]
    fn test_dependencies_split_missing(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);
        let deps = graph.dependencies(&id("deploy")).unwrap();

        assert_eq!(ids(&deps.tasks), vec!["test"]);
        assert_eq!(deps.missing, vec![&id("ghost")]);
    }

    #[rstest]
    fn test_dependents_in_snapshot_order(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);
        let dependents = graph.dependents(&id("build")).unwrap();

        assert_eq!(ids(&dependents), vec!["test", "docs"]);
    }

    #[rstest]
    fn test_unknown_task_is_not_found(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);

        assert!(matches!(
            graph.dependencies(&id("ghost")),
            Err(Error::TaskNotFound(_))
        ));
        assert!(matches!(
            graph.dependents(&id("ghost")),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[rstest]
    fn test_dependency_tree_breadth_first(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);
        let tree = graph.dependency_tree(&id("deploy"), None).unwrap();

        let rendered: Vec<(String, usize)> =
            tree.iter().map(|(id, depth)| (id.to_string(), *depth)).collect();
        assert_eq!(
            rendered,
            vec![
                ("test".to_string(), 1),
                ("ghost".to_string(), 1),
                ("build".to_string(), 2),
                ("lint".to_string(), 2),
            ]
        );
    }

    #[rstest]
    fn test_dependency_tree_respects_max_depth(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);
        let tree = graph.dependency_tree(&id("deploy"), Some(1)).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[rstest]
    fn test_dependency_tree_terminates_on_cycles() {
        let tasks = vec![
            Task::new("a", "A").with_dependencies(["b"]),
            Task::new("b", "B").with_dependencies(["a"]),
        ];
        let graph = SnapshotGraph::build(&tasks);
        let tree = graph.dependency_tree(&id("a"), None).unwrap();

        assert_eq!(tree, vec![(&id("b"), 1)]);
    }

    #[rstest]
    fn test_blocked_and_ready(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);

        // test waits on lint, deploy waits on test; the ghost never blocks.
        assert_eq!(ids(&graph.blocked_tasks()), vec!["test", "deploy"]);
        assert_eq!(ids(&graph.ready_tasks()), vec!["lint", "docs"]);
    }

    #[rstest]
    fn test_view_drops_dangling_links(pipeline: Vec<Task>) {
        let graph = SnapshotGraph::build(&pipeline);
        let view = graph.view();

        assert_eq!(view.nodes.len(), 5);
        assert_eq!(view.links.len(), 4);
        assert!(view.links.contains(&GraphLink {
            source: id("test"),
            target: id("deploy"),
        }));
        assert!(view.links.iter().all(|link| link.source != id("ghost")));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let tasks = vec![
            Task::new("a", "First"),
            Task::new("a", "Second").with_dependencies(["a"]),
        ];
        let graph = SnapshotGraph::build(&tasks);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get(&id("a")).unwrap().title, "First");
        assert!(graph.cycles().is_empty());
    }
}
