//! Circular dependency detection.
//!
//! The checker answers one question before a task's dependency set is
//! changed: would adding these dependency edges let the task reach itself?
//! When it would, it reports one concrete cycle so the caller can show the
//! user which chain of tasks is at fault.
//!
//! # Algorithm
//!
//! 1. Build an adjacency map (`id -> dependency ids`) from the snapshot.
//! 2. Overlay the proposed edges on the edited task, after its existing ones.
//! 3. Run a three-color DFS from the edited task only, so the cost is bounded
//!    by the subgraph reachable from it.
//! 4. A back-edge to the edited task closes a cycle; the DFS path at that
//!    moment, plus the edited task again, is the reported cycle.
//!
//! Dependency ids missing from the snapshot are treated as leaves. The
//! snapshot is only borrowed and never modified.
//!
//! # Edge Direction
//!
//! Edges point from **dependent -> dependency**: `A -> B` means A depends on B
//! and B must complete first.
//!
//! # Tie-break
//!
//! When several cycles pass through the edited task, the first one met while
//! exploring dependencies in declared order (existing, then proposed) is
//! reported. The result is deterministic for a given input.

mod adjacency;
mod search;

use crate::domain::{Task, TaskId};
use crate::error::{Error, Result};
use adjacency::{Adjacency, Augmented};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Outcome of a circular dependency check.
///
/// Serializes as `{ "hasCircular": bool, "path": [ids] | null }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleCheck {
    /// Whether the proposed dependencies would close a cycle
    pub has_circular: bool,

    /// The offending cycle, starting and ending with the edited task
    pub path: Option<Vec<TaskId>>,
}

impl CycleCheck {
    /// No cycle would be introduced.
    #[must_use]
    pub fn acyclic() -> Self {
        Self {
            has_circular: false,
            path: None,
        }
    }

    /// A cycle would be introduced along `path`.
    #[must_use]
    pub fn circular(path: Vec<TaskId>) -> Self {
        Self {
            has_circular: true,
            path: Some(path),
        }
    }

    /// Human-readable chain such as `A → B → C → A`, if a cycle was found.
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        self.path.as_deref().map(describe_path)
    }
}

/// Join a path of task ids with arrows.
#[must_use]
pub fn describe_path(path: &[TaskId]) -> String {
    path.iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Reusable checker over one snapshot.
///
/// Use [`check_circularity`] for a single check; build a checker when many
/// checks run against the same snapshot.
#[derive(Debug)]
pub struct DependencyCycleChecker<'a> {
    adjacency: Adjacency<'a>,
}

impl<'a> DependencyCycleChecker<'a> {
    /// Index a snapshot of all tasks.
    #[must_use]
    pub fn new(all_tasks: &'a [Task]) -> Self {
        Self {
            adjacency: Adjacency::from_tasks(all_tasks),
        }
    }

    /// Check whether adding `proposed` as dependencies of `task_id` would
    /// create a cycle.
    ///
    /// `task_id` does not need to exist in the snapshot, which allows checking
    /// a task that has not been created yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `task_id` or any proposed id is blank.
    pub fn check(&self, task_id: &TaskId, proposed: &[TaskId]) -> Result<CycleCheck> {
        validate_request(task_id, proposed)?;
        Ok(self.search(&Augmented::new(&self.adjacency, task_id, proposed)))
    }

    /// Check `dependencies` as the task's complete new dependency set.
    ///
    /// Unlike [`DependencyCycleChecker::check`], the task's current
    /// dependencies are ignored, so an edit that removes the edge closing an
    /// existing cycle is reported as acyclic.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `task_id` or any dependency id is blank.
    pub fn check_replacing(&self, task_id: &TaskId, dependencies: &[TaskId]) -> Result<CycleCheck> {
        validate_request(task_id, dependencies)?;
        Ok(self.search(&Augmented::replacing(&self.adjacency, task_id, dependencies)))
    }

    /// Cycle through `task_id` using only the snapshot's own edges.
    ///
    /// No input validation: ids come from the snapshot itself, blank or not.
    pub(crate) fn existing_cycle_through(&self, task_id: &TaskId) -> Option<Vec<TaskId>> {
        search::find_cycle_through(&Augmented::new(&self.adjacency, task_id, &[]))
    }

    fn search(&self, graph: &Augmented<'_>) -> CycleCheck {
        let task_id = graph.root();
        match search::find_cycle_through(graph) {
            Some(path) => {
                debug!(
                    task = %task_id,
                    cycle = %describe_path(&path),
                    "Proposed dependencies would create a cycle"
                );
                CycleCheck::circular(path)
            }
            None => {
                trace!(task = %task_id, tasks = self.task_count(), "No cycle");
                CycleCheck::acyclic()
            }
        }
    }

    /// Number of tasks in the indexed snapshot.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.adjacency.node_count()
    }
}

/// Check whether adding `proposed_dependency_ids` to `task_id` would create a
/// cycle in the dependency graph formed by `all_tasks`.
///
/// Pure function: identical inputs give identical output and `all_tasks` is
/// not modified.
///
/// # Errors
///
/// Returns `Error::Validation` if `task_id` or any proposed id is blank.
///
/// # Example
///
/// ```
/// use taskgraph::checker::check_circularity;
/// use taskgraph::domain::{Task, TaskId};
///
/// let tasks = vec![
///     Task::new("A", "Schema"),
///     Task::new("B", "Models").with_dependencies(["A"]),
///     Task::new("C", "Views").with_dependencies(["B"]),
/// ];
///
/// let result = check_circularity(&TaskId::new("A"), &[TaskId::new("C")], &tasks).unwrap();
/// assert_eq!(result.describe().as_deref(), Some("A → C → B → A"));
/// ```
pub fn check_circularity(
    task_id: &TaskId,
    proposed_dependency_ids: &[TaskId],
    all_tasks: &[Task],
) -> Result<CycleCheck> {
    DependencyCycleChecker::new(all_tasks).check(task_id, proposed_dependency_ids)
}

/// Validate the ids of a check request without touching any snapshot.
///
/// # Errors
///
/// Returns `Error::Validation` naming the first blank id.
pub fn validate_request(task_id: &TaskId, proposed: &[TaskId]) -> Result<()> {
    task_id.validate().map_err(Error::Validation)?;

    if let Some(position) = proposed.iter().position(|id| id.validate().is_err()) {
        return Err(Error::Validation(format!(
            "Dependency ID at position {position} cannot be empty"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn ids(raw: &[&str]) -> Vec<TaskId> {
        raw.iter().map(|id| TaskId::new(*id)).collect()
    }

    /// `A`, `B -> A`, `C -> B`
    #[fixture]
    fn chain() -> Vec<Task> {
        vec![
            Task::new("A", "Schema"),
            Task::new("B", "Models").with_dependencies(["A"]),
            Task::new("C", "Views").with_dependencies(["B"]),
        ]
    }

    #[rstest]
    fn test_transitive_cycle(chain: Vec<Task>) {
        let result = check_circularity(&TaskId::new("A"), &ids(&["C"]), &chain).unwrap();

        assert!(result.has_circular);
        assert_eq!(result.path, Some(ids(&["A", "C", "B", "A"])));
    }

    #[rstest]
    fn test_direct_reverse_edge(chain: Vec<Task>) {
        let result = check_circularity(&TaskId::new("A"), &ids(&["B"]), &chain).unwrap();

        assert!(result.has_circular);
        assert_eq!(result.path, Some(ids(&["A", "B", "A"])));
    }

    #[rstest]
    fn test_self_dependency(chain: Vec<Task>) {
        let result = check_circularity(&TaskId::new("B"), &ids(&["B"]), &chain).unwrap();

        assert!(result.has_circular);
        assert_eq!(result.path, Some(ids(&["B", "B"])));
    }

    #[rstest]
    fn test_self_dependency_of_unknown_task() {
        let result = check_circularity(&TaskId::new("T1"), &ids(&["T1"]), &[]).unwrap();
        assert_eq!(result.path, Some(ids(&["T1", "T1"])));
    }

    #[rstest]
    fn test_forward_edge_is_acyclic(chain: Vec<Task>) {
        let result = check_circularity(&TaskId::new("C"), &ids(&["A"]), &chain).unwrap();

        assert_eq!(result, CycleCheck::acyclic());
    }

    #[rstest]
    fn test_empty_proposal_on_acyclic_graph(chain: Vec<Task>) {
        let result = check_circularity(&TaskId::new("C"), &[], &chain).unwrap();
        assert!(!result.has_circular);
        assert!(result.path.is_none());
    }

    #[rstest]
    fn test_dangling_dependency_is_a_leaf(chain: Vec<Task>) {
        let result =
            check_circularity(&TaskId::new("A"), &ids(&["does-not-exist"]), &chain).unwrap();
        assert!(!result.has_circular);
    }

    #[rstest]
    fn test_dangling_edge_in_snapshot() {
        let tasks = vec![
            Task::new("A", "A").with_dependencies(["ghost"]),
            Task::new("B", "B").with_dependencies(["ghost", "A"]),
        ];

        let result = check_circularity(&TaskId::new("A"), &ids(&["B"]), &tasks).unwrap();
        assert_eq!(result.path, Some(ids(&["A", "B", "A"])));
    }

    #[rstest]
    fn test_new_task_not_in_snapshot(chain: Vec<Task>) {
        let result = check_circularity(&TaskId::new("D"), &ids(&["C", "A"]), &chain).unwrap();
        assert!(!result.has_circular);
    }

    #[rstest]
    fn test_first_cycle_in_declared_order() {
        // Both X and Y lead back to R; Y is proposed first.
        let tasks = vec![
            Task::new("R", "Root"),
            Task::new("X", "X").with_dependencies(["R"]),
            Task::new("Y", "Y").with_dependencies(["R"]),
        ];

        let result = check_circularity(&TaskId::new("R"), &ids(&["Y", "X"]), &tasks).unwrap();
        assert_eq!(result.path, Some(ids(&["R", "Y", "R"])));
    }

    #[rstest]
    fn test_path_follows_existing_edges() {
        let tasks = vec![
            Task::new("R", "Root").with_dependencies(["E"]),
            Task::new("E", "Existing").with_dependencies(["P"]),
            Task::new("P", "Proposed"),
        ];

        let result = check_circularity(&TaskId::new("P"), &ids(&["R"]), &tasks).unwrap();
        assert_eq!(result.path, Some(ids(&["P", "R", "E", "P"])));
    }

    #[rstest]
    fn test_existing_cycle_elsewhere_is_not_reported() {
        let tasks = vec![
            Task::new("A", "A"),
            Task::new("X", "X").with_dependencies(["Y"]),
            Task::new("Y", "Y").with_dependencies(["X"]),
        ];

        let result = check_circularity(&TaskId::new("A"), &ids(&["X"]), &tasks).unwrap();
        assert!(!result.has_circular);
    }

    #[rstest]
    fn test_diamond_is_acyclic() {
        let tasks = vec![
            Task::new("top", "Top").with_dependencies(["left", "right"]),
            Task::new("left", "Left").with_dependencies(["bottom"]),
            Task::new("right", "Right").with_dependencies(["bottom"]),
            Task::new("bottom", "Bottom"),
        ];

        let result = check_circularity(&TaskId::new("bottom"), &ids(&["extra"]), &tasks).unwrap();
        assert!(!result.has_circular);

        let result = check_circularity(&TaskId::new("bottom"), &ids(&["right"]), &tasks).unwrap();
        assert_eq!(result.path, Some(ids(&["bottom", "right", "bottom"])));
    }

    #[rstest]
    fn test_deep_chain_does_not_overflow() {
        let depth = 50_000;
        let tasks: Vec<Task> = (0..depth)
            .map(|i| {
                let task = Task::new(format!("t{i}"), "step");
                if i == 0 {
                    task
                } else {
                    task.with_dependencies([format!("t{}", i - 1)])
                }
            })
            .collect();

        let result = check_circularity(
            &TaskId::new("t0"),
            &ids(&[format!("t{}", depth - 1).as_str()]),
            &tasks,
        )
        .unwrap();

        let path = result.path.unwrap();
        assert_eq!(path.len(), depth + 1);
        assert_eq!(path.first(), path.last());
    }

    #[rstest]
    fn test_idempotent(chain: Vec<Task>) {
        let proposed = ids(&["C", "B"]);
        let first = check_circularity(&TaskId::new("A"), &proposed, &chain).unwrap();
        let second = check_circularity(&TaskId::new("A"), &proposed, &chain).unwrap();

        assert_eq!(first, second);
    }

    #[rstest]
    fn test_snapshot_not_mutated(chain: Vec<Task>) {
        let before = chain.clone();
        let _ = check_circularity(&TaskId::new("A"), &ids(&["C"]), &chain).unwrap();
        assert_eq!(before, chain);
    }

    #[rstest]
    #[case("", &["A"])]
    #[case("   ", &["A"])]
    #[case("A", &["B", ""])]
    fn test_blank_ids_are_validation_errors(
        chain: Vec<Task>,
        #[case] task_id: &str,
        #[case] proposed: &[&str],
    ) {
        let err = check_circularity(&TaskId::new(task_id), &ids(proposed), &chain).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {err:?}");
    }

    #[rstest]
    fn test_checker_reused_across_checks(chain: Vec<Task>) {
        let checker = DependencyCycleChecker::new(&chain);
        assert_eq!(checker.task_count(), 3);

        assert!(checker.check(&TaskId::new("A"), &ids(&["C"])).unwrap().has_circular);
        assert!(!checker.check(&TaskId::new("C"), &ids(&["A"])).unwrap().has_circular);
    }

    #[rstest]
    fn test_replacing_drops_existing_edges() {
        // X -> Y -> X already; editing X to depend on Z only repairs it.
        let tasks = vec![
            Task::new("X", "X").with_dependencies(["Y"]),
            Task::new("Y", "Y").with_dependencies(["X"]),
            Task::new("Z", "Z"),
        ];
        let checker = DependencyCycleChecker::new(&tasks);

        let added = checker.check(&TaskId::new("X"), &ids(&["Z"])).unwrap();
        assert_eq!(added.path, Some(ids(&["X", "Y", "X"])));

        let replaced = checker.check_replacing(&TaskId::new("X"), &ids(&["Z"])).unwrap();
        assert_eq!(replaced, CycleCheck::acyclic());
    }

    #[rstest]
    fn test_replacing_still_finds_new_cycles(chain: Vec<Task>) {
        let checker = DependencyCycleChecker::new(&chain);

        let result = checker.check_replacing(&TaskId::new("A"), &ids(&["C"])).unwrap();
        assert_eq!(result.path, Some(ids(&["A", "C", "B", "A"])));
        assert!(checker.check_replacing(&TaskId::new("B"), &ids(&[" "])).is_err());
    }

    #[test]
    fn test_existing_cycle_through_blank_ids() {
        let tasks = vec![
            Task::new(" ", "Blank").with_dependencies(["x"]),
            Task::new("x", "X").with_dependencies([" "]),
        ];
        let checker = DependencyCycleChecker::new(&tasks);

        assert_eq!(
            checker.existing_cycle_through(&TaskId::new("x")),
            Some(ids(&["x", " ", "x"]))
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(CycleCheck::circular(ids(&["A", "B", "A"]))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "hasCircular": true, "path": ["A", "B", "A"] })
        );

        let json = serde_json::to_value(CycleCheck::acyclic()).unwrap();
        assert_eq!(json, serde_json::json!({ "hasCircular": false, "path": null }));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            CycleCheck::circular(ids(&["A", "C", "B", "A"])).describe().as_deref(),
            Some("A → C → B → A")
        );
        assert_eq!(CycleCheck::acyclic().describe(), None);
    }
}
