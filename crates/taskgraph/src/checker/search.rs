//! Three-color depth-first search for a cycle through the edited task.

use super::adjacency::Augmented;
use crate::domain::TaskId;
use std::collections::HashMap;
use tracing::debug;

/// DFS color. Ids without an entry are white (unvisited).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

/// Search for a path from the augmented root back to itself.
///
/// Returns the cycle as `[root, .., root]`. The traversal is iterative: the
/// explicit stack holds `(id, next dependency index)` frames, and its ids are
/// exactly the current DFS path, which becomes the reported cycle.
///
/// Only back-edges to the root count. A back-edge to any other gray node is a
/// cycle that already exists in the snapshot and is not introduced by the
/// edit. Every cycle through the root is still found, because the root stays
/// gray for the whole search.
pub(super) fn find_cycle_through(graph: &Augmented<'_>) -> Option<Vec<TaskId>> {
    let root = graph.root();
    let mut colors: HashMap<&TaskId, Color> = HashMap::new();
    let mut stack: Vec<(&TaskId, usize)> = vec![(root, 0)];
    colors.insert(root, Color::Gray);

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;

        let Some(dep) = graph.dependency(node, next) else {
            colors.insert(node, Color::Black);
            stack.pop();
            continue;
        };
        frame.1 += 1;

        match colors.get(dep) {
            None => {
                colors.insert(dep, Color::Gray);
                stack.push((dep, 0));
            }
            Some(Color::Gray) if dep == root => {
                // The root is always the bottom frame, so the whole stack is the cycle.
                let mut path: Vec<TaskId> = stack.iter().map(|(id, _)| (*id).clone()).collect();
                path.push(root.clone());
                return Some(path);
            }
            Some(Color::Gray) => {
                debug!(from = %node, to = %dep, "Ignoring existing cycle not through {}", root);
            }
            Some(Color::Black) => {}
        }
    }

    None
}
