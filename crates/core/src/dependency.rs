//! Prerequisite graph checks for calendar events.
//!
//! Events declare the lessons they depend on. Rescheduling cascades walk
//! these edges, so a cycle would make a cascade revisit its origin. Cycles
//! are rejected when events are created.

use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::types::DbId;

/// Lesson id together with the lesson ids it requires.
pub type PrerequisiteEdge<'a> = (DbId, &'a [DbId]);

/// Return one cycle in the prerequisite graph, if any.
///
/// The returned path starts and ends at the same lesson id. Multiple
/// events for the same lesson merge their prerequisite lists.
pub fn find_cycle<'a, I>(edges: I) -> Option<Vec<DbId>>
where
    I: IntoIterator<Item = PrerequisiteEdge<'a>>,
{
    let mut graph: HashMap<DbId, Vec<DbId>> = HashMap::new();
    for (lesson_id, prerequisites) in edges {
        graph
            .entry(lesson_id)
            .or_default()
            .extend(prerequisites.iter().copied());
    }

    let mut done: HashSet<DbId> = HashSet::new();
    let mut roots: Vec<DbId> = graph.keys().copied().collect();
    roots.sort_unstable();

    for root in roots {
        if done.contains(&root) {
            continue;
        }
        // Iterative DFS; `path` mirrors the stack so a back edge can be
        // turned into the cycle it closes.
        let mut path: Vec<DbId> = vec![root];
        let mut on_path: HashSet<DbId> = HashSet::from([root]);
        let mut stack: Vec<(DbId, usize)> = vec![(root, 0)];

        while let Some((node, next_child)) = stack.pop() {
            let children = graph.get(&node).map(Vec::as_slice).unwrap_or(&[]);
            if let Some(&child) = children.get(next_child) {
                stack.push((node, next_child + 1));
                if on_path.contains(&child) {
                    let start = path.iter().position(|&n| n == child).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(child);
                    return Some(cycle);
                }
                if !done.contains(&child) {
                    path.push(child);
                    on_path.insert(child);
                    stack.push((child, 0));
                }
            } else {
                done.insert(node);
                on_path.remove(&node);
                path.pop();
            }
        }
    }
    None
}

/// Reject a prerequisite set that would close a cycle.
pub fn ensure_acyclic<'a, I>(edges: I) -> Result<(), CoreError>
where
    I: IntoIterator<Item = PrerequisiteEdge<'a>>,
{
    match find_cycle(edges) {
        None => Ok(()),
        Some(cycle) => {
            let rendered: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            Err(CoreError::Conflict(format!(
                "prerequisite cycle between lessons: {}",
                rendered.join(" -> ")
            )))
        }
    }
}
