//! Cycle guard for the `blocked_by` relation.
//!
//! Edges point from a task to the task it is blocked by. Replacing a task's
//! blocker set must keep the graph acyclic, so a task can never end up
//! waiting on itself, directly or through a chain.

use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("A task cannot be blocked by itself")]
    SelfReference,

    #[error("Task {blocker} already depends on this task")]
    Cycle { blocker: Uuid },
}

/// Checks that giving `task_id` the blocker set `blockers` keeps the graph
/// acyclic
///
/// `edges` is the current `(task_id, blocker_id)` edge set. The task's own
/// outgoing edges are ignored since they are being replaced.
pub fn ensure_acyclic(
    edges: &[(Uuid, Uuid)],
    task_id: Uuid,
    blockers: &[Uuid],
) -> Result<(), DependencyError> {
    let mut graph: DiGraphMap<Uuid, ()> = DiGraphMap::new();

    for &(from, to) in edges.iter().filter(|(from, _)| *from != task_id) {
        graph.add_edge(from, to, ());
    }
    graph.add_node(task_id);

    for &blocker in blockers {
        if blocker == task_id {
            return Err(DependencyError::SelfReference);
        }

        graph.add_edge(task_id, blocker, ());

        if is_cyclic_directed(&graph) {
            return Err(DependencyError::Cycle { blocker });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<const N: usize>() -> [Uuid; N] {
        std::array::from_fn(|_| Uuid::new_v4())
    }

    #[test]
    fn test_empty_graph_accepts_blockers() {
        let [a, b, c] = ids();
        assert_eq!(ensure_acyclic(&[], a, &[b, c]), Ok(()));
        assert_eq!(ensure_acyclic(&[], a, &[]), Ok(()));
    }

    #[test]
    fn test_self_reference_rejected() {
        let [a, b] = ids();
        assert_eq!(
            ensure_acyclic(&[], a, &[b, a]),
            Err(DependencyError::SelfReference)
        );
    }

    #[test]
    fn test_direct_cycle_rejected() {
        let [a, b] = ids();
        // b is blocked by a, so a cannot be blocked by b
        let edges = [(b, a)];
        assert_eq!(
            ensure_acyclic(&edges, a, &[b]),
            Err(DependencyError::Cycle { blocker: b })
        );
    }

    #[test]
    fn test_transitive_cycle_rejected() {
        let [a, b, c] = ids();
        let edges = [(c, b), (b, a)];
        assert_eq!(
            ensure_acyclic(&edges, a, &[c]),
            Err(DependencyError::Cycle { blocker: c })
        );
    }

    #[test]
    fn test_shared_blocker_is_not_a_cycle() {
        let [a, b, c] = ids();
        // a and b both wait on c
        let edges = [(b, c)];
        assert_eq!(ensure_acyclic(&edges, a, &[b, c]), Ok(()));
    }

    #[test]
    fn test_replaced_edges_are_ignored() {
        let [a, b] = ids();
        // a is currently blocked by b; flipping the relation is allowed
        // because a's blocker set is being replaced with nothing
        let edges = [(a, b)];
        assert_eq!(ensure_acyclic(&edges, a, &[]), Ok(()));
        assert_eq!(ensure_acyclic(&edges, b, &[a]), Err(DependencyError::Cycle { blocker: a }));
        assert_eq!(ensure_acyclic(&edges, a, &[b]), Ok(()));
    }
}
