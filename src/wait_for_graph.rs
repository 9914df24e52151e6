//! Waits-for graph for deadlock detection: a reachability-from-a-
//! single-node search. A blocking request checks only whether *it* is
//! on a cycle, not whether the whole graph is acyclic, which is the
//! cheaper and sufficient check — the requester is always the one node
//! freshly added to the graph, so any new cycle must pass through it.

use crate::transaction_id::TransactionId;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct WaitForGraph {
    // from -> set of transactions `from` is waiting on.
    edges: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        WaitForGraph {
            edges: HashMap::new(),
        }
    }

    pub fn add_edge(&mut self, from: TransactionId, to: TransactionId) {
        if from == to {
            return;
        }
        self.edges.entry(from).or_insert_with(HashSet::new).insert(to);
    }

    /// Drops every edge originating at `tid` (called once its request
    /// is granted or it is aborted — it is no longer waiting on
    /// anything).
    pub fn remove_waiter(&mut self, tid: TransactionId) {
        self.edges.remove(&tid);
    }

    /// BFS from `start` over its out-edges; true if `start` is
    /// reachable from itself, i.e. the graph has a cycle through it.
    /// O(V+E).
    pub fn has_cycle_through(&self, start: TransactionId) -> bool {
        let mut visited: HashSet<TransactionId> = HashSet::new();
        let mut frontier: Vec<TransactionId> = self
            .edges
            .get(&start)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();

        while let Some(node) = frontier.pop() {
            if node == start {
                return true;
            }
            if visited.insert(node) {
                if let Some(next) = self.edges.get(&node) {
                    frontier.extend(next.iter().copied());
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cycle_for_a_chain() {
        let mut g = WaitForGraph::new();
        let (t1, t2, t3) = (TransactionId::new(), TransactionId::new(), TransactionId::new());
        g.add_edge(t1, t2);
        g.add_edge(t2, t3);
        assert!(!g.has_cycle_through(t1));
        assert!(!g.has_cycle_through(t2));
    }

    #[test]
    fn detects_two_cycle() {
        let mut g = WaitForGraph::new();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        g.add_edge(t1, t2);
        g.add_edge(t2, t1);
        assert!(g.has_cycle_through(t1));
        assert!(g.has_cycle_through(t2));
    }

    #[test]
    fn removing_waiter_breaks_cycle() {
        let mut g = WaitForGraph::new();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        g.add_edge(t1, t2);
        g.add_edge(t2, t1);
        g.remove_waiter(t2);
        assert!(!g.has_cycle_through(t1));
    }
}
