//! Schedule dependency graph.
//!
//! An arena of phase nodes addressed by integer index, built fresh from a
//! project's schedule rows on every recalculation. Building fresh keeps the
//! recalculation pure and testable; nothing here mutates the input rows.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::types::{PhaseKey, SchedulePhase};

/// Errors from graph construction and traversal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A `depends_on` entry names a phase that has no schedule row.
    #[error("phase {phase} depends on unknown phase {depends_on}")]
    UnknownDependency { phase: PhaseKey, depends_on: PhaseKey },

    /// The requested phase has no schedule row.
    #[error("phase {0} is not in the schedule")]
    UnknownPhase(PhaseKey),

    /// The dependency edges form a cycle. Carries the offending cycle in
    /// edge order.
    #[error("cyclic dependency: {0:?}")]
    CyclicDependency(Vec<PhaseKey>),
}

/// Dependency graph over one project's schedule phases.
///
/// Edges point from a phase to the phases it depends on; the reverse edges
/// (dependents) are indexed at build time for forward traversal.
#[derive(Debug, Clone)]
pub struct ScheduleGraph {
    keys: Vec<PhaseKey>,
    deps: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
    index: HashMap<PhaseKey, usize>,
}

impl ScheduleGraph {
    /// Builds the graph from a project's schedule rows.
    ///
    /// Node order follows the input slice, which keeps traversal order
    /// deterministic for equal inputs. Dangling `depends_on` references are
    /// rejected.
    pub fn build(phases: &[SchedulePhase]) -> Result<Self, GraphError> {
        let keys: Vec<PhaseKey> = phases.iter().map(|p| p.phase_key.clone()).collect();
        let index: HashMap<PhaseKey, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        let mut deps = vec![Vec::new(); phases.len()];
        let mut dependents = vec![Vec::new(); phases.len()];

        for (i, phase) in phases.iter().enumerate() {
            for dep_key in &phase.depends_on {
                let dep = *index.get(dep_key).ok_or_else(|| GraphError::UnknownDependency {
                    phase: phase.phase_key.clone(),
                    depends_on: dep_key.clone(),
                })?;
                deps[i].push(dep);
                dependents[dep].push(i);
            }
        }

        Ok(ScheduleGraph {
            keys,
            deps,
            dependents,
            index,
        })
    }

    /// Looks up a phase's node index.
    pub fn node(&self, key: &PhaseKey) -> Result<usize, GraphError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownPhase(key.clone()))
    }

    /// Detects a cycle in the dependency edges.
    ///
    /// Uses depth-first search with three-color marking: white (unvisited),
    /// gray (on the stack), black (done). A back edge to a gray node is a
    /// cycle; the returned vector lists it in edge order.
    pub fn detect_cycle(&self) -> Option<Vec<PhaseKey>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn dfs(
            node: usize,
            deps: &[Vec<usize>],
            colors: &mut [Color],
            path: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            colors[node] = Color::Gray;
            path.push(node);

            for &dep in &deps[node] {
                match colors[dep] {
                    Color::Gray => {
                        if let Some(pos) = path.iter().position(|&n| n == dep) {
                            return Some(path[pos..].to_vec());
                        }
                    }
                    Color::White => {
                        if let Some(cycle) = dfs(dep, deps, colors, path) {
                            return Some(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }

            path.pop();
            colors[node] = Color::Black;
            None
        }

        let mut colors = vec![Color::White; self.keys.len()];
        for node in 0..self.keys.len() {
            if colors[node] == Color::White {
                let mut path = Vec::new();
                if let Some(cycle) = dfs(node, &self.deps, &mut colors, &mut path) {
                    return Some(cycle.into_iter().map(|n| self.keys[n].clone()).collect());
                }
            }
        }

        None
    }

    /// All transitive dependents of a phase, in topological order
    /// (dependents before their own dependents).
    ///
    /// The graph must be acyclic; run [`detect_cycle`](Self::detect_cycle)
    /// first. Implemented as a forward walk over the reverse edges followed
    /// by Kahn's algorithm restricted to the reachable sub-graph.
    pub fn transitive_dependents(&self, key: &PhaseKey) -> Result<Vec<PhaseKey>, GraphError> {
        let start = self.node(key)?;

        // Reachable set via BFS over dependent edges.
        let mut reachable = vec![false; self.keys.len()];
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for &dependent in &self.dependents[node] {
                if !reachable[dependent] {
                    reachable[dependent] = true;
                    queue.push_back(dependent);
                }
            }
        }

        // Kahn over the sub-graph induced by {start} and its dependents.
        // Dependencies outside the sub-graph don't constrain the order.
        let in_subgraph = |n: usize| n == start || reachable[n];
        let mut indegree = vec![0usize; self.keys.len()];
        for node in 0..self.keys.len() {
            if reachable[node] {
                indegree[node] = self.deps[node].iter().filter(|&&d| in_subgraph(d)).count();
            }
        }

        let mut ready: VecDeque<usize> = VecDeque::from([start]);
        let mut order = Vec::new();
        while let Some(node) = ready.pop_front() {
            if node != start {
                order.push(self.keys[node].clone());
            }
            for &dependent in &self.dependents[node] {
                if reachable[dependent] {
                    indegree[dependent] -= 1;
                    if indegree[dependent] == 0 {
                        ready.push_back(dependent);
                    }
                }
            }
        }

        Ok(order)
    }
}
