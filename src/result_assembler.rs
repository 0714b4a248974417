//! Turns the final state of the search into the public result: the groups of original vertices per
//! terminal, the cut value, and the run report. Also derives the edge lists of the extended
//! results from the final assignment.

use crate::branchbound::{IsolationBranchingTree, TreeState};
use crate::graph::KtcGraph;
use std::collections::{BTreeMap, BTreeSet};

/// Why the search stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationReason {
    /// Every node was expanded or pruned, the incumbent is optimal
    Exhausted,
    TimeLimit,
}

/// Global bounds of the search at some point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundSnapshot {
    pub elapsed: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolverReport {
    /// Nodes evaluated, the root included
    pub node_count: usize,
    pub pruned_count: usize,
    /// Nodes that were branched on
    pub processed_count: usize,
    pub best_bound_over_time: Vec<BoundSnapshot>,
    pub elapsed_time: f64,
    pub termination_reason: TerminationReason,
    pub status: TreeState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KtcSolution {
    /// For each terminal, the original vertices grouped with it, the terminal included. Empty if
    /// no complete assignment was found in time.
    pub source_sets: BTreeMap<usize, BTreeSet<usize>>,
    pub cut_value: f64,
    pub report: SolverReport,
}

impl KtcSolution {
    /// Whether the solution holds a complete assignment
    pub fn is_feasible(&self) -> bool {
        !self.source_sets.is_empty()
    }

    /// Maps every vertex to the terminal of its group
    pub fn assignment(&self) -> BTreeMap<usize, usize> {
        self.source_sets
            .iter()
            .flat_map(|(&t, group)| group.iter().map(move |&v| (v, t)))
            .collect()
    }
}

/// The solution with the edges it removes and the edges left inside each group
#[derive(Clone, Debug, PartialEq)]
pub struct ExtendedSolution {
    pub solution: KtcSolution,
    pub removed_edges: Vec<(usize, usize, f64)>,
    pub partition_edges: BTreeMap<usize, Vec<(usize, usize, f64)>>,
}

/// Reads the incumbent and the counters off a finished tree
///
/// # Panics
///
/// If the tree has not been solved yet.
pub fn assemble_solution(tree: &IsolationBranchingTree) -> KtcSolution {
    let Some(termination_reason) = tree.termination_reason else {
        panic!("the isolation branching tree has not been solved");
    };

    let report = SolverReport {
        node_count: tree.node_count,
        pruned_count: tree.pruned_count,
        processed_count: tree.nodes_processed,
        best_bound_over_time: tree.bound_history.clone(),
        elapsed_time: tree.elapsed_time,
        termination_reason,
        status: tree.state,
    };

    let mut source_sets = BTreeMap::<usize, BTreeSet<usize>>::new();
    if let Some(assignment) = &tree.best_assignment {
        for &t in &tree.terminals {
            source_sets.entry(t).or_default();
        }
        for (&v, &t) in assignment {
            source_sets.entry(t).or_default().insert(v);
        }
    }

    KtcSolution {
        source_sets,
        cut_value: tree.best_solution_value,
        report,
    }
}

/// Edges whose endpoints are in different groups
pub fn removed_edges(
    graph: &KtcGraph,
    assignment: &BTreeMap<usize, usize>,
) -> Vec<(usize, usize, f64)> {
    graph
        .edges()
        .into_iter()
        .filter(|(u, v, _)| assignment.get(u) != assignment.get(v))
        .collect()
}

/// Edges inside each group, keyed by the group's terminal
pub fn partition_edges(
    graph: &KtcGraph,
    assignment: &BTreeMap<usize, usize>,
) -> BTreeMap<usize, Vec<(usize, usize, f64)>> {
    let mut partitions = BTreeMap::<usize, Vec<(usize, usize, f64)>>::new();
    for &t in assignment.values() {
        partitions.entry(t).or_default();
    }

    for (u, v, c) in graph.edges() {
        match (assignment.get(&u), assignment.get(&v)) {
            (Some(&a), Some(&b)) if a == b => partitions.entry(a).or_default().push((u, v, c)),
            _ => {}
        }
    }

    partitions
}

/// Attaches the requested edge lists to a solution, lists not asked for stay empty
pub fn extend_solution(
    graph: &KtcGraph,
    solution: KtcSolution,
    return_removed_edges: bool,
    return_partitions: bool,
) -> ExtendedSolution {
    let assignment = solution.assignment();

    let removed = if return_removed_edges && solution.is_feasible() {
        removed_edges(graph, &assignment)
    } else {
        Vec::new()
    };

    let partitions = if return_partitions && solution.is_feasible() {
        partition_edges(graph, &assignment)
    } else {
        BTreeMap::new()
    };

    ExtendedSolution {
        solution,
        removed_edges: removed,
        partition_edges: partitions,
    }
}

#[cfg(test)]
mod tests {
    use crate::result_assembler::{partition_edges, removed_edges};
    use crate::tests::make_cycle_graph;
    use std::collections::BTreeMap;

    #[test]
    fn edge_lists_of_assignment() {
        let g = make_cycle_graph();
        let assignment: BTreeMap<usize, usize> =
            [(1, 1), (2, 2), (3, 3), (4, 4), (5, 1), (6, 1), (7, 3), (8, 4)]
                .into_iter()
                .collect();

        let removed = removed_edges(&g, &assignment);
        let cut: f64 = removed.iter().map(|&(_, _, c)| c).sum();
        assert_eq!(cut, g.cut_value(&assignment));
        assert!(removed.contains(&(2, 6, 3.0)));
        assert!(removed.contains(&(6, 7, 2.0)));

        let partitions = partition_edges(&g, &assignment);
        assert_eq!(partitions.len(), 4);
        assert_eq!(partitions[&1], vec![(1, 5, 3.0), (5, 6, 2.0)]);
        assert!(partitions[&2].is_empty());

        // every edge is either removed or inside a group
        let kept: usize = partitions.values().map(Vec::len).sum();
        assert_eq!(kept + removed.len(), g.num_edges());
    }
}
