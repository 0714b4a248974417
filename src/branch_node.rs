use crate::contraction::{contract, contract_vertex};
use crate::error::Result;
use crate::graph::KtcGraph;
use crate::isolating_cut::IsolatingCut;
use crate::persistence::CandidateSets;
use std::collections::{BTreeMap, BTreeSet};

/// Struct the describes the isolation branching tree nodes
///
/// Resolved vertices are contracted into their terminal in `graph`, so the only non-terminal
/// vertices left are the keys of `candidates`.
#[derive(Clone, Debug)]
pub struct IsolationNode {
    pub lower_bound: f64,
    pub graph: KtcGraph,
    pub candidates: CandidateSets,
    pub depth: usize,
}

impl IsolationNode {
    pub fn new(graph: KtcGraph, candidates: CandidateSets) -> Self {
        Self {
            lower_bound: f64::NEG_INFINITY,
            graph,
            candidates,
            depth: 0,
        }
    }

    /// A node is complete when every vertex has been assigned to a terminal
    pub fn is_complete(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn num_unresolved(&self) -> usize {
        self.candidates.len()
    }

    /// Assigns `vertex` to `terminal` by contracting it into the terminal
    ///
    /// # Errors
    ///
    /// Fails if either vertex is no longer in the node graph.
    pub fn resolve_vertex(&mut self, vertex: usize, terminal: usize) -> Result<()> {
        contract_vertex(&mut self.graph, terminal, vertex)?;
        self.candidates.remove(&vertex);
        Ok(())
    }

    /// Contracts every vertex whose assignment is already decided: vertices with a single candidate
    /// terminal, and vertices with no edges left, which go to their first candidate at no cost.
    /// Returns the number of vertices resolved.
    ///
    /// # Panics
    ///
    /// If a vertex has no candidate terminal at all.
    ///
    /// # Errors
    ///
    /// Propagates contraction failures.
    pub fn resolve_trivial_vertices(&mut self) -> Result<usize> {
        let mut groups = BTreeMap::<usize, Vec<usize>>::new();

        for (&v, candidates) in &self.candidates {
            let Some(&first) = candidates.first() else {
                panic!("vertex {v} has no candidate terminal");
            };

            if candidates.len() == 1 || self.graph.degree(v) == 0 {
                groups.entry(first).or_default().push(v);
            }
        }

        let mut resolved = 0;
        for (terminal, vertices) in groups {
            contract(&mut self.graph, terminal, &vertices)?;
            for v in &vertices {
                self.candidates.remove(v);
            }
            resolved += vertices.len();
        }

        Ok(resolved)
    }

    /// Contracts the source side of each isolating cut into its terminal. A source side that
    /// overlaps one already contracted is skipped. Returns the number of vertices resolved.
    ///
    /// # Errors
    ///
    /// Propagates contraction failures.
    pub fn contract_isolating_sources(&mut self, cuts: &[IsolatingCut]) -> Result<usize> {
        let mut claimed = BTreeSet::new();
        let mut resolved = 0;

        for cut in cuts {
            let absorbed = cut
                .source_side
                .iter()
                .copied()
                .filter(|v| self.candidates.contains_key(v))
                .collect::<Vec<usize>>();

            if absorbed.is_empty() || absorbed.iter().any(|v| claimed.contains(v)) {
                continue;
            }

            contract(&mut self.graph, cut.terminal, &absorbed)?;
            for v in &absorbed {
                self.candidates.remove(v);
            }

            resolved += absorbed.len();
            claimed.extend(absorbed);
        }

        Ok(resolved)
    }

    /// Maps every original vertex that has been resolved to its terminal
    pub fn assignment(&self, terminals: &[usize]) -> BTreeMap<usize, usize> {
        terminals
            .iter()
            .flat_map(|&t| self.graph.represented(t).into_iter().map(move |v| (v, t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::branch_node::IsolationNode;
    use crate::isolating_cut::IsolatingCut;
    use crate::persistence::all_candidates;
    use crate::tests::make_cycle_graph;
    use std::collections::BTreeMap;

    const TERMINALS: [usize; 4] = [1, 2, 3, 4];

    fn make_root() -> IsolationNode {
        let g = make_cycle_graph();
        let candidates = all_candidates(&g, &TERMINALS);
        IsolationNode::new(g, candidates)
    }

    #[test]
    fn resolving_moves_vertices_into_terminals() {
        let mut node = make_root();
        assert_eq!(node.num_unresolved(), 4);

        node.resolve_vertex(5, 1).unwrap();
        node.resolve_vertex(6, 1).unwrap();

        assert_eq!(node.num_unresolved(), 2);
        assert!(!node.graph.contains_vertex(5));
        assert_eq!(node.graph.capacity(1, 2), Some(3.0));

        let assignment = node.assignment(&TERMINALS);
        assert_eq!(assignment[&5], 1);
        assert_eq!(assignment[&6], 1);
        assert_eq!(assignment[&3], 3);
        assert!(!assignment.contains_key(&7));
    }

    #[test]
    fn trivial_vertices_are_resolved() {
        let mut node = make_root();
        node.candidates.insert(5, vec![1]);
        node.candidates.insert(7, vec![3]);

        assert_eq!(node.resolve_trivial_vertices().unwrap(), 2);
        assert_eq!(node.num_unresolved(), 2);
        assert!(!node.is_complete());

        // an isolated vertex goes to its first candidate
        node.graph.add_vertex(42);
        node.candidates.insert(42, vec![2, 4]);
        assert_eq!(node.resolve_trivial_vertices().unwrap(), 1);
        assert_eq!(node.assignment(&TERMINALS)[&42], 2);
    }

    #[test]
    #[should_panic(expected = "no candidate terminal")]
    fn empty_candidates_panic() {
        let mut node = make_root();
        node.candidates.insert(5, vec![]);
        let _ = node.resolve_trivial_vertices();
    }

    #[test]
    fn overlapping_source_sides_are_skipped() {
        let mut node = make_root();
        let cuts = vec![
            IsolatingCut {
                terminal: 1,
                cut_value: 4.0,
                source_side: [1, 5, 6].into_iter().collect(),
            },
            IsolatingCut {
                terminal: 2,
                cut_value: 4.0,
                source_side: [2, 6].into_iter().collect(),
            },
            IsolatingCut {
                terminal: 3,
                cut_value: 4.0,
                source_side: [3, 7].into_iter().collect(),
            },
        ];

        assert_eq!(node.contract_isolating_sources(&cuts).unwrap(), 3);

        let assignment = node.assignment(&TERMINALS);
        let expected: BTreeMap<usize, usize> =
            [(1, 1), (2, 2), (3, 3), (4, 4), (5, 1), (6, 1), (7, 3)]
                .into_iter()
                .collect();
        assert_eq!(assignment, expected);
        assert_eq!(node.candidates.keys().copied().collect::<Vec<_>>(), vec![8]);
    }
}
