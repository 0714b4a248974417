//! The capacitated, undirected graph the solver works on.
//!
//! Vertices are `usize` labels. Every edge carries a positive capacity, and vertices that absorbed
//! other vertices through contraction remember which original labels they now stand for.

use crate::error::{KtcError, Result};
use smolprng::{Algorithm, PRNG};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Capacity given to edges that are supplied without one
pub const DEFAULT_CAPACITY: f64 = 1.0;

/// An input edge, where the capacity may be missing
pub type InputEdge = (usize, usize, Option<f64>);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KtcGraph {
    adjacency: BTreeMap<usize, BTreeMap<usize, f64>>,
    combined: BTreeMap<usize, BTreeSet<usize>>,
}

impl KtcGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a list of vertices and edges, edges without a capacity get
    /// [`DEFAULT_CAPACITY`]. Endpoints of edges are added even if they are not listed as vertices.
    ///
    /// Example:
    /// ```rust
    /// use ktcut::graph::KtcGraph;
    ///
    /// let g = KtcGraph::from_edges(&[1, 2, 3], &[(1, 2, None), (2, 3, Some(2.5))]).unwrap();
    /// assert_eq!(g.capacity(1, 2), Some(1.0));
    /// assert_eq!(g.total_capacity(), 3.5);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on self-loops and on capacities that are not positive and finite.
    pub fn from_edges(vertices: &[usize], edges: &[InputEdge]) -> Result<Self> {
        let mut graph = Self::new();

        for &v in vertices {
            graph.add_vertex(v);
        }

        for &(u, v, capacity) in edges {
            graph.add_edge(u, v, capacity.unwrap_or(DEFAULT_CAPACITY))?;
        }

        Ok(graph)
    }

    /// Generates a random graph where each pair of vertices is joined with probability `density`,
    /// with integral capacities between 1 and `max_capacity`
    pub fn make_random_graph<T: Algorithm>(
        num_vertices: usize,
        prng: &mut PRNG<T>,
        density: f64,
        max_capacity: usize,
    ) -> Self {
        let mut graph = Self::new();
        let max_capacity = max_capacity.max(1) as u64;

        for i in 0..num_vertices {
            graph.add_vertex(i);
        }

        for i in 0..num_vertices {
            for j in (i + 1)..num_vertices {
                if prng.gen_f64() < density {
                    let capacity = 1 + prng.gen_u64() % max_capacity;
                    graph.insert_capacity(i, j, capacity as f64);
                }
            }
        }

        graph
    }

    pub fn add_vertex(&mut self, v: usize) {
        self.adjacency.entry(v).or_default();
    }

    /// Adds an edge, if the edge is already present then the capacities are summed
    ///
    /// # Errors
    ///
    /// Fails on self-loops and on capacities that are not positive and finite.
    pub fn add_edge(&mut self, u: usize, v: usize, capacity: f64) -> Result<()> {
        if u == v {
            return Err(KtcError::InvalidArgument(format!(
                "self-loop on vertex {u} is not allowed"
            )));
        }

        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(KtcError::InvalidArgument(format!(
                "edge ({u}, {v}) has capacity {capacity}, capacities must be positive"
            )));
        }

        self.insert_capacity(u, v, capacity);
        Ok(())
    }

    /// Adds capacity to the edge (u, v), creating it if needed. Callers guarantee u != v.
    pub(crate) fn insert_capacity(&mut self, u: usize, v: usize, capacity: f64) {
        *self.adjacency.entry(u).or_default().entry(v).or_insert(0.0) += capacity;
        *self.adjacency.entry(v).or_default().entry(u).or_insert(0.0) += capacity;
    }

    /// Removes a vertex and all of its edges, returning its neighborhood
    pub(crate) fn remove_vertex(&mut self, v: usize) -> Option<BTreeMap<usize, f64>> {
        let neighborhood = self.adjacency.remove(&v)?;

        for w in neighborhood.keys() {
            if let Some(w_adj) = self.adjacency.get_mut(w) {
                w_adj.remove(&v);
            }
        }

        Some(neighborhood)
    }

    /// Removes and returns the contracted-vertex record of `v`
    pub(crate) fn take_record(&mut self, v: usize) -> Option<BTreeSet<usize>> {
        self.combined.remove(&v)
    }

    pub(crate) fn extend_record<I: IntoIterator<Item = usize>>(&mut self, v: usize, labels: I) {
        self.combined.entry(v).or_default().extend(labels);
    }

    pub fn contains_vertex(&self, v: usize) -> bool {
        self.adjacency.contains_key(&v)
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Vertices in ascending label order
    pub fn vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.keys().copied()
    }

    /// Neighbors of `v` with the capacity of the joining edge, empty if `v` is not in the graph
    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency
            .get(&v)
            .into_iter()
            .flat_map(|adj| adj.iter().map(|(&w, &c)| (w, c)))
    }

    pub fn capacity(&self, u: usize, v: usize) -> Option<f64> {
        self.adjacency.get(&u)?.get(&v).copied()
    }

    /// Every edge once, as (u, v, capacity) with u < v
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        let mut edges = Vec::with_capacity(self.num_edges());
        for (&u, adj) in &self.adjacency {
            for (&v, &c) in adj.range((u + 1)..) {
                edges.push((u, v, c));
            }
        }
        edges
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency.get(&v).map_or(0, BTreeMap::len)
    }

    /// Total capacity of the edges incident to `v`
    pub fn weighted_degree(&self, v: usize) -> f64 {
        self.adjacency.get(&v).map_or(0.0, |adj| adj.values().sum())
    }

    pub fn total_capacity(&self) -> f64 {
        self.edges().iter().map(|&(_, _, c)| c).sum()
    }

    /// The original labels that `v` absorbed through contraction, if any
    pub fn combined(&self, v: usize) -> Option<&BTreeSet<usize>> {
        self.combined.get(&v)
    }

    /// Every original label `v` stands for, including itself
    pub fn represented(&self, v: usize) -> BTreeSet<usize> {
        let mut labels = self.combined.get(&v).cloned().unwrap_or_default();
        labels.insert(v);
        labels
    }

    /// Weight of the edges whose endpoints are assigned to different terminals. Vertices missing
    /// from the assignment are treated as being in their own group.
    pub fn cut_value(&self, assignment: &BTreeMap<usize, usize>) -> f64 {
        self.edges()
            .iter()
            .filter(|(u, v, _)| assignment.get(u).is_none() || assignment.get(u) != assignment.get(v))
            .map(|&(_, _, c)| c)
            .sum()
    }

    /// Checks that the terminal set is non-empty, repeat free, and contained in the graph
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate_terminals(&self, terminals: &[usize]) -> Result<()> {
        if terminals.is_empty() {
            return Err(KtcError::InvalidArgument(
                "the terminal set is empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(terminals.len());
        for &t in terminals {
            if !seen.insert(t) {
                return Err(KtcError::InvalidArgument(format!(
                    "terminal {t} is listed more than once"
                )));
            }
            if !self.contains_vertex(t) {
                return Err(KtcError::VertexNotFound(t));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::KtcError;
    use crate::graph::KtcGraph;
    use crate::tests::{make_cycle_graph, make_test_prng};
    use std::collections::BTreeMap;

    #[test]
    fn missing_capacity_defaults_to_one() {
        let g = KtcGraph::from_edges(&[], &[(1, 2, None), (2, 3, Some(4.0))]).unwrap();
        assert_eq!(g.capacity(2, 1), Some(1.0));
        assert_eq!(g.capacity(3, 2), Some(4.0));
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn repeated_edges_are_summed() {
        let g = KtcGraph::from_edges(&[], &[(1, 2, Some(1.5)), (2, 1, Some(2.0))]).unwrap();
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.capacity(1, 2), Some(3.5));
    }

    #[test]
    fn bad_edges_are_rejected() {
        assert!(matches!(
            KtcGraph::from_edges(&[], &[(1, 1, None)]),
            Err(KtcError::InvalidArgument(_))
        ));
        assert!(matches!(
            KtcGraph::from_edges(&[], &[(1, 2, Some(0.0))]),
            Err(KtcError::InvalidArgument(_))
        ));
        assert!(matches!(
            KtcGraph::from_edges(&[], &[(1, 2, Some(f64::NAN))]),
            Err(KtcError::InvalidArgument(_))
        ));
    }

    #[test]
    fn cut_value_of_assignment() {
        let g = make_cycle_graph();

        // every cycle vertex with its own terminal cuts the whole cycle
        let assignment: BTreeMap<usize, usize> =
            [(1, 1), (2, 2), (3, 3), (4, 4), (5, 1), (6, 2), (7, 3), (8, 4)]
                .into_iter()
                .collect();
        assert_eq!(g.cut_value(&assignment), 8.0);

        // moving the whole cycle to terminal 1 cuts three terminal edges
        let assignment: BTreeMap<usize, usize> =
            [(1, 1), (2, 2), (3, 3), (4, 4), (5, 1), (6, 1), (7, 1), (8, 1)]
                .into_iter()
                .collect();
        assert_eq!(g.cut_value(&assignment), 9.0);
    }

    #[test]
    fn terminal_validation() {
        let g = make_cycle_graph();
        assert!(g.validate_terminals(&[1, 2, 3, 4]).is_ok());
        assert!(matches!(
            g.validate_terminals(&[]),
            Err(KtcError::InvalidArgument(_))
        ));
        assert!(matches!(
            g.validate_terminals(&[1, 2, 1]),
            Err(KtcError::InvalidArgument(_))
        ));
        assert_eq!(g.validate_terminals(&[1, 99]), Err(KtcError::VertexNotFound(99)));
    }

    #[test]
    fn random_graph_is_well_formed() {
        let mut prng = make_test_prng();
        let g = KtcGraph::make_random_graph(30, &mut prng, 0.3, 5);

        assert_eq!(g.num_vertices(), 30);
        for (u, v, c) in g.edges() {
            assert!(u < v);
            assert!((1.0..=5.0).contains(&c));
            assert_eq!(g.capacity(v, u), Some(c));
        }
    }
}
