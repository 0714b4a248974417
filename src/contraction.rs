//! Vertex contraction with capacity bookkeeping.
//!
//! Contracting `v` into `u` moves every edge of `v` onto `u`, summing capacities where `u` already
//! has an edge to the same neighbor, and records on `u` the original labels `v` stood for.

use crate::error::{KtcError, Result};
use crate::graph::KtcGraph;
use std::collections::BTreeSet;

/// Contracts every vertex in `absorbed` into `representative`, the graph is mutated in place and
/// returned for chaining. An empty `absorbed` leaves the graph untouched.
///
/// Example:
/// ```rust
/// use ktcut::contraction::contract;
/// use ktcut::graph::KtcGraph;
///
/// let mut g = KtcGraph::from_edges(&[], &[(1, 3, Some(1.0)), (2, 3, Some(2.0))]).unwrap();
/// contract(&mut g, 1, &[2]).unwrap();
/// assert_eq!(g.capacity(1, 3), Some(3.0));
/// ```
///
/// # Errors
///
/// Fails if `representative` is listed in `absorbed`, or if any vertex is not in the graph.
pub fn contract<'a>(
    graph: &'a mut KtcGraph,
    representative: usize,
    absorbed: &[usize],
) -> Result<&'a mut KtcGraph> {
    let absorbed_set = absorbed.iter().copied().collect::<BTreeSet<usize>>();

    if absorbed_set.contains(&representative) {
        return Err(KtcError::InvalidArgument(format!(
            "cannot contract vertex {representative} into itself"
        )));
    }

    if !graph.contains_vertex(representative) {
        return Err(KtcError::VertexNotFound(representative));
    }

    if let Some(&missing) = absorbed_set.iter().find(|&&v| !graph.contains_vertex(v)) {
        return Err(KtcError::VertexNotFound(missing));
    }

    for &v in &absorbed_set {
        // checked above, the vertex is present
        let neighborhood = graph.remove_vertex(v).unwrap_or_default();

        for (w, capacity) in neighborhood {
            if w == representative || absorbed_set.contains(&w) {
                continue;
            }
            graph.insert_capacity(representative, w, capacity);
        }

        let record = graph.take_record(v).unwrap_or_default();
        graph.extend_record(representative, record.into_iter().chain(std::iter::once(v)));
    }

    Ok(graph)
}

/// Contracts the single vertex `v` into `u`
///
/// # Errors
///
/// Fails if `u == v` or either vertex is not in the graph.
pub fn contract_vertex(graph: &mut KtcGraph, u: usize, v: usize) -> Result<&mut KtcGraph> {
    contract(graph, u, &[v])
}

#[cfg(test)]
mod tests {
    use crate::contraction::{contract, contract_vertex};
    use crate::error::KtcError;
    use crate::graph::KtcGraph;
    use crate::tests::{make_cycle_graph, make_test_prng};
    use std::collections::BTreeSet;

    #[test]
    fn parallel_capacities_are_summed() {
        // A - C with 1.5 and B - C with 2.0
        let mut g = KtcGraph::from_edges(&[], &[(0, 2, Some(1.5)), (1, 2, Some(2.0))]).unwrap();

        contract_vertex(&mut g, 0, 1).unwrap();

        assert_eq!(g.capacity(0, 2), Some(3.5));
        assert_eq!(g.num_edges(), 1);
        assert!(!g.contains_vertex(1));
    }

    #[test]
    fn records_accumulate() {
        let mut g = KtcGraph::from_edges(&[], &[(0, 1, None), (0, 2, None), (1, 2, None)]).unwrap();

        contract_vertex(&mut g, 0, 1).unwrap();
        contract_vertex(&mut g, 0, 2).unwrap();

        let expected = [1, 2].into_iter().collect::<BTreeSet<usize>>();
        assert_eq!(g.combined(0), Some(&expected));
        assert_eq!(g.num_vertices(), 1);
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn records_of_absorbed_vertices_are_carried_over() {
        let mut g = make_cycle_graph();

        contract_vertex(&mut g, 5, 6).unwrap();
        contract_vertex(&mut g, 1, 5).unwrap();

        let expected = [5, 6].into_iter().collect::<BTreeSet<usize>>();
        assert_eq!(g.combined(1), Some(&expected));
        assert_eq!(g.represented(1), [1, 5, 6].into_iter().collect::<BTreeSet<usize>>());
    }

    #[test]
    fn self_merge_fails() {
        let mut g = make_cycle_graph();
        let before = g.clone();

        assert!(matches!(
            contract_vertex(&mut g, 5, 5),
            Err(KtcError::InvalidArgument(_))
        ));
        assert!(matches!(
            contract(&mut g, 5, &[6, 5]),
            Err(KtcError::InvalidArgument(_))
        ));

        // nothing was touched
        assert_eq!(g, before);

        let mut empty = KtcGraph::new();
        empty.add_vertex(0);
        assert!(matches!(
            contract_vertex(&mut empty, 0, 0),
            Err(KtcError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_vertices_fail() {
        let mut g = make_cycle_graph();
        assert_eq!(contract(&mut g, 42, &[5]).err(), Some(KtcError::VertexNotFound(42)));
        assert_eq!(contract(&mut g, 5, &[6, 42]).err(), Some(KtcError::VertexNotFound(42)));
    }

    #[test]
    fn multi_contraction_drops_inner_edges() {
        // cycle 5 - 6 - 7 - 8 - 5 with capacity 2, each attached to a terminal with capacity 3
        let mut g = make_cycle_graph();

        contract(&mut g, 1, &[5, 6]).unwrap();

        // 1 - 5 disappears, 5 - 6 disappears, 6 - 2 moves, 5 - 8 and 6 - 7 move
        assert_eq!(g.capacity(1, 2), Some(3.0));
        assert_eq!(g.capacity(1, 8), Some(2.0));
        assert_eq!(g.capacity(1, 7), Some(2.0));
        assert_eq!(g.weighted_degree(1), 7.0);
    }

    #[test]
    fn contraction_preserves_capacity_outside_the_group() {
        let mut prng = make_test_prng();
        let g = KtcGraph::make_random_graph(25, &mut prng, 0.4, 4);

        let group = [3, 7, 11, 19];
        let inside: f64 = g
            .edges()
            .iter()
            .filter(|(u, v, _)| (*u == 0 || group.contains(u)) && (*v == 0 || group.contains(v)))
            .map(|&(_, _, c)| c)
            .sum();

        let mut h = g.clone();
        contract(&mut h, 0, &group).unwrap();

        assert!((h.total_capacity() - (g.total_capacity() - inside)).abs() < 1E-9);
        assert_eq!(h.num_vertices(), g.num_vertices() - group.len());
    }
}
