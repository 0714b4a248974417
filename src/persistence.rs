//! Narrows the terminals each vertex can be grouped with, using the fractional relaxation of the
//! assignment program.
//!
//! The relaxation gives each non-terminal vertex a fractional weight per terminal. Depending on the
//! mode, a vertex with weight 1 on a terminal is fixed to it (strong), or terminals with zero
//! weight are dropped from its candidates (weak).

use crate::error::{KtcError, Result};
use crate::graph::KtcGraph;
use ndarray::Array2;
use std::collections::BTreeMap;

/// Weights within this distance of 0 or 1 are read as integral
pub const PERSISTENCE_TOLERANCE: f64 = 1E-5;

/// For every non-terminal vertex, the sorted terminals it can still be grouped with
pub type CandidateSets = BTreeMap<usize, Vec<usize>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PersistenceMode {
    #[default]
    None,
    Weak,
    Strong,
}

impl PersistenceMode {
    /// Parses `"none"`, `"weak"` or `"strong"`, a missing name means no persistence
    ///
    /// # Errors
    ///
    /// Fails on any other name.
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name.map(str::to_ascii_lowercase).as_deref() {
            None | Some("none") => Ok(Self::None),
            Some("weak") => Ok(Self::Weak),
            Some("strong") => Ok(Self::Strong),
            Some(other) => Err(KtcError::InvalidArgument(format!(
                "unknown persistence mode '{other}', expected none, weak or strong"
            ))),
        }
    }
}

/// Solution of the fractional relaxation
#[derive(Clone, Debug)]
pub struct Relaxation {
    /// Non-terminal vertices, in the row order of `weights`
    pub vertices: Vec<usize>,
    /// Terminals, in the column order of `weights`
    pub terminals: Vec<usize>,
    /// `weights[[i, j]]` is the fraction of `vertices[i]` assigned to `terminals[j]`
    pub weights: Array2<f64>,
    /// Optimal value of the relaxation
    pub objective: f64,
}

impl Relaxation {
    pub fn weight(&self, vertex: usize, terminal: usize) -> Option<f64> {
        let i = self.vertices.iter().position(|&v| v == vertex)?;
        let j = self.terminals.iter().position(|&t| t == terminal)?;
        Some(self.weights[[i, j]])
    }
}

/// Capability to solve the fractional relaxation of the assignment program
pub trait RelaxationSolver: Send + Sync {
    /// # Errors
    ///
    /// Infeasibility or numerical failure of the underlying solver must be reported, never hidden.
    fn solve_relaxation(&self, graph: &KtcGraph, terminals: &[usize]) -> Result<Relaxation>;
}

/// Every terminal is a candidate for every non-terminal vertex
pub fn all_candidates(graph: &KtcGraph, terminals: &[usize]) -> CandidateSets {
    let mut sorted_terminals = terminals.to_vec();
    sorted_terminals.sort_unstable();

    graph
        .vertices()
        .filter(|v| !terminals.contains(v))
        .map(|v| (v, sorted_terminals.clone()))
        .collect()
}

/// Computes the candidate terminals of every non-terminal vertex for the given mode, only
/// calling the relaxation solver when the mode needs it
///
/// # Errors
///
/// Solver failures are propagated, as are vertices left without any candidate.
pub fn compute_candidate_terminals<S: RelaxationSolver + ?Sized>(
    graph: &KtcGraph,
    terminals: &[usize],
    mode: PersistenceMode,
    solver: &S,
) -> Result<CandidateSets> {
    if mode == PersistenceMode::None {
        return Ok(all_candidates(graph, terminals));
    }

    let relaxation = solver.solve_relaxation(graph, terminals)?;
    candidates_from_relaxation(graph, terminals, &relaxation, mode)
}

/// Applies the persistence rule of `mode` to a relaxation solution
///
/// # Errors
///
/// Fails if the relaxation is missing a vertex or a terminal, or leaves a vertex with no
/// candidate.
pub fn candidates_from_relaxation(
    graph: &KtcGraph,
    terminals: &[usize],
    relaxation: &Relaxation,
    mode: PersistenceMode,
) -> Result<CandidateSets> {
    let mut candidates = all_candidates(graph, terminals);

    if mode == PersistenceMode::None {
        return Ok(candidates);
    }

    for (&v, vertex_candidates) in &mut candidates {
        let mut weights = Vec::with_capacity(vertex_candidates.len());
        for &t in vertex_candidates.iter() {
            let w = relaxation.weight(v, t).ok_or_else(|| {
                KtcError::Relaxation(format!("no weight for vertex {v} and terminal {t}"))
            })?;
            weights.push((t, w));
        }

        match mode {
            PersistenceMode::Strong => {
                if let Some(&(t, _)) = weights
                    .iter()
                    .find(|(_, w)| (w - 1.0).abs() <= PERSISTENCE_TOLERANCE)
                {
                    *vertex_candidates = vec![t];
                }
            }
            PersistenceMode::Weak => {
                *vertex_candidates = weights
                    .iter()
                    .filter(|(_, w)| *w > PERSISTENCE_TOLERANCE)
                    .map(|&(t, _)| t)
                    .collect();
            }
            PersistenceMode::None => {}
        }

        if vertex_candidates.is_empty() {
            return Err(KtcError::Relaxation(format!(
                "relaxation gives vertex {v} no terminal with positive weight"
            )));
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use crate::error::KtcError;
    use crate::persistence::{
        all_candidates, candidates_from_relaxation, compute_candidate_terminals,
        PersistenceMode, Relaxation, RelaxationSolver,
    };
    use crate::graph::KtcGraph;
    use crate::tests::make_triangle_graph;
    use ndarray::array;

    /// Hands back a fixed relaxation, the vertex order is 12, 13, 23
    struct FixedRelaxation(Relaxation);

    impl RelaxationSolver for FixedRelaxation {
        fn solve_relaxation(&self, _: &KtcGraph, _: &[usize]) -> crate::error::Result<Relaxation> {
            Ok(self.0.clone())
        }
    }

    struct FailingRelaxation;

    impl RelaxationSolver for FailingRelaxation {
        fn solve_relaxation(&self, _: &KtcGraph, _: &[usize]) -> crate::error::Result<Relaxation> {
            Err(KtcError::Relaxation("primal infeasible".to_string()))
        }
    }

    fn make_relaxation() -> Relaxation {
        Relaxation {
            vertices: vec![12, 13, 23],
            terminals: vec![1, 2, 3],
            weights: array![[0.5, 0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 0.3, 0.7]],
            objective: 7.5,
        }
    }

    #[test]
    fn mode_names() {
        assert_eq!(PersistenceMode::from_name(None).unwrap(), PersistenceMode::None);
        assert_eq!(PersistenceMode::from_name(Some("Weak")).unwrap(), PersistenceMode::Weak);
        assert_eq!(PersistenceMode::from_name(Some("strong")).unwrap(), PersistenceMode::Strong);
        assert!(PersistenceMode::from_name(Some("medium")).is_err());
    }

    #[test]
    fn no_persistence_keeps_everything() {
        let g = make_triangle_graph();
        let candidates =
            compute_candidate_terminals(&g, &[3, 1, 2], PersistenceMode::None, &FailingRelaxation)
                .unwrap();

        assert_eq!(candidates.len(), 3);
        assert!(candidates.values().all(|c| c == &vec![1, 2, 3]));
        assert!(!candidates.contains_key(&1));
    }

    #[test]
    fn strong_only_fixes_integral_vertices() {
        let g = make_triangle_graph();
        let solver = FixedRelaxation(make_relaxation());
        let candidates =
            compute_candidate_terminals(&g, &[1, 2, 3], PersistenceMode::Strong, &solver).unwrap();

        assert_eq!(candidates[&12], vec![1, 2, 3]);
        assert_eq!(candidates[&13], vec![1]);
        assert_eq!(candidates[&23], vec![1, 2, 3]);
    }

    #[test]
    fn weak_drops_zero_weights() {
        let g = make_triangle_graph();
        let solver = FixedRelaxation(make_relaxation());
        let candidates =
            compute_candidate_terminals(&g, &[1, 2, 3], PersistenceMode::Weak, &solver).unwrap();

        assert_eq!(candidates[&12], vec![1, 2]);
        assert_eq!(candidates[&13], vec![1]);
        assert_eq!(candidates[&23], vec![2, 3]);
    }

    #[test]
    fn solver_failures_propagate() {
        let g = make_triangle_graph();
        for mode in [PersistenceMode::Weak, PersistenceMode::Strong] {
            assert!(matches!(
                compute_candidate_terminals(&g, &[1, 2, 3], mode, &FailingRelaxation),
                Err(KtcError::Relaxation(_))
            ));
        }
    }

    #[test]
    fn empty_candidate_set_is_an_error() {
        let g = make_triangle_graph();
        let mut relaxation = make_relaxation();
        relaxation.weights[[0, 0]] = 0.0;
        relaxation.weights[[0, 1]] = 0.0;

        assert!(matches!(
            candidates_from_relaxation(&g, &[1, 2, 3], &relaxation, PersistenceMode::Weak),
            Err(KtcError::Relaxation(_))
        ));

        // without narrowing the relaxation is not consulted
        assert_eq!(
            candidates_from_relaxation(&g, &[1, 2, 3], &relaxation, PersistenceMode::None)
                .unwrap(),
            all_candidates(&g, &[1, 2, 3])
        );
    }
}
