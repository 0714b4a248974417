//! Exact k-terminal cut by isolation branching.
//!
//! Given an undirected graph with positive edge capacities and k terminal vertices, find the
//! partition of the vertices into k groups, one terminal per group, that minimizes the capacity of
//! the edges between groups.
//!
//! The search is a branch and bound over the assignment of the non-terminal vertices, bounded at
//! every node by the isolating cuts of the terminals. The assignment can be narrowed before the
//! search starts with the persistence of the fractional relaxation.
//!
//! Example:
//! ```rust
//! use ktcut::graph::KtcGraph;
//! use ktcut::persistence::PersistenceMode;
//!
//! let g = KtcGraph::from_edges(
//!     &[],
//!     &[(1, 4, Some(3.0)), (2, 4, Some(2.0)), (3, 4, None), (2, 3, Some(5.0))],
//! )
//! .unwrap();
//!
//! let solution = ktcut::isolation_branching(&g, &[1, 2, 3], PersistenceMode::None, 10.0).unwrap();
//! assert_eq!(solution.cut_value, 8.0);
//! assert!(solution.source_sets[&1].contains(&4));
//! ```

use crate::branchbound::IsolationBranchingTree;
use crate::error::Result;
use crate::graph::KtcGraph;
use crate::max_flow::{DinicOracle, MinCutOracle};
use crate::persistence::{compute_candidate_terminals, PersistenceMode, RelaxationSolver};
use crate::result_assembler::{assemble_solution, extend_solution, ExtendedSolution, KtcSolution};
use crate::solver_options::SolverOptions;
use crate::subproblemsolvers::clarabel_lp::ClarabelRelaxationSolver;

pub mod branch_node;
pub mod branch_stratagy;
pub mod branchbound;
pub mod branchbound_utils;
pub mod branchboundlogger;
pub mod contraction;
pub mod error;
pub mod graph;
pub mod heuristic_stratagy;
pub mod isolating_cut;
pub mod max_flow;
pub mod persistence;
pub mod result_assembler;
pub mod solver_options;

pub mod subproblemsolvers {
    pub mod clarabel_lp;
    pub mod enumerate_ktc;
}

#[cfg(feature = "python")]
pub mod python_interopt;

/// Solves k-terminal cut on `graph` with the default min-cut oracle and relaxation solver
///
/// # Errors
///
/// Fails on an invalid terminal set or time limit, and when the relaxation solver fails under weak
/// or strong persistence. Running out of time is reported in the solution, not as an error.
pub fn isolation_branching(
    graph: &KtcGraph,
    terminals: &[usize],
    persistence: PersistenceMode,
    time_limit: f64,
) -> Result<KtcSolution> {
    let mut options = SolverOptions::new();
    options.persistence = persistence;
    options.max_time = time_limit;

    isolation_branching_with_options(
        graph,
        terminals,
        options,
        Box::new(DinicOracle),
        &ClarabelRelaxationSolver::new(),
    )
}

/// Solves k-terminal cut with explicit options and collaborators
///
/// # Errors
///
/// Fails on an invalid terminal set or time limit, and propagates failures of the relaxation
/// solver and of the min-cut oracle.
pub fn isolation_branching_with_options(
    graph: &KtcGraph,
    terminals: &[usize],
    options: SolverOptions,
    oracle: Box<dyn MinCutOracle>,
    relaxation_solver: &dyn RelaxationSolver,
) -> Result<KtcSolution> {
    graph.validate_terminals(terminals)?;

    let candidates =
        compute_candidate_terminals(graph, terminals, options.persistence, relaxation_solver)?;

    let mut tree = IsolationBranchingTree::new(graph.clone(), terminals, candidates, options, oracle)?;
    tree.solve()?;

    Ok(assemble_solution(&tree))
}

/// Solves k-terminal cut like [`isolation_branching`], and additionally lists the edges removed by
/// the cut and the edges kept inside each group when asked for
///
/// # Errors
///
/// Same as [`isolation_branching`].
pub fn isolation_branching_extended_results(
    graph: &KtcGraph,
    terminals: &[usize],
    persistence: PersistenceMode,
    time_limit: f64,
    return_removed_edges: bool,
    return_partitions: bool,
) -> Result<ExtendedSolution> {
    let solution = isolation_branching(graph, terminals, persistence, time_limit)?;

    Ok(extend_solution(
        graph,
        solution,
        return_removed_edges,
        return_partitions,
    ))
}
