//! Acts as the interface to rust code from python. The graph is passed as an edge list where the
//! capacity of an edge may be `None`, and the terminals as a list of vertex labels.
use std::collections::{BTreeMap, BTreeSet};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::KtcError;
use crate::graph::{InputEdge, KtcGraph};
use crate::max_flow::DinicOracle;
use crate::persistence::{PersistenceMode, RelaxationSolver};
use crate::result_assembler::{extend_solution, KtcSolution, SolverReport};
use crate::solver_options::SolverOptions;
use crate::subproblemsolvers::clarabel_lp::ClarabelRelaxationSolver;

// type alias for the report handed back to python
// (node_count, pruned_count, processed_count, elapsed_time, termination_reason, status,
// best_bound_over_time as (elapsed, lower_bound, upper_bound))
type ReportData = (
    usize,
    usize,
    usize,
    f64,
    String,
    String,
    Vec<(f64, f64, f64)>,
);

type EdgeData = (usize, usize, f64);

impl From<KtcError> for PyErr {
    fn from(err: KtcError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn report_data(report: &SolverReport) -> ReportData {
    (
        report.node_count,
        report.pruned_count,
        report.processed_count,
        report.elapsed_time,
        format!("{:?}", report.termination_reason),
        format!("{:?}", report.status),
        report
            .best_bound_over_time
            .iter()
            .map(|s| (s.elapsed, s.lower_bound, s.upper_bound))
            .collect(),
    )
}

fn solve(
    graph: &KtcGraph,
    terminals: &[usize],
    persistence: Option<&str>,
    time_limit: f64,
    verbose: Option<usize>,
    branch_strategy: Option<String>,
    seed: Option<usize>,
) -> PyResult<KtcSolution> {
    let mut options = SolverOptions::new();

    options.set_persistence(persistence)?;

    options.set_branch_strategy(branch_strategy);

    options.max_time = time_limit;

    options.verbose = verbose.unwrap_or(0);

    options.seed = seed.unwrap_or(0);

    Ok(crate::isolation_branching_with_options(
        graph,
        terminals,
        options,
        Box::new(DinicOracle),
        &ClarabelRelaxationSolver::new(),
    )?)
}

/// Solves k-terminal cut with isolation branching, returns the vertex groups of each terminal, the
/// cut value and the report of the search.
///
/// Example
/// ``` python
/// import ktcut
///
/// edges = [(1, 4, 3.0), (2, 4, 2.0), (3, 4, None), (2, 3, 5.0)]
///
/// source_sets, cut_value, report = ktcut.isolation_branching(edges, [1, 2, 3], persistence="weak", time_limit=10.0)
/// ```
///
/// # Errors
///
/// Raises `ValueError` on invalid terminals, capacities, or persistence names, and when the
/// relaxation solver fails.
#[pyfunction]
#[pyo3(signature = (edges, terminals, persistence=None, time_limit=600.0, verbose=None, vertices=None, branch_strategy=None, seed=None))]
pub fn isolation_branching(
    edges: Vec<InputEdge>,
    terminals: Vec<usize>,
    persistence: Option<String>,
    time_limit: f64,
    verbose: Option<usize>,
    vertices: Option<Vec<usize>>,
    branch_strategy: Option<String>,
    seed: Option<usize>,
) -> PyResult<(BTreeMap<usize, BTreeSet<usize>>, f64, ReportData)> {
    let graph = KtcGraph::from_edges(&vertices.unwrap_or_default(), &edges)?;

    let solution = solve(
        &graph,
        &terminals,
        persistence.as_deref(),
        time_limit,
        verbose,
        branch_strategy,
        seed,
    )?;

    let report = report_data(&solution.report);
    Ok((solution.source_sets, solution.cut_value, report))
}

/// Same as `isolation_branching`, additionally returns the edges removed by the cut and the edges
/// inside each group when asked for.
///
/// Example
/// ``` python
/// import ktcut
///
/// source_sets, cut_value, report, removed, partitions = ktcut.isolation_branching_extended_results(
///     edges, [1, 2, 3], return_removed_edges=True, return_partitions=True)
/// ```
///
/// # Errors
///
/// Same as `isolation_branching`.
#[pyfunction]
#[pyo3(signature = (edges, terminals, persistence=None, time_limit=600.0, verbose=None, return_removed_edges=false, return_partitions=false))]
pub fn isolation_branching_extended_results(
    edges: Vec<InputEdge>,
    terminals: Vec<usize>,
    persistence: Option<String>,
    time_limit: f64,
    verbose: Option<usize>,
    return_removed_edges: bool,
    return_partitions: bool,
) -> PyResult<(
    BTreeMap<usize, BTreeSet<usize>>,
    f64,
    ReportData,
    Vec<EdgeData>,
    BTreeMap<usize, Vec<EdgeData>>,
)> {
    let graph = KtcGraph::from_edges(&[], &edges)?;

    let solution = solve(
        &graph,
        &terminals,
        persistence.as_deref(),
        time_limit,
        verbose,
        None,
        None,
    )?;

    let extended = extend_solution(&graph, solution, return_removed_edges, return_partitions);
    let report = report_data(&extended.solution.report);

    Ok((
        extended.solution.source_sets,
        extended.solution.cut_value,
        report,
        extended.removed_edges,
        extended.partition_edges,
    ))
}

/// Solves the fractional relaxation, returns its value and the weight of every non-terminal
/// vertex on each terminal, in the order of `terminals`.
///
/// Example
/// ``` python
/// import ktcut
///
/// value, weights = ktcut.lp_relaxation(edges, [1, 2, 3])
/// ```
///
/// # Errors
///
/// Raises `ValueError` on invalid input and when the solver fails.
#[pyfunction]
#[pyo3(signature = (edges, terminals, persistence=None))]
pub fn lp_relaxation(
    edges: Vec<InputEdge>,
    terminals: Vec<usize>,
    persistence: Option<String>,
) -> PyResult<(f64, BTreeMap<usize, Vec<f64>>, BTreeMap<usize, Vec<usize>>)> {
    let graph = KtcGraph::from_edges(&[], &edges)?;

    let relaxation = ClarabelRelaxationSolver::new().solve_relaxation(&graph, &terminals)?;

    let weights = relaxation
        .vertices
        .iter()
        .zip(relaxation.weights.rows())
        .map(|(&v, row)| (v, row.to_vec()))
        .collect();

    // candidate terminals under the requested persistence, without solving the LP twice
    let mode = PersistenceMode::from_name(persistence.as_deref())?;
    let candidates =
        crate::persistence::candidates_from_relaxation(&graph, &terminals, &relaxation, mode)?;

    Ok((relaxation.objective, weights, candidates))
}

#[pymodule]
fn ktcut(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(isolation_branching, m)?)?;
    m.add_function(wrap_pyfunction!(isolation_branching_extended_results, m)?)?;
    m.add_function(wrap_pyfunction!(lp_relaxation, m)?)?;
    Ok(())
}
