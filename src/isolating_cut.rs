//! Isolating cuts and the lower bound of a search node.
//!
//! In a node graph every resolved vertex has already been contracted into its terminal. The
//! isolating cut of a terminal `t` separates `t` from a single sink made of the other terminals
//! and every undetermined vertex that can no longer join `t`.
//!
//! An edge crossing a complete partition leaves exactly two groups, so it is charged to exactly
//! two isolating cuts. Half the sum of the isolating cuts is therefore a lower bound on any
//! completion of the node.

use crate::contraction::contract;
use crate::error::Result;
use crate::graph::KtcGraph;
use crate::max_flow::MinCutOracle;
use crate::persistence::CandidateSets;
use std::collections::BTreeSet;

/// Minimum cut between one terminal and everything that cannot be grouped with it
#[derive(Clone, Debug, PartialEq)]
pub struct IsolatingCut {
    pub terminal: usize,
    pub cut_value: f64,
    /// Minimal source side, contains `terminal`
    pub source_side: BTreeSet<usize>,
}

/// Computes the isolating cut of `terminal` in the node graph
///
/// # Errors
///
/// Propagates contraction and oracle failures, e.g. when a terminal is missing from the graph.
pub fn isolating_cut<O: MinCutOracle + ?Sized>(
    graph: &KtcGraph,
    terminal: usize,
    terminals: &[usize],
    candidates: &CandidateSets,
    oracle: &O,
) -> Result<IsolatingCut> {
    let mut sink_set = terminals
        .iter()
        .copied()
        .filter(|&s| s != terminal)
        .collect::<Vec<usize>>();

    sink_set.extend(
        candidates
            .iter()
            .filter(|(v, c)| !c.contains(&terminal) && graph.contains_vertex(**v))
            .map(|(&v, _)| v),
    );

    // nothing to isolate from, the terminal can take the whole graph
    let Some((&sink, rest)) = sink_set.split_first() else {
        return Ok(IsolatingCut {
            terminal,
            cut_value: 0.0,
            source_side: graph.vertices().collect(),
        });
    };

    let mut working = graph.clone();
    contract(&mut working, sink, rest)?;

    let cut = oracle.min_cut(&working, terminal, sink)?;

    Ok(IsolatingCut {
        terminal,
        cut_value: cut.cut_value,
        source_side: cut.source_side,
    })
}

/// Computes the isolating cut of every terminal, in the order of `terminals`
///
/// # Errors
///
/// Propagates the first failure of [`isolating_cut`].
pub fn isolating_cuts<O: MinCutOracle + ?Sized>(
    graph: &KtcGraph,
    terminals: &[usize],
    candidates: &CandidateSets,
    oracle: &O,
) -> Result<Vec<IsolatingCut>> {
    terminals
        .iter()
        .map(|&t| isolating_cut(graph, t, terminals, candidates, oracle))
        .collect()
}

/// Half the total weight of the isolating cuts
pub fn isolating_cut_bound(cuts: &[IsolatingCut]) -> f64 {
    0.5 * cuts.iter().map(|c| c.cut_value).sum::<f64>()
}

/// Lower bound on every completion of the node described by `graph` and `candidates`
///
/// # Errors
///
/// Propagates the first failure of [`isolating_cut`].
pub fn node_lower_bound<O: MinCutOracle + ?Sized>(
    graph: &KtcGraph,
    terminals: &[usize],
    candidates: &CandidateSets,
    oracle: &O,
) -> Result<f64> {
    Ok(isolating_cut_bound(&isolating_cuts(
        graph, terminals, candidates, oracle,
    )?))
}
