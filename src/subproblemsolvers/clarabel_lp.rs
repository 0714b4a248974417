//! The fractional relaxation of the k-terminal cut assignment program, solved as an LP with
//! Clarabel.
//!
//! Every non-terminal vertex `v` gets weights `x[v, t]` summing to one, terminals are fixed to
//! themselves, and for every edge `uv` and terminal `t` an auxiliary `d[uv, t] >= |x[u, t] - x[v, t]|`
//! measures the disagreement. The objective is `sum_uv c_uv / 2 * sum_t d[uv, t]`.

use crate::error::{KtcError, Result};
use crate::graph::KtcGraph;
use crate::persistence::{Relaxation, RelaxationSolver};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSolver, IPSolver, NonnegativeConeT, SolverStatus, ZeroConeT,
};
use ndarray::{Array1, Array2};
use sprs::{CsMat, TriMat};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct ClarabelRelaxationSolver {
    pub max_iter: u32,
    pub verbose: bool,
}

impl Default for ClarabelRelaxationSolver {
    fn default() -> Self {
        Self {
            max_iter: 200,
            verbose: false,
        }
    }
}

impl ClarabelRelaxationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_cb_form(p0: &CsMat<f64>) -> CscMatrix {
        let (t, y, u) = p0.to_csc().into_raw_storage();
        CscMatrix::new(p0.rows(), p0.cols(), t, y, u)
    }
}

/// One end of an edge in the LP, either a variable block or a fixed terminal
#[derive(Clone, Copy)]
enum Endpoint {
    Free(usize),
    Terminal(usize),
}

impl RelaxationSolver for ClarabelRelaxationSolver {
    fn solve_relaxation(&self, graph: &KtcGraph, terminals: &[usize]) -> Result<Relaxation> {
        graph.validate_terminals(terminals)?;

        let k = terminals.len();
        let vertices = graph
            .vertices()
            .filter(|v| !terminals.contains(v))
            .collect::<Vec<usize>>();
        let n = vertices.len();

        let row_of = vertices
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect::<BTreeMap<usize, usize>>();
        let terminal_index = terminals
            .iter()
            .enumerate()
            .map(|(j, &t)| (t, j))
            .collect::<BTreeMap<usize, usize>>();

        let endpoint = |v: usize| match terminal_index.get(&v) {
            Some(&j) => Endpoint::Terminal(j),
            None => Endpoint::Free(row_of[&v]),
        };

        // edges between two terminals are always cut and only shift the objective
        let mut constant = 0.0;
        let mut free_edges = Vec::new();
        for (u, v, c) in graph.edges() {
            match (endpoint(u), endpoint(v)) {
                (Endpoint::Terminal(_), Endpoint::Terminal(_)) => constant += c,
                (a, b) => free_edges.push((a, b, c)),
            }
        }

        if n == 0 {
            return Ok(Relaxation {
                vertices,
                terminals: terminals.to_vec(),
                weights: Array2::zeros((0, k)),
                objective: constant,
            });
        }

        // variable layout, x[v, t] first then d[e, t]
        let num_x = n * k;
        let num_vars = num_x + free_edges.len() * k;
        let x_index = |i: usize, j: usize| i * k + j;
        let d_index = |e: usize, j: usize| num_x + e * k + j;

        let mut q = Array1::<f64>::zeros(num_vars);
        for (e, &(_, _, c)) in free_edges.iter().enumerate() {
            for j in 0..k {
                q[d_index(e, j)] = 0.5 * c;
            }
        }

        // rows: n assignment equalities, then n * k nonnegativity rows, then two rows per (e, t)
        let num_eq = n;
        let num_ineq = num_x + 2 * free_edges.len() * k;
        let mut a = TriMat::new((num_eq + num_ineq, num_vars));
        let mut b = Array1::<f64>::zeros(num_eq + num_ineq);

        for i in 0..n {
            for j in 0..k {
                a.add_triplet(i, x_index(i, j), 1.0);
            }
            b[i] = 1.0;
        }

        for idx in 0..num_x {
            a.add_triplet(num_eq + idx, idx, -1.0);
        }

        let mut row = num_eq + num_x;
        for (e, &(from, to, _)) in free_edges.iter().enumerate() {
            for j in 0..k {
                // (x_from - x_to) - d <= 0 and (x_to - x_from) - d <= 0
                for (plus, minus) in [(from, to), (to, from)] {
                    let mut offset = 0.0;
                    match plus {
                        Endpoint::Free(i) => a.add_triplet(row, x_index(i, j), 1.0),
                        Endpoint::Terminal(jt) if jt == j => offset += 1.0,
                        Endpoint::Terminal(_) => {}
                    }
                    match minus {
                        Endpoint::Free(i) => a.add_triplet(row, x_index(i, j), -1.0),
                        Endpoint::Terminal(jt) if jt == j => offset -= 1.0,
                        Endpoint::Terminal(_) => {}
                    }
                    a.add_triplet(row, d_index(e, j), -1.0);
                    b[row] = -offset;
                    row += 1;
                }
            }
        }

        let a_csc: CsMat<f64> = a.to_csc();
        let a_clara = Self::make_cb_form(&a_csc);
        let p_clara = CscMatrix::zeros((num_vars, num_vars));

        let cones = [ZeroConeT(num_eq), NonnegativeConeT(num_ineq)];

        let settings = DefaultSettings {
            verbose: self.verbose,
            max_iter: self.max_iter,
            ..Default::default()
        };

        let (Some(q_slice), Some(b_slice)) = (q.as_slice(), b.as_slice()) else {
            return Err(KtcError::Relaxation(
                "problem data is not contiguous".to_string(),
            ));
        };

        let mut solver = DefaultSolver::new(&p_clara, q_slice, &a_clara, b_slice, &cones, settings);
        solver.solve();

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {}
            status => {
                return Err(KtcError::Relaxation(format!(
                    "clarabel terminated with status {status:?}"
                )))
            }
        }

        let mut weights = Array2::<f64>::zeros((n, k));
        for i in 0..n {
            for j in 0..k {
                weights[[i, j]] = solver.solution.x[x_index(i, j)].clamp(0.0, 1.0);
            }
        }

        Ok(Relaxation {
            vertices,
            terminals: terminals.to_vec(),
            weights,
            objective: solver.solution.obj_val + constant,
        })
    }
}
