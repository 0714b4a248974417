//! The min-cut primitive the isolating cuts are computed with.
//!
//! The search only needs `min_cut(graph, source, sink)`, so the primitive is a trait that can be
//! swapped out (e.g. for a deterministic fake in tests). [`DinicOracle`] is the default.

use crate::error::{KtcError, Result};
use crate::graph::KtcGraph;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Residual capacities below this are treated as saturated
const FLOW_EPSILON: f64 = 1E-12;

/// Result of a min-cut computation
#[derive(Clone, Debug, PartialEq)]
pub struct MinCutResult {
    /// Total capacity of the edges crossing the cut
    pub cut_value: f64,
    /// Vertices on the source side, the smallest such side among minimum cuts
    pub source_side: BTreeSet<usize>,
}

/// Capability to compute a minimum (source, sink) cut on an undirected capacitated graph
pub trait MinCutOracle: Send + Sync {
    /// # Errors
    ///
    /// Implementations fail if the source or sink are missing or equal.
    fn min_cut(&self, graph: &KtcGraph, source: usize, sink: usize) -> Result<MinCutResult>;
}

/// Dinic's max-flow, the minimal source side is read off the final residual graph
#[derive(Clone, Copy, Debug, Default)]
pub struct DinicOracle;

impl MinCutOracle for DinicOracle {
    fn min_cut(&self, graph: &KtcGraph, source: usize, sink: usize) -> Result<MinCutResult> {
        if source == sink {
            return Err(KtcError::InvalidArgument(format!(
                "source and sink are both vertex {source}"
            )));
        }

        let mut network = FlowNetwork::from_graph(graph);
        let s = network.index_of(source)?;
        let t = network.index_of(sink)?;

        network.max_flow(s, t);

        // vertices still reachable from the source in the residual graph
        network.bfs(s);
        let source_side = network
            .labels
            .iter()
            .enumerate()
            .filter(|&(i, _)| network.level[i] >= 0)
            .map(|(_, &label)| label)
            .collect::<BTreeSet<usize>>();

        // sum the original capacities across the cut, this is exact for integral capacities
        let cut_value = graph
            .edges()
            .iter()
            .filter(|(u, v, _)| source_side.contains(u) != source_side.contains(v))
            .map(|&(_, _, c)| c)
            .sum();

        Ok(MinCutResult {
            cut_value,
            source_side,
        })
    }
}

#[derive(Clone, Debug)]
struct FlowEdge {
    to: usize,
    rev: usize,
    cap: f64,
}

struct FlowNetwork {
    labels: Vec<usize>,
    index: BTreeMap<usize, usize>,
    adj: Vec<Vec<FlowEdge>>,
    level: Vec<i64>,
    iter: Vec<usize>,
}

impl FlowNetwork {
    fn from_graph(graph: &KtcGraph) -> Self {
        let labels = graph.vertices().collect::<Vec<usize>>();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| (label, i))
            .collect::<BTreeMap<usize, usize>>();
        let n = labels.len();

        let mut network = Self {
            labels,
            index,
            adj: vec![Vec::new(); n],
            level: vec![-1; n],
            iter: vec![0; n],
        };

        // an undirected edge is a pair of arcs that are each other's reverse
        for (u, v, c) in graph.edges() {
            let (a, b) = (network.index[&u], network.index[&v]);
            let rev_a = network.adj[b].len();
            let rev_b = network.adj[a].len();
            network.adj[a].push(FlowEdge { to: b, rev: rev_a, cap: c });
            network.adj[b].push(FlowEdge { to: a, rev: rev_b, cap: c });
        }

        network
    }

    fn index_of(&self, label: usize) -> Result<usize> {
        self.index
            .get(&label)
            .copied()
            .ok_or(KtcError::VertexNotFound(label))
    }

    /// BFS to build the level graph from the source
    fn bfs(&mut self, s: usize) {
        self.level.fill(-1);
        let mut queue = VecDeque::new();
        self.level[s] = 0;
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            for e in &self.adj[v] {
                if e.cap > FLOW_EPSILON && self.level[e.to] < 0 {
                    self.level[e.to] = self.level[v] + 1;
                    queue.push_back(e.to);
                }
            }
        }
    }

    /// Walks one augmenting path in the level graph and pushes its bottleneck along it, returns 0
    /// once the level graph is blocked. The path is kept as (vertex, arc index) pairs on an
    /// explicit stack, so its length is not bounded by the thread stack.
    fn augment(&mut self, s: usize, t: usize) -> f64 {
        let mut path: Vec<(usize, usize)> = Vec::new();
        let mut v = s;

        loop {
            if v == t {
                let bottleneck = path
                    .iter()
                    .map(|&(u, i)| self.adj[u][i].cap)
                    .fold(f64::INFINITY, f64::min);

                for &(u, i) in &path {
                    let (to, rev) = (self.adj[u][i].to, self.adj[u][i].rev);
                    self.adj[u][i].cap -= bottleneck;
                    self.adj[to][rev].cap += bottleneck;
                }
                return bottleneck;
            }

            let mut advanced = false;
            while self.iter[v] < self.adj[v].len() {
                let i = self.iter[v];
                let to = self.adj[v][i].to;
                if self.adj[v][i].cap > FLOW_EPSILON && self.level[v] < self.level[to] {
                    path.push((v, i));
                    v = to;
                    advanced = true;
                    break;
                }
                self.iter[v] += 1;
            }

            if !advanced {
                // dead end, retire the arc that led here
                match path.pop() {
                    Some((u, _)) => {
                        self.iter[u] += 1;
                        v = u;
                    }
                    None => return 0.0,
                }
            }
        }
    }

    fn max_flow(&mut self, s: usize, t: usize) -> f64 {
        let mut total_flow = 0.0;
        loop {
            self.bfs(s);
            if self.level[t] < 0 {
                break;
            }
            self.iter.fill(0);
            loop {
                let f = self.augment(s, t);
                if f <= FLOW_EPSILON {
                    break;
                }
                total_flow += f;
            }
        }
        total_flow
    }
}

#[cfg(test)]
mod tests {
    use crate::error::KtcError;
    use crate::graph::KtcGraph;
    use crate::max_flow::{DinicOracle, MinCutOracle};
    use crate::tests::make_cycle_graph;
    use std::collections::BTreeSet;

    #[test]
    fn path_cut_is_the_bottleneck() {
        // 0 -3- 1 -1- 2 -3- 3
        let g =
            KtcGraph::from_edges(&[], &[(0, 1, Some(3.0)), (1, 2, Some(1.0)), (2, 3, Some(3.0))])
                .unwrap();
        let cut = DinicOracle.min_cut(&g, 0, 3).unwrap();

        assert_eq!(cut.cut_value, 1.0);
        assert_eq!(cut.source_side, [0, 1].into_iter().collect::<BTreeSet<usize>>());
    }

    #[test]
    fn terminal_in_cycle_graph() {
        // terminal 1 against the other three terminals merged into 2
        let mut g = make_cycle_graph();
        crate::contraction::contract(&mut g, 2, &[3, 4]).unwrap();

        let cut = DinicOracle.min_cut(&g, 1, 2).unwrap();

        // cutting the terminal edge (3) beats cutting both cycle edges (4)
        assert_eq!(cut.cut_value, 3.0);
        assert_eq!(cut.source_side, [1].into_iter().collect::<BTreeSet<usize>>());
    }

    #[test]
    fn source_side_is_minimal() {
        // two equal cuts, 0 -2- 1 -2- 2, the minimal side only holds the source
        let g = KtcGraph::from_edges(&[], &[(0, 1, Some(2.0)), (1, 2, Some(2.0))]).unwrap();
        let cut = DinicOracle.min_cut(&g, 0, 2).unwrap();

        assert_eq!(cut.cut_value, 2.0);
        assert_eq!(cut.source_side.len(), 1);
    }

    #[test]
    fn disconnected_sink_has_zero_cut() {
        let g = KtcGraph::from_edges(&[9], &[(0, 1, None)]).unwrap();
        let cut = DinicOracle.min_cut(&g, 0, 9).unwrap();

        assert_eq!(cut.cut_value, 0.0);
        assert_eq!(cut.source_side, [0, 1].into_iter().collect::<BTreeSet<usize>>());
    }

    #[test]
    fn long_path_does_not_exhaust_the_stack() {
        let n = 100_000;
        let edges = (0..n - 1)
            .map(|i| (i, i + 1, Some(if i == n / 2 { 1.0 } else { 2.0 })))
            .collect::<Vec<_>>();
        let g = KtcGraph::from_edges(&[], &edges).unwrap();

        let cut = DinicOracle.min_cut(&g, 0, n - 1).unwrap();

        assert_eq!(cut.cut_value, 1.0);
        assert_eq!(cut.source_side.len(), n / 2 + 1);
    }

    #[test]
    fn bad_endpoints() {
        let g = make_cycle_graph();
        assert!(matches!(
            DinicOracle.min_cut(&g, 1, 1),
            Err(KtcError::InvalidArgument(_))
        ));
        assert_eq!(DinicOracle.min_cut(&g, 1, 77), Err(KtcError::VertexNotFound(77)));
    }
}
