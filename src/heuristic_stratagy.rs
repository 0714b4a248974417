use crate::branch_node::IsolationNode;
use crate::branchbound::IsolationBranchingTree;
use crate::isolating_cut::IsolatingCut;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeuristicSelection {
    None,
    #[default]
    IsolatingCuts,
}

impl HeuristicSelection {
    /// Builds a complete assignment from a partially resolved node, returning it with its cut
    /// value on the original graph
    pub fn make_heuristic(
        &self,
        tree: &IsolationBranchingTree,
        node: &IsolationNode,
        cuts: &[IsolatingCut],
    ) -> Option<(BTreeMap<usize, usize>, f64)> {
        match self {
            Self::None => None,
            Self::IsolatingCuts => Some(Self::isolating_cuts(tree, node, cuts)),
        }
    }

    /// Every unresolved vertex joins the first terminal whose isolating source side holds it, and
    /// otherwise the candidate terminal with the heaviest isolating cut, so that the most expensive
    /// cut is the one left out of the solution
    pub fn isolating_cuts(
        tree: &IsolationBranchingTree,
        node: &IsolationNode,
        cuts: &[IsolatingCut],
    ) -> (BTreeMap<usize, usize>, f64) {
        let mut assignment = node.assignment(&tree.terminals);

        for (&v, candidates) in &node.candidates {
            let by_source_side = cuts
                .iter()
                .find(|cut| cut.source_side.contains(&v))
                .map(|cut| cut.terminal);

            let by_heaviest_cut = || {
                let mut best = candidates.first().copied();
                let mut heaviest = f64::NEG_INFINITY;
                for cut in cuts.iter().filter(|cut| candidates.contains(&cut.terminal)) {
                    if cut.cut_value > heaviest {
                        heaviest = cut.cut_value;
                        best = Some(cut.terminal);
                    }
                }
                best
            };

            if let Some(t) = by_source_side.or_else(by_heaviest_cut) {
                for label in node.graph.represented(v) {
                    assignment.insert(label, t);
                }
            }
        }

        let value = tree.graph.cut_value(&assignment);
        (assignment, value)
    }
}
