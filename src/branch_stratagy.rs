use crate::branch_node::IsolationNode;
use crate::branchbound::IsolationBranchingTree;
use smolprng::{JsfLarge, PRNG};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchStrategy {
    FirstNotFixed,
    MostEdges,
    LargestEdges,
    Random,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BranchStrategySelection {
    FirstNotFixed,
    MostEdges,
    #[default]
    LargestEdges,
    Random,
}

impl BranchStrategy {
    /// Picks the unresolved vertex to branch on
    ///
    /// # Panics
    ///
    /// If the node has no unresolved vertex.
    pub fn make_branch(&self, tree: &IsolationBranchingTree, node: &IsolationNode) -> usize {
        match self {
            Self::FirstNotFixed => first_not_fixed(tree, node),
            Self::MostEdges => most_edges(tree, node),
            Self::LargestEdges => largest_edges(tree, node),
            Self::Random => random(tree, node),
        }
    }

    pub const fn get_branch_strategy(branch_strategy_selection: &BranchStrategySelection) -> Self {
        match branch_strategy_selection {
            BranchStrategySelection::FirstNotFixed => Self::FirstNotFixed,
            BranchStrategySelection::MostEdges => Self::MostEdges,
            BranchStrategySelection::LargestEdges => Self::LargestEdges,
            BranchStrategySelection::Random => Self::Random,
        }
    }
}

/// Branches on the unresolved vertex with the smallest label
pub fn first_not_fixed(_: &IsolationBranchingTree, node: &IsolationNode) -> usize {
    // candidate sets are keyed in ascending order
    match node.candidates.keys().next() {
        Some(&v) => v,
        None => panic!("No vertex to branch on"),
    }
}

/// Branches on the unresolved vertex with the most edges in the node graph
fn most_edges(_: &IsolationBranchingTree, node: &IsolationNode) -> usize {
    let mut max_edges = 0;
    let mut index_max_edges = None;

    // strict comparison keeps the smallest label on ties
    for &v in node.candidates.keys() {
        let edges = node.graph.degree(v);
        if index_max_edges.is_none() || edges > max_edges {
            max_edges = edges;
            index_max_edges = Some(v);
        }
    }

    index_max_edges.unwrap_or_else(|| panic!("No vertex to branch on"))
}

/// Branches on the unresolved vertex with the largest total capacity, the one that is most likely
/// to drive the cut value
fn largest_edges(_: &IsolationBranchingTree, node: &IsolationNode) -> usize {
    let mut max_capacity = f64::NEG_INFINITY;
    let mut index_max_capacity = None;

    for &v in node.candidates.keys() {
        let capacity = node.graph.weighted_degree(v);
        if capacity > max_capacity {
            max_capacity = capacity;
            index_max_capacity = Some(v);
        }
    }

    index_max_capacity.unwrap_or_else(|| panic!("No vertex to branch on"))
}

/// Branches on a random unresolved vertex, reproducible from the seed and the number of nodes
/// processed so far
pub fn random(tree: &IsolationBranchingTree, node: &IsolationNode) -> usize {
    let num_unresolved = node.num_unresolved();
    if num_unresolved == 0 {
        panic!("No vertex to branch on");
    }

    let mut prng = PRNG {
        generator: JsfLarge::from(
            (tree.options.seed as u64).wrapping_add(tree.nodes_processed as u64),
        ),
    };

    // the remainder is below num_unresolved, so it fits in a usize
    let index = (prng.gen_u64() % num_unresolved as u64) as usize;

    node.candidates
        .keys()
        .nth(index)
        .copied()
        .unwrap_or_else(|| panic!("No vertex to branch on"))
}
