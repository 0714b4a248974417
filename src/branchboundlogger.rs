use crate::branchbound::IsolationBranchingTree;
use crate::branchbound_utils::{get_current_time, relative_gap};

/// This is the main logic behind the solver output
///
/// It has varying levels of output, where 0 means nothing is displayed to the screen, and each
/// additional level includes everything previous
///
/// 0 - Nothing
/// 1 - Header, Iteration Log, and Finish
/// 2 - Each New Incumbent
///
#[derive(Clone, Debug)]
pub struct SolverOutputLogger {
    pub output_level: usize,
}

impl SolverOutputLogger {
    pub const fn new(level: usize) -> Self {
        Self {
            output_level: level,
        }
    }

    pub fn output_header(&self, tree: &IsolationBranchingTree) {
        if self.output_level < 1 {
            return;
        }

        let version_number = env!("CARGO_PKG_VERSION");
        let num_vertices = tree.graph.num_vertices();
        let num_edges = tree.graph.num_edges();
        let num_terminals = tree.terminals.len();
        let num_unresolved = tree.root_candidates.values().filter(|c| c.len() > 1).count();

        println!("ktcut: Isolation Branching for the k-Terminal Cut problem");
        println!("Version number {version_number}");
        println!("Problem size: {num_vertices} vertices, {num_edges} edges");
        println!("Terminals: {num_terminals}");
        println!("Undetermined vertices: {num_unresolved}");

        println!("------------------------------------------------------");
        println!("Nodes Visited | Best Solution | Lower Bound | Gap (%)");
    }

    pub fn generate_output_line(&self, tree: &IsolationBranchingTree) {
        if self.output_level < 1 {
            return;
        }

        let num_nodes = tree.nodes_visited;
        let upper_bound = tree.best_solution_value;
        let lower_bound = tree.global_lower_bound();
        let gap = relative_gap(upper_bound, lower_bound);
        println!("{num_nodes} | {upper_bound} | {lower_bound} | {gap}");
    }

    pub fn output_new_incumbent(&self, tree: &IsolationBranchingTree) {
        if self.output_level < 2 {
            return;
        }

        let solution_value = tree.best_solution_value;
        let num_nodes = tree.nodes_visited;
        println!("New incumbent {solution_value} after {num_nodes} nodes");
    }

    pub fn generate_exit_line(&self, tree: &IsolationBranchingTree) {
        if self.output_level < 1 {
            return;
        }

        let solution_value = tree.best_solution_value;
        let state = &tree.state;
        let nodes_visited = tree.nodes_visited;
        let node_count = tree.node_count;
        let pruned = tree.pruned_count;
        let current_time = get_current_time();
        let time_passed = current_time - tree.time_start;
        println!("------------------------------------------------------");
        println!("Isolation Branching Finished");
        println!("Status: {state:?}");
        println!("Best Solution Value: {solution_value}");
        println!("Nodes Visited: {nodes_visited}");
        println!("Nodes Created: {node_count}");
        println!("Nodes Pruned: {pruned}");
        println!("Time to Solve: {time_passed}");
        println!("------------------------------------------------------");
    }
}
