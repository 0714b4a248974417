use crate::branch_node::IsolationNode;
use crate::branch_stratagy::BranchStrategy;
use crate::branchbound_utils::{get_current_time, PRUNE_TOLERANCE};
use crate::branchboundlogger::SolverOutputLogger;
use crate::error::{KtcError, Result};
use crate::graph::KtcGraph;
use crate::isolating_cut::{isolating_cut_bound, isolating_cuts};
use crate::max_flow::MinCutOracle;
use crate::persistence::CandidateSets;
use crate::result_assembler::{BoundSnapshot, TerminationReason};
use crate::solver_options::SolverOptions;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Number of expanded nodes between two iteration lines of the log
const OUTPUT_FREQUENCY: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeState {
    Idle,
    Running,
    Optimal,
    TimedOutWithSolution,
    TimedOutNoSolution,
}

/// Struct for the isolation branching solver
pub struct IsolationBranchingTree {
    pub graph: KtcGraph,
    pub terminals: Vec<usize>,
    pub root_candidates: CandidateSets,
    pub best_assignment: Option<BTreeMap<usize, usize>>,
    pub best_solution_value: f64,
    pub nodes: Vec<IsolationNode>,
    pub node_count: usize,
    pub nodes_visited: usize,
    pub nodes_processed: usize,
    pub pruned_count: usize,
    pub time_start: f64,
    pub elapsed_time: f64,
    pub state: TreeState,
    pub termination_reason: Option<TerminationReason>,
    pub bound_history: Vec<BoundSnapshot>,
    pub branch_strategy: BranchStrategy,
    pub oracle: Box<dyn MinCutOracle>,
    pub options: SolverOptions,
    pub solver_logger: SolverOutputLogger,
}

pub enum Event {
    UpdateBestSolution(BTreeMap<usize, usize>, f64),
    AddNode(IsolationNode),
}

pub enum NodeLoggingAction {
    Visited,
    Evaluated,
    Processed,
    Pruned,
}

pub enum PruneAction {
    Prune,
    Dont,
}

pub struct ProcessNodeState {
    pub events: Vec<Event>,
    pub logging: NodeLoggingAction,
}

impl IsolationBranchingTree {
    /// Creates a new isolation branching tree. Non-terminal vertices without an entry in
    /// `candidates` may be grouped with any terminal.
    ///
    /// # Errors
    ///
    /// Fails on an invalid terminal set, on candidate sets that are empty, name a vertex that is
    /// not a non-terminal of the graph, or name something that is not a terminal, and on a
    /// negative time limit.
    pub fn new(
        graph: KtcGraph,
        terminals: &[usize],
        candidates: CandidateSets,
        options: SolverOptions,
        oracle: Box<dyn MinCutOracle>,
    ) -> Result<Self> {
        graph.validate_terminals(terminals)?;

        if options.max_time.is_nan() || options.max_time < 0.0 {
            return Err(KtcError::InvalidArgument(format!(
                "time limit {} is not a non-negative number of seconds",
                options.max_time
            )));
        }

        let mut sorted_terminals = terminals.to_vec();
        sorted_terminals.sort_unstable();

        let mut root_candidates = CandidateSets::new();
        for v in graph.vertices().filter(|v| !terminals.contains(v)) {
            root_candidates.insert(v, sorted_terminals.clone());
        }

        for (v, mut vertex_candidates) in candidates {
            if !graph.contains_vertex(v) {
                return Err(KtcError::VertexNotFound(v));
            }
            if terminals.contains(&v) {
                return Err(KtcError::InvalidArgument(format!(
                    "terminal {v} cannot have candidate terminals"
                )));
            }
            if let Some(t) = vertex_candidates.iter().find(|t| !terminals.contains(t)) {
                return Err(KtcError::InvalidArgument(format!(
                    "candidate {t} of vertex {v} is not a terminal"
                )));
            }

            vertex_candidates.sort_unstable();
            vertex_candidates.dedup();
            if vertex_candidates.is_empty() {
                return Err(KtcError::InvalidArgument(format!(
                    "vertex {v} has no candidate terminal"
                )));
            }
            root_candidates.insert(v, vertex_candidates);
        }

        let branch_strategy = BranchStrategy::get_branch_strategy(&options.branch_strategy);
        let output_level = options.verbose;

        Ok(Self {
            graph,
            terminals: terminals.to_vec(),
            root_candidates,
            best_assignment: None,
            best_solution_value: f64::INFINITY,
            nodes: Vec::new(),
            node_count: 0,
            nodes_visited: 0,
            nodes_processed: 0,
            pruned_count: 0,
            time_start: get_current_time(),
            elapsed_time: 0.0,
            state: TreeState::Idle,
            termination_reason: None,
            bound_history: Vec::new(),
            branch_strategy,
            oracle,
            options,
            solver_logger: SolverOutputLogger::new(output_level),
        })
    }

    /// The main solve function of the isolation branching algorithm. Running out of time is not an
    /// error, it shows in `state`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the min-cut oracle.
    pub fn solve(&mut self) -> Result<()> {
        self.reset();

        // Reset start time as it can be different from the time we created the solver instance
        self.time_start = get_current_time();
        self.state = TreeState::Running;

        self.solver_logger.output_header(self);

        // a zero budget does not even evaluate the root
        if self.time_exceeded() {
            self.finish(TerminationReason::TimeLimit);
            return Ok(());
        }

        let root = IsolationNode::new(self.graph.clone(), self.root_candidates.clone());
        let root_state = self.evaluate_node(root)?;
        self.apply_logging_action(root_state.logging);
        self.apply_events(root_state.events);
        self.record_bound();

        // until we have hit a termination condition, we will keep iterating
        loop {
            if let Some(reason) = self.termination_condition() {
                self.finish(reason);
                break;
            }

            let Some(node) = self.get_next_node() else {
                continue;
            };

            let process_results = self.process_node(&node)?;
            self.apply_logging_action(NodeLoggingAction::Processed);

            // apply all the events from the parallel evaluation back to the tree
            let mut events = Vec::new();
            for state in process_results {
                self.apply_logging_action(state.logging);
                events.extend(state.events);
            }
            self.apply_events(events);
            self.record_bound();

            if self.nodes_processed % OUTPUT_FREQUENCY == 0 {
                self.solver_logger.generate_output_line(self);
            }
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.best_assignment = None;
        self.best_solution_value = f64::INFINITY;
        self.nodes.clear();
        self.node_count = 0;
        self.nodes_visited = 0;
        self.nodes_processed = 0;
        self.pruned_count = 0;
        self.elapsed_time = 0.0;
        self.termination_reason = None;
        self.bound_history.clear();
        self.state = TreeState::Idle;
    }

    fn finish(&mut self, reason: TerminationReason) {
        self.elapsed_time = get_current_time() - self.time_start;
        self.termination_reason = Some(reason);

        self.state = match (reason, self.best_assignment.is_some()) {
            (TerminationReason::Exhausted, true) => TreeState::Optimal,
            (TerminationReason::Exhausted, false) => {
                unreachable!("search exhausted without a complete assignment")
            }
            (TerminationReason::TimeLimit, true) => TreeState::TimedOutWithSolution,
            (TerminationReason::TimeLimit, false) => TreeState::TimedOutNoSolution,
        };

        self.record_bound();
        self.solver_logger.generate_exit_line(self);
    }

    /// Resolves what is already decided at the node, computes its bound, and proposes a heuristic
    /// incumbent. Only reads the tree, so sibling nodes can be evaluated in parallel.
    ///
    /// # Errors
    ///
    /// Propagates failures of the min-cut oracle.
    pub fn evaluate_node(&self, mut node: IsolationNode) -> Result<ProcessNodeState> {
        node.resolve_trivial_vertices()?;

        if node.is_complete() {
            return Ok(self.complete_node_state(&node));
        }

        let cuts = isolating_cuts(
            &node.graph,
            &self.terminals,
            &node.candidates,
            self.oracle.as_ref(),
        )?;
        node.lower_bound = node.lower_bound.max(isolating_cut_bound(&cuts));

        let mut events = Vec::new();

        if let Some((assignment, value)) = self.options.heuristic.make_heuristic(self, &node, &cuts)
        {
            events.push(Event::UpdateBestSolution(assignment, value));
        }

        if self.options.contract_isolating_sources
            && node.contract_isolating_sources(&cuts)? > 0
            && node.is_complete()
        {
            let mut state = self.complete_node_state(&node);
            events.append(&mut state.events);
            return Ok(ProcessNodeState {
                events,
                logging: NodeLoggingAction::Evaluated,
            });
        }

        events.push(Event::AddNode(node));

        Ok(ProcessNodeState {
            events,
            logging: NodeLoggingAction::Evaluated,
        })
    }

    /// A complete node is a solution, evaluated on the original graph
    fn complete_node_state(&self, node: &IsolationNode) -> ProcessNodeState {
        let assignment = node.assignment(&self.terminals);
        let value = self.graph.cut_value(&assignment);

        ProcessNodeState {
            events: vec![Event::UpdateBestSolution(assignment, value)],
            logging: NodeLoggingAction::Evaluated,
        }
    }

    /// Branches the node and evaluates the children in parallel
    ///
    /// # Errors
    ///
    /// Propagates the first failure among the children.
    pub fn process_node(&self, node: &IsolationNode) -> Result<Vec<ProcessNodeState>> {
        // determine what vertex we are branching on
        let branch_id = self.make_branch(node);

        let children = Self::branch(node, branch_id)?;

        children
            .into_par_iter()
            .map(|child| self.evaluate_node(child))
            .collect()
    }

    /// Checks if we can prune the node, based on the lower bound and best solution
    pub fn can_prune_action(&self, node: &IsolationNode) -> PruneAction {
        if node.lower_bound >= self.best_solution_value - PRUNE_TOLERANCE {
            return PruneAction::Prune;
        }
        PruneAction::Dont
    }

    // apply the logging action to the tree
    pub fn apply_logging_action(&mut self, action: NodeLoggingAction) {
        match action {
            NodeLoggingAction::Visited => self.nodes_visited += 1,
            NodeLoggingAction::Evaluated => self.node_count += 1,
            NodeLoggingAction::Processed => self.nodes_processed += 1,
            NodeLoggingAction::Pruned => self.pruned_count += 1,
        }
    }

    /// Applies the incumbent updates first, then pushes the surviving nodes so that the one with
    /// the lowest bound is popped first
    pub fn apply_events(&mut self, events: Vec<Event>) {
        let mut branches = Vec::new();

        for action in events {
            match action {
                Event::UpdateBestSolution(assignment, value) => {
                    self.update_solution_if_better(assignment, value);
                }
                Event::AddNode(node) => branches.push(node),
            }
        }

        branches.sort_by(|a, b| b.lower_bound.total_cmp(&a.lower_bound));

        for node in branches {
            match self.can_prune_action(&node) {
                PruneAction::Prune => self.apply_logging_action(NodeLoggingAction::Pruned),
                PruneAction::Dont => self.nodes.push(node),
            }
        }
    }

    /// update the best solution if strictly better than the current best solution
    pub fn update_solution_if_better(&mut self, assignment: BTreeMap<usize, usize>, value: f64) {
        if value < self.best_solution_value {
            self.best_assignment = Some(assignment);
            self.best_solution_value = value;
            self.solver_logger.output_new_incumbent(self);
        }
    }

    /// Pops nodes until one survives the bound check against the current incumbent
    pub fn get_next_node(&mut self) -> Option<IsolationNode> {
        while let Some(node) = self.nodes.pop() {
            self.apply_logging_action(NodeLoggingAction::Visited);

            // the incumbent may have improved since the node was pushed
            if matches!(self.can_prune_action(&node), PruneAction::Dont) {
                return Some(node);
            }

            self.apply_logging_action(NodeLoggingAction::Pruned);
        }

        None
    }

    fn time_exceeded(&self) -> bool {
        get_current_time() - self.time_start >= self.options.max_time
    }

    /// Checks for termination conditions, no more nodes or the time limit
    pub fn termination_condition(&self) -> Option<TerminationReason> {
        if self.nodes.is_empty() {
            return Some(TerminationReason::Exhausted);
        }

        if self.time_exceeded() {
            return Some(TerminationReason::TimeLimit);
        }

        None
    }

    /// Smallest bound over the open nodes and the incumbent
    pub fn global_lower_bound(&self) -> f64 {
        let open_bound = self
            .nodes
            .iter()
            .map(|node| node.lower_bound)
            .fold(self.best_solution_value, f64::min);

        if open_bound.is_finite() {
            open_bound
        } else {
            0.0
        }
    }

    fn record_bound(&mut self) {
        let snapshot = BoundSnapshot {
            elapsed: get_current_time() - self.time_start,
            lower_bound: self.global_lower_bound(),
            upper_bound: self.best_solution_value,
        };

        let changed = self.bound_history.last().map_or(true, |last| {
            last.lower_bound != snapshot.lower_bound || last.upper_bound != snapshot.upper_bound
        });

        if changed {
            self.bound_history.push(snapshot);
        }
    }

    /// Branch Selection Strategy
    pub fn make_branch(&self, node: &IsolationNode) -> usize {
        self.branch_strategy.make_branch(self, node)
    }

    /// Creates one child per candidate terminal of `vertex`, with the vertex contracted into it
    ///
    /// # Errors
    ///
    /// Propagates contraction failures.
    pub fn branch(node: &IsolationNode, vertex: usize) -> Result<Vec<IsolationNode>> {
        let Some(candidates) = node.candidates.get(&vertex) else {
            panic!("vertex {vertex} is not undetermined at this node");
        };

        let mut children = Vec::with_capacity(candidates.len());
        for &t in candidates {
            let mut child = node.clone();
            child.resolve_vertex(vertex, t)?;
            child.depth += 1;
            children.push(child);
        }

        Ok(children)
    }
}
