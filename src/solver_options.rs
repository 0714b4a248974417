use crate::branch_stratagy::BranchStrategySelection;
use crate::error::Result;
use crate::heuristic_stratagy::HeuristicSelection;
use crate::persistence::PersistenceMode;

/// Options for the isolation branching solver for run time
#[derive(Clone, Debug)]
pub struct SolverOptions {
    pub persistence: PersistenceMode,
    pub branch_strategy: BranchStrategySelection,
    pub heuristic: HeuristicSelection,
    /// Contract the source side of each minimum isolating cut into its terminal
    pub contract_isolating_sources: bool,
    /// Time budget of the search in seconds
    pub max_time: f64,
    pub seed: usize,
    pub verbose: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self {
            persistence: PersistenceMode::None,
            branch_strategy: BranchStrategySelection::LargestEdges,
            heuristic: HeuristicSelection::IsolatingCuts,
            contract_isolating_sources: true,
            max_time: 600.0,
            seed: 0,
            verbose: 0,
        }
    }

    pub fn set_branch_strategy(&mut self, strategy: Option<String>) {
        if let Some(s) = strategy {
            match s.as_str() {
                "FirstNotFixed" => self.branch_strategy = BranchStrategySelection::FirstNotFixed,
                "MostEdges" => self.branch_strategy = BranchStrategySelection::MostEdges,
                "LargestEdges" => self.branch_strategy = BranchStrategySelection::LargestEdges,
                "Random" => self.branch_strategy = BranchStrategySelection::Random,
                _ => {}
            }
        }
    }

    pub fn set_heuristic_strategy(&mut self, strategy: Option<String>) {
        if let Some(s) = strategy {
            match s.as_str() {
                "None" => self.heuristic = HeuristicSelection::None,
                "IsolatingCuts" => self.heuristic = HeuristicSelection::IsolatingCuts,
                _ => {}
            }
        }
    }

    /// # Errors
    ///
    /// Fails on a name that is not a persistence mode.
    pub fn set_persistence(&mut self, persistence: Option<&str>) -> Result<()> {
        self.persistence = PersistenceMode::from_name(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::branch_stratagy::BranchStrategySelection;
    use crate::heuristic_stratagy::HeuristicSelection;
    use crate::persistence::PersistenceMode;
    use crate::solver_options::SolverOptions;

    #[test]
    fn setters_accept_known_names() {
        let mut options = SolverOptions::new();

        options.set_branch_strategy(Some("MostEdges".to_string()));
        options.set_heuristic_strategy(Some("None".to_string()));
        options.set_persistence(Some("strong")).unwrap();

        assert_eq!(options.branch_strategy, BranchStrategySelection::MostEdges);
        assert_eq!(options.heuristic, HeuristicSelection::None);
        assert_eq!(options.persistence, PersistenceMode::Strong);
    }

    #[test]
    fn unknown_names() {
        let mut options = SolverOptions::new();

        // unknown strategies leave the defaults in place
        options.set_branch_strategy(Some("MostViolated".to_string()));
        options.set_branch_strategy(None);
        assert_eq!(options.branch_strategy, BranchStrategySelection::LargestEdges);

        assert!(options.set_persistence(Some("sometimes")).is_err());
        assert_eq!(options.persistence, PersistenceMode::None);
    }
}
