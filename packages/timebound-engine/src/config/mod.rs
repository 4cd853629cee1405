//! Engine configuration.

use crate::errors::Result;
use crate::features::solver::infrastructure::SolverChoice;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What to do when the solver hits its time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutPolicy {
    /// Abort the analysis
    Fail,
    /// Report the best incumbent bound the solver had
    BestEffort,
}

/// All knobs of one engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name of the function the analysis starts from; empty means the engine
    /// elects the least-referenced function
    pub start_function: Option<String>,
    /// Annotation table produced by the pragma scanner
    pub loop_bounds_json: Option<PathBuf>,
    pub solver: SolverChoice,
    /// Absolute cap for headers without any bound; None makes them fatal
    pub fallback_loop_cap: Option<u32>,
    pub timeout: Option<Duration>,
    pub on_timeout: TimeoutPolicy,
    /// Integer variables (default) give tight bounds; the LP relaxation is a
    /// faster over-approximation
    pub integer_variables: bool,
    /// Upgrade an objective disagreement in `all` mode from warning to error
    pub fail_on_disagreement: bool,
    /// Where to dump the program graph, if anywhere
    pub dot_output: Option<PathBuf>,
    /// Where to dump the ILP model, if anywhere
    pub lp_output: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_function: None,
            loop_bounds_json: None,
            solver: SolverChoice::Auto,
            fallback_loop_cap: None,
            timeout: None,
            on_timeout: TimeoutPolicy::Fail,
            integer_variables: true,
            fail_on_disagreement: false,
            dot_output: None,
            lp_output: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_function(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.start_function = (!name.is_empty()).then_some(name);
        self
    }

    pub fn with_loop_bounds_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.loop_bounds_json = Some(path.into());
        self
    }

    pub fn with_solver(mut self, solver: SolverChoice) -> Self {
        self.solver = solver;
        self
    }

    /// Parse and set the solver selection; unknown names are configuration
    /// errors.
    pub fn with_solver_name(mut self, name: &str) -> Result<Self> {
        self.solver = SolverChoice::parse(name)?;
        Ok(self)
    }

    pub fn with_fallback_loop_cap(mut self, cap: u32) -> Self {
        self.fallback_loop_cap = Some(cap);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration, policy: TimeoutPolicy) -> Self {
        self.timeout = Some(timeout);
        self.on_timeout = policy;
        self
    }

    pub fn with_lp_relaxation(mut self) -> Self {
        self.integer_variables = false;
        self
    }

    pub fn with_fail_on_disagreement(mut self, fail: bool) -> Self {
        self.fail_on_disagreement = fail;
        self
    }

    pub fn with_dot_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.dot_output = Some(path.into());
        self
    }

    pub fn with_lp_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.lp_output = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::features::solver::infrastructure::BackendKind;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.solver, SolverChoice::Auto);
        assert!(config.integer_variables);
        assert_eq!(config.on_timeout, TimeoutPolicy::Fail);
        assert!(config.fallback_loop_cap.is_none());
    }

    #[test]
    fn test_solver_name_parsing() {
        let config = EngineConfig::new().with_solver_name("highs").unwrap();
        assert_eq!(config.solver, SolverChoice::Named(BackendKind::Highs));

        let err = EngineConfig::new().with_solver_name("simplex").unwrap_err();
        assert!(matches!(err, EngineError::UnknownSolver(_)));
    }

    #[test]
    fn test_empty_start_function_means_election() {
        let config = EngineConfig::new().with_start_function("");
        assert!(config.start_function.is_none());
        let config = EngineConfig::new().with_start_function("main");
        assert_eq!(config.start_function.as_deref(), Some("main"));
    }
}
