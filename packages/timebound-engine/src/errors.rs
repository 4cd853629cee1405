//! Error types for the timing analysis engine.
//!
//! Every failure mode maps to one variant so diagnostics always carry the
//! offending identifier (block label, header name, solver name).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// IO error (DOT/LP dumps, bounds file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown ILP solver name in the configuration
    #[error("unknown solver '{0}' (expected auto, gurobi, highs or all)")]
    UnknownSolver(String),

    /// A bounds file was named in the configuration but does not exist
    #[error("loop bounds file not found: {0}")]
    MissingBoundsFile(PathBuf),

    /// Generic configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Call through a register or computed address
    #[error("indirect call in block '{block}' of function '{function}'")]
    IndirectCall { function: String, block: String },

    /// Cycle in the direct call graph
    #[error("recursive call chain: {}", cycle.join(" -> "))]
    Recursion { cycle: Vec<String> },

    /// A reachable loop header has no bound from any source
    #[error("no loop bound for header '{header}' (node {node}); supply a bound or configure a fallback cap")]
    MissingLoopBound { header: String, node: u32 },

    /// Instruction with no latency table entry
    #[error("no latency entry for instruction '{0}'")]
    UnknownLatency(String),

    /// Graph construction error (bad edge endpoints, invariant violations)
    #[error("graph construction error: {0}")]
    Construction(String),

    /// The same basic block was fed to the latency pass twice
    #[error("duplicate block '{block}' in function '{function}'")]
    DuplicateBlock { function: String, block: String },

    /// Abstract interpretation error
    #[error("analysis error: {0}")]
    Analysis(String),

    /// The fixpoint iteration exceeded its cap without stabilizing
    #[error("fixpoint did not stabilize after {iterations} iterations")]
    FixpointDiverged { iterations: usize },

    /// No ILP backend compiled in or licensed
    #[error("no ILP backend available; rebuild with the 'gurobi' or 'highs' feature")]
    NoBackend,

    /// The requested backend is compiled in but cannot run
    #[error("solver '{0}' is not available (missing license or runtime)")]
    BackendUnavailable(String),

    /// The ILP model has no feasible point
    #[error("ILP model is infeasible")]
    Infeasible,

    /// The ILP model is unbounded (a loop without an effective bound)
    #[error("ILP model is unbounded")]
    Unbounded,

    /// Backend-internal failure
    #[error("solver error: {0}")]
    Solver(String),

    /// The solve hit the configured time limit in fail-on-timeout mode
    #[error("solver timed out")]
    Timeout,
}

impl EngineError {
    pub fn construction(msg: impl Into<String>) -> Self {
        EngineError::Construction(msg.into())
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        EngineError::Analysis(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Config(msg.into())
    }

    /// Coarse category, used for the single-line diagnostic prefix.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::Io(_)
            | EngineError::UnknownSolver(_)
            | EngineError::MissingBoundsFile(_)
            | EngineError::Config(_) => ErrorCategory::Configuration,
            EngineError::IndirectCall { .. }
            | EngineError::Recursion { .. }
            | EngineError::MissingLoopBound { .. }
            | EngineError::UnknownLatency(_) => ErrorCategory::InputRejection,
            EngineError::Construction(_) | EngineError::DuplicateBlock { .. } => {
                ErrorCategory::Construction
            }
            EngineError::Analysis(_) | EngineError::FixpointDiverged { .. } => {
                ErrorCategory::Analysis
            }
            EngineError::NoBackend
            | EngineError::BackendUnavailable(_)
            | EngineError::Infeasible
            | EngineError::Unbounded
            | EngineError::Solver(_)
            | EngineError::Timeout => ErrorCategory::Ilp,
        }
    }

    /// Single-line rendering for the diagnostic stream.
    pub fn diagnostic(&self) -> String {
        format!("Error: [{}] {}", self.category(), self)
    }
}

/// Error category per taxonomy stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    InputRejection,
    Construction,
    Analysis,
    Ilp,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::InputRejection => "input",
            ErrorCategory::Construction => "construction",
            ErrorCategory::Analysis => "analysis",
            ErrorCategory::Ilp => "ilp",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = EngineError::MissingLoopBound {
            header: "while.cond".to_string(),
            node: 4,
        };
        assert_eq!(err.category(), ErrorCategory::InputRejection);
        assert!(err.to_string().contains("while.cond"));

        assert_eq!(EngineError::NoBackend.category(), ErrorCategory::Ilp);
        assert_eq!(
            EngineError::UnknownSolver("cplex".into()).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_diagnostic_is_single_line() {
        let err = EngineError::Recursion {
            cycle: vec!["main".into(), "f".into(), "main".into()],
        };
        let line = err.diagnostic();
        assert!(line.starts_with("Error: [input]"));
        assert!(!line.contains('\n'));
        assert!(line.contains("main -> f -> main"));
    }
}
