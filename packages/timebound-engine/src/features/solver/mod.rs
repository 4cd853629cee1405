//! ILP solver adapters.
//!
//! Backends are pluggable behind [`ports::IlpBackend`]; which ones exist is a
//! build-time choice (`gurobi`, `highs` features). The registry implements
//! the selection strategies: a named backend, automatic preference order, or
//! a cross-validating run of everything available.

pub mod infrastructure;
pub mod ports;

pub use infrastructure::{BackendKind, BackendRun, SolveReport, SolverChoice, SolverRegistry};
pub use ports::{IlpBackend, Solution, SolveStatus};
