pub mod registry;

#[cfg(feature = "gurobi")]
pub mod gurobi;
#[cfg(feature = "highs")]
pub mod highs_backend;

pub use registry::{BackendKind, BackendRun, SolveReport, SolverChoice, SolverRegistry};

#[cfg(feature = "gurobi")]
pub use gurobi::GurobiBackend;
#[cfg(feature = "highs")]
pub use highs_backend::HighsBackend;
