//! Abstract interpretation over the program graph.
//!
//! The lattice here is a max-lattice: joining two states keeps the later
//! cycle count and the later resource availability, so the fixpoint is an
//! upper bound over all paths into each node. Widening at loop headers keeps
//! the iteration finite even though cycle counters ascend without bound
//! through back-edges.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{Lattice, ResourceId, SystemState};
pub use infrastructure::{
    FixpointSolution, NoCache, PipelineAnalysis, StaticNotTaken, WorklistSolver,
};
pub use ports::AbstractAnalysis;
