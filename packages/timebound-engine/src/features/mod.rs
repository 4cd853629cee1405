//! Feature modules, one vertical slice per analysis stage.

pub mod analysis;
pub mod ipet;
pub mod latency;
pub mod loop_bounds;
pub mod program_graph;
pub mod solver;
