//! Interprocedural program graph.
//!
//! One node per basic block plus a synthetic Entry/Exit pair around the start
//! function. Edges cover intra-function successors, call to callee entry and
//! callee return to call continuation; back-edges are a distinguished subset
//! of predecessors per loop header. Topology is frozen after `finalize`;
//! later stages only update node cost and state.

pub mod domain;
pub mod infrastructure;

pub use domain::{BlockRef, Node, NodeId, NodeKind, ProgramGraph};
pub use infrastructure::{elect_start_function, write_dot, GraphBuilder};
