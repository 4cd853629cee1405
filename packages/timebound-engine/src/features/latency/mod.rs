//! Instruction latency models.
//!
//! A latency model is a pure mapping from a machine instruction to its cycle
//! cost on the selected target. Costs are summed per basic block before graph
//! construction; an instruction the table does not know is a hard error so a
//! hole in the table can never deflate the bound.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::BlockCosts;
pub use domain::{LatencyModel, Target};
pub use infrastructure::Msp430Latency;
