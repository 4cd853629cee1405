//! Implicit path enumeration.
//!
//! Translates the annotated program graph into a maximization problem over
//! per-node execution counts and per-edge flows. The model is plain data so
//! every solver backend consumes the same encoding and the model can be
//! dumped in LP format for diagnostics.

pub mod domain;
pub mod infrastructure;

pub use domain::{Constraint, IlpModel, RowSense, VarId, VarKind, Variable};
pub use infrastructure::{write_lp, IpetEncoder};
