//! Loop iteration bounds.
//!
//! Bounds come from two places, in priority order: a constant trip count
//! proven by the front-end's scalar-evolution oracle, then an externally
//! supplied annotation table keyed by source location. A header left without
//! a bound is rejected later, at encoding time, unless a fallback cap is
//! configured.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::BoundAggregator;
pub use domain::{BoundSource, LoopBound};
pub use infrastructure::{BoundsTable, LoopBoundRecord};
