pub mod pipeline_analysis;
pub mod strategies;
pub mod worklist;

pub use pipeline_analysis::PipelineAnalysis;
pub use strategies::{BranchPredictor, CacheModel, NoCache, StaticNotTaken};
pub use worklist::{FixpointSolution, WorklistSolver};
