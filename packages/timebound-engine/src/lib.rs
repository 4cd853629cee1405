/*
 * Timebound - Static WCET Analysis Engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Input models (lowered program, loop-info oracle)
 * - features/    : Vertical slices (latency → bounds → graph → fixpoint → ipet → solver)
 * - pipeline/    : Orchestration (results container, pass driver, report)
 * - config/      : Run configuration
 *
 * The engine computes a sound upper bound on the worst-case execution time
 * of a lowered program for a simple in-order core (MSP430-class): per-block
 * cycle costs from a target latency table, an interprocedural program graph
 * with spliced calls, a worklist fixpoint over a max-lattice of system
 * states, and an implicit path enumeration ILP whose maximal objective is
 * the bound. Solver backends (Gurobi, HiGHS) are build-time features behind
 * a strategy layer.
 */

/// Shared models (lowered program, loop-info oracle)
pub mod shared;

/// Feature modules (analysis stages)
pub mod features;

/// Pipeline orchestration
pub mod pipeline;

/// Configuration
pub mod config;

/// Error types
pub mod errors;

pub use config::{EngineConfig, TimeoutPolicy};
pub use errors::{EngineError, ErrorCategory, Result};
pub use features::analysis::{
    AbstractAnalysis, Lattice, PipelineAnalysis, SystemState, WorklistSolver,
};
pub use features::ipet::{IlpModel, IpetEncoder};
pub use features::latency::{BlockCosts, LatencyModel, Msp430Latency, Target};
pub use features::program_graph::{Node, NodeId, NodeKind, ProgramGraph};
pub use features::solver::{
    BackendKind, IlpBackend, Solution, SolveStatus, SolverChoice, SolverRegistry,
};
pub use pipeline::{AnalysisResults, WcetEngine, WcetReport};
pub use shared::models::{
    AddrMode, BasicBlock, Function, FunctionLoops, Instr, Mnemonic, ModuleLoops, NaturalLoop,
    Operand, Program, Reg, SourceLoc,
};
