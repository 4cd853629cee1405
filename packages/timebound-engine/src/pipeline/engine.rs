//! The pass driver.
//!
//! Fixed order, single-threaded: latency, bound aggregation, graph fill,
//! finalize, fixpoint, encoding, solve. Each stage owns the shared results
//! container for the duration of its window.

use crate::config::{EngineConfig, TimeoutPolicy};
use crate::errors::{EngineError, Result};
use crate::features::analysis::infrastructure::{PipelineAnalysis, WorklistSolver};
use crate::features::ipet::infrastructure::encoder::IpetEncoder;
use crate::features::ipet::infrastructure::lp_writer::dump_lp;
use crate::features::latency::application::BlockCosts;
use crate::features::latency::infrastructure::Msp430Latency;
use crate::features::loop_bounds::application::BoundAggregator;
use crate::features::loop_bounds::infrastructure::BoundsTable;
use crate::features::program_graph::infrastructure::{
    dot::dump_dot, elect_start_function, GraphBuilder,
};
use crate::features::solver::infrastructure::SolverRegistry;
use crate::features::solver::ports::SolveStatus;
use crate::pipeline::report::WcetReport;
use crate::pipeline::results::AnalysisResults;
use crate::shared::models::{ModuleLoops, Program};
use tracing::{info, warn};

/// One-shot WCET analysis engine.
pub struct WcetEngine {
    config: EngineConfig,
    registry: SolverRegistry,
}

impl WcetEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: SolverRegistry::with_compiled_backends(),
        }
    }

    /// Inject a registry; used by embedders that bring their own backend.
    pub fn with_registry(config: EngineConfig, registry: SolverRegistry) -> Self {
        Self { config, registry }
    }

    /// Run the full pipeline and return the bound.
    pub fn run(&self, program: &Program, loops: &ModuleLoops) -> Result<WcetReport> {
        let mut results = AnalysisResults::new();
        let latency = Msp430Latency::new();

        info!("stage: instruction latency");
        results.set_block_costs(BlockCosts::compute(program, &latency)?)?;

        info!("stage: loop bound aggregation");
        let table = match &self.config.loop_bounds_json {
            Some(path) => BoundsTable::load(path)?,
            None => BoundsTable::default(),
        };
        let bounds = BoundAggregator::new(table).aggregate(program, loops);
        results.set_loop_bounds(bounds)?;

        info!("stage: program graph");
        let start = elect_start_function(program, self.config.start_function.as_deref())?;
        let graph = GraphBuilder::new(program, loops).build(
            &start.name,
            results.block_costs()?,
            results.loop_bounds()?,
        )?;
        results.set_graph(graph)?;
        if let Some(path) = &self.config.dot_output {
            dump_dot(results.graph()?, path)?;
        }

        info!("stage: abstract interpretation");
        let solver = WorklistSolver::new(program, PipelineAnalysis::new(&latency));
        let fixpoint = solver.run(results.graph_mut()?)?;
        info!(
            iterations = fixpoint.iterations,
            widenings = fixpoint.widenings,
            "fixpoint complete"
        );

        info!("stage: path analysis");
        let model = IpetEncoder::new(results.graph()?)
            .with_integer_variables(self.config.integer_variables)
            .with_fallback_cap(self.config.fallback_loop_cap)
            .encode()?;
        if let Some(path) = &self.config.lp_output {
            dump_lp(&model, path)?;
        }

        let solve_report = self.registry.solve(
            &model,
            self.config.solver,
            self.config.timeout,
            self.config.fail_on_disagreement,
        )?;
        if solve_report.solution.status == SolveStatus::Timeout {
            match self.config.on_timeout {
                TimeoutPolicy::Fail => return Err(EngineError::Timeout),
                TimeoutPolicy::BestEffort => {
                    warn!("solver timed out; reporting the best known bound")
                }
            }
        }

        let report = WcetReport::from_solve(&model, solve_report);
        results.set_wcet(report.wcet)?;
        info!(
            wcet = report.wcet,
            solver = report.solver.as_str(),
            "analysis complete"
        );
        Ok(report)
    }
}
