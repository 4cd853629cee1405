//! Concrete pipeline analysis.
//!
//! Transfer = static latency from the target table plus dynamic penalties
//! from the configured hardware strategies.

use crate::errors::Result;
use crate::features::analysis::domain::SystemState;
use crate::features::analysis::infrastructure::strategies::{
    BranchPredictor, CacheModel, NoCache, StaticNotTaken,
};
use crate::features::analysis::ports::AbstractAnalysis;
use crate::features::latency::domain::LatencyModel;
use crate::shared::models::Instr;

/// Cycle-accumulating analysis for a single in-order core.
pub struct PipelineAnalysis<'m> {
    latency: &'m dyn LatencyModel,
    cache: Box<dyn CacheModel>,
    branch: Box<dyn BranchPredictor>,
}

impl<'m> PipelineAnalysis<'m> {
    pub fn new(latency: &'m dyn LatencyModel) -> Self {
        Self {
            latency,
            cache: Box::new(NoCache),
            branch: Box::new(StaticNotTaken),
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn CacheModel>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_branch_predictor(mut self, branch: Box<dyn BranchPredictor>) -> Self {
        self.branch = branch;
        self
    }
}

impl AbstractAnalysis for PipelineAnalysis<'_> {
    type State = SystemState;

    fn initial(&self) -> SystemState {
        SystemState::new()
    }

    fn transfer(&self, state: &SystemState, instr: &Instr) -> Result<(SystemState, u32)> {
        let base = self.latency.latency(instr)?;
        let penalty = self
            .cache
            .fetch_penalty(state, instr)
            .saturating_add(self.branch.mispredict_penalty(instr));
        let cycles = base.saturating_add(penalty);
        let mut out = state.clone();
        out.advance(u64::from(cycles));
        Ok((out, cycles))
    }
}
