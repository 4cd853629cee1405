//! Shared analysis results container.
//!
//! Each stage writes its product exactly once and later stages read it; a
//! double write or a read before the producing stage ran is a stage-ordering
//! bug and fails loudly.

use crate::errors::{EngineError, Result};
use crate::features::latency::application::BlockCosts;
use crate::features::loop_bounds::domain::LoopBound;
use crate::features::program_graph::domain::ProgramGraph;
use rustc_hash::FxHashMap;

pub type LoopBoundMap = FxHashMap<(String, String), LoopBound>;

/// Cross-stage state of one engine run.
#[derive(Debug, Default)]
pub struct AnalysisResults {
    block_costs: Option<BlockCosts>,
    loop_bounds: Option<LoopBoundMap>,
    graph: Option<ProgramGraph>,
    wcet: Option<u64>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_costs(&mut self, costs: BlockCosts) -> Result<()> {
        if self.block_costs.is_some() {
            return Err(EngineError::construction("block costs set twice"));
        }
        self.block_costs = Some(costs);
        Ok(())
    }

    pub fn block_costs(&self) -> Result<&BlockCosts> {
        self.block_costs
            .as_ref()
            .ok_or_else(|| EngineError::construction("block costs read before the latency stage"))
    }

    pub fn set_loop_bounds(&mut self, bounds: LoopBoundMap) -> Result<()> {
        if self.loop_bounds.is_some() {
            return Err(EngineError::construction("loop bounds set twice"));
        }
        self.loop_bounds = Some(bounds);
        Ok(())
    }

    pub fn loop_bounds(&self) -> Result<&LoopBoundMap> {
        self.loop_bounds.as_ref().ok_or_else(|| {
            EngineError::construction("loop bounds read before the aggregation stage")
        })
    }

    pub fn set_graph(&mut self, graph: ProgramGraph) -> Result<()> {
        if self.graph.is_some() {
            return Err(EngineError::construction("program graph set twice"));
        }
        self.graph = Some(graph);
        Ok(())
    }

    pub fn graph(&self) -> Result<&ProgramGraph> {
        self.graph
            .as_ref()
            .ok_or_else(|| EngineError::construction("program graph read before construction"))
    }

    /// The fixpoint stage updates node cost and state in place; topology
    /// stays frozen.
    pub fn graph_mut(&mut self) -> Result<&mut ProgramGraph> {
        self.graph
            .as_mut()
            .ok_or_else(|| EngineError::construction("program graph read before construction"))
    }

    pub fn set_wcet(&mut self, wcet: u64) -> Result<()> {
        if self.wcet.is_some() {
            return Err(EngineError::construction("WCET set twice"));
        }
        self.wcet = Some(wcet);
        Ok(())
    }

    pub fn wcet(&self) -> Option<u64> {
        self.wcet
    }
}
