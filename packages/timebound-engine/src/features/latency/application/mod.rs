//! Block cost aggregation.

use crate::errors::{EngineError, Result};
use crate::features::latency::domain::LatencyModel;
use crate::shared::models::Program;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Per-block cycle costs for the whole module, keyed by `(function, block)`.
#[derive(Debug, Clone, Default)]
pub struct BlockCosts {
    costs: FxHashMap<(String, String), u64>,
}

impl BlockCosts {
    /// Sum instruction latencies for every block in the module.
    ///
    /// Sums saturate; a block appearing twice under the same function is a
    /// front-end bug and rejected.
    pub fn compute(program: &Program, model: &dyn LatencyModel) -> Result<Self> {
        let mut costs = FxHashMap::default();
        for function in &program.functions {
            for block in &function.blocks {
                let mut total: u64 = 0;
                for instr in &block.instrs {
                    total = total.saturating_add(u64::from(model.latency(instr)?));
                }
                debug!(
                    function = function.name.as_str(),
                    block = block.label.as_str(),
                    cycles = total,
                    "block cost"
                );
                let key = (function.name.clone(), block.label.clone());
                if costs.insert(key, total).is_some() {
                    return Err(EngineError::DuplicateBlock {
                        function: function.name.clone(),
                        block: block.label.clone(),
                    });
                }
            }
        }
        Ok(Self { costs })
    }

    pub fn cost(&self, function: &str, block: &str) -> Option<u64> {
        self.costs
            .get(&(function.to_string(), block.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}
