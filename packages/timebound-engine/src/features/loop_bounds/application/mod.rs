//! Bound aggregation across sources.

use crate::features::loop_bounds::domain::LoopBound;
use crate::features::loop_bounds::infrastructure::BoundsTable;
use crate::shared::models::{Function, ModuleLoops, Program, SourceLoc};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Resolves a bound per loop header: oracle trip count first, then the
/// annotation table by the header's source location.
#[derive(Debug, Default)]
pub struct BoundAggregator {
    table: BoundsTable,
}

impl BoundAggregator {
    pub fn new(table: BoundsTable) -> Self {
        Self { table }
    }

    /// Bounds for every header in the module, keyed by `(function, header)`.
    /// Headers with no bound from either source are simply absent; the
    /// encoder decides whether that is fatal.
    pub fn aggregate(
        &self,
        program: &Program,
        loops: &ModuleLoops,
    ) -> FxHashMap<(String, String), LoopBound> {
        let mut bounds = FxHashMap::default();
        for function in &program.functions {
            let Some(function_loops) = loops.for_function(&function.name) else {
                continue;
            };
            for natural_loop in &function_loops.loops {
                let bound = match natural_loop.trip_count {
                    Some(count) => Some(LoopBound::from_trip_count(count)),
                    None => self
                        .header_location(function, &natural_loop.header)
                        .and_then(|loc| self.table.lookup(loc.basename(), loc.line)),
                };
                match bound {
                    Some(bound) => {
                        debug!(
                            function = function.name.as_str(),
                            header = natural_loop.header.as_str(),
                            upper = bound.upper,
                            source = bound.source.as_str(),
                            "loop bound"
                        );
                        bounds.insert(
                            (function.name.clone(), natural_loop.header.clone()),
                            bound,
                        );
                    }
                    None => {
                        debug!(
                            function = function.name.as_str(),
                            header = natural_loop.header.as_str(),
                            "no bound for header"
                        );
                    }
                }
            }
        }
        bounds
    }

    /// Source location of a header: the first located instruction in the
    /// header block.
    fn header_location<'a>(&self, function: &'a Function, header: &str) -> Option<&'a SourceLoc> {
        function
            .block(header)?
            .instrs
            .iter()
            .find_map(|instr| instr.loc.as_ref())
    }
}
