//! Graph construction.
//!
//! The builder ingests one function at a time, then finalizes: call sites are
//! spliced to callee entries and callee returns back to the call's
//! continuation block, and structural invariants are checked. Indirect calls
//! and recursion are rejected up front; with either present the flow
//! constraints would admit unbounded paths.

use crate::errors::{EngineError, Result};
use crate::features::latency::application::BlockCosts;
use crate::features::loop_bounds::domain::LoopBound;
use crate::features::program_graph::domain::graph::CallSite;
use crate::features::program_graph::domain::{BlockRef, NodeId, NodeKind, ProgramGraph};
use crate::shared::models::{Function, ModuleLoops, Program};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

/// Pick the start function: the requested name, or the function with the
/// unique minimum number of incoming references in the call graph.
pub fn elect_start_function<'p>(
    program: &'p Program,
    requested: Option<&str>,
) -> Result<&'p Function> {
    if let Some(name) = requested.filter(|n| !n.is_empty()) {
        return program
            .function(name)
            .ok_or_else(|| EngineError::config(format!("start function '{name}' not found")));
    }
    if program.functions.is_empty() {
        return Err(EngineError::config("module contains no functions"));
    }

    let mut references: FxHashMap<&str, usize> = program
        .functions
        .iter()
        .map(|f| (f.name.as_str(), 0))
        .collect();
    for (_, callee) in program.call_edges() {
        if let Some(count) = references.get_mut(callee) {
            *count += 1;
        }
    }

    // The least-referenced function is the presumed root; a tie means we
    // cannot tell and the caller has to name one.
    let mut elected: Option<&Function> = None;
    let mut elected_count = usize::MAX;
    let mut tied = false;
    for function in &program.functions {
        let count = references[function.name.as_str()];
        if count < elected_count {
            elected = Some(function);
            elected_count = count;
            tied = false;
        } else if count == elected_count {
            tied = true;
        }
    }
    if tied {
        return Err(EngineError::config(format!(
            "ambiguous start function: multiple functions have {elected_count} incoming references"
        )));
    }
    let function =
        elected.ok_or_else(|| EngineError::config("module contains no functions"))?;
    info!(start = function.name.as_str(), "elected start function");
    Ok(function)
}

/// Builds the interprocedural program graph for a lowered module.
pub struct GraphBuilder<'p> {
    program: &'p Program,
    loops: &'p ModuleLoops,
    graph: ProgramGraph,
    block_nodes: FxHashMap<(String, String), NodeId>,
}

impl<'p> GraphBuilder<'p> {
    pub fn new(program: &'p Program, loops: &'p ModuleLoops) -> Self {
        Self {
            program,
            loops,
            graph: ProgramGraph::new(),
            block_nodes: FxHashMap::default(),
        }
    }

    /// Run the full construction: rejection checks, per-function fill, bound
    /// application, splicing and validation.
    pub fn build(
        mut self,
        start: &str,
        costs: &BlockCosts,
        bounds: &FxHashMap<(String, String), LoopBound>,
    ) -> Result<ProgramGraph> {
        self.reject_invalid_calls()?;
        self.reject_recursion()?;

        for (index, function) in self.program.functions.iter().enumerate() {
            self.fill_with_function(index, function.name == start, costs)?;
        }
        self.apply_bounds(bounds);
        self.resolve_nesting();
        self.finalize()?;
        Ok(self.graph)
    }

    /// Pre-split contract: a call is the last instruction of its block and
    /// the block has exactly one textual successor (the continuation).
    /// Indirect calls are rejected outright.
    fn reject_invalid_calls(&self) -> Result<()> {
        for function in &self.program.functions {
            for block in &function.blocks {
                if block.has_interior_call() {
                    return Err(EngineError::construction(format!(
                        "call before the end of block '{}:{}'; blocks must be split at call boundaries",
                        function.name, block.label
                    )));
                }
                let Some(call) = block.tail_call() else {
                    continue;
                };
                if call.direct_callee().is_none() {
                    return Err(EngineError::IndirectCall {
                        function: function.name.clone(),
                        block: block.label.clone(),
                    });
                }
                if block.successors.len() != 1 {
                    return Err(EngineError::construction(format!(
                        "call block '{}:{}' has {} successors, expected exactly one continuation",
                        function.name,
                        block.label,
                        block.successors.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Reject any cycle in the direct call graph. A call-graph cycle behaves
    /// like a loop without a bound and makes the flow encoding unsound.
    fn reject_recursion(&self) -> Result<()> {
        let mut callees: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for (caller, callee) in self.program.call_edges() {
            if self.program.function(callee).is_some() {
                callees.entry(caller).or_default().push(callee);
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }
        let mut colors: FxHashMap<&str, Color> = self
            .program
            .functions
            .iter()
            .map(|f| (f.name.as_str(), Color::White))
            .collect();

        fn visit<'a>(
            name: &'a str,
            callees: &FxHashMap<&'a str, Vec<&'a str>>,
            colors: &mut FxHashMap<&'a str, Color>,
            stack: &mut Vec<&'a str>,
        ) -> Result<()> {
            colors.insert(name, Color::Gray);
            stack.push(name);
            for &callee in callees.get(name).map(Vec::as_slice).unwrap_or(&[]) {
                match colors.get(callee).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        let start = stack.iter().position(|&n| n == callee).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|s| s.to_string()).collect();
                        cycle.push(callee.to_string());
                        return Err(EngineError::Recursion { cycle });
                    }
                    Color::White => visit(callee, callees, colors, stack)?,
                    Color::Black => {}
                }
            }
            stack.pop();
            colors.insert(name, Color::Black);
            Ok(())
        }

        let mut stack = Vec::new();
        for function in &self.program.functions {
            if colors[function.name.as_str()] == Color::White {
                visit(&function.name, &callees, &mut colors, &mut stack)?;
            }
        }
        Ok(())
    }

    fn fill_with_function(
        &mut self,
        function_index: usize,
        is_start: bool,
        costs: &BlockCosts,
    ) -> Result<()> {
        let function = &self.program.functions[function_index];
        if function.blocks.is_empty() {
            warn!(function = function.name.as_str(), "skipping empty function");
            return Ok(());
        }
        debug!(
            function = function.name.as_str(),
            blocks = function.blocks.len(),
            is_start,
            "filling graph"
        );

        let virtual_pair = if is_start {
            let entry = self.graph.add_node("Entry", NodeKind::VirtualEntry, None);
            let exit = self.graph.add_node("Exit", NodeKind::VirtualExit, None);
            self.graph.set_entry_exit(entry, exit);
            Some((entry, exit))
        } else {
            None
        };

        // Nodes, costs and the block index
        for (block_index, block) in function.blocks.iter().enumerate() {
            let id = self.graph.add_node(
                &block.label,
                NodeKind::Block,
                Some(BlockRef {
                    function: function_index as u32,
                    block: block_index as u32,
                }),
            );
            let node = self.graph.node_mut(id);
            node.function = Some(function.name.clone());
            node.cost = costs.cost(&function.name, &block.label).unwrap_or(0);
            self.block_nodes
                .insert((function.name.clone(), block.label.clone()), id);
        }

        let first = self.node_of(&function.name, &function.blocks[0].label)?;
        self.graph.set_function_entry(&function.name, first);
        if let Some((entry, _)) = virtual_pair {
            self.graph.add_edge(entry, first)?;
        }

        // Intra-function edges and back-edge marking
        let function_loops = self.loops.for_function(&function.name);
        for block in &function.blocks {
            let from = self.node_of(&function.name, &block.label)?;
            for succ_label in &block.successors {
                let to =
                    self.block_nodes
                        .get(&(function.name.clone(), succ_label.clone()))
                        .copied()
                        .ok_or_else(|| {
                            EngineError::construction(format!(
                                "successor '{}' of block '{}:{}' does not exist",
                                succ_label, function.name, block.label
                            ))
                        })?;
                self.graph.add_edge(from, to)?;
                if function_loops.is_some_and(|l| l.is_back_edge(&block.label, succ_label)) {
                    debug!(from = from.0, to = to.0, "back-edge");
                    self.graph.mark_back_edge(from, to)?;
                }
            }
        }

        // Return nodes; the start function's returns feed the virtual exit
        let mut saw_return = false;
        for block in function.return_blocks() {
            let id = self.node_of(&function.name, &block.label)?;
            self.graph.add_function_return(&function.name, id);
            saw_return = true;
            if let Some((_, exit)) = virtual_pair {
                self.graph.add_edge(id, exit)?;
            }
        }
        if let Some((_, exit)) = virtual_pair {
            if !saw_return {
                // Fall back to the layout-last block so the exit stays wired.
                warn!(
                    function = function.name.as_str(),
                    "start function has no return block"
                );
                let last = self.node_of(
                    &function.name,
                    &function.blocks[function.blocks.len() - 1].label,
                )?;
                self.graph.add_edge(last, exit)?;
            }
        }

        // Pending call sites; external callees are not spliced
        for block in &function.blocks {
            let Some(callee) = block.tail_call().and_then(|c| c.direct_callee()) else {
                continue;
            };
            if self.program.function(callee).is_none() {
                warn!(
                    callee,
                    caller = function.name.as_str(),
                    "callee not in module; call not spliced"
                );
                continue;
            }
            let caller = self.node_of(&function.name, &block.label)?;
            let continuation = self.node_of(&function.name, &block.successors[0])?;
            self.graph.call_sites.push(CallSite {
                caller,
                callee: callee.to_string(),
                continuation,
            });
        }

        Ok(())
    }

    fn apply_bounds(&mut self, bounds: &FxHashMap<(String, String), LoopBound>) {
        for ((function, header), bound) in bounds {
            match self.block_nodes.get(&(function.clone(), header.clone())) {
                Some(&id) => {
                    self.graph.node_mut(id).loop_bound = Some(*bound);
                }
                None => warn!(
                    function = function.as_str(),
                    header = header.as_str(),
                    "bound for unknown header"
                ),
            }
        }
    }

    fn resolve_nesting(&mut self) {
        for function in &self.program.functions {
            let Some(function_loops) = self.loops.for_function(&function.name) else {
                continue;
            };
            for natural_loop in &function_loops.loops {
                let Some(parent) = &natural_loop.parent else {
                    continue;
                };
                let header = self
                    .block_nodes
                    .get(&(function.name.clone(), natural_loop.header.clone()))
                    .copied();
                let enclosing = self
                    .block_nodes
                    .get(&(function.name.clone(), parent.clone()))
                    .copied();
                if let (Some(header), Some(enclosing)) = (header, enclosing) {
                    let node = self.graph.node_mut(header);
                    node.is_nested_loop = true;
                    node.enclosing_header = Some(enclosing);
                }
            }
        }
    }

    /// Splice pending call sites and freeze the topology.
    fn finalize(&mut self) -> Result<()> {
        let call_sites = self.graph.call_sites.clone();
        for site in &call_sites {
            let Some(callee_entry) = self.graph.function_entry(&site.callee) else {
                warn!(callee = site.callee.as_str(), "callee has no entry node");
                continue;
            };
            self.graph.add_edge(site.caller, callee_entry)?;
            let returns: Vec<NodeId> = self.graph.function_returns(&site.callee).to_vec();
            for ret in returns {
                self.graph.add_edge(ret, site.continuation)?;
            }
            debug!(
                caller = site.caller.0,
                callee = site.callee.as_str(),
                "spliced call"
            );
        }
        self.graph.validate()?;
        self.graph.set_finalized();
        info!(
            nodes = self.graph.len(),
            edges = self.graph.edges().len(),
            calls = call_sites.len(),
            "program graph finalized"
        );
        Ok(())
    }

    fn node_of(&self, function: &str, block: &str) -> Result<NodeId> {
        self.block_nodes
            .get(&(function.to_string(), block.to_string()))
            .copied()
            .ok_or_else(|| {
                EngineError::construction(format!("no node for block '{function}:{block}'"))
            })
    }
}
