//! Worklist fixpoint solver.
//!
//! Kildall-style iteration over the finalized program graph: pop a node,
//! join the predecessor out-states, run the transfer function across the
//! node's block, and re-enqueue successors when the out-state grew. Removal
//! order is FIFO and adjacency sets are ordered, so the visit sequence is
//! deterministic for a given graph.

use crate::errors::{EngineError, Result};
use crate::features::analysis::domain::Lattice;
use crate::features::analysis::ports::AbstractAnalysis;
use crate::features::program_graph::domain::{NodeId, ProgramGraph};
use crate::shared::models::Program;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Fixpoint output: one out-state per node (None = never reached), plus
/// iteration counters.
#[derive(Debug, Clone)]
pub struct FixpointSolution<S> {
    pub states: Vec<Option<S>>,
    pub iterations: usize,
    pub widenings: usize,
}

impl<S> FixpointSolution<S> {
    pub fn state(&self, id: NodeId) -> Option<&S> {
        self.states.get(id.index()).and_then(Option::as_ref)
    }
}

/// Worklist driver for an [`AbstractAnalysis`].
pub struct WorklistSolver<'p, A> {
    analysis: A,
    program: &'p Program,
    max_iterations: usize,
    widen_after: u32,
}

impl<'p, A: AbstractAnalysis> WorklistSolver<'p, A> {
    pub fn new(program: &'p Program, analysis: A) -> Self {
        Self {
            analysis,
            program,
            max_iterations: 100_000,
            widen_after: 2,
        }
    }

    /// Safety cap on worklist pops; exceeding it is an analysis error.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Unstable visits of a loop header before widening kicks in.
    pub fn with_widen_after(mut self, widen_after: u32) -> Self {
        self.widen_after = widen_after;
        self
    }

    /// Run to fixpoint. Block costs computed by the transfer function are
    /// written back into the graph nodes; topology is untouched.
    pub fn run(&self, graph: &mut ProgramGraph) -> Result<FixpointSolution<A::State>> {
        let node_count = graph.len();
        let mut states: Vec<Option<A::State>> = vec![None; node_count];
        let mut in_worklist = vec![true; node_count];
        let mut unstable_visits = vec![0u32; node_count];
        let mut widening_rounds = vec![0u32; node_count];

        let mut worklist: VecDeque<NodeId> = graph.node_ids().collect();
        let mut iterations = 0usize;
        let mut widenings = 0usize;

        while let Some(id) = worklist.pop_front() {
            in_worklist[id.index()] = false;
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(EngineError::FixpointDiverged {
                    iterations: self.max_iterations,
                });
            }

            // Join the predecessor out-states; a node with no predecessors
            // starts from the initial state.
            let mut in_state: Option<A::State> = None;
            for &pred in &graph.node(id).predecessors {
                if let Some(pred_state) = &states[pred.index()] {
                    match in_state.as_mut() {
                        Some(current) => {
                            current.join(pred_state);
                        }
                        None => in_state = Some(pred_state.clone()),
                    }
                }
            }
            let mut state = in_state.unwrap_or_else(|| self.analysis.initial());

            // Transfer across the node's block, collecting its cycle cost.
            if let Some(block_ref) = graph.node(id).block {
                let block = &self.program.functions[block_ref.function as usize].blocks
                    [block_ref.block as usize];
                let mut block_cost: u64 = 0;
                for instr in &block.instrs {
                    let (next, cycles) = self.analysis.transfer(&state, instr)?;
                    state = next;
                    block_cost = block_cost.saturating_add(u64::from(cycles));
                }
                graph.node_mut(id).cost = block_cost;
            }

            let changed = match &states[id.index()] {
                Some(previous) => *previous != state,
                None => true,
            };
            if !changed {
                continue;
            }

            let node = graph.node(id);
            if node.is_loop_header {
                if let Some(previous) = &states[id.index()] {
                    unstable_visits[id.index()] += 1;
                    if unstable_visits[id.index()] >= self.widen_after {
                        let rounds = widening_rounds[id.index()];
                        let saturate = rounds > 0 || node.loop_bound.is_none();
                        let steps = node
                            .loop_bound
                            .map(|bound| u64::from(bound.upper))
                            .unwrap_or(0);
                        state.widen(previous, steps, saturate);
                        widening_rounds[id.index()] += 1;
                        widenings += 1;
                        debug!(node = id.0, rounds, saturate, "widened header state");
                    }
                }
            }

            debug!(node = id.0, state = %state, "state updated");
            states[id.index()] = Some(state);
            for &succ in &graph.node(id).successors {
                if !in_worklist[succ.index()] {
                    in_worklist[succ.index()] = true;
                    worklist.push_back(succ);
                }
            }
        }

        info!(iterations, widenings, "fixpoint reached");
        Ok(FixpointSolution {
            states,
            iterations,
            widenings,
        })
    }
}
