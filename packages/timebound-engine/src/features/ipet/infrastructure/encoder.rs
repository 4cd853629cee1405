//! Graph to ILP translation.
//!
//! Objective: maximize sum of node cost times node count. Rows: unit entry
//! and exit counts, flow conservation on both sides of every node, and per
//! header `(B-1)*x_h - B*sum(back-edge flow) >= 0`, which caps back-edge
//! traffic at `B-1` per entry into the loop. A flagged header without
//! recorded back-edges falls back to the absolute cap `x_h <= B`.

use crate::errors::{EngineError, Result};
use crate::features::ipet::domain::{IlpModel, RowSense, VarId};
use crate::features::program_graph::domain::{NodeId, ProgramGraph};
use tracing::{debug, warn};

/// Encodes a finalized, cost-annotated graph.
pub struct IpetEncoder<'g> {
    graph: &'g ProgramGraph,
    integer: bool,
    fallback_cap: Option<u32>,
}

impl<'g> IpetEncoder<'g> {
    pub fn new(graph: &'g ProgramGraph) -> Self {
        Self {
            graph,
            integer: true,
            fallback_cap: None,
        }
    }

    /// Relax to continuous variables (fast upper bound, possibly less tight).
    pub fn with_integer_variables(mut self, integer: bool) -> Self {
        self.integer = integer;
        self
    }

    /// Absolute cap applied to headers that have no bound of their own.
    pub fn with_fallback_cap(mut self, cap: Option<u32>) -> Self {
        self.fallback_cap = cap;
        self
    }

    pub fn encode(&self) -> Result<IlpModel> {
        let (entry, exit) = self.entry_exit()?;
        let mut model = IlpModel::new();

        for node in self.graph.nodes() {
            model.add_node_var(node.id, node.cost as f64, self.integer);
        }
        for (from, to) in self.graph.edges() {
            model.add_edge_var(from, to, self.integer);
        }

        let entry_var = self.node_var(&model, entry)?;
        let exit_var = self.node_var(&model, exit)?;
        model.add_constraint("entry", vec![(entry_var, 1.0)], RowSense::Eq, 1.0);
        model.add_constraint("exit", vec![(exit_var, 1.0)], RowSense::Eq, 1.0);

        // Flow conservation. A non-entry node with no predecessors gets an
        // empty inflow sum, which pins its count to zero.
        for node in self.graph.nodes() {
            let x = self.node_var(&model, node.id)?;
            if node.id != entry {
                let mut terms: Vec<(VarId, f64)> = vec![(x, -1.0)];
                for &pred in &node.predecessors {
                    if let Some(f) = model.edge_var(pred, node.id) {
                        terms.push((f, 1.0));
                    }
                }
                model.add_constraint(format!("flow_in_{}", node.id), terms, RowSense::Eq, 0.0);
            }
            if node.id != exit {
                let mut terms: Vec<(VarId, f64)> = vec![(x, -1.0)];
                for &succ in &node.successors {
                    if let Some(f) = model.edge_var(node.id, succ) {
                        terms.push((f, 1.0));
                    }
                }
                model.add_constraint(format!("flow_out_{}", node.id), terms, RowSense::Eq, 0.0);
            }
        }

        // Loop bounds.
        let reachable = self.graph.reachable_from_entry();
        for node in self.graph.nodes() {
            if !node.is_loop_header {
                continue;
            }
            let bound = match (node.loop_bound, self.fallback_cap) {
                (Some(bound), _) => u64::from(bound.upper),
                (None, Some(cap)) => {
                    if reachable.contains(&node.id) {
                        warn!(
                            header = node.qualified_name().as_str(),
                            cap, "header has no bound; applying fallback cap"
                        );
                    }
                    let x = self.node_var(&model, node.id)?;
                    model.add_constraint(
                        format!("loop_cap_{}", node.id),
                        vec![(x, 1.0)],
                        RowSense::Le,
                        f64::from(cap),
                    );
                    continue;
                }
                (None, None) => {
                    if !reachable.contains(&node.id) {
                        continue;
                    }
                    return Err(EngineError::MissingLoopBound {
                        header: node.qualified_name(),
                        node: node.id.0,
                    });
                }
            };

            let x = self.node_var(&model, node.id)?;
            if node.back_edge_predecessors.is_empty() {
                model.add_constraint(
                    format!("loop_cap_{}", node.id),
                    vec![(x, 1.0)],
                    RowSense::Le,
                    bound as f64,
                );
                continue;
            }
            let mut terms: Vec<(VarId, f64)> = vec![(x, bound as f64 - 1.0)];
            for &pred in &node.back_edge_predecessors {
                if let Some(f) = model.edge_var(pred, node.id) {
                    terms.push((f, -(bound as f64)));
                }
            }
            model.add_constraint(format!("loop_bound_{}", node.id), terms, RowSense::Ge, 0.0);
        }

        debug!(
            variables = model.num_variables(),
            constraints = model.constraints.len(),
            "encoded IPET model"
        );
        Ok(model)
    }

    fn node_var(&self, model: &IlpModel, node: NodeId) -> Result<VarId> {
        model
            .node_var(node)
            .ok_or_else(|| EngineError::construction(format!("no column for node {node}")))
    }

    /// Virtual entry/exit, with the reference fallback of degree-based
    /// discovery for graphs assembled by hand.
    fn entry_exit(&self) -> Result<(NodeId, NodeId)> {
        let entry = self
            .graph
            .entry()
            .or_else(|| {
                self.graph
                    .nodes()
                    .find(|n| n.predecessors.is_empty())
                    .map(|n| n.id)
            })
            .ok_or_else(|| EngineError::construction("could not identify an entry node"))?;
        let exit = self
            .graph
            .exit()
            .or_else(|| {
                self.graph
                    .nodes()
                    .find(|n| n.successors.is_empty())
                    .map(|n| n.id)
            })
            .ok_or_else(|| EngineError::construction("could not identify an exit node"))?;
        Ok((entry, exit))
    }
}
