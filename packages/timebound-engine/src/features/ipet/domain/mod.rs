//! Solver-independent ILP model.

use crate::features::program_graph::domain::NodeId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// What a column stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    /// Execution count of a node
    NodeCount(NodeId),
    /// Flow along an edge
    EdgeFlow(NodeId, NodeId),
}

/// One column: non-negative, integer unless relaxed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub objective: f64,
    pub integer: bool,
}

/// Row sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowSense {
    Eq,
    Ge,
    Le,
}

/// One row: `terms <sense> rhs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub sense: RowSense,
    pub rhs: f64,
}

/// Maximization model over node counts and edge flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IlpModel {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    #[serde(skip)]
    node_vars: FxHashMap<NodeId, VarId>,
    #[serde(skip)]
    edge_vars: FxHashMap<(NodeId, NodeId), VarId>,
}

impl IlpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node_var(&mut self, node: NodeId, objective: f64, integer: bool) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: format!("xN{}", node.0),
            kind: VarKind::NodeCount(node),
            objective,
            integer,
        });
        self.node_vars.insert(node, id);
        id
    }

    pub fn add_edge_var(&mut self, from: NodeId, to: NodeId, integer: bool) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: format!("fE{}_{}", from.0, to.0),
            kind: VarKind::EdgeFlow(from, to),
            objective: 0.0,
            integer,
        });
        self.edge_vars.insert((from, to), id);
        id
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(VarId, f64)>,
        sense: RowSense,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
    }

    pub fn node_var(&self, node: NodeId) -> Option<VarId> {
        self.node_vars.get(&node).copied()
    }

    pub fn edge_var(&self, from: NodeId, to: NodeId) -> Option<VarId> {
        self.edge_vars.get(&(from, to)).copied()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Objective value of a full column assignment.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(var, value)| var.objective * value)
            .sum()
    }

    /// Diagnostic feasibility check of a column assignment. Returns the name
    /// of the first violated row, if any.
    pub fn violated_constraint(&self, values: &[f64], tolerance: f64) -> Option<&str> {
        if values.len() != self.variables.len() {
            return Some("<wrong assignment length>");
        }
        for (index, value) in values.iter().enumerate() {
            if *value < -tolerance {
                return Some(self.variables[index].name.as_str());
            }
        }
        for constraint in &self.constraints {
            let lhs: f64 = constraint
                .terms
                .iter()
                .map(|&(var, coeff)| coeff * values[var.0])
                .sum();
            let ok = match constraint.sense {
                RowSense::Eq => (lhs - constraint.rhs).abs() <= tolerance,
                RowSense::Ge => lhs >= constraint.rhs - tolerance,
                RowSense::Le => lhs <= constraint.rhs + tolerance,
            };
            if !ok {
                return Some(constraint.name.as_str());
            }
        }
        None
    }
}
