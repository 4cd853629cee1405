//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::time::Duration;
use timebound_engine::errors::Result;
use timebound_engine::features::ipet::IpetEncoder;
use timebound_engine::features::latency::BlockCosts;
use timebound_engine::features::loop_bounds::BoundAggregator;
use timebound_engine::features::program_graph::GraphBuilder;
use timebound_engine::{
    AddrMode, EngineError, IlpBackend, IlpModel, Instr, Mnemonic, ModuleLoops, Msp430Latency,
    NodeId, PipelineAnalysis, Program, ProgramGraph, Solution, SolveStatus, WorklistSolver,
};

/// `n` register-register adds: a block costing exactly `n` cycles.
pub fn adds(n: usize) -> Vec<Instr> {
    (0..n)
        .map(|_| Instr::two_op(Mnemonic::Add, AddrMode::Register, AddrMode::Register))
        .collect()
}

/// Run latency, bound aggregation, graph construction and the fixpoint, then
/// encode. Mirrors the engine's pass order with the stages exposed.
pub fn analyse(program: &Program, loops: &ModuleLoops, start: &str) -> (ProgramGraph, IlpModel) {
    let latency = Msp430Latency::new();
    let costs = BlockCosts::compute(program, &latency).expect("block costs");
    let bounds = BoundAggregator::default().aggregate(program, loops);
    let mut graph = GraphBuilder::new(program, loops)
        .build(start, &costs, &bounds)
        .expect("graph construction");
    WorklistSolver::new(program, PipelineAnalysis::new(&latency))
        .run(&mut graph)
        .expect("fixpoint");
    let model = IpetEncoder::new(&graph).encode().expect("encoding");
    (graph, model)
}

/// A claimed optimum: node execution counts and edge flows by block name.
#[derive(Default)]
pub struct Witness<'a> {
    pub counts: Vec<(&'a str, f64)>,
    pub flows: Vec<(&'a str, &'a str, f64)>,
}

impl<'a> Witness<'a> {
    pub fn new(counts: Vec<(&'a str, f64)>, flows: Vec<(&'a str, &'a str, f64)>) -> Self {
        Self { counts, flows }
    }

    /// Turn the named witness into a full column assignment.
    pub fn assignment(&self, graph: &ProgramGraph, model: &IlpModel) -> Vec<f64> {
        let mut values = vec![0.0; model.num_variables()];
        for (name, count) in &self.counts {
            let var = model
                .node_var(node_id(graph, name))
                .unwrap_or_else(|| panic!("no count column for {name}"));
            values[var.0] = *count;
        }
        for (from, to, flow) in &self.flows {
            let var = model
                .edge_var(node_id(graph, from), node_id(graph, to))
                .unwrap_or_else(|| panic!("no flow column for {from} -> {to}"));
            values[var.0] = *flow;
        }
        values
    }
}

/// Node id by name ("Entry"/"Exit" included).
pub fn node_id(graph: &ProgramGraph, name: &str) -> NodeId {
    graph
        .nodes()
        .find(|n| n.name == name)
        .unwrap_or_else(|| panic!("no node named {name}"))
        .id
}

/// Assert the witness satisfies every row and yields the expected objective.
pub fn assert_witness(
    graph: &ProgramGraph,
    model: &IlpModel,
    witness: &Witness<'_>,
    expected_objective: f64,
) {
    let values = witness.assignment(graph, model);
    assert_eq!(
        model.violated_constraint(&values, 1e-6),
        None,
        "witness violates the model"
    );
    let objective = model.objective_value(&values);
    assert!(
        (objective - expected_objective).abs() < 1e-6,
        "objective {objective} != expected {expected_objective}"
    );
}

/// Assert the assignment breaks at least one row (evidence a larger bound is
/// not reachable).
pub fn assert_infeasible(graph: &ProgramGraph, model: &IlpModel, witness: &Witness<'_>) {
    let values = witness.assignment(graph, model);
    assert!(
        model.violated_constraint(&values, 1e-6).is_some(),
        "assignment was expected to violate a row"
    );
}

/// Test backend that replays a fixed named assignment, refusing it if it is
/// infeasible for the model it is handed.
pub struct AssignmentBackend {
    pub backend_name: &'static str,
    /// Column values by variable name; absent columns are zero
    pub values: Vec<(String, f64)>,
}

impl AssignmentBackend {
    pub fn new(backend_name: &'static str, values: Vec<(String, f64)>) -> Self {
        Self {
            backend_name,
            values,
        }
    }

    /// Every column set to one: the witness for straight-line programs.
    pub fn all_ones(backend_name: &'static str) -> Self {
        Self {
            backend_name,
            values: Vec::new(),
        }
    }
}

impl IlpBackend for AssignmentBackend {
    fn name(&self) -> &'static str {
        self.backend_name
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, model: &IlpModel, _timeout: Option<Duration>) -> Result<Solution> {
        let values: Vec<f64> = if self.values.is_empty() {
            vec![1.0; model.num_variables()]
        } else {
            let mut values = vec![0.0; model.num_variables()];
            for (name, value) in &self.values {
                let index = model
                    .variables
                    .iter()
                    .position(|v| &v.name == name)
                    .ok_or_else(|| EngineError::Solver(format!("unknown column {name}")))?;
                values[index] = *value;
            }
            values
        };
        if let Some(row) = model.violated_constraint(&values, 1e-6) {
            return Err(EngineError::Solver(format!(
                "assignment violates row {row}"
            )));
        }
        Ok(Solution {
            status: SolveStatus::Optimal,
            objective: model.objective_value(&values),
            values,
        })
    }
}

/// Backend that must never be reached; used to show rejection happens before
/// any solver runs.
pub struct UnreachableBackend;

impl IlpBackend for UnreachableBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, _model: &IlpModel, _timeout: Option<Duration>) -> Result<Solution> {
        panic!("the solver must not be invoked for a rejected input");
    }
}
