//! HiGHS backend (`highs` feature).

use crate::errors::{EngineError, Result};
use crate::features::ipet::domain::{IlpModel, RowSense};
use crate::features::solver::ports::{IlpBackend, Solution, SolveStatus};
use highs::{HighsModelStatus, RowProblem, Sense};
use std::time::Duration;

/// Open-source backend; always available once compiled in.
#[derive(Debug, Default)]
pub struct HighsBackend;

impl HighsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl IlpBackend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, model: &IlpModel, timeout: Option<Duration>) -> Result<Solution> {
        let mut problem = RowProblem::default();

        let columns: Vec<highs::Col> = model
            .variables
            .iter()
            .map(|variable| {
                if variable.integer {
                    problem.add_integer_column(variable.objective, 0.0..)
                } else {
                    problem.add_column(variable.objective, 0.0..)
                }
            })
            .collect();

        for constraint in &model.constraints {
            let factors: Vec<(highs::Col, f64)> = constraint
                .terms
                .iter()
                .map(|&(var, coeff)| (columns[var.0], coeff))
                .collect();
            match constraint.sense {
                RowSense::Eq => problem.add_row(constraint.rhs..=constraint.rhs, factors),
                RowSense::Ge => problem.add_row(constraint.rhs.., factors),
                RowSense::Le => problem.add_row(..=constraint.rhs, factors),
            };
        }

        let mut solver = problem.optimise(Sense::Maximise);
        solver.set_option("output_flag", false);
        if let Some(timeout) = timeout {
            solver.set_option("time_limit", timeout.as_secs_f64());
        }

        let solved = solver.solve();
        let status = match solved.status() {
            HighsModelStatus::Optimal => SolveStatus::Optimal,
            HighsModelStatus::Infeasible => SolveStatus::Infeasible,
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                SolveStatus::Unbounded
            }
            HighsModelStatus::ReachedTimeLimit => SolveStatus::Timeout,
            other => {
                return Err(EngineError::Solver(format!(
                    "HiGHS terminated with status {other:?}"
                )))
            }
        };

        let values: Vec<f64> = match status {
            SolveStatus::Optimal | SolveStatus::Timeout => {
                solved.get_solution().columns().to_vec()
            }
            _ => vec![0.0; model.num_variables()],
        };
        let objective = model.objective_value(&values);

        Ok(Solution {
            status,
            objective,
            values,
        })
    }
}
