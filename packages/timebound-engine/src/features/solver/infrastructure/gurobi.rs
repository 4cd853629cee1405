//! Gurobi backend (`gurobi` feature).

use crate::errors::{EngineError, Result};
use crate::features::ipet::domain::{IlpModel, RowSense};
use crate::features::solver::ports::{IlpBackend, Solution, SolveStatus};
use grb::prelude::*;
use std::time::Duration;

/// Commercial backend; availability means a usable license.
pub struct GurobiBackend {
    has_license: bool,
}

impl GurobiBackend {
    pub fn new() -> Self {
        // Creating an environment performs the license check.
        let has_license = Env::new("").is_ok();
        Self { has_license }
    }
}

impl Default for GurobiBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn grb_err(err: grb::Error) -> EngineError {
    EngineError::Solver(format!("Gurobi: {err}"))
}

impl IlpBackend for GurobiBackend {
    fn name(&self) -> &'static str {
        "gurobi"
    }

    fn is_available(&self) -> bool {
        self.has_license
    }

    fn solve(&self, model: &IlpModel, timeout: Option<Duration>) -> Result<Solution> {
        let mut env = Env::empty().map_err(grb_err)?;
        env.set(param::OutputFlag, 0).map_err(grb_err)?;
        if let Some(timeout) = timeout {
            env.set(param::TimeLimit, timeout.as_secs_f64())
                .map_err(grb_err)?;
        }
        let env = env.start().map_err(grb_err)?;
        let mut grb_model = Model::with_env("wcet", &env).map_err(grb_err)?;

        let vars: Vec<Var> = model
            .variables
            .iter()
            .map(|variable| {
                let vtype = if variable.integer {
                    VarType::Integer
                } else {
                    VarType::Continuous
                };
                grb_model.add_var(
                    &variable.name,
                    vtype,
                    variable.objective,
                    0.0,
                    grb::INFINITY,
                    std::iter::empty::<(Constr, f64)>(),
                )
            })
            .collect::<std::result::Result<_, _>>()
            .map_err(grb_err)?;
        grb_model
            .set_attr(attr::ModelSense, ModelSense::Maximize)
            .map_err(grb_err)?;

        for constraint in &model.constraints {
            let mut expr = grb::expr::LinExpr::new();
            for &(var, coeff) in &constraint.terms {
                expr.add_term(coeff, vars[var.0]);
            }
            let row = match constraint.sense {
                RowSense::Eq => c!(expr == constraint.rhs),
                RowSense::Ge => c!(expr >= constraint.rhs),
                RowSense::Le => c!(expr <= constraint.rhs),
            };
            grb_model
                .add_constr(&constraint.name, row)
                .map_err(grb_err)?;
        }

        grb_model.optimize().map_err(grb_err)?;
        let status = match grb_model.status().map_err(grb_err)? {
            Status::Optimal => SolveStatus::Optimal,
            Status::Infeasible => SolveStatus::Infeasible,
            Status::Unbounded | Status::InfOrUnbd => SolveStatus::Unbounded,
            Status::TimeLimit => SolveStatus::Timeout,
            other => {
                return Err(EngineError::Solver(format!(
                    "Gurobi terminated with status {other:?}"
                )))
            }
        };

        let values: Vec<f64> = match status {
            SolveStatus::Optimal | SolveStatus::Timeout => grb_model
                .get_obj_attr_batch(attr::X, vars)
                .map_err(grb_err)?,
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
