//! Backend interface.

use crate::errors::Result;
use crate::features::ipet::domain::IlpModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Timeout,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Timeout => "timeout",
        }
    }
}

/// Backend output: status, objective and one value per model column.
/// On timeout the objective is the best incumbent the backend had, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub status: SolveStatus,
    pub objective: f64,
    pub values: Vec<f64>,
}

/// One ILP solver.
pub trait IlpBackend {
    fn name(&self) -> &'static str;

    /// License and runtime probe; an unavailable backend is skipped by the
    /// automatic strategy and fatal for the named one.
    fn is_available(&self) -> bool;

    /// Run the model to completion (or to `timeout`). Internal failures are
    /// errors; infeasible/unbounded/timeout are reported through the status.
    fn solve(&self, model: &IlpModel, timeout: Option<Duration>) -> Result<Solution>;
}
