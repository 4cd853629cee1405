//! Backend registry and selection strategies.

use crate::errors::{EngineError, Result};
use crate::features::ipet::domain::IlpModel;
use crate::features::solver::ports::{IlpBackend, Solution, SolveStatus};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Objectives within this distance count as agreeing in `All` mode.
const AGREEMENT_TOLERANCE: f64 = 1e-6;

/// Known backend identities, in automatic preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gurobi,
    Highs,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gurobi => "gurobi",
            BackendKind::Highs => "highs",
        }
    }
}

/// Selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverChoice {
    /// Commercial first, open source second, else fail
    Auto,
    /// Exactly the requested backend
    Named(BackendKind),
    /// Run everything available and cross-check
    All,
}

impl SolverChoice {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "auto" => Ok(SolverChoice::Auto),
            "gurobi" => Ok(SolverChoice::Named(BackendKind::Gurobi)),
            "highs" => Ok(SolverChoice::Named(BackendKind::Highs)),
            "all" => Ok(SolverChoice::All),
            other => Err(EngineError::UnknownSolver(other.to_string())),
        }
    }
}

/// One backend attempt in `All` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendRun {
    pub backend: String,
    pub available: bool,
    pub status: Option<SolveStatus>,
    pub objective: Option<f64>,
    pub wall_time: Duration,
}

/// Outcome of a registry solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub solver: String,
    pub solution: Solution,
    /// Populated in `All` mode
    pub runs: Vec<BackendRun>,
}

/// Holds the compiled-in backends and applies the selection strategy.
pub struct SolverRegistry {
    backends: Vec<Box<dyn IlpBackend>>,
}

impl SolverRegistry {
    /// Registry over whatever the build enabled, in preference order.
    pub fn with_compiled_backends() -> Self {
        #[allow(unused_mut)]
        let mut backends: Vec<Box<dyn IlpBackend>> = Vec::new();
        #[cfg(feature = "gurobi")]
        backends.push(Box::new(
            crate::features::solver::infrastructure::gurobi::GurobiBackend::new(),
        ));
        #[cfg(feature = "highs")]
        backends.push(Box::new(
            crate::features::solver::infrastructure::highs_backend::HighsBackend::new(),
        ));
        Self { backends }
    }

    /// Registry over explicit backends; the strategies keep the given order.
    pub fn new(backends: Vec<Box<dyn IlpBackend>>) -> Self {
        Self { backends }
    }

    pub fn available_backends(&self) -> Vec<&str> {
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| b.name())
            .collect()
    }

    /// Apply the selection strategy and solve.
    ///
    /// Infeasible and unbounded results are errors. Timeout is passed
    /// through in the report; the caller decides whether a best-effort bound
    /// is acceptable.
    pub fn solve(
        &self,
        model: &IlpModel,
        choice: SolverChoice,
        timeout: Option<Duration>,
        fail_on_disagreement: bool,
    ) -> Result<SolveReport> {
        match choice {
            SolverChoice::Named(kind) => {
                let backend = self
                    .backends
                    .iter()
                    .find(|b| b.name() == kind.as_str())
                    .ok_or_else(|| EngineError::BackendUnavailable(kind.as_str().to_string()))?;
                if !backend.is_available() {
                    return Err(EngineError::BackendUnavailable(backend.name().to_string()));
                }
                self.run_single(backend.as_ref(), model, timeout)
            }
            SolverChoice::Auto => {
                let backend = self
                    .backends
                    .iter()
                    .find(|b| b.is_available())
                    .ok_or(EngineError::NoBackend)?;
                info!(solver = backend.name(), "auto-selected backend");
                self.run_single(backend.as_ref(), model, timeout)
            }
            SolverChoice::All => self.run_all(model, timeout, fail_on_disagreement),
        }
    }

    fn run_single(
        &self,
        backend: &dyn IlpBackend,
        model: &IlpModel,
        timeout: Option<Duration>,
    ) -> Result<SolveReport> {
        let solution = self.checked_solve(backend, model, timeout)?;
        Ok(SolveReport {
            solver: backend.name().to_string(),
            solution,
            runs: Vec::new(),
        })
    }

    fn run_all(
        &self,
        model: &IlpModel,
        timeout: Option<Duration>,
        fail_on_disagreement: bool,
    ) -> Result<SolveReport> {
        if self.backends.is_empty() {
            return Err(EngineError::NoBackend);
        }

        let mut runs = Vec::new();
        let mut best: Option<(String, Solution)> = None;
        let mut first_error: Option<EngineError> = None;

        for backend in &self.backends {
            if !backend.is_available() {
                runs.push(BackendRun {
                    backend: backend.name().to_string(),
                    available: false,
                    status: None,
                    objective: None,
                    wall_time: Duration::ZERO,
                });
                continue;
            }
            let started = Instant::now();
            let outcome = self.checked_solve(backend.as_ref(), model, timeout);
            let wall_time = started.elapsed();
            match outcome {
                Ok(solution) => {
                    runs.push(BackendRun {
                        backend: backend.name().to_string(),
                        available: true,
                        status: Some(solution.status),
                        objective: Some(solution.objective),
                        wall_time,
                    });
                    if best.is_none() {
                        best = Some((backend.name().to_string(), solution));
                    }
                }
                Err(err) => {
                    warn!(solver = backend.name(), %err, "backend failed");
                    runs.push(BackendRun {
                        backend: backend.name().to_string(),
                        available: true,
                        status: None,
                        objective: None,
                        wall_time,
                    });
                    first_error.get_or_insert(err);
                }
            }
        }

        let Some((solver, solution)) = best else {
            return Err(first_error.unwrap_or(EngineError::NoBackend));
        };

        // Cross-check the successful objectives.
        let objectives: Vec<(&str, f64)> = runs
            .iter()
            .filter(|r| r.status == Some(SolveStatus::Optimal))
            .filter_map(|r| r.objective.map(|o| (r.backend.as_str(), o)))
            .collect();
        if let Some(&(_, reference)) = objectives.first() {
            let disagreeing: Vec<&str> = objectives
                .iter()
                .filter(|(_, objective)| (objective - reference).abs() > AGREEMENT_TOLERANCE)
                .map(|&(name, _)| name)
                .collect();
            if !disagreeing.is_empty() {
                if fail_on_disagreement {
                    return Err(EngineError::Solver(format!(
                        "backends disagree on the objective: {}",
                        disagreeing.join(", ")
                    )));
                }
                warn!(
                    backends = %disagreeing.join(", "),
                    reference, "backends disagree on the objective"
                );
            } else {
                info!(objective = reference, "all backends agree");
            }
        }

        Ok(SolveReport {
            solver,
            solution,
            runs,
        })
    }

    /// Run one backend and map hard statuses to errors.
    fn checked_solve(
        &self,
        backend: &dyn IlpBackend,
        model: &IlpModel,
        timeout: Option<Duration>,
    ) -> Result<Solution> {
        let solution = backend.solve(model, timeout)?;
        match solution.status {
            SolveStatus::Infeasible => Err(EngineError::Infeasible),
            SolveStatus::Unbounded => Err(EngineError::Unbounded),
            SolveStatus::Optimal | SolveStatus::Timeout => Ok(solution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBackend {
        name: &'static str,
        available: bool,
        objective: f64,
        status: SolveStatus,
    }

    impl FakeBackend {
        fn boxed(name: &'static str, available: bool, objective: f64) -> Box<dyn IlpBackend> {
            Box::new(Self {
                name,
                available,
                objective,
                status: SolveStatus::Optimal,
            })
        }
    }

    impl IlpBackend for FakeBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn solve(&self, model: &IlpModel, _timeout: Option<Duration>) -> Result<Solution> {
            Ok(Solution {
                status: self.status,
                objective: self.objective,
                values: vec![0.0; model.num_variables()],
            })
        }
    }

    fn model() -> IlpModel {
        IlpModel::new()
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(SolverChoice::parse("auto").unwrap(), SolverChoice::Auto);
        assert_eq!(
            SolverChoice::parse("gurobi").unwrap(),
            SolverChoice::Named(BackendKind::Gurobi)
        );
        assert_eq!(SolverChoice::parse("all").unwrap(), SolverChoice::All);
        assert!(matches!(
            SolverChoice::parse("cplex").unwrap_err(),
            EngineError::UnknownSolver(_)
        ));
    }

    #[test]
    fn test_auto_skips_unavailable() {
        let registry = SolverRegistry::new(vec![
            FakeBackend::boxed("gurobi", false, 10.0),
            FakeBackend::boxed("highs", true, 21.0),
        ]);
        let report = registry
            .solve(&model(), SolverChoice::Auto, None, false)
            .unwrap();
        assert_eq!(report.solver, "highs");
        assert_eq!(report.solution.objective, 21.0);
    }

    #[test]
    fn test_auto_with_nothing_available() {
        let registry = SolverRegistry::new(vec![FakeBackend::boxed("gurobi", false, 0.0)]);
        let err = registry
            .solve(&model(), SolverChoice::Auto, None, false)
            .unwrap_err();
        assert!(matches!(err, EngineError::NoBackend));
    }

    #[test]
    fn test_named_requires_availability() {
        let registry = SolverRegistry::new(vec![FakeBackend::boxed("gurobi", false, 0.0)]);
        let err = registry
            .solve(
                &model(),
                SolverChoice::Named(BackendKind::Gurobi),
                None,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::BackendUnavailable(_)));

        let err = registry
            .solve(
                &model(),
                SolverChoice::Named(BackendKind::Highs),
                None,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::BackendUnavailable(_)));
    }

    #[test]
    fn test_all_reports_every_backend() {
        let registry = SolverRegistry::new(vec![
            FakeBackend::boxed("gurobi", true, 21.0),
            FakeBackend::boxed("highs", true, 21.0),
            FakeBackend::boxed("other", false, 0.0),
        ]);
        let report = registry
            .solve(&model(), SolverChoice::All, None, false)
            .unwrap();
        assert_eq!(report.runs.len(), 3);
        assert_eq!(report.solver, "gurobi");
        assert!(!report.runs[2].available);
    }

    #[test]
    fn test_all_disagreement_warns_by_default_and_fails_when_asked() {
        let registry = SolverRegistry::new(vec![
            FakeBackend::boxed("gurobi", true, 21.0),
            FakeBackend::boxed("highs", true, 22.0),
        ]);
        // default: warning only, first success wins
        let report = registry
            .solve(&model(), SolverChoice::All, None, false)
            .unwrap();
        assert_eq!(report.solution.objective, 21.0);

        let registry = SolverRegistry::new(vec![
            FakeBackend::boxed("gurobi", true, 21.0),
            FakeBackend::boxed("highs", true, 22.0),
        ]);
        let err = registry
            .solve(&model(), SolverChoice::All, None, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::Solver(_)));
    }

    #[test]
    fn test_infeasible_is_an_error() {
        let backend = Box::new(FakeBackend {
            name: "highs",
            available: true,
            objective: 0.0,
            status: SolveStatus::Infeasible,
        });
        let registry = SolverRegistry::new(vec![backend]);
        let err = registry
            .solve(&model(), SolverChoice::Auto, None, false)
            .unwrap_err();
        assert!(matches!(err, EngineError::Infeasible));
    }
}
