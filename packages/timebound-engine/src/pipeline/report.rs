//! Final analysis report.

use crate::features::ipet::domain::{IlpModel, VarKind};
use crate::features::solver::infrastructure::{BackendRun, SolveReport};
use crate::features::solver::ports::SolveStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a run produced: the bound itself, the witness counts and, in
/// `all` mode, the backend comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WcetReport {
    /// Sound upper bound in cycles (ceiling of the objective)
    pub wcet: u64,
    pub objective: f64,
    pub status: SolveStatus,
    pub solver: String,
    /// Execution count per node id
    pub node_counts: BTreeMap<u32, u64>,
    /// Flow per edge `(from, to)`
    pub edge_flows: BTreeMap<(u32, u32), u64>,
    pub runs: Vec<BackendRun>,
}

impl WcetReport {
    pub fn from_solve(model: &IlpModel, report: SolveReport) -> Self {
        let mut node_counts = BTreeMap::new();
        let mut edge_flows = BTreeMap::new();
        for (variable, &value) in model.variables.iter().zip(&report.solution.values) {
            let rounded = value.round().max(0.0) as u64;
            match variable.kind {
                VarKind::NodeCount(node) => {
                    node_counts.insert(node.0, rounded);
                }
                VarKind::EdgeFlow(from, to) => {
                    edge_flows.insert((from.0, to.0), rounded);
                }
            }
        }
        Self {
            wcet: report.solution.objective.ceil().max(0.0) as u64,
            objective: report.solution.objective,
            status: report.solution.status,
            solver: report.solver,
            node_counts,
            edge_flows,
            runs: report.runs,
        }
    }

    pub fn count(&self, node: u32) -> u64 {
        self.node_counts.get(&node).copied().unwrap_or(0)
    }

    pub fn flow(&self, from: u32, to: u32) -> u64 {
        self.edge_flows.get(&(from, to)).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for WcetReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "WCET (worst-case execution time): {} cycles [{}; {}]",
            self.wcet,
            self.solver,
            self.status.as_str()
        )?;
        if self.runs.is_empty() {
            return Ok(());
        }
        writeln!(f, "+-----------+-----------+-----------+-------------+------------+")?;
        writeln!(f, "| Solver    | Available | Status    | WCET (cyc)  | Time (ms)  |")?;
        writeln!(f, "+-----------+-----------+-----------+-------------+------------+")?;
        for run in &self.runs {
            writeln!(
                f,
                "| {:<9} | {:<9} | {:<9} | {:>11} | {:>10.3} |",
                run.backend,
                if run.available { "yes" } else { "no" },
                run.status.map(|s| s.as_str()).unwrap_or("-"),
                run.objective
                    .map(|o| format!("{o:.0}"))
                    .unwrap_or_else(|| "-".to_string()),
                run.wall_time.as_secs_f64() * 1e3,
            )?;
        }
        writeln!(f, "+-----------+-----------+-----------+-------------+------------+")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_graph::domain::NodeId;
    use crate::features::solver::ports::Solution;
    use std::time::Duration;

    fn sample_report(runs: Vec<BackendRun>) -> WcetReport {
        let mut model = IlpModel::new();
        model.add_node_var(NodeId(0), 3.0, true);
        model.add_node_var(NodeId(1), 5.0, true);
        model.add_edge_var(NodeId(0), NodeId(1), true);
        WcetReport::from_solve(
            &model,
            SolveReport {
                solver: "highs".to_string(),
                solution: Solution {
                    status: SolveStatus::Optimal,
                    objective: 8.0,
                    values: vec![1.0, 1.0, 1.0],
                },
                runs,
            },
        )
    }

    #[test]
    fn test_counts_and_flows_extracted() {
        let report = sample_report(Vec::new());
        assert_eq!(report.wcet, 8);
        assert_eq!(report.count(0), 1);
        assert_eq!(report.count(1), 1);
        assert_eq!(report.flow(0, 1), 1);
        assert_eq!(report.flow(1, 0), 0);
    }

    #[test]
    fn test_display_table_only_in_all_mode() {
        let plain = sample_report(Vec::new());
        assert!(!plain.to_string().contains("| Solver"));

        let with_runs = sample_report(vec![BackendRun {
            backend: "highs".to_string(),
            available: true,
            status: Some(SolveStatus::Optimal),
            objective: Some(8.0),
            wall_time: Duration::from_millis(2),
        }]);
        let text = with_runs.to_string();
        assert!(text.contains("| Solver"));
        assert!(text.contains("| highs"));
        assert!(text.contains("8"));
    }
}
