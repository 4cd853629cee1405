//! LP-format model dump.
//!
//! CPLEX LP text format, accepted by every backend we drive and by most
//! standalone solvers, which makes it the convenient exchange form for
//! inspecting a model outside the engine.

use crate::errors::Result;
use crate::features::ipet::domain::{IlpModel, RowSense};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write the model in LP format.
pub fn write_lp<W: Write>(model: &IlpModel, out: &mut W) -> Result<()> {
    writeln!(out, "\\ WCET IPET model")?;
    writeln!(out, "Maximize")?;
    write!(out, " obj:")?;
    let mut wrote_term = false;
    for variable in &model.variables {
        if variable.objective != 0.0 {
            write!(out, " + {} {}", format_coeff(variable.objective), variable.name)?;
            wrote_term = true;
        }
    }
    if !wrote_term {
        if let Some(first) = model.variables.first() {
            // Degenerate but valid: an all-zero objective.
            write!(out, " 0 {}", first.name)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "Subject To")?;
    for constraint in &model.constraints {
        write!(out, " {}:", constraint.name)?;
        for &(var, coeff) in &constraint.terms {
            let sign = if coeff < 0.0 { '-' } else { '+' };
            write!(
                out,
                " {} {} {}",
                sign,
                format_coeff(coeff.abs()),
                model.variables[var.0].name
            )?;
        }
        let sense = match constraint.sense {
            RowSense::Eq => "=",
            RowSense::Ge => ">=",
            RowSense::Le => "<=",
        };
        writeln!(out, " {} {}", sense, format_coeff(constraint.rhs))?;
    }

    let integers: Vec<&str> = model
        .variables
        .iter()
        .filter(|v| v.integer)
        .map(|v| v.name.as_str())
        .collect();
    if !integers.is_empty() {
        writeln!(out, "General")?;
        writeln!(out, " {}", integers.join(" "))?;
    }
    writeln!(out, "End")?;
    Ok(())
}

/// Write the model to an `.lp` file.
pub fn dump_lp(model: &IlpModel, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_lp(model, &mut file)?;
    info!(path = %path.display(), "wrote ILP model");
    Ok(())
}

fn format_coeff(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ipet::domain::VarId;
    use crate::features::program_graph::domain::NodeId;

    #[test]
    fn test_lp_text() {
        let mut model = IlpModel::new();
        let x = model.add_node_var(NodeId(0), 3.0, true);
        let y = model.add_node_var(NodeId(1), 0.0, true);
        let f = model.add_edge_var(NodeId(0), NodeId(1), true);
        model.add_constraint("entry", vec![(x, 1.0)], RowSense::Eq, 1.0);
        model.add_constraint(
            "flow_in_1",
            vec![(VarId(y.0), -1.0), (f, 1.0)],
            RowSense::Eq,
            0.0,
        );
        model.add_constraint("loop_bound_0", vec![(x, 4.0), (f, -5.0)], RowSense::Ge, 0.0);

        let mut buffer = Vec::new();
        write_lp(&model, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("Maximize"));
        assert!(text.contains("obj: + 3 xN0"));
        assert!(text.contains("entry: + 1 xN0 = 1"));
        assert!(text.contains("flow_in_1: - 1 xN1 + 1 fE0_1 = 0"));
        assert!(text.contains("loop_bound_0: + 4 xN0 - 5 fE0_1 >= 0"));
        assert!(text.contains("General"));
        assert!(text.contains("xN0 xN1 fE0_1"));
        assert!(text.trim_end().ends_with("End"));
    }
}
