//! Analysis interface used by the fixpoint solver.

use crate::errors::Result;
use crate::features::analysis::domain::Lattice;
use crate::shared::models::Instr;

/// The static analysis logic: initial state, per-instruction transfer and the
/// merge operator. The solver propagates states through the graph without
/// knowing the underlying domain.
pub trait AbstractAnalysis {
    type State: Lattice;

    /// State at the program entry.
    fn initial(&self) -> Self::State;

    /// Effect of one instruction: the successor state and the instruction's
    /// cycle contribution.
    fn transfer(&self, state: &Self::State, instr: &Instr) -> Result<(Self::State, u32)>;

    /// Merge at control-flow joins. Defaults to the lattice join.
    fn join(&self, a: &Self::State, b: &Self::State) -> Self::State {
        let mut merged = a.clone();
        merged.join(b);
        merged
    }
}
