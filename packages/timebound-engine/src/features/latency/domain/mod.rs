//! Latency model interface.

use crate::errors::Result;
use crate::shared::models::Instr;
use serde::{Deserialize, Serialize};

/// Analysis target selected by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Msp430,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Msp430 => "msp430",
        }
    }
}

/// Cycle cost of a single instruction.
///
/// Implementations are pure tables: no state, no side effects. Metadata
/// pseudo-instructions cost 0; an unknown opcode/mode combination is an
/// error, never a silent 0.
pub trait LatencyModel {
    fn target(&self) -> Target;

    fn latency(&self, instr: &Instr) -> Result<u32>;
}
