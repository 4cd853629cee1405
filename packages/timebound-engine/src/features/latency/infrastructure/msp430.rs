//! MSP430X CPU cycle table.
//!
//! Cycle counts follow the MSP430FR family user's guide (SLAU445I, tables in
//! section 4.5.1.5): Format I cost is a function of source and destination
//! addressing mode, with MOV/BIT/CMP one cycle cheaper for memory
//! destinations and an extra cycle when the program counter is the
//! destination of a register-form instruction. The CPU has no pipeline; every
//! latency is fixed and branch cost does not depend on the outcome.

use crate::errors::{EngineError, Result};
use crate::features::latency::domain::{LatencyModel, Target};
use crate::shared::models::{AddrMode, Instr, Mnemonic};

/// Latency table for the MSP430X core.
#[derive(Debug, Default, Clone, Copy)]
pub struct Msp430Latency;

impl Msp430Latency {
    pub fn new() -> Self {
        Self
    }

    fn format_one(&self, instr: &Instr) -> Result<u32> {
        let (src, dst) = match (instr.src, instr.dst) {
            (Some(src), Some(dst)) => (src, dst),
            _ => return Err(unknown(instr)),
        };
        // MOV, BIT and CMP execute in one fewer cycle for memory destinations.
        let discounted = matches!(
            instr.mnemonic,
            Mnemonic::Mov | Mnemonic::Bit | Mnemonic::Cmp
        );
        let cycles = match (src, dst) {
            (AddrMode::Immediate, AddrMode::Register) => {
                if instr.uses_pc() {
                    3
                } else {
                    2
                }
            }
            (AddrMode::Indexed, AddrMode::Register) => 3,
            (AddrMode::Indirect, AddrMode::Register) => 2,
            (AddrMode::IndirectAutoInc, AddrMode::Register) => {
                if instr.uses_pc() {
                    3
                } else {
                    2
                }
            }
            (AddrMode::Register, AddrMode::Register) => {
                if instr.uses_pc() {
                    2
                } else {
                    1
                }
            }
            (AddrMode::Immediate, AddrMode::Indexed) => 5 - u32::from(discounted),
            (AddrMode::Indexed, AddrMode::Indexed) => 6 - u32::from(discounted),
            (AddrMode::Indirect, AddrMode::Indexed) => 5 - u32::from(discounted),
            (AddrMode::IndirectAutoInc, AddrMode::Indexed) => 5 - u32::from(discounted),
            (AddrMode::Register, AddrMode::Indexed) => 4 - u32::from(discounted),
            // Indirect and auto-increment modes cannot be destinations.
            _ => return Err(unknown(instr)),
        };
        Ok(cycles)
    }

    fn format_two(&self, instr: &Instr) -> Result<u32> {
        let mode = instr.dst.ok_or_else(|| unknown(instr))?;
        let cycles = match (instr.mnemonic, mode) {
            (Mnemonic::Rra | Mnemonic::Rrc | Mnemonic::Swpb | Mnemonic::Sxt, AddrMode::Indexed) => {
                4
            }
            (
                Mnemonic::Rra | Mnemonic::Rrc | Mnemonic::Swpb | Mnemonic::Sxt,
                AddrMode::Indirect | AddrMode::IndirectAutoInc,
            ) => 3,
            (
                Mnemonic::Rra | Mnemonic::Rrc | Mnemonic::Swpb | Mnemonic::Sxt,
                AddrMode::Register,
            ) => 1,
            (Mnemonic::Push, AddrMode::Register | AddrMode::Immediate) => 3,
            (Mnemonic::Pop, AddrMode::Register) => 3,
            (Mnemonic::Call, AddrMode::Indexed) => 5,
            (
                Mnemonic::Call,
                AddrMode::Register
                | AddrMode::Immediate
                | AddrMode::Indirect
                | AddrMode::IndirectAutoInc,
            ) => 4,
            _ => return Err(unknown(instr)),
        };
        Ok(cycles)
    }

    /// Emulated branch: `mov src, pc`.
    fn branch(&self, instr: &Instr) -> Result<u32> {
        let mode = instr.src.or(instr.dst).ok_or_else(|| unknown(instr))?;
        let cycles = match mode {
            AddrMode::Register => 2,
            AddrMode::Indirect => 2,
            AddrMode::Immediate | AddrMode::Indexed | AddrMode::IndirectAutoInc => 3,
        };
        Ok(cycles)
    }
}

fn unknown(instr: &Instr) -> EngineError {
    EngineError::UnknownLatency(instr.to_string())
}

impl LatencyModel for Msp430Latency {
    fn target(&self) -> Target {
        Target::Msp430
    }

    fn latency(&self, instr: &Instr) -> Result<u32> {
        match instr.mnemonic {
            Mnemonic::Mov
            | Mnemonic::Add
            | Mnemonic::Addc
            | Mnemonic::Sub
            | Mnemonic::Subc
            | Mnemonic::Cmp
            | Mnemonic::Dadd
            | Mnemonic::Bit
            | Mnemonic::Bic
            | Mnemonic::Bis
            | Mnemonic::Xor
            | Mnemonic::And => self.format_one(instr),
            Mnemonic::Rra
            | Mnemonic::Rrc
            | Mnemonic::Swpb
            | Mnemonic::Sxt
            | Mnemonic::Push
            | Mnemonic::Pop
            | Mnemonic::Call => self.format_two(instr),
            // All jumps take one code word and two cycles, taken or not.
            Mnemonic::Jmp | Mnemonic::Jcc => Ok(2),
            Mnemonic::Br => self.branch(instr),
            Mnemonic::Ret => Ok(4),
            Mnemonic::Reti => Ok(5),
            // Emulated as mov r3, r3
            Mnemonic::Nop => Ok(1),
            Mnemonic::Cfi | Mnemonic::Dbg => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Operand, Reg};

    fn lat(instr: Instr) -> u32 {
        Msp430Latency::new().latency(&instr).unwrap()
    }

    #[test]
    fn test_register_register_forms() {
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Add,
                AddrMode::Register,
                AddrMode::Register
            )),
            1
        );
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Mov,
                AddrMode::Immediate,
                AddrMode::Register
            )),
            2
        );
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Xor,
                AddrMode::Indexed,
                AddrMode::Register
            )),
            3
        );
    }

    #[test]
    fn test_pc_destination_costs_extra() {
        let plain = Instr::two_op(Mnemonic::Add, AddrMode::Register, AddrMode::Register)
            .with_operands(vec![Operand::Register(Reg(4)), Operand::Register(Reg(5))]);
        let to_pc = Instr::two_op(Mnemonic::Add, AddrMode::Register, AddrMode::Register)
            .with_operands(vec![Operand::Register(Reg(4)), Operand::Register(Reg::PC)]);
        assert_eq!(lat(plain), 1);
        assert_eq!(lat(to_pc), 2);

        let imm_to_pc = Instr::two_op(Mnemonic::Mov, AddrMode::Immediate, AddrMode::Register)
            .with_operands(vec![Operand::Immediate(0x4400), Operand::Register(Reg::PC)]);
        assert_eq!(lat(imm_to_pc), 3);
    }

    #[test]
    fn test_memory_destination_discount() {
        // add #n, x(r4) = 5; mov/bit/cmp are one cheaper
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Add,
                AddrMode::Immediate,
                AddrMode::Indexed
            )),
            5
        );
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Mov,
                AddrMode::Immediate,
                AddrMode::Indexed
            )),
            4
        );
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Sub,
                AddrMode::Indexed,
                AddrMode::Indexed
            )),
            6
        );
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Cmp,
                AddrMode::Indexed,
                AddrMode::Indexed
            )),
            5
        );
        assert_eq!(
            lat(Instr::two_op(
                Mnemonic::Bit,
                AddrMode::Register,
                AddrMode::Indexed
            )),
            3
        );
    }

    #[test]
    fn test_format_two() {
        assert_eq!(lat(Instr::one_op(Mnemonic::Rra, AddrMode::Register)), 1);
        assert_eq!(lat(Instr::one_op(Mnemonic::Rrc, AddrMode::Indirect)), 3);
        assert_eq!(lat(Instr::one_op(Mnemonic::Swpb, AddrMode::Indexed)), 4);
        assert_eq!(lat(Instr::one_op(Mnemonic::Push, AddrMode::Register)), 3);
        assert_eq!(lat(Instr::one_op(Mnemonic::Pop, AddrMode::Register)), 3);
        assert_eq!(lat(Instr::one_op(Mnemonic::Call, AddrMode::Indexed)), 5);
        assert_eq!(lat(Instr::call("f")), 4);
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(lat(Instr::new(Mnemonic::Jmp)), 2);
        assert_eq!(lat(Instr::new(Mnemonic::Jcc)), 2);
        assert_eq!(lat(Instr::new(Mnemonic::Ret)), 4);
        assert_eq!(lat(Instr::new(Mnemonic::Reti)), 5);
    }

    #[test]
    fn test_metadata_is_free() {
        assert_eq!(lat(Instr::new(Mnemonic::Cfi)), 0);
        assert_eq!(lat(Instr::new(Mnemonic::Dbg)), 0);
    }

    #[test]
    fn test_invalid_combination_is_fatal() {
        // pop with a memory operand does not exist
        let err = Msp430Latency::new()
            .latency(&Instr::one_op(Mnemonic::Pop, AddrMode::Indexed))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownLatency(_)));

        // indirect mode is never a Format I destination
        let err = Msp430Latency::new()
            .latency(&Instr::two_op(
                Mnemonic::Add,
                AddrMode::Register,
                AddrMode::Indirect,
            ))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownLatency(_)));
    }
}
