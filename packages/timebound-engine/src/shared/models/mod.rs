//! Common data models: the lowered program handed over by the front-end and
//! the loop-info oracle that accompanies it.

pub mod loops;
pub mod program;

pub use loops::{FunctionLoops, ModuleLoops, NaturalLoop};
pub use program::{
    AddrMode, BasicBlock, Function, Instr, Mnemonic, Operand, Program, Reg, SourceLoc,
};
