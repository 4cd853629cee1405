//! Lowered machine program model.
//!
//! The front-end hands the engine a module of functions, each a list of basic
//! blocks with a textual successor relation. Blocks containing a call must be
//! pre-split so the call is the block's last instruction and the single
//! textual successor is the return continuation.

use serde::{Deserialize, Serialize};

/// Machine register. MSP430 numbering: r0 is the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reg(pub u8);

impl Reg {
    pub const PC: Reg = Reg(0);
    pub const SP: Reg = Reg(1);
    pub const SR: Reg = Reg(2);

    pub fn is_pc(&self) -> bool {
        *self == Reg::PC
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Reg::PC => write!(f, "pc"),
            Reg::SP => write!(f, "sp"),
            Reg::SR => write!(f, "sr"),
            Reg(n) => write!(f, "r{}", n),
        }
    }
}

/// Addressing mode of one operand position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrMode {
    /// Rn
    Register,
    /// x(Rn), EDE, &EDE
    Indexed,
    /// @Rn
    Indirect,
    /// @Rn+
    IndirectAutoInc,
    /// #N
    Immediate,
}

impl AddrMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddrMode::Register => "r",
            AddrMode::Indexed => "m",
            AddrMode::Indirect => "n",
            AddrMode::IndirectAutoInc => "p",
            AddrMode::Immediate => "i",
        }
    }
}

/// Instruction mnemonic.
///
/// Format I mnemonics take a source and a destination mode, Format II a
/// single mode. `Cfi` and `Dbg` cover the front-end's metadata
/// pseudo-instructions and never cost cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mnemonic {
    // Format I (double operand)
    Mov,
    Add,
    Addc,
    Sub,
    Subc,
    Cmp,
    Dadd,
    Bit,
    Bic,
    Bis,
    Xor,
    And,
    // Format II (single operand)
    Rra,
    Rrc,
    Swpb,
    Sxt,
    Push,
    Pop,
    Call,
    // Jumps
    Jmp,
    Jcc,
    // Emulated
    Br,
    Ret,
    Reti,
    Nop,
    // Metadata pseudo-instructions
    Cfi,
    Dbg,
}

impl Mnemonic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mnemonic::Mov => "mov",
            Mnemonic::Add => "add",
            Mnemonic::Addc => "addc",
            Mnemonic::Sub => "sub",
            Mnemonic::Subc => "subc",
            Mnemonic::Cmp => "cmp",
            Mnemonic::Dadd => "dadd",
            Mnemonic::Bit => "bit",
            Mnemonic::Bic => "bic",
            Mnemonic::Bis => "bis",
            Mnemonic::Xor => "xor",
            Mnemonic::And => "and",
            Mnemonic::Rra => "rra",
            Mnemonic::Rrc => "rrc",
            Mnemonic::Swpb => "swpb",
            Mnemonic::Sxt => "sxt",
            Mnemonic::Push => "push",
            Mnemonic::Pop => "pop",
            Mnemonic::Call => "call",
            Mnemonic::Jmp => "jmp",
            Mnemonic::Jcc => "jcc",
            Mnemonic::Br => "br",
            Mnemonic::Ret => "ret",
            Mnemonic::Reti => "reti",
            Mnemonic::Nop => "nop",
            Mnemonic::Cfi => "cfi",
            Mnemonic::Dbg => "dbg",
        }
    }

    /// Format I double-operand instruction?
    pub fn is_format_one(&self) -> bool {
        matches!(
            self,
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
                | Mnemonic::And
        )
    }

    /// Metadata pseudo-instruction (zero cycles)?
    pub fn is_meta(&self) -> bool {
        matches!(self, Mnemonic::Cfi | Mnemonic::Dbg)
    }
}

/// One instruction operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Register(Reg),
    Immediate(i32),
    /// Direct call target resolved by the front-end
    Function(String),
    /// Data symbol or code label
    Symbol(String),
}

/// Source location carried through from debug info.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLoc {
    pub file: String,
    pub line: u32,
}

impl SourceLoc {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// File name without any directory components, the key the loop-bound
    /// table is indexed by.
    pub fn basename(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

/// A machine instruction with its addressing modes and operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instr {
    pub mnemonic: Mnemonic,
    /// Source addressing mode (Format I only)
    pub src: Option<AddrMode>,
    /// Destination / single-operand addressing mode
    pub dst: Option<AddrMode>,
    pub operands: Vec<Operand>,
    pub loc: Option<SourceLoc>,
}

impl Instr {
    pub fn new(mnemonic: Mnemonic) -> Self {
        Self {
            mnemonic,
            src: None,
            dst: None,
            operands: Vec::new(),
            loc: None,
        }
    }

    /// Format I instruction `mnemonic src, dst`.
    pub fn two_op(mnemonic: Mnemonic, src: AddrMode, dst: AddrMode) -> Self {
        Self {
            mnemonic,
            src: Some(src),
            dst: Some(dst),
            operands: Vec::new(),
            loc: None,
        }
    }

    /// Format II instruction `mnemonic op`.
    pub fn one_op(mnemonic: Mnemonic, mode: AddrMode) -> Self {
        Self {
            mnemonic,
            src: None,
            dst: Some(mode),
            operands: Vec::new(),
            loc: None,
        }
    }

    /// Direct call to a known function.
    pub fn call(target: impl Into<String>) -> Self {
        Self {
            mnemonic: Mnemonic::Call,
            src: None,
            dst: Some(AddrMode::Immediate),
            operands: vec![Operand::Function(target.into())],
            loc: None,
        }
    }

    /// Indirect call through a register.
    pub fn call_indirect(reg: Reg) -> Self {
        Self {
            mnemonic: Mnemonic::Call,
            src: None,
            dst: Some(AddrMode::Register),
            operands: vec![Operand::Register(reg)],
            loc: None,
        }
    }

    pub fn with_operands(mut self, operands: Vec<Operand>) -> Self {
        self.operands = operands;
        self
    }

    pub fn with_loc(mut self, loc: SourceLoc) -> Self {
        self.loc = Some(loc);
        self
    }

    pub fn is_call(&self) -> bool {
        self.mnemonic == Mnemonic::Call
    }

    /// Statically known call target, if any.
    pub fn direct_callee(&self) -> Option<&str> {
        if !self.is_call() {
            return None;
        }
        self.operands.iter().find_map(|op| match op {
            Operand::Function(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Does any register operand name the program counter?
    pub fn uses_pc(&self) -> bool {
        self.operands
            .iter()
            .any(|op| matches!(op, Operand::Register(r) if r.is_pc()))
    }
}

impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic.as_str())?;
        if let Some(src) = self.src {
            write!(f, ".{}", src.as_str())?;
        }
        if let Some(dst) = self.dst {
            write!(f, ".{}", dst.as_str())?;
        }
        Ok(())
    }
}

/// Basic block: label, instructions, textual successors, return flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub label: String,
    pub instrs: Vec<Instr>,
    /// Labels of successor blocks within the same function
    pub successors: Vec<String>,
    pub is_return: bool,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            instrs: Vec::new(),
            successors: Vec::new(),
            is_return: false,
        }
    }

    pub fn with_instrs(mut self, instrs: Vec<Instr>) -> Self {
        self.instrs = instrs;
        self
    }

    pub fn with_successors(mut self, successors: Vec<&str>) -> Self {
        self.successors = successors.into_iter().map(str::to_string).collect();
        self
    }

    pub fn returning(mut self) -> Self {
        self.is_return = true;
        self
    }

    /// The terminating call instruction, if this is a pre-split call block.
    pub fn tail_call(&self) -> Option<&Instr> {
        self.instrs.last().filter(|i| i.is_call())
    }

    /// A call anywhere before the last instruction means the front-end did
    /// not split this block.
    pub fn has_interior_call(&self) -> bool {
        let len = self.instrs.len();
        len > 1 && self.instrs[..len - 1].iter().any(Instr::is_call)
    }
}

/// One lowered function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Blocks in layout order; the first block is the function entry.
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<String>, blocks: Vec<BasicBlock>) -> Self {
        Self {
            name: name.into(),
            blocks,
        }
    }

    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }

    pub fn return_blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter().filter(|b| b.is_return)
    }
}

/// The whole lowered module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new(functions: Vec<Function>) -> Self {
        Self { functions }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Direct call edges `(caller, callee)` over the whole module.
    pub fn call_edges(&self) -> Vec<(&str, &str)> {
        let mut edges = Vec::new();
        for func in &self.functions {
            for block in &func.blocks {
                for instr in &block.instrs {
                    if let Some(callee) = instr.direct_callee() {
                        edges.push((func.name.as_str(), callee));
                    }
                }
            }
        }
        edges
    }
}
