//! Canonical instruction records produced by the rule pass.

use crate::mnemonic::{InstructionFormat, Mnemonic};
use crate::parser::SourceLocation;

/// Branch or jump destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Byte displacement written as a literal.
    Offset(i64),
    /// Label, resolved to a displacement in pass 2.
    Label(String),
}

/// Operand fields of each encoding format.
///
/// Register operands still hold the names as written; pass 2 resolves them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Operands {
    R { rd: String, rs1: String, rs2: String },
    I { rd: String, rs1: String, imm: i64 },
    Is { rd: String, rs1: String, shamt: i64 },
    S { rs1: String, rs2: String, imm: i64 },
    Sb { rs1: String, rs2: String, target: Target },
    U { rd: String, imm: i64 },
    Uj { rd: String, target: Target },
}

impl Operands {
    /// Format these operands encode with.
    #[must_use]
    pub const fn format(&self) -> InstructionFormat {
        match self {
            Self::R { .. } => InstructionFormat::R,
            Self::I { .. } => InstructionFormat::I,
            Self::Is { .. } => InstructionFormat::Is,
            Self::S { .. } => InstructionFormat::S,
            Self::Sb { .. } => InstructionFormat::Sb,
            Self::U { .. } => InstructionFormat::U,
            Self::Uj { .. } => InstructionFormat::Uj,
        }
    }
}

/// One real instruction, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Real instruction the operands belong to.
    pub mnemonic: &'static Mnemonic,
    /// Operand fields.
    pub operands: Operands,
    /// Location of the source statement this was lowered from.
    pub location: SourceLocation,
}
