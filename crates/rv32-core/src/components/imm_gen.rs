use crate::truth_table::{Row, TruthTable, TruthTableError};
use crate::{BitError, BitVector, Fault, Signedness};

/// Pulls a format's immediate bits out of an instruction, before sign
/// extension.
pub type Extractor = fn(BitVector) -> Result<BitVector, BitError>;

fn none(_: BitVector) -> Result<BitVector, BitError> {
    BitVector::zero(32)
}

fn i_type(instruction: BitVector) -> Result<BitVector, BitError> {
    instruction.slice(20, 32)
}

fn s_type(instruction: BitVector) -> Result<BitVector, BitError> {
    BitVector::join(&[instruction.slice(25, 32)?, instruction.slice(7, 12)?])
}

fn sb_type(instruction: BitVector) -> Result<BitVector, BitError> {
    BitVector::join(&[
        instruction.slice(31, 32)?,
        instruction.slice(7, 8)?,
        instruction.slice(25, 31)?,
        instruction.slice(8, 12)?,
        BitVector::zero(1)?,
    ])
}

fn u_type(instruction: BitVector) -> Result<BitVector, BitError> {
    BitVector::join(&[instruction.slice(12, 32)?, BitVector::zero(12)?])
}

fn uj_type(instruction: BitVector) -> Result<BitVector, BitError> {
    BitVector::join(&[
        instruction.slice(31, 32)?,
        instruction.slice(12, 20)?,
        instruction.slice(20, 21)?,
        instruction.slice(21, 31)?,
        BitVector::zero(1)?,
    ])
}

const ROWS: &[Row<'static, Extractor, 1>] = &[
    Row::new(["0110011"], none as Extractor),
    Row::new(["0010011"], i_type as Extractor),
    Row::new(["0000011"], i_type as Extractor),
    Row::new(["1100111"], i_type as Extractor),
    Row::new(["1110011"], i_type as Extractor),
    Row::new(["0100011"], s_type as Extractor),
    Row::new(["1100011"], sb_type as Extractor),
    Row::new(["0110111"], u_type as Extractor),
    Row::new(["0010111"], u_type as Extractor),
    Row::new(["1101111"], uj_type as Extractor),
];
const TABLE: TruthTable<'static, Extractor, 1> = TruthTable::new("imm_gen", ROWS);

/// Immediate generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmGen;

impl ImmGen {
    /// Produces the sign-extended 32-bit immediate of `instruction`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Decode`] for an opcode with no immediate format.
    pub fn tick(instruction: BitVector) -> Result<BitVector, Fault> {
        let extract = TABLE.lookup([instruction.slice(0, 7)?])?;
        Ok(extract(instruction)?.extend(32, Signedness::Signed)?)
    }

    /// Checks the format table.
    ///
    /// # Errors
    ///
    /// Returns the first malformed pattern.
    pub fn validate() -> Result<(), TruthTableError> {
        TABLE.validate([7])
    }
}
