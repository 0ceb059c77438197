use crate::truth_table::{Row, TruthTable, TruthTableError};
use crate::{BitVector, Fault};

/// 4-bit ALU operation codes.
pub mod alu_code {
    /// Bitwise and.
    pub const AND: u8 = 0b0000;
    /// Bitwise or.
    pub const OR: u8 = 0b0001;
    /// Wrapping addition.
    pub const ADD: u8 = 0b0010;
    /// Bitwise exclusive or.
    pub const XOR: u8 = 0b0011;
    /// Logical left shift.
    pub const SLL: u8 = 0b0100;
    /// Logical right shift.
    pub const SRL: u8 = 0b0101;
    /// Wrapping subtraction.
    pub const SUB: u8 = 0b0110;
    /// Signed less-than.
    pub const SLT: u8 = 0b0111;
    /// Unsigned less-than.
    pub const SLTU: u8 = 0b1000;
    /// Arithmetic right shift.
    pub const SRA: u8 = 0b1001;
    /// Second operand pass-through.
    pub const LUI: u8 = 0b1010;
}

use alu_code::{ADD, AND, LUI, OR, SLL, SLT, SLTU, SRA, SRL, SUB, XOR};

#[rustfmt::skip]
const ROWS: &[Row<'static, u8, 3>] = &[
    //        aluOp  funct7     funct3
    Row::new(["000", "xxxxxxx", "xxx"], ADD),
    Row::new(["001", "xxxxxxx", "00x"], SUB),  // beq, bne
    Row::new(["001", "xxxxxxx", "10x"], SLT),  // blt, bge
    Row::new(["001", "xxxxxxx", "11x"], SLTU), // bltu, bgeu
    Row::new(["010", "0000000", "000"], ADD),
    Row::new(["010", "0100000", "000"], SUB),
    Row::new(["010", "0000000", "001"], SLL),
    Row::new(["010", "0000000", "010"], SLT),
    Row::new(["010", "0000000", "011"], SLTU),
    Row::new(["010", "0000000", "100"], XOR),
    Row::new(["010", "0000000", "101"], SRL),
    Row::new(["010", "0100000", "101"], SRA),
    Row::new(["010", "0000000", "110"], OR),
    Row::new(["010", "0000000", "111"], AND),
    // I-type funct7 bits belong to the immediate except for shifts.
    Row::new(["011", "xxxxxxx", "000"], ADD),
    Row::new(["011", "0000000", "001"], SLL),
    Row::new(["011", "xxxxxxx", "010"], SLT),
    Row::new(["011", "xxxxxxx", "011"], SLTU),
    Row::new(["011", "xxxxxxx", "100"], XOR),
    Row::new(["011", "0000000", "101"], SRL),
    Row::new(["011", "0100000", "101"], SRA),
    Row::new(["011", "xxxxxxx", "110"], OR),
    Row::new(["011", "xxxxxxx", "111"], AND),
    Row::new(["100", "xxxxxxx", "xxx"], LUI),
];
const TABLE: TruthTable<'static, u8, 3> = TruthTable::new("alu_control", ROWS);

/// Maps `aluOp` and the funct fields to an ALU operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluControl;

impl AluControl {
    /// Selects the 4-bit operation.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Decode`] for combinations with no RV32I operation,
    /// such as an R-type `funct7` outside `0000000`/`0100000`.
    pub fn tick(alu_op: BitVector, funct7: BitVector, funct3: BitVector) -> Result<BitVector, Fault> {
        let code = TABLE.lookup([alu_op, funct7, funct3])?;
        Ok(BitVector::from_u64((*code).into(), 4)?)
    }

    /// Checks the operation table.
    ///
    /// # Errors
    ///
    /// Returns the first malformed pattern.
    pub fn validate() -> Result<(), TruthTableError> {
        TABLE.validate([3, 7, 3])
    }
}
