use crate::truth_table::{Row, TruthTable, TruthTableError};
use crate::{BitVector, Fault, Signedness};

/// Width of the intermediate result; one more than the datapath so that
/// signed and unsigned operands both fit.
const INTERMEDIATE_WIDTH: usize = 33;

type Operation = fn(i64, i64) -> i64;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn shamt(b: i64) -> u32 {
    (b & 31) as u32
}

const fn and(a: i64, b: i64) -> i64 {
    a & b
}
const fn or(a: i64, b: i64) -> i64 {
    a | b
}
const fn add(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}
const fn xor(a: i64, b: i64) -> i64 {
    a ^ b
}
const fn sll(a: i64, b: i64) -> i64 {
    a.wrapping_shl(shamt(b))
}
const fn srl(a: i64, b: i64) -> i64 {
    a.wrapping_shr(shamt(b))
}
const fn sub(a: i64, b: i64) -> i64 {
    a.wrapping_sub(b)
}
#[allow(clippy::cast_lossless)]
const fn less_than(a: i64, b: i64) -> i64 {
    (a < b) as i64
}
const fn sra(a: i64, b: i64) -> i64 {
    a.wrapping_shr(shamt(b))
}
const fn pass(_: i64, b: i64) -> i64 {
    b
}

#[rustfmt::skip]
const SIGNEDNESS_ROWS: &[Row<'static, Signedness, 1>] = &[
    Row::new(["1000"], Signedness::Unsigned), // sltu
    Row::new(["0101"], Signedness::Unsigned), // srl
    Row::new(["xxxx"], Signedness::Signed),
];
const SIGNEDNESS: TruthTable<'static, Signedness, 1> =
    TruthTable::new("alu.signedness", SIGNEDNESS_ROWS);

// SLT and SLTU share `less_than`; the signedness table decides how the
// operands were extended. SRL and SRA likewise share a shift.
#[rustfmt::skip]
const OPERATION_ROWS: &[Row<'static, Operation, 1>] = &[
    Row::new(["0000"], and as Operation),
    Row::new(["0001"], or as Operation),
    Row::new(["0010"], add as Operation),
    Row::new(["0011"], xor as Operation),
    Row::new(["0100"], sll as Operation),
    Row::new(["0101"], srl as Operation),
    Row::new(["0110"], sub as Operation),
    Row::new(["0111"], less_than as Operation),
    Row::new(["1000"], less_than as Operation),
    Row::new(["1001"], sra as Operation),
    Row::new(["1010"], pass as Operation),
];
const OPERATION: TruthTable<'static, Operation, 1> =
    TruthTable::new("alu.operation", OPERATION_ROWS);

/// ALU outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AluOutputs {
    /// 32-bit result.
    pub result: BitVector,
    /// `result == 0`.
    pub zero: bool,
}

/// Arithmetic/logic unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alu;

impl Alu {
    /// Computes `in1 <op> in2` for the operation selected by `control`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Decode`] for an unassigned control code and
    /// [`Fault::Bits`] if an operand is wider than 32 bits.
    #[allow(clippy::cast_sign_loss)]
    pub fn tick(in1: BitVector, in2: BitVector, control: BitVector) -> Result<AluOutputs, Fault> {
        let signedness = *SIGNEDNESS.lookup([control])?;
        let operation = OPERATION.lookup([control])?;
        let a = in1.extend(INTERMEDIATE_WIDTH, signedness)?.to_i64();
        let b = in2.extend(INTERMEDIATE_WIDTH, signedness)?.to_i64();
        let raw = operation(a, b);
        let result = BitVector::wrapping(raw as u64, INTERMEDIATE_WIDTH)?.slice(0, 32)?;
        Ok(AluOutputs {
            result,
            zero: result.is_zero(),
        })
    }

    /// Checks both ALU tables.
    ///
    /// # Errors
    ///
    /// Returns the first malformed pattern.
    pub fn validate() -> Result<(), TruthTableError> {
        SIGNEDNESS.validate([4])?;
        OPERATION.validate([4])
    }
}
