use crate::{BitVector, Fault, Signedness};

/// 32-bit two's-complement adder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adder;

impl Adder {
    /// `(in1 + in2) mod 2^32`, summed at 33 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Bits`] if an input is wider than 32 bits.
    pub fn tick(in1: BitVector, in2: BitVector) -> Result<BitVector, Fault> {
        let a = in1.extend(33, Signedness::Signed)?.to_u64();
        let b = in2.extend(33, Signedness::Signed)?.to_u64();
        Ok(BitVector::wrapping(a.wrapping_add(b), 33)?.slice(0, 32)?)
    }
}

/// Jump/branch target adder; the result is always halfword aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchAdder;

impl BranchAdder {
    /// `in1 + in2` with bit 0 cleared.
    ///
    /// # Errors
    ///
    /// See [`Adder::tick`].
    pub fn tick(in1: BitVector, in2: BitVector) -> Result<BitVector, Fault> {
        let sum = Adder::tick(in1, in2)?;
        Ok(BitVector::join(&[sum.slice(1, 32)?, BitVector::zero(1)?])?)
    }
}

/// `pc + immediate` for `auipc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuipcAdder;

impl AuipcAdder {
    /// `pc + immediate`.
    ///
    /// # Errors
    ///
    /// See [`Adder::tick`].
    pub fn tick(pc: BitVector, immediate: BitVector) -> Result<BitVector, Fault> {
        Adder::tick(pc, immediate)
    }
}
