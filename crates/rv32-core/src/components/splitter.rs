use crate::{BitVector, Fault};

/// Fixed-position fields of a 32-bit instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionFields {
    /// Bits `6..0`.
    pub opcode: BitVector,
    /// Bits `11..7`.
    pub rd: BitVector,
    /// Bits `14..12`.
    pub funct3: BitVector,
    /// Bits `19..15`.
    pub rs1: BitVector,
    /// Bits `24..20`.
    pub rs2: BitVector,
    /// Bits `31..25`.
    pub funct7: BitVector,
}

/// Slices an instruction word into its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionSplitter;

impl InstructionSplitter {
    /// Splits `instruction`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Bits`] if `instruction` is narrower than 32 bits.
    pub fn tick(instruction: BitVector) -> Result<InstructionFields, Fault> {
        Ok(InstructionFields {
            opcode: instruction.slice(0, 7)?,
            rd: instruction.slice(7, 12)?,
            funct3: instruction.slice(12, 15)?,
            rs1: instruction.slice(15, 20)?,
            rs2: instruction.slice(20, 25)?,
            funct7: instruction.slice(25, 32)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::InstructionSplitter;
    use crate::BitVector;

    #[test]
    fn fields_come_from_their_fixed_offsets() {
        // sub x3, x1, x2
        let fields = InstructionSplitter::tick(BitVector::from_u32(0x4020_81B3)).unwrap();
        assert_eq!(fields.opcode.to_u64(), 0b011_0011);
        assert_eq!(fields.rd.to_u64(), 3);
        assert_eq!(fields.funct3.to_u64(), 0);
        assert_eq!(fields.rs1.to_u64(), 1);
        assert_eq!(fields.rs2.to_u64(), 2);
        assert_eq!(fields.funct7.to_u64(), 0b010_0000);
        assert_eq!(fields.rd.width(), 5);
    }
}
