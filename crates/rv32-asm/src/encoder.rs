//! Instruction encoding (pass 2).
//!
//! Label targets become PC-relative byte displacements, register names become
//! 5-bit numbers, and the fields of each format are joined MSB-first in the
//! order the ISA manual draws them.

use rv32_core::{register_number, BitError, BitVector, Signedness};

use crate::instruction::{Instruction, Operands, Target};
use crate::mnemonic::Mnemonic;
use crate::parser::SourceLocation;
use crate::symbols::SymbolTable;

/// Error during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    /// Kind of error.
    pub kind: EncodeErrorKind,
    /// Location of the statement being encoded.
    pub location: SourceLocation,
}

/// Classification of encoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Name that is neither `x0`..`x31` nor an ABI register name.
    UnknownRegister(String),
    /// Undefined label reference.
    UnknownLabel(String),
    /// Immediate does not fit its field.
    ImmediateOutOfRange {
        /// Value after label resolution.
        value: i64,
        /// Field width in bits.
        bits: usize,
    },
    /// Literal branch or jump offset with bit 0 set.
    MisalignedOffset(i64),
    /// Field packing failed.
    Bits(BitError),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRegister(name) => write!(f, "unknown register: {name}"),
            Self::UnknownLabel(name) => write!(f, "unknown label: {name}"),
            Self::ImmediateOutOfRange { value, bits } => {
                write!(f, "immediate {value} does not fit in {bits} bits")
            }
            Self::MisalignedOffset(value) => {
                write!(f, "offset {value} is not a multiple of 2")
            }
            Self::Bits(e) => write!(f, "invalid encoding: {e}"),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<BitError> for EncodeErrorKind {
    fn from(e: BitError) -> Self {
        Self::Bits(e)
    }
}

/// Immediate field widths, in bits.
mod width {
    pub const I: usize = 12;
    pub const SHAMT: usize = 5;
    pub const S: usize = 12;
    pub const SB: usize = 13;
    pub const U: usize = 20;
    pub const UJ: usize = 21;
}

fn fixed(value: u32, bits: usize) -> Result<BitVector, BitError> {
    BitVector::wrapping(u64::from(value), bits)
}

fn register(name: &str) -> Result<BitVector, EncodeErrorKind> {
    let number =
        register_number(name).ok_or_else(|| EncodeErrorKind::UnknownRegister(name.to_owned()))?;
    Ok(fixed(u32::from(number), 5)?)
}

fn immediate(value: i64, bits: usize, signedness: Signedness) -> Result<BitVector, EncodeErrorKind> {
    BitVector::from_int(i128::from(value), bits, signedness)
        .map_err(|_| EncodeErrorKind::ImmediateOutOfRange { value, bits })
}

/// Upper immediates accept both the signed and the unsigned 20-bit range.
fn upper(value: i64) -> Result<BitVector, EncodeErrorKind> {
    let signedness = if value < 0 {
        Signedness::Signed
    } else {
        Signedness::Unsigned
    };
    immediate(value, width::U, signedness)
}

/// `(label_index - current_index) * 4`, or a literal offset, which must be
/// even.
fn displacement(
    target: &Target,
    index: usize,
    symbols: &SymbolTable,
    bits: usize,
) -> Result<i64, EncodeErrorKind> {
    let label = match target {
        Target::Offset(offset) if offset % 2 != 0 => {
            return Err(EncodeErrorKind::MisalignedOffset(*offset))
        }
        Target::Offset(offset) => return Ok(*offset),
        Target::Label(name) => symbols
            .get(name)
            .ok_or_else(|| EncodeErrorKind::UnknownLabel(name.clone()))?
            .index,
    };
    let overflow = EncodeErrorKind::ImmediateOutOfRange {
        value: i64::MAX,
        bits,
    };
    let (Ok(label), Ok(index)) = (i64::try_from(label), i64::try_from(index)) else {
        return Err(overflow);
    };
    label
        .checked_sub(index)
        .and_then(|delta| delta.checked_mul(4))
        .ok_or(overflow)
}

#[allow(clippy::similar_names)]
fn pack(
    mnemonic: &Mnemonic,
    operands: &Operands,
    index: usize,
    symbols: &SymbolTable,
) -> Result<u32, EncodeErrorKind> {
    let opcode = fixed(mnemonic.opcode, 7)?;
    let funct3 = fixed(mnemonic.funct3, 3)?;
    let funct7 = fixed(mnemonic.funct7, 7)?;

    let fields = match operands {
        Operands::R { rd, rs1, rs2 } => {
            vec![funct7, register(rs2)?, register(rs1)?, funct3, register(rd)?, opcode]
        }
        Operands::I { rd, rs1, imm } => vec![
            immediate(*imm, width::I, Signedness::Signed)?,
            register(rs1)?,
            funct3,
            register(rd)?,
            opcode,
        ],
        Operands::Is { rd, rs1, shamt } => vec![
            funct7,
            immediate(*shamt, width::SHAMT, Signedness::Unsigned)?,
            register(rs1)?,
            funct3,
            register(rd)?,
            opcode,
        ],
        Operands::S { rs1, rs2, imm } => {
            let imm = immediate(*imm, width::S, Signedness::Signed)?;
            vec![
                imm.slice(5, 12)?,
                register(rs2)?,
                register(rs1)?,
                funct3,
                imm.slice(0, 5)?,
                opcode,
            ]
        }
        Operands::Sb { rs1, rs2, target } => {
            let offset = displacement(target, index, symbols, width::SB)?;
            let imm = immediate(offset, width::SB, Signedness::Signed)?;
            vec![
                imm.slice(12, 13)?,
                imm.slice(5, 11)?,
                register(rs2)?,
                register(rs1)?,
                funct3,
                imm.slice(1, 5)?,
                imm.slice(11, 12)?,
                opcode,
            ]
        }
        Operands::U { rd, imm } => vec![upper(*imm)?, register(rd)?, opcode],
        Operands::Uj { rd, target } => {
            let offset = displacement(target, index, symbols, width::UJ)?;
            let imm = immediate(offset, width::UJ, Signedness::Signed)?;
            vec![
                imm.slice(20, 21)?,
                imm.slice(1, 11)?,
                imm.slice(11, 12)?,
                imm.slice(12, 20)?,
                register(rd)?,
                opcode,
            ]
        }
    };

    Ok(BitVector::join(&fields)?.to_u32()?)
}

/// Encodes the instruction at position `index` of the program.
///
/// # Errors
///
/// Returns an `EncodeError` for an unknown register or label, an immediate
/// outside its field width, or an odd literal branch or jump offset.
pub fn encode(
    instruction: &Instruction,
    index: usize,
    symbols: &SymbolTable,
) -> Result<u32, EncodeError> {
    pack(instruction.mnemonic, &instruction.operands, index, symbols).map_err(|kind| EncodeError {
        kind,
        location: instruction.location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{assign, Symbol};
    use crate::parser::parse_program;
    use rstest::rstest;

    fn encode_source(source: &str) -> Result<Vec<u32>, EncodeError> {
        let assignment = assign(&parse_program(source).unwrap()).unwrap();
        assignment
            .instructions
            .iter()
            .enumerate()
            .map(|(index, instruction)| encode(instruction, index, &assignment.symbols))
            .collect()
    }

    fn word(source: &str) -> u32 {
        encode_source(source).unwrap()[0]
    }

    fn kind(source: &str) -> EncodeErrorKind {
        encode_source(source).unwrap_err().kind
    }

    #[rstest]
    #[case::r_type("add x0, x1, x2", 0x0020_8033)]
    #[case::r_sub("sub a0, a1, a2", 0x40C5_8533)]
    #[case::i_negative("addi t0, t0, -1", 0xFFF2_8293)]
    #[case::i_shift("srai a0, t0, 2", 0x4022_D513)]
    #[case::shift_max("slli a0, a0, 31", 0x01F5_1513)]
    #[case::load("lw a0, 8(sp)", 0x0081_2503)]
    #[case::load_byte("lb a0, 0(zero)", 0x0000_0503)]
    #[case::store("sw a0, 0(sp)", 0x00A1_2023)]
    #[case::store_negative("sw ra, -4(sp)", 0xFE11_2E23)]
    #[case::lui("lui a0, 0x12345", 0x1234_5537)]
    #[case::lui_negative("lui a0, -1", 0xFFFF_F537)]
    #[case::auipc("auipc a1, 1", 0x0000_1597)]
    #[case::jalr("jalr zero, 0(ra)", 0x0000_8067)]
    #[case::ret("ret", 0x0000_8067)]
    #[case::ecall("ecall", 0x0000_0073)]
    #[case::ebreak("ebreak", 0x0010_0073)]
    #[case::nop("nop", 0x0000_0013)]
    #[case::branch_offset("bne t0, zero, -8", 0xFE02_9CE3)]
    #[case::jal_offset("jal ra, 12", 0x00C0_00EF)]
    fn encodes_canonical_words(#[case] source: &str, #[case] expected: u32) {
        assert_eq!(word(source), expected, "{source}");
    }

    #[test]
    fn forward_branch_to_next_instruction() {
        assert_eq!(encode_source("beq x11, x12, next\nnext:"), Ok(vec![0x00C5_8263]));
    }

    #[test]
    fn backward_jump_to_own_line() {
        assert_eq!(encode_source("prev:\nj prev"), Ok(vec![0x0000_006F]));
    }

    #[test]
    fn backward_branch_has_negative_offset() {
        let words = encode_source("loop:\n  addi t0, t0, -1\n  bne t0, zero, loop").unwrap();
        assert_eq!(words[1], 0xFE02_9EE3);
    }

    #[test]
    fn label_table_drives_displacement() {
        let mut symbols = SymbolTable::new();
        symbols.insert(
            "far".into(),
            Symbol {
                index: 10,
                defined_at: 1,
            },
        );
        let target = Target::Label("far".into());
        assert_eq!(displacement(&target, 2, &symbols, 13), Ok(32));
        assert_eq!(displacement(&target, 12, &symbols, 13), Ok(-8));
    }

    #[rstest]
    #[case("addi a0, a0, 2048", 2048, 12)]
    #[case("addi a0, a0, -2049", -2049, 12)]
    #[case("slli a0, a0, 32", 32, 5)]
    #[case("sw a0, 4096(sp)", 4096, 12)]
    #[case("beq a0, a1, 4096", 4096, 13)]
    #[case("lui a0, 0x100000", 0x10_0000, 20)]
    #[case("lui a0, -524289", -524_289, 20)]
    #[case("jal zero, 1048576", 1_048_576, 21)]
    fn immediates_out_of_range_name_the_width(
        #[case] source: &str,
        #[case] value: i64,
        #[case] bits: usize,
    ) {
        assert_eq!(
            kind(source),
            EncodeErrorKind::ImmediateOutOfRange { value, bits }
        );
    }

    #[rstest]
    #[case("beq a0, a1, 3", 3)]
    #[case("bne a0, zero, -7", -7)]
    #[case("jal ra, 1", 1)]
    #[case("j -2047", -2047)]
    fn odd_literal_offsets_are_rejected(#[case] source: &str, #[case] value: i64) {
        assert_eq!(kind(source), EncodeErrorKind::MisalignedOffset(value));
    }

    #[test]
    fn even_offsets_need_not_be_word_aligned() {
        assert_eq!(word("jal zero, 2"), 0x0020_006F);
    }

    #[test]
    fn li_wider_than_32_bits_is_rejected() {
        assert_eq!(
            kind("li a0, 0x100000000"),
            EncodeErrorKind::ImmediateOutOfRange {
                value: 0x10_0000,
                bits: 20
            }
        );
    }

    #[test]
    fn unknown_register() {
        let err = encode_source("nop\nadd a0, a1, x32").unwrap_err();
        assert_eq!(err.kind, EncodeErrorKind::UnknownRegister("x32".into()));
        assert_eq!(err.location.line, 2);
        assert_eq!(err.to_string(), "unknown register: x32");
    }

    #[test]
    fn unknown_label() {
        assert_eq!(
            kind("j nowhere"),
            EncodeErrorKind::UnknownLabel("nowhere".into())
        );
    }
}
