use crate::truth_table::{Row, TruthTable, TruthTableError};
use crate::{BitVector, Fault};

/// `writeSrc` mux selections.
pub mod write_src {
    /// ALU result.
    pub const ALU: u8 = 0b00;
    /// Data-memory read.
    pub const MEM: u8 = 0b01;
    /// Return address.
    pub const PC_PLUS_4: u8 = 0b10;
    /// `pc + imm`.
    pub const AUIPC: u8 = 0b11;
}

/// `aluOp` classes handed to ALU control.
pub mod alu_op {
    /// Address and link arithmetic.
    pub const ADD: u8 = 0b000;
    /// Branch comparison.
    pub const BRANCH: u8 = 0b001;
    /// Register-register, decoded from funct7/funct3.
    pub const R_TYPE: u8 = 0b010;
    /// Register-immediate, decoded from funct7/funct3.
    pub const I_TYPE: u8 = 0b011;
    /// Immediate pass-through.
    pub const LUI: u8 = 0b100;
}

/// `ecall` signal values.
pub mod ecall_kind {
    /// Ordinary instruction.
    pub const NONE: u8 = 0b00;
    /// `ecall`.
    pub const ECALL: u8 = 0b01;
    /// `ebreak`.
    pub const EBREAK: u8 = 0b10;
}

/// Every control line driven by the decoder for one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct ControlSignals {
    /// Second ALU operand is the immediate.
    pub alu_src: bool,
    /// Register write-back source (2 bits, see [`write_src`]).
    pub write_src: BitVector,
    /// Register file write enable.
    pub reg_write: bool,
    /// Data memory read enable.
    pub mem_read: bool,
    /// Data memory write enable.
    pub mem_write: bool,
    /// Branch when the ALU result is zero.
    pub branch_zero: bool,
    /// Branch when the ALU result is non-zero.
    pub branch_not_zero: bool,
    /// Unconditional jump.
    pub jump: bool,
    /// Jump target base is `rs1` instead of the PC.
    pub jalr: bool,
    /// ALU operation class (3 bits, see [`alu_op`]).
    pub alu_op: BitVector,
    /// Access size: `00` byte, `01` half, `10` word.
    pub mem_size: BitVector,
    /// Sign-extend loaded values.
    pub mem_signed: bool,
    /// System call kind (2 bits, see [`ecall_kind`]).
    pub ecall: BitVector,
}

#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)]
struct MainDecode {
    alu_src: bool,
    write_src: u8,
    reg_write: bool,
    mem_read: bool,
    mem_write: bool,
    alu_op: u8,
}

const fn lines(
    alu_src: bool,
    write_src: u8,
    reg_write: bool,
    mem_read: bool,
    mem_write: bool,
    alu_op: u8,
) -> MainDecode {
    MainDecode {
        alu_src,
        write_src,
        reg_write,
        mem_read,
        mem_write,
        alu_op,
    }
}

#[rustfmt::skip]
const MAIN_ROWS: &[Row<'static, MainDecode, 1>] = &[
    //        opcode         alu_src  write_src             reg_w  mem_r  mem_w  alu_op
    Row::new(["0110011"], lines(false, write_src::ALU,       true,  false, false, alu_op::R_TYPE)),
    Row::new(["0010011"], lines(true,  write_src::ALU,       true,  false, false, alu_op::I_TYPE)),
    Row::new(["0000011"], lines(true,  write_src::MEM,       true,  true,  false, alu_op::ADD)),
    Row::new(["0100011"], lines(true,  write_src::ALU,       false, false, true,  alu_op::ADD)),
    Row::new(["1100011"], lines(false, write_src::ALU,       false, false, false, alu_op::BRANCH)),
    Row::new(["1101111"], lines(false, write_src::PC_PLUS_4, true,  false, false, alu_op::ADD)),
    Row::new(["1100111"], lines(true,  write_src::PC_PLUS_4, true,  false, false, alu_op::ADD)),
    Row::new(["0110111"], lines(true,  write_src::ALU,       true,  false, false, alu_op::LUI)),
    Row::new(["0010111"], lines(true,  write_src::AUIPC,     true,  false, false, alu_op::ADD)),
    Row::new(["1110011"], lines(false, write_src::ALU,       false, false, false, alu_op::ADD)),
];
const MAIN: TruthTable<'static, MainDecode, 1> = TruthTable::new("control.main", MAIN_ROWS);

#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)]
struct BranchDecode {
    branch_zero: bool,
    branch_not_zero: bool,
    jump: bool,
    jalr: bool,
}

const fn branch(branch_zero: bool, branch_not_zero: bool, jump: bool, jalr: bool) -> BranchDecode {
    BranchDecode {
        branch_zero,
        branch_not_zero,
        jump,
        jalr,
    }
}

const SEQUENTIAL: BranchDecode = branch(false, false, false, false);

#[rustfmt::skip]
const BRANCH_ROWS: &[Row<'static, BranchDecode, 2>] = &[
    //        opcode     funct3        bz     bnz    jump   jalr
    Row::new(["1100011", "000"], branch(true,  false, false, false)), // beq
    Row::new(["1100011", "001"], branch(false, true,  false, false)), // bne
    Row::new(["1100011", "100"], branch(false, true,  false, false)), // blt
    Row::new(["1100011", "101"], branch(true,  false, false, false)), // bge
    Row::new(["1100011", "110"], branch(false, true,  false, false)), // bltu
    Row::new(["1100011", "111"], branch(true,  false, false, false)), // bgeu
    Row::new(["1101111", "xxx"], branch(false, false, true,  false)), // jal
    Row::new(["1100111", "000"], branch(false, false, true,  true)),  // jalr
    Row::new(["0110011", "xxx"], SEQUENTIAL),
    Row::new(["0010011", "xxx"], SEQUENTIAL),
    Row::new(["0000011", "xxx"], SEQUENTIAL),
    Row::new(["0100011", "xxx"], SEQUENTIAL),
    Row::new(["0110111", "xxx"], SEQUENTIAL),
    Row::new(["0010111", "xxx"], SEQUENTIAL),
    Row::new(["1110011", "000"], SEQUENTIAL),
];
const BRANCH: TruthTable<'static, BranchDecode, 2> = TruthTable::new("control.branch", BRANCH_ROWS);

#[derive(Debug, Clone, Copy)]
struct AccessDecode {
    size: u8,
    signed: bool,
}

const fn access(size: u8, signed: bool) -> AccessDecode {
    AccessDecode { size, signed }
}

const WORD: AccessDecode = access(0b10, false);

#[rustfmt::skip]
const ACCESS_ROWS: &[Row<'static, AccessDecode, 2>] = &[
    //        opcode     funct3
    Row::new(["0000011", "000"], access(0b00, true)),  // lb
    Row::new(["0000011", "001"], access(0b01, true)),  // lh
    Row::new(["0000011", "010"], access(0b10, true)),  // lw
    Row::new(["0000011", "100"], access(0b00, false)), // lbu
    Row::new(["0000011", "101"], access(0b01, false)), // lhu
    Row::new(["0100011", "000"], access(0b00, false)), // sb
    Row::new(["0100011", "001"], access(0b01, false)), // sh
    Row::new(["0100011", "010"], access(0b10, false)), // sw
    Row::new(["0110011", "xxx"], WORD),
    Row::new(["0010011", "xxx"], WORD),
    Row::new(["1100011", "xxx"], WORD),
    Row::new(["1101111", "xxx"], WORD),
    Row::new(["1100111", "xxx"], WORD),
    Row::new(["0110111", "xxx"], WORD),
    Row::new(["0010111", "xxx"], WORD),
    Row::new(["1110011", "xxx"], WORD),
];
const ACCESS: TruthTable<'static, AccessDecode, 2> = TruthTable::new("control.access", ACCESS_ROWS);

#[rustfmt::skip]
const ECALL_ROWS: &[Row<'static, u8, 3>] = &[
    //        opcode     funct3 imm[11:0]
    Row::new(["1110011", "000", "000000000000"], ecall_kind::ECALL),
    Row::new(["1110011", "000", "000000000001"], ecall_kind::EBREAK),
    Row::new(["xxxxxxx", "xxx", "xxxxxxxxxxxx"], ecall_kind::NONE),
];
const ECALL: TruthTable<'static, u8, 3> = TruthTable::new("control.ecall", ECALL_ROWS);

/// Main decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control;

impl Control {
    /// Decodes `opcode`/`funct3` (and the raw word for system calls) into
    /// control lines.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Decode`] when a table has no row for the fields,
    /// which is how unsupported instructions are reported.
    pub fn tick(
        opcode: BitVector,
        funct3: BitVector,
        instruction: BitVector,
    ) -> Result<ControlSignals, Fault> {
        let main = MAIN.lookup([opcode])?;
        let branch = BRANCH.lookup([opcode, funct3])?;
        let access = ACCESS.lookup([opcode, funct3])?;
        let ecall = ECALL.lookup([opcode, funct3, instruction.slice(20, 32)?])?;

        Ok(ControlSignals {
            alu_src: main.alu_src,
            write_src: BitVector::from_u64(main.write_src.into(), 2)?,
            reg_write: main.reg_write,
            mem_read: main.mem_read,
            mem_write: main.mem_write,
            branch_zero: branch.branch_zero,
            branch_not_zero: branch.branch_not_zero,
            jump: branch.jump,
            jalr: branch.jalr,
            alu_op: BitVector::from_u64(main.alu_op.into(), 3)?,
            mem_size: BitVector::from_u64(access.size.into(), 2)?,
            mem_signed: access.signed,
            ecall: BitVector::from_u64((*ecall).into(), 2)?,
        })
    }

    /// Checks every control table against its input widths.
    ///
    /// # Errors
    ///
    /// Returns the first malformed pattern.
    pub fn validate() -> Result<(), TruthTableError> {
        MAIN.validate([7])?;
        BRANCH.validate([7, 3])?;
        ACCESS.validate([7, 3])?;
        ECALL.validate([7, 3, 12])
    }
}

#[cfg(test)]
mod tests {
    use super::{alu_op, ecall_kind, write_src, Control, ControlSignals};
    use crate::{BitVector, Fault, FaultClass};
    use rstest::rstest;

    fn decode(word: u32) -> Result<ControlSignals, Fault> {
        let instruction = BitVector::from_u32(word);
        Control::tick(
            instruction.slice(0, 7).unwrap(),
            instruction.slice(12, 15).unwrap(),
            instruction,
        )
    }

    #[test]
    fn tables_are_well_formed() {
        assert_eq!(Control::validate(), Ok(()));
    }

    #[test]
    fn loads_read_memory_and_write_back_memory_data() {
        // lbu a0, 3(a1)
        let signals = decode(0x0035_C503).unwrap();
        assert!(signals.mem_read && signals.reg_write && signals.alu_src);
        assert!(!signals.mem_write);
        assert_eq!(signals.write_src.to_u64(), u64::from(write_src::MEM));
        assert_eq!(signals.mem_size.to_u64(), 0b00);
        assert!(!signals.mem_signed);
    }

    #[rstest]
    #[case(0x00B5_0463, true, false)] // beq a0, a1, 8
    #[case(0x00B5_1463, false, true)] // bne a0, a1, 8
    #[case(0x00B5_4463, false, true)] // blt a0, a1, 8
    #[case(0x00B5_5463, true, false)] // bge a0, a1, 8
    fn branches_pick_their_zero_polarity(
        #[case] word: u32,
        #[case] branch_zero: bool,
        #[case] branch_not_zero: bool,
    ) {
        let signals = decode(word).unwrap();
        assert_eq!(signals.branch_zero, branch_zero);
        assert_eq!(signals.branch_not_zero, branch_not_zero);
        assert!(!signals.jump);
        assert_eq!(signals.alu_op.to_u64(), u64::from(alu_op::BRANCH));
    }

    #[test]
    fn jalr_jumps_from_rs1_and_links() {
        // jalr ra, 0(a0)
        let signals = decode(0x0005_00E7).unwrap();
        assert!(signals.jump && signals.jalr && signals.reg_write);
        assert_eq!(signals.write_src.to_u64(), u64::from(write_src::PC_PLUS_4));
    }

    #[rstest]
    #[case(0x0000_0073, ecall_kind::ECALL)]
    #[case(0x0010_0073, ecall_kind::EBREAK)]
    #[case(0x0000_0013, ecall_kind::NONE)]
    fn system_calls_are_flagged(#[case] word: u32, #[case] kind: u8) {
        assert_eq!(decode(word).unwrap().ecall.to_u64(), u64::from(kind));
    }

    #[rstest]
    #[case(0x0000_0000)] // all-zero word
    #[case(0x0000_300F)] // fence-class opcode
    #[case(0x0000_3003)] // ld (RV64 only)
    #[case(0x3400_2573)] // csrrs
    fn unsupported_encodings_fail_to_decode(#[case] word: u32) {
        let fault = decode(word).unwrap_err();
        assert_eq!(fault.class(), FaultClass::Decode);
    }
}
