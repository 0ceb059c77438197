//! Base-ISA mnemonic table.

use rv32_core::encoding::opcode;

/// Encoding layout of a real instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionFormat {
    /// Register-register.
    R,
    /// Register-immediate, loads, `jalr` and system calls.
    I,
    /// Immediate shifts: I-type with a 5-bit shamt and funct7 in the upper bits.
    Is,
    /// Stores.
    S,
    /// Conditional branches.
    Sb,
    /// Upper immediates.
    U,
    /// `jal`.
    Uj,
}

/// Fixed encoding fields of one mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mnemonic {
    /// Lower-case name.
    pub name: &'static str,
    /// Encoding layout.
    pub format: InstructionFormat,
    /// 7-bit major opcode.
    pub opcode: u32,
    /// 3-bit minor opcode; zero where the format has none.
    pub funct3: u32,
    /// 7-bit function field; zero where the format has none.
    pub funct7: u32,
}

const fn entry(
    name: &'static str,
    format: InstructionFormat,
    opcode: u32,
    funct3: u32,
    funct7: u32,
) -> Mnemonic {
    Mnemonic {
        name,
        format,
        opcode,
        funct3,
        funct7,
    }
}

use InstructionFormat::{Is, Sb, Uj, I, R, S, U};

#[rustfmt::skip]
const MNEMONICS: &[Mnemonic] = &[
    entry("add",    R,  opcode::OP,     0b000, 0b000_0000),
    entry("sub",    R,  opcode::OP,     0b000, 0b010_0000),
    entry("sll",    R,  opcode::OP,     0b001, 0b000_0000),
    entry("slt",    R,  opcode::OP,     0b010, 0b000_0000),
    entry("sltu",   R,  opcode::OP,     0b011, 0b000_0000),
    entry("xor",    R,  opcode::OP,     0b100, 0b000_0000),
    entry("srl",    R,  opcode::OP,     0b101, 0b000_0000),
    entry("sra",    R,  opcode::OP,     0b101, 0b010_0000),
    entry("or",     R,  opcode::OP,     0b110, 0b000_0000),
    entry("and",    R,  opcode::OP,     0b111, 0b000_0000),
    entry("addi",   I,  opcode::OP_IMM, 0b000, 0),
    entry("slti",   I,  opcode::OP_IMM, 0b010, 0),
    entry("sltiu",  I,  opcode::OP_IMM, 0b011, 0),
    entry("xori",   I,  opcode::OP_IMM, 0b100, 0),
    entry("ori",    I,  opcode::OP_IMM, 0b110, 0),
    entry("andi",   I,  opcode::OP_IMM, 0b111, 0),
    entry("slli",   Is, opcode::OP_IMM, 0b001, 0b000_0000),
    entry("srli",   Is, opcode::OP_IMM, 0b101, 0b000_0000),
    entry("srai",   Is, opcode::OP_IMM, 0b101, 0b010_0000),
    entry("lb",     I,  opcode::LOAD,   0b000, 0),
    entry("lh",     I,  opcode::LOAD,   0b001, 0),
    entry("lw",     I,  opcode::LOAD,   0b010, 0),
    entry("lbu",    I,  opcode::LOAD,   0b100, 0),
    entry("lhu",    I,  opcode::LOAD,   0b101, 0),
    entry("sb",     S,  opcode::STORE,  0b000, 0),
    entry("sh",     S,  opcode::STORE,  0b001, 0),
    entry("sw",     S,  opcode::STORE,  0b010, 0),
    entry("beq",    Sb, opcode::BRANCH, 0b000, 0),
    entry("bne",    Sb, opcode::BRANCH, 0b001, 0),
    entry("blt",    Sb, opcode::BRANCH, 0b100, 0),
    entry("bge",    Sb, opcode::BRANCH, 0b101, 0),
    entry("bltu",   Sb, opcode::BRANCH, 0b110, 0),
    entry("bgeu",   Sb, opcode::BRANCH, 0b111, 0),
    entry("lui",    U,  opcode::LUI,    0, 0),
    entry("auipc",  U,  opcode::AUIPC,  0, 0),
    entry("jal",    Uj, opcode::JAL,    0, 0),
    entry("jalr",   I,  opcode::JALR,   0b000, 0),
    entry("ecall",  I,  opcode::SYSTEM, 0b000, 0),
    entry("ebreak", I,  opcode::SYSTEM, 0b000, 0),
];

/// Looks up a real instruction by name, ignoring ASCII case.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Mnemonic> {
    MNEMONICS
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
}

/// All real instructions, in table order.
#[must_use]
pub const fn all() -> &'static [Mnemonic] {
    MNEMONICS
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rv32_core::components::{AluControl, Control, InstructionSplitter};
    use rv32_core::BitVector;

    use super::*;

    #[test]
    fn names_are_unique_and_lowercase() {
        let mut seen = HashSet::new();
        for entry in all() {
            assert!(seen.insert(entry.name), "duplicate {}", entry.name);
            assert_eq!(entry.name, entry.name.to_ascii_lowercase());
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(lookup("ADDI").map(|m| m.name), Some("addi"));
        assert_eq!(lookup("Ebreak").map(|m| m.format), Some(InstructionFormat::I));
        assert_eq!(lookup("mul"), None);
        assert_eq!(lookup("mv"), None);
    }

    #[test]
    fn every_entry_decodes_in_the_datapath() {
        for entry in all() {
            let imm = if entry.name == "ebreak" { 1 << 20 } else { 0 };
            let word =
                imm | (entry.funct7 << 25) | (entry.funct3 << 12) | entry.opcode;
            let instruction = BitVector::from_u32(word);
            let fields = InstructionSplitter::tick(instruction).unwrap();
            let control = Control::tick(fields.opcode, fields.funct3, instruction)
                .unwrap_or_else(|e| panic!("{}: {e}", entry.name));
            AluControl::tick(control.alu_op, fields.funct7, fields.funct3)
                .unwrap_or_else(|e| panic!("{}: {e}", entry.name));
        }
    }
}
