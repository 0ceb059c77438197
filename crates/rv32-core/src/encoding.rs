/// Major opcode values (instruction bits `6..0`).
pub mod opcode {
    /// `lb`, `lh`, `lw`, `lbu`, `lhu`.
    pub const LOAD: u32 = 0b000_0011;
    /// Register-immediate arithmetic.
    pub const OP_IMM: u32 = 0b001_0011;
    /// `auipc`.
    pub const AUIPC: u32 = 0b001_0111;
    /// `sb`, `sh`, `sw`.
    pub const STORE: u32 = 0b010_0011;
    /// Register-register arithmetic.
    pub const OP: u32 = 0b011_0011;
    /// `lui`.
    pub const LUI: u32 = 0b011_0111;
    /// Conditional branches.
    pub const BRANCH: u32 = 0b110_0011;
    /// `jalr`.
    pub const JALR: u32 = 0b110_0111;
    /// `jal`.
    pub const JAL: u32 = 0b110_1111;
    /// `ecall`, `ebreak`.
    pub const SYSTEM: u32 = 0b111_0011;
}

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 32;

/// Return address.
pub const REG_RA: usize = 1;
/// Stack pointer.
pub const REG_SP: usize = 2;
/// Global pointer.
pub const REG_GP: usize = 3;
/// First argument / return value.
pub const REG_A0: usize = 10;
/// Second argument.
pub const REG_A1: usize = 11;
/// System-call number by convention.
pub const REG_A7: usize = 17;

/// `addi x0, x0, 0`.
pub const NOP_WORD: u32 = 0x0000_0013;

/// ABI names indexed by register number.
pub const ABI_REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Resolves `x0`..`x31`, an ABI name, or `fp`, ignoring case.
#[must_use]
pub fn register_number(name: &str) -> Option<u8> {
    let name = name.to_ascii_lowercase();
    if name == "fp" {
        return Some(8);
    }
    if let Some(digits) = name.strip_prefix('x') {
        let valid = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !(digits.len() > 1 && digits.starts_with('0'));
        if valid {
            return digits
                .parse::<u8>()
                .ok()
                .filter(|n| usize::from(*n) < REGISTER_COUNT);
        }
    }
    ABI_REGISTER_NAMES
        .iter()
        .position(|abi| *abi == name)
        .and_then(|index| u8::try_from(index).ok())
}
