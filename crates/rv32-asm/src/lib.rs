//! Two-pass RV32I assembler.
//!
//! Pass 1 parses source text, lowers every statement to real instructions and
//! records label indices; pass 2 encodes each instruction to a 32-bit word.
//! See [`assembler::assemble`].

use tracing_subscriber as _;

#[cfg(test)]
use tempfile as _;

/// Top-level two-pass assembler pipeline.
pub mod assembler;
/// Instruction encoding.
pub mod encoder;
/// Structured parse/assembly error types.
pub mod errors;
/// Canonical instruction records.
pub mod instruction;
/// Base-ISA mnemonic table.
pub mod mnemonic;
/// Assembly parser for labels and instruction statements.
pub mod parser;
/// Instruction-matching and pseudo-instruction rules.
pub mod rules;
/// Symbol table and pass-1 instruction assignment.
pub mod symbols;

pub use assembler::{assemble, assemble_file, words, AssembledWord};
pub use errors::{AssemblerError, AssemblerErrorKind};
