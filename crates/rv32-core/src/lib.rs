//! Core of the single-cycle RV32I emulator.
//!
//! The processor is built from discrete datapath components whose control
//! logic is expressed as ordered truth tables over the instruction fields.
//! [`Simulator`] owns all component state and evaluates the datapath once per
//! [`Simulator::tick`].

/// Fixed-width bit vectors.
pub mod bits;
pub use bits::{BitError, BitVector, Signedness, MAX_WIDTH};

/// First-match truth tables with don't-care patterns.
pub mod truth_table;
pub use truth_table::{Row, TruthTable, TruthTableError, DONT_CARE};

/// Sparse little-endian byte memory and its text dump.
pub mod memory;
pub use memory::{Dump, DumpAddress, DumpEntry, Memory, MemoryError, Radix, TableFormat};

/// RV32I opcode and register-name tables.
pub mod encoding;
pub use encoding::{register_number, ABI_REGISTER_NAMES, NOP_WORD, REGISTER_COUNT};

/// Fault taxonomy for datapath failures.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Host-facing configuration and run types.
pub mod api;
pub use api::{RunOutcome, RunState, SimulatorConfig};

/// Datapath components.
pub mod components;

/// Component wiring and the tick loop.
pub mod simulator;
pub use simulator::{Signals, Simulator};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
