//! Datapath components of the single-cycle core.
//!
//! Each component is a pure function of its inputs: `tick` recomputes the
//! outputs from the values passed in and holds no references to other
//! components. Clocked state (PC, register file, memory contents) is updated
//! only through explicit `latch`/`write_back`/`commit` calls, which the
//! simulator issues at the end of a cycle.

mod adders;
mod alu;
mod alu_control;
mod control;
mod data_memory;
mod gates;
mod imm_gen;
mod jump_control;
mod mux;
mod pc;
mod register_file;
mod splitter;

pub use adders::{Adder, AuipcAdder, BranchAdder};
pub use alu::{Alu, AluOutputs};
pub use alu_control::{alu_code, AluControl};
pub use control::{alu_op, ecall_kind, write_src, Control, ControlSignals};
pub use data_memory::{DataMemory, InstructionMemory, MemoryAccess};
pub use gates::{And, Not, Or};
pub use imm_gen::{Extractor, ImmGen};
pub use jump_control::JumpControl;
pub use mux::Mux;
pub use pc::ProgramCounter;
pub use register_file::RegisterFile;
pub use splitter::{InstructionFields, InstructionSplitter};
