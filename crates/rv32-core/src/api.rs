use crate::encoding::{REG_GP, REG_SP};

/// Default address-space size for both memories (4 GiB).
pub const DEFAULT_MEMORY_SIZE: u64 = 1 << 32;
/// Conventional initial stack pointer.
pub const DEFAULT_STACK_POINTER: u32 = 0x7FFF_FFF0;
/// Conventional initial global pointer.
pub const DEFAULT_GLOBAL_POINTER: u32 = 0x1000_8000;

/// Simulator construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulatorConfig {
    /// Size in bytes of each memory; must be a power of two.
    pub memory_size: u64,
    /// Initial `sp`.
    pub stack_pointer: u32,
    /// Initial `gp`.
    pub global_pointer: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_pointer: DEFAULT_STACK_POINTER,
            global_pointer: DEFAULT_GLOBAL_POINTER,
        }
    }
}

impl SimulatorConfig {
    /// Register values applied on construction and reset.
    #[must_use]
    pub const fn initial_registers(&self) -> [(usize, u32); 2] {
        [(REG_SP, self.stack_pointer), (REG_GP, self.global_pointer)]
    }
}

/// Simulator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Program loaded, no tick executed yet.
    #[default]
    Constructed,
    /// At least one tick executed and the PC is still inside the program.
    Running,
    /// The PC has left the program.
    Done,
}

/// Result of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Ticks executed by this call.
    pub ticks: u64,
    /// Whether the program finished within the bound.
    pub done: bool,
}
