use thiserror::Error;

use crate::{BitError, MemoryError, TruthTableError};

/// Fault classes used for reporting and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// A value did not fit the bit width it was forced into.
    Encoding,
    /// A control truth table rejected the instruction fields.
    Decode,
    /// Memory access outside the address space or with a bad width.
    Memory,
    /// Components were driven with inconsistent signals.
    Wiring,
}

/// Unrecoverable failure raised while ticking the datapath.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Bit-vector construction or slicing failed.
    #[error(transparent)]
    Bits(#[from] BitError),
    /// No control table row matched.
    #[error(transparent)]
    Decode(#[from] TruthTableError),
    /// Memory rejected an access.
    #[error(transparent)]
    Memory(#[from] MemoryError),
    /// Data memory saw `memRead` and `memWrite` in the same cycle.
    #[error("data memory read and write requested together at {address:#010x}")]
    SimultaneousReadWrite {
        /// Access address.
        address: u32,
    },
    /// Mux select exceeds the number of inputs.
    #[error("mux select {select} out of range for {choices} inputs")]
    MuxSelectOutOfRange {
        /// Select value.
        select: u64,
        /// Declared input count.
        choices: usize,
    },
    /// Mux driven with the wrong number of inputs.
    #[error("mux expects {expected} inputs, found {found}")]
    MuxInputCount {
        /// Declared input count.
        expected: usize,
        /// Inputs supplied.
        found: usize,
    },
    /// Mux input width differs from the declared width.
    #[error("mux input {index} is {found} bits wide, expected {expected}")]
    MuxWidthMismatch {
        /// Offending input.
        index: usize,
        /// Declared width.
        expected: usize,
        /// Actual width.
        found: usize,
    },
    /// Register index outside `0..32`.
    #[error("register index {index} out of range")]
    RegisterIndex {
        /// Offending index.
        index: usize,
    },
}

impl Fault {
    /// Returns the reporting class of this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::Bits(_) => FaultClass::Encoding,
            Self::Decode(_) => FaultClass::Decode,
            Self::Memory(_) => FaultClass::Memory,
            Self::SimultaneousReadWrite { .. }
            | Self::MuxSelectOutOfRange { .. }
            | Self::MuxInputCount { .. }
            | Self::MuxWidthMismatch { .. }
            | Self::RegisterIndex { .. } => FaultClass::Wiring,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Fault, FaultClass};
    use crate::{BitError, MemoryError};

    #[test]
    fn wrapped_errors_keep_their_message_and_class() {
        let fault = Fault::from(MemoryError::InvalidWidth { width: 3 });
        assert_eq!(fault.class(), FaultClass::Memory);
        assert_eq!(
            fault.to_string(),
            "access width 3 is not supported (1..=8 bytes)"
        );

        let fault = Fault::from(BitError::WidthTooLarge { width: 65 });
        assert_eq!(fault.class(), FaultClass::Encoding);
    }

    #[test]
    fn wiring_faults_render_addresses_in_hex() {
        let fault = Fault::SimultaneousReadWrite { address: 0x40 };
        assert_eq!(fault.class(), FaultClass::Wiring);
        assert_eq!(
            fault.to_string(),
            "data memory read and write requested together at 0x00000040"
        );
    }
}
