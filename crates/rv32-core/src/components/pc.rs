use crate::{BitVector, Fault};

/// Edge-triggered program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProgramCounter {
    data: u32,
}

impl ProgramCounter {
    /// A PC holding `address`.
    #[must_use]
    pub const fn new(address: u32) -> Self {
        Self { data: address }
    }

    /// Value latched at the previous clock edge.
    #[must_use]
    pub const fn out(&self) -> BitVector {
        BitVector::from_u32(self.data)
    }

    /// Latched address as an integer.
    #[must_use]
    pub const fn data(&self) -> u32 {
        self.data
    }

    /// Clock edge: `next` becomes visible on the following cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Bits`] if `next` does not fit in 32 bits.
    pub fn latch(&mut self, next: BitVector) -> Result<(), Fault> {
        self.data = next.to_u32()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ProgramCounter;
    use crate::BitVector;

    #[test]
    fn output_changes_only_on_latch() {
        let mut pc = ProgramCounter::default();
        let next = BitVector::from_u32(8);
        assert_eq!(pc.out(), BitVector::from_u32(0));
        pc.latch(next).unwrap();
        assert_eq!(pc.data(), 8);
        assert_eq!(pc.out(), next);
    }
}
