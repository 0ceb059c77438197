use crate::encoding::REGISTER_COUNT;
use crate::{BitVector, Fault};

/// The 32 general-purpose registers; `x0` reads as zero and ignores writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    registers: [u32; REGISTER_COUNT],
}

impl RegisterFile {
    /// All registers zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
        }
    }

    fn index(select: BitVector) -> Result<usize, Fault> {
        let index = usize::try_from(select.to_u64()).unwrap_or(usize::MAX);
        if index < REGISTER_COUNT {
            Ok(index)
        } else {
            Err(Fault::RegisterIndex { index })
        }
    }

    /// Combinational read of the register selected by a 5-bit field.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterIndex`] for a select outside `0..32`.
    pub fn read(&self, select: BitVector) -> Result<BitVector, Fault> {
        Ok(BitVector::from_u32(self.registers[Self::index(select)?]))
    }

    /// Clock edge: writes `data` to `rd` when `reg_write` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterIndex`] or [`Fault::Bits`] when `data` is
    /// wider than 32 bits; nothing is written on error.
    pub fn write_back(&mut self, reg_write: bool, rd: BitVector, data: BitVector) -> Result<(), Fault> {
        if !reg_write {
            return Ok(());
        }
        let index = Self::index(rd)?;
        let value = data.to_u32()?;
        if index != 0 {
            self.registers[index] = value;
        }
        Ok(())
    }

    /// Register `index`, or `None` past `x31`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.registers.get(index).copied()
    }

    /// Sets register `index` outside the clocked path; `x0` stays zero.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterIndex`] past `x31`.
    pub fn set(&mut self, index: usize, value: u32) -> Result<(), Fault> {
        let slot = self
            .registers
            .get_mut(index)
            .ok_or(Fault::RegisterIndex { index })?;
        if index != 0 {
            *slot = value;
        }
        Ok(())
    }

    /// All registers in index order.
    #[must_use]
    pub const fn as_array(&self) -> &[u32; REGISTER_COUNT] {
        &self.registers
    }

    /// Zeroes every register.
    pub fn clear(&mut self) {
        self.registers = [0; REGISTER_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::RegisterFile;
    use crate::{BitVector, Fault};

    fn select(index: u64) -> BitVector {
        BitVector::from_u64(index, 5).unwrap()
    }

    #[test]
    fn x0_is_hardwired_to_zero() {
        let mut registers = RegisterFile::new();
        registers
            .write_back(true, select(0), BitVector::from_u32(42))
            .unwrap();
        registers.set(0, 7).unwrap();
        assert_eq!(registers.read(select(0)), Ok(BitVector::from_u32(0)));
    }

    #[test]
    fn writes_need_the_enable_line() {
        let mut registers = RegisterFile::new();
        registers
            .write_back(false, select(5), BitVector::from_u32(9))
            .unwrap();
        assert_eq!(registers.get(5), Some(0));
        registers
            .write_back(true, select(5), BitVector::from_u32(9))
            .unwrap();
        assert_eq!(registers.get(5), Some(9));
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut registers = RegisterFile::new();
        assert_eq!(registers.get(32), None);
        assert_eq!(registers.set(32, 1), Err(Fault::RegisterIndex { index: 32 }));
        let wide = BitVector::from_u64(40, 6).unwrap();
        assert!(registers.read(wide).is_err());
    }
}
