use crate::truth_table::{Row, TruthTable};
use crate::{BitVector, Fault, Memory, Signedness};

const WIDTH_ROWS: &[Row<'static, usize, 1>] = &[
    Row::new(["00"], 1),
    Row::new(["01"], 2),
    Row::new(["10"], 4),
];
const ACCESS_WIDTH: TruthTable<'static, usize, 1> = TruthTable::new("memory.width", WIDTH_ROWS);

/// Data-memory port inputs for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryAccess {
    /// Byte address.
    pub address: BitVector,
    /// Read enable.
    pub mem_read: bool,
    /// Write enable.
    pub mem_write: bool,
    /// Value to store.
    pub write_data: BitVector,
    /// `00` byte, `01` half, `10` word.
    pub size: BitVector,
    /// Sign-extend the loaded value.
    pub signed: bool,
}

impl MemoryAccess {
    fn check(&self) -> Result<(u64, usize), Fault> {
        let address = self.address.to_u32()?;
        if self.mem_read && self.mem_write {
            return Err(Fault::SimultaneousReadWrite { address });
        }
        let width = *ACCESS_WIDTH.lookup([self.size])?;
        Ok((address.into(), width))
    }
}

/// Load/store port over a [`Memory`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataMemory {
    memory: Memory,
}

impl DataMemory {
    /// Wraps `memory`.
    #[must_use]
    pub const fn new(memory: Memory) -> Self {
        Self { memory }
    }

    /// Read path: the loaded value extended to 32 bits, or zero when
    /// `mem_read` is clear.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::SimultaneousReadWrite`] when both enables are set and
    /// [`Fault::Memory`] for an out-of-range read.
    pub fn tick(&self, access: &MemoryAccess) -> Result<BitVector, Fault> {
        let (address, width) = access.check()?;
        if !access.mem_read {
            return Ok(BitVector::zero(32)?);
        }
        let raw = self.memory.load(address, width)?;
        let signedness = Signedness::from(access.signed);
        Ok(BitVector::from_u64(raw, width * 8)?.extend(32, signedness)?)
    }

    /// Clock edge: stores the low bytes of `write_data` when `mem_write` is set.
    ///
    /// # Errors
    ///
    /// Fails like [`DataMemory::tick`]; nothing is written on error.
    pub fn commit(&mut self, access: &MemoryAccess) -> Result<(), Fault> {
        let (address, width) = access.check()?;
        if !access.mem_write {
            return Ok(());
        }
        let value = access.write_data.slice(0, width * 8)?.to_u64();
        self.memory.store(address, width, value)?;
        Ok(())
    }

    /// Backing store.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Backing store, for loading data before a run.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
}

/// Word-fetch port holding the program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionMemory {
    memory: Memory,
}

impl InstructionMemory {
    /// Wraps `memory`.
    #[must_use]
    pub const fn new(memory: Memory) -> Self {
        Self { memory }
    }

    /// Replaces the program with `code`, one word per 4 bytes from address 0.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Memory`] when the program does not fit; the old
    /// program stays loaded in that case.
    pub fn load_code(&mut self, code: &[u32]) -> Result<(), Fault> {
        let words: Vec<u64> = code.iter().copied().map(u64::from).collect();
        let mut memory = Memory::new(self.memory.size())?;
        memory.store_array(0, 4, &words)?;
        self.memory = memory;
        Ok(())
    }

    /// Fetches the word at `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Memory`] for a fetch past the end of memory.
    pub fn fetch(&self, pc: BitVector) -> Result<BitVector, Fault> {
        let word = self.memory.load(u64::from(pc.to_u32()?), 4)?;
        Ok(BitVector::from_u64(word, 32)?)
    }

    /// Backing store.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::{DataMemory, InstructionMemory, MemoryAccess};
    use crate::{BitVector, Fault, Memory};

    fn access(address: u32, size: u64, signed: bool) -> MemoryAccess {
        MemoryAccess {
            address: BitVector::from_u32(address),
            mem_read: true,
            mem_write: false,
            write_data: BitVector::from_u32(0),
            size: BitVector::from_u64(size, 2).unwrap(),
            signed,
        }
    }

    fn store(memory: &mut DataMemory, address: u32, size: u64, value: u32) {
        let request = MemoryAccess {
            mem_read: false,
            mem_write: true,
            write_data: BitVector::from_u32(value),
            ..access(address, size, false)
        };
        memory.commit(&request).unwrap();
    }

    #[test]
    fn loads_extend_by_signedness() {
        let mut memory = DataMemory::new(Memory::new(64).unwrap());
        store(&mut memory, 0, 0b10, 0x0000_80FF);

        let lb = memory.tick(&access(0, 0b00, true)).unwrap();
        let lbu = memory.tick(&access(0, 0b00, false)).unwrap();
        let lh = memory.tick(&access(0, 0b01, true)).unwrap();
        let lhu = memory.tick(&access(0, 0b01, false)).unwrap();
        assert_eq!(lb.to_u64(), 0xFFFF_FFFF);
        assert_eq!(lbu.to_u64(), 0xFF);
        assert_eq!(lh.to_u64(), 0xFFFF_80FF);
        assert_eq!(lhu.to_u64(), 0x80FF);
        assert_eq!(lb.width(), 32);
    }

    #[test]
    fn stores_truncate_to_the_access_width() {
        let mut memory = DataMemory::new(Memory::new(64).unwrap());
        store(&mut memory, 4, 0b00, 0x1234_5678);
        assert_eq!(memory.memory().load(4, 4), Ok(0x78));
    }

    #[test]
    fn read_and_write_together_is_a_fault() {
        let mut memory = DataMemory::new(Memory::new(64).unwrap());
        let request = MemoryAccess {
            mem_write: true,
            ..access(8, 0b10, false)
        };
        assert_eq!(
            memory.tick(&request),
            Err(Fault::SimultaneousReadWrite { address: 8 })
        );
        assert!(memory.commit(&request).is_err());
    }

    #[test]
    fn idle_port_reads_zero() {
        let memory = DataMemory::new(Memory::new(64).unwrap());
        let request = MemoryAccess {
            mem_read: false,
            ..access(1000, 0b10, false)
        };
        assert_eq!(memory.tick(&request), Ok(BitVector::from_u32(0)));
    }

    #[test]
    fn instruction_memory_fetches_words() {
        let mut code = InstructionMemory::new(Memory::new(64).unwrap());
        code.load_code(&[0x0000_0013, 0x0020_8033]).unwrap();
        assert_eq!(
            code.fetch(BitVector::from_u32(4)),
            Ok(BitVector::from_u32(0x0020_8033))
        );
        assert!(code.fetch(BitVector::from_u32(64)).is_err());
    }

    #[test]
    fn oversized_program_keeps_the_old_one() {
        let mut code = InstructionMemory::new(Memory::new(16).unwrap());
        code.load_code(&[0x0000_0013, 0x0020_8033]).unwrap();
        assert!(code.load_code(&[0x0000_0013; 5]).is_err());
        assert_eq!(
            code.fetch(BitVector::from_u32(0)),
            Ok(BitVector::from_u32(0x0000_0013))
        );
        assert_eq!(
            code.fetch(BitVector::from_u32(4)),
            Ok(BitVector::from_u32(0x0020_8033))
        );
    }
}
