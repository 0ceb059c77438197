//! Sparse byte-addressable memory.
//!
//! Only non-zero bytes are stored, so a full 4 GiB address space costs nothing
//! until it is written. Multi-byte values are little-endian.

/// Lazy address/value iteration and text tables.
pub mod dump;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub use dump::{Dump, DumpAddress, DumpEntry, Radix, TableFormat};

/// Widest single access in bytes.
pub const MAX_ACCESS_BYTES: usize = 8;

/// Failures raised by memory construction and access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address-space size must be a non-zero power of two.
    #[error("memory size {size:#x} is not a power of two")]
    InvalidSize {
        /// Requested size.
        size: u64,
    },
    /// Access width outside `1..=8` bytes.
    #[error("access width {width} is not supported (1..={MAX_ACCESS_BYTES} bytes)")]
    InvalidWidth {
        /// Requested width.
        width: usize,
    },
    /// `address + width` runs past the end of memory.
    #[error("{width}-byte access at {address:#x} exceeds memory size {size:#x}")]
    AddressOutOfRange {
        /// Start address.
        address: u64,
        /// Width in bytes.
        width: usize,
        /// Address-space size.
        size: u64,
    },
    /// Value needs more bytes than the access width.
    #[error("value {value:#x} does not fit in {width} bytes")]
    ValueOutOfRange {
        /// Offending value.
        value: u64,
        /// Width in bytes.
        width: usize,
    },
    /// Dump word size is unsupported or does not divide the memory size.
    #[error("word size {word_size} cannot tile memory of size {size:#x}")]
    InvalidWordSize {
        /// Requested word size in bytes.
        word_size: u64,
        /// Address-space size.
        size: u64,
    },
}

/// A sparse little-endian byte store over `size` addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    size: u64,
    bytes: BTreeMap<u64, u8>,
}

impl Memory {
    /// Creates an empty memory of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidSize`] unless `size` is a power of two.
    pub fn new(size: u64) -> Result<Self, MemoryError> {
        if !size.is_power_of_two() {
            return Err(MemoryError::InvalidSize { size });
        }
        Ok(Self {
            size,
            bytes: BTreeMap::new(),
        })
    }

    /// Address-space size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` when every byte reads as zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Zeroes all of memory.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    fn check_range(&self, address: u64, width: usize) -> Result<(), MemoryError> {
        if !(1..=MAX_ACCESS_BYTES).contains(&width) {
            return Err(MemoryError::InvalidWidth { width });
        }
        let in_range = address
            .checked_add(width as u64)
            .is_some_and(|end| end <= self.size);
        if in_range {
            Ok(())
        } else {
            Err(MemoryError::AddressOutOfRange {
                address,
                width,
                size: self.size,
            })
        }
    }

    fn byte(&self, address: u64) -> u8 {
        self.bytes.get(&address).copied().unwrap_or(0)
    }

    fn read_le(&self, address: u64, width: usize) -> u64 {
        (0..width as u64)
            .rev()
            .fold(0, |acc, offset| (acc << 8) | u64::from(self.byte(address + offset)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_le(&mut self, address: u64, width: usize, value: u64) {
        for offset in 0..width as u64 {
            let byte = (value >> (offset * 8)) as u8;
            if byte == 0 {
                self.bytes.remove(&(address + offset));
            } else {
                self.bytes.insert(address + offset, byte);
            }
        }
    }

    /// Reads a `width`-byte little-endian value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidWidth`] or [`MemoryError::AddressOutOfRange`].
    pub fn load(&self, address: u64, width: usize) -> Result<u64, MemoryError> {
        self.check_range(address, width)?;
        Ok(self.read_le(address, width))
    }

    /// Writes `value` as `width` little-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidWidth`], [`MemoryError::AddressOutOfRange`]
    /// or [`MemoryError::ValueOutOfRange`]; nothing is written on error.
    pub fn store(&mut self, address: u64, width: usize, value: u64) -> Result<(), MemoryError> {
        self.check_range(address, width)?;
        check_value(width, value)?;
        self.write_le(address, width, value);
        Ok(())
    }

    /// Reads `count` consecutive `width`-byte elements.
    ///
    /// # Errors
    ///
    /// Fails like [`Memory::load`] if any element is out of range.
    pub fn load_array(
        &self,
        address: u64,
        width: usize,
        count: usize,
    ) -> Result<Vec<u64>, MemoryError> {
        (0..count as u64)
            .map(|index| self.load(address + index * width as u64, width))
            .collect()
    }

    /// Writes `values` as consecutive `width`-byte elements.
    ///
    /// Every element is validated before any byte is written.
    ///
    /// # Errors
    ///
    /// Fails like [`Memory::store`] if any element is invalid.
    pub fn store_array(
        &mut self,
        address: u64,
        width: usize,
        values: &[u64],
    ) -> Result<(), MemoryError> {
        for (index, value) in values.iter().enumerate() {
            self.check_range(address + index as u64 * width as u64, width)?;
            check_value(width, *value)?;
        }
        for (index, value) in values.iter().enumerate() {
            self.write_le(address + index as u64 * width as u64, width, *value);
        }
        Ok(())
    }

    /// Lazily walks memory in `word_size`-byte words.
    ///
    /// Zero runs longer than `collapse_threshold` words become a single
    /// [`DumpAddress::Range`]; shorter runs are listed word by word. Each call
    /// starts a fresh walk.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidWordSize`] unless `word_size` is a power
    /// of two no wider than [`MAX_ACCESS_BYTES`] that divides the memory size.
    pub fn dump(&self, word_size: u64, collapse_threshold: u64) -> Result<Dump<'_>, MemoryError> {
        let supported = word_size.is_power_of_two()
            && word_size <= MAX_ACCESS_BYTES as u64
            && self.size % word_size == 0;
        if !supported {
            return Err(MemoryError::InvalidWordSize {
                word_size,
                size: self.size,
            });
        }
        Ok(Dump::new(self, word_size, collapse_threshold))
    }

    /// Renders the dump as one `address: value` row per entry.
    ///
    /// # Errors
    ///
    /// Fails like [`Memory::dump`].
    pub fn format_table(&self, format: TableFormat) -> Result<String, MemoryError> {
        let dump = self.dump(format.word_size, format.collapse_threshold)?;
        Ok(dump::render(self.size, format, dump))
    }
}

const fn check_value(width: usize, value: u64) -> Result<(), MemoryError> {
    if width < MAX_ACCESS_BYTES && value >> (width * 8) != 0 {
        return Err(MemoryError::ValueOutOfRange { value, width });
    }
    Ok(())
}

/// Default table, with rows narrowed to the whole memory when it is smaller
/// than a word.
impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default = TableFormat::default();
        let format = TableFormat {
            word_size: default.word_size.min(self.size),
            ..default
        };
        let table = self.format_table(format).map_err(|_| fmt::Error)?;
        f.write_str(&table)
    }
}
