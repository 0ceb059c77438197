use std::fmt::Write as _;

use super::Memory;

/// Address column of a dump row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DumpAddress {
    /// A single word.
    Single(u64),
    /// A collapsed run of zero words, bounds inclusive.
    Range {
        /// First byte of the run.
        start: u64,
        /// Last byte of the run.
        end: u64,
    },
}

/// One `(address, value)` row of a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DumpEntry {
    /// Word address or collapsed range.
    pub address: DumpAddress,
    /// Word value (always zero for ranges).
    pub value: u64,
}

/// Number base used when rendering tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radix {
    /// Zero-padded `0x` hexadecimal.
    #[default]
    Hex,
    /// Plain decimal.
    Decimal,
}

/// Rendering options for [`Memory::format_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    /// Bytes per row.
    pub word_size: u64,
    /// Longest zero run still listed word by word.
    pub collapse_threshold: u64,
    /// Number base for addresses and values.
    pub radix: Radix,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            word_size: 4,
            collapse_threshold: 4,
            radix: Radix::Hex,
        }
    }
}

/// Lazy walk over memory produced by [`Memory::dump`].
#[derive(Debug, Clone)]
pub struct Dump<'a> {
    memory: &'a Memory,
    word_size: u64,
    collapse_threshold: u64,
    cursor: Option<u64>,
}

impl<'a> Dump<'a> {
    pub(super) const fn new(memory: &'a Memory, word_size: u64, collapse_threshold: u64) -> Self {
        Self {
            memory,
            word_size,
            collapse_threshold,
            cursor: Some(0),
        }
    }

    fn next_used_word(&self, from: u64) -> u64 {
        self.memory
            .bytes
            .range(from..)
            .next()
            .map_or(self.memory.size, |(&address, _)| {
                address - address % self.word_size
            })
    }
}

impl Iterator for Dump<'_> {
    type Item = DumpEntry;

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<DumpEntry> {
        let cursor = self.cursor.filter(|c| *c < self.memory.size)?;
        let next_used = self.next_used_word(cursor);

        if next_used == cursor {
            self.cursor = cursor.checked_add(self.word_size);
            return Some(DumpEntry {
                address: DumpAddress::Single(cursor),
                value: self.memory.read_le(cursor, self.word_size as usize),
            });
        }

        let zero_words = (next_used - cursor) / self.word_size;
        if zero_words > self.collapse_threshold {
            self.cursor = Some(next_used);
            Some(DumpEntry {
                address: DumpAddress::Range {
                    start: cursor,
                    end: next_used - 1,
                },
                value: 0,
            })
        } else {
            self.cursor = cursor.checked_add(self.word_size);
            Some(DumpEntry {
                address: DumpAddress::Single(cursor),
                value: 0,
            })
        }
    }
}

pub(super) fn render(size: u64, format: TableFormat, dump: Dump<'_>) -> String {
    let address_digits = (64 - (size - 1).leading_zeros()).div_ceil(4).max(1) as usize;
    let value_digits = (format.word_size * 2) as usize;
    let address = |a: u64| match format.radix {
        Radix::Hex => format!("0x{a:0address_digits$x}"),
        Radix::Decimal => a.to_string(),
    };

    let mut out = String::new();
    for entry in dump {
        let value = match format.radix {
            Radix::Hex => format!("0x{:0value_digits$x}", entry.value),
            Radix::Decimal => entry.value.to_string(),
        };
        let row = match entry.address {
            DumpAddress::Single(a) => address(a),
            DumpAddress::Range { start, end } => format!("{}..{}", address(start), address(end)),
        };
        let _ = writeln!(out, "{row}: {value}");
    }
    out
}
