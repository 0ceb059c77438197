//! Fixed-width bit vectors.
//!
//! Bit `0` is the least-significant bit. Indices, slices and extensions all
//! work in that LSB-0 space, while every textual or array conversion is
//! MSB-first so that `"0110011"` reads the way the ISA manual prints an opcode.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Widest vector the type can hold.
pub const MAX_WIDTH: usize = 64;

/// Interpretation applied when converting between integers and bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Signedness {
    /// Plain binary magnitude.
    #[default]
    Unsigned,
    /// Two's complement.
    Signed,
}

impl Signedness {
    /// Returns `true` for [`Signedness::Signed`].
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Signed)
    }
}

impl From<bool> for Signedness {
    fn from(signed: bool) -> Self {
        if signed {
            Self::Signed
        } else {
            Self::Unsigned
        }
    }
}

impl fmt::Display for Signedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned => f.write_str("unsigned"),
            Self::Signed => f.write_str("signed"),
        }
    }
}

/// Failures raised by bit-vector construction and manipulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// Integer does not fit the requested width.
    #[error("value {value} does not fit in {width} bits ({signedness})")]
    ValueOutOfRange {
        /// Offending value.
        value: i128,
        /// Requested width.
        width: usize,
        /// Requested interpretation.
        signedness: Signedness,
    },
    /// Requested width is wider than [`MAX_WIDTH`].
    #[error("width {width} exceeds the {MAX_WIDTH}-bit limit")]
    WidthTooLarge {
        /// Requested width.
        width: usize,
    },
    /// Bit string contained something other than `0` or `1`.
    #[error("invalid bit character {found:?} at position {position}")]
    InvalidDigit {
        /// Offending character.
        found: char,
        /// Character position, counted from the left.
        position: usize,
    },
    /// Single-bit access past the end of the vector.
    #[error("bit index {index} out of bounds for width {width}")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Vector width.
        width: usize,
    },
    /// Slice bounds are reversed or past the end of the vector.
    #[error("slice {start}..{end} out of bounds for width {width}")]
    InvalidSlice {
        /// Inclusive lower index.
        start: usize,
        /// Exclusive upper index.
        end: usize,
        /// Vector width.
        width: usize,
    },
    /// `extend` would drop bits.
    #[error("cannot extend a {from}-bit vector to {to} bits")]
    NarrowingExtend {
        /// Current width.
        from: usize,
        /// Requested width.
        to: usize,
    },
}

/// An ordered, fixed-length sequence of bits.
///
/// Equality compares width as well as value: `0b1` as a 1-bit vector is not
/// equal to `0b01` as a 2-bit vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BitVector {
    bits: u64,
    width: u8,
}

const fn mask(width: usize) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1_u64 << width) - 1
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn checked_width(width: usize) -> Result<u8, BitError> {
    if width > MAX_WIDTH {
        Err(BitError::WidthTooLarge { width })
    } else {
        Ok(width as u8)
    }
}

impl BitVector {
    /// An all-zero vector of `width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::WidthTooLarge`] when `width > MAX_WIDTH`.
    pub const fn zero(width: usize) -> Result<Self, BitError> {
        match checked_width(width) {
            Ok(width) => Ok(Self { bits: 0, width }),
            Err(e) => Err(e),
        }
    }

    /// A 32-bit vector holding `value`.
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self {
            bits: value as u64,
            width: 32,
        }
    }

    /// A 1-bit vector, `1` for `true`.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        Self {
            bits: value as u64,
            width: 1,
        }
    }

    /// Builds a vector from an integer under the requested interpretation.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::ValueOutOfRange`] when `value` is not representable
    /// in `width` bits, or [`BitError::WidthTooLarge`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_int(value: i128, width: usize, signedness: Signedness) -> Result<Self, BitError> {
        let stored = checked_width(width)?;
        let (min, max) = match signedness {
            Signedness::Unsigned => (0, (1_i128 << width) - 1),
            Signedness::Signed if width == 0 => (0, 0),
            Signedness::Signed => (-(1_i128 << (width - 1)), (1_i128 << (width - 1)) - 1),
        };
        if value < min || value > max {
            return Err(BitError::ValueOutOfRange {
                value,
                width,
                signedness,
            });
        }
        Ok(Self {
            bits: (value as u64) & mask(width),
            width: stored,
        })
    }

    /// Unsigned shorthand for [`BitVector::from_int`].
    ///
    /// # Errors
    ///
    /// See [`BitVector::from_int`].
    pub fn from_u64(value: u64, width: usize) -> Result<Self, BitError> {
        Self::from_int(i128::from(value), width, Signedness::Unsigned)
    }

    /// Signed shorthand for [`BitVector::from_int`].
    ///
    /// # Errors
    ///
    /// See [`BitVector::from_int`].
    pub fn from_i64(value: i64, width: usize) -> Result<Self, BitError> {
        Self::from_int(i128::from(value), width, Signedness::Signed)
    }

    /// Keeps the low `width` bits of `value`, discarding the rest.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::WidthTooLarge`] when `width > MAX_WIDTH`.
    pub const fn wrapping(value: u64, width: usize) -> Result<Self, BitError> {
        match checked_width(width) {
            Ok(stored) => Ok(Self {
                bits: value & mask(width),
                width: stored,
            }),
            Err(e) => Err(e),
        }
    }

    /// Parses an MSB-first string of `0`/`1` characters.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidDigit`] on any other character and
    /// [`BitError::WidthTooLarge`] for strings longer than [`MAX_WIDTH`].
    pub fn from_bit_str(text: &str) -> Result<Self, BitError> {
        let mut bits = 0_u64;
        let mut width = 0_usize;
        for (position, found) in text.chars().enumerate() {
            let bit = match found {
                '0' => 0,
                '1' => 1,
                _ => return Err(BitError::InvalidDigit { found, position }),
            };
            width += 1;
            checked_width(width)?;
            bits = (bits << 1) | bit;
        }
        Ok(Self {
            bits,
            width: checked_width(width)?,
        })
    }

    /// Builds a vector from MSB-first bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::WidthTooLarge`] for more than [`MAX_WIDTH`] bits.
    pub fn from_bits(bits: &[bool]) -> Result<Self, BitError> {
        let width = checked_width(bits.len())?;
        let bits = bits
            .iter()
            .fold(0_u64, |acc, bit| (acc << 1) | u64::from(*bit));
        Ok(Self { bits, width })
    }

    /// Number of bits.
    #[must_use]
    pub const fn width(self) -> usize {
        self.width as usize
    }

    /// Returns `true` when every bit is clear.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.bits == 0
    }

    /// Reads bit `index` (LSB-0).
    ///
    /// # Errors
    ///
    /// Returns [`BitError::IndexOutOfBounds`] when `index >= width`.
    pub const fn at(self, index: usize) -> Result<bool, BitError> {
        if index >= self.width() {
            return Err(BitError::IndexOutOfBounds {
                index,
                width: self.width(),
            });
        }
        Ok((self.bits >> index) & 1 == 1)
    }

    /// Extracts bits `start..end` (LSB-0, end exclusive) as a new vector.
    ///
    /// `instruction.slice(0, 7)` is the opcode field.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidSlice`] when `start > end` or `end > width`.
    pub fn slice(self, start: usize, end: usize) -> Result<Self, BitError> {
        if start > end || end > self.width() {
            return Err(BitError::InvalidSlice {
                start,
                end,
                width: self.width(),
            });
        }
        let shifted = u32::try_from(start)
            .ok()
            .and_then(|shift| self.bits.checked_shr(shift))
            .unwrap_or(0);
        Self::wrapping(shifted, end - start)
    }

    /// Widens to `new_width`, padding with zeros or copies of the sign bit.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::NarrowingExtend`] when `new_width < width`.
    pub fn extend(self, new_width: usize, signedness: Signedness) -> Result<Self, BitError> {
        if new_width < self.width() {
            return Err(BitError::NarrowingExtend {
                from: self.width(),
                to: new_width,
            });
        }
        let width = checked_width(new_width)?;
        let negative = signedness.is_signed() && self.width > 0 && self.at(self.width() - 1)?;
        let bits = if negative {
            self.bits | (mask(new_width) & !mask(self.width()))
        } else {
            self.bits
        };
        Ok(Self { bits, width })
    }

    /// Concatenates `parts`, the first being the most-significant chunk.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::WidthTooLarge`] when the total exceeds [`MAX_WIDTH`].
    pub fn join(parts: &[Self]) -> Result<Self, BitError> {
        let total: usize = parts.iter().map(|part| part.width()).sum();
        let width = checked_width(total)?;
        let bits = parts.iter().fold(0_u64, |acc, part| {
            acc.checked_shl(u32::from(part.width)).unwrap_or(0) | part.bits
        });
        Ok(Self { bits, width })
    }

    /// Unsigned value.
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        self.bits
    }

    /// Two's-complement value, taking bit `width - 1` as the sign.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i64(self) -> i64 {
        if self.width == 0 {
            return 0;
        }
        let unused = MAX_WIDTH as u32 - self.width as u32;
        ((self.bits << unused) as i64) >> unused
    }

    /// Integer value under the requested interpretation.
    #[must_use]
    pub const fn to_int(self, signedness: Signedness) -> i128 {
        match signedness {
            Signedness::Unsigned => self.bits as i128,
            Signedness::Signed => self.to_i64() as i128,
        }
    }

    /// Unsigned value as a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::ValueOutOfRange`] when the value needs more than 32 bits.
    pub fn to_u32(self) -> Result<u32, BitError> {
        u32::try_from(self.bits).map_err(|_| BitError::ValueOutOfRange {
            value: i128::from(self.bits),
            width: 32,
            signedness: Signedness::Unsigned,
        })
    }

    /// MSB-first bits.
    #[must_use]
    pub fn to_bits(self) -> Vec<bool> {
        (0..self.width()).rev().map(|i| (self.bits >> i) & 1 == 1).collect()
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.to_bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitVector {
    type Err = BitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bit_str(s)
    }
}
