//! Ordered first-match truth tables over bit patterns.
//!
//! Every control decision in the datapath is a [`TruthTable`]: an ordered list
//! of rows, each holding one MSB-first pattern per input plus an output. A
//! pattern character is `0`, `1`, or a don't-care (`x` or `-`). Lookup returns
//! the output of the first row whose every pattern accepts its input, so a
//! broad row placed last acts as the default. A lookup that matches nothing is
//! an error naming the inputs, never a silent default.

use thiserror::Error;

use crate::BitVector;

/// Characters accepted as "don't care" in a pattern.
pub const DONT_CARE: [char; 2] = ['x', '-'];

/// Failures raised by truth-table lookup and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TruthTableError {
    /// No row accepted the inputs.
    #[error("no row of truth table `{table}` matches inputs [{}]", .inputs.join(", "))]
    NoMatch {
        /// Table name.
        table: &'static str,
        /// MSB-first rendering of each input.
        inputs: Vec<String>,
    },
    /// A row pattern has the wrong width or an unknown character.
    #[error("row {row} of truth table `{table}` has pattern {pattern:?}, expected {width} of 0/1/x")]
    MalformedPattern {
        /// Table name.
        table: &'static str,
        /// Zero-based row index.
        row: usize,
        /// The offending pattern.
        pattern: String,
        /// Width of the input column.
        width: usize,
    },
}

/// One table row: a pattern per input and the output it selects.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a, T, const N: usize> {
    pattern: [&'a str; N],
    output: T,
}

impl<'a, T, const N: usize> Row<'a, T, N> {
    /// Creates a row.
    pub const fn new(pattern: [&'a str; N], output: T) -> Self {
        Self { pattern, output }
    }

    /// Input patterns, MSB-first.
    pub const fn pattern(&self) -> &[&'a str; N] {
        &self.pattern
    }

    /// Output selected by this row.
    pub const fn output(&self) -> &T {
        &self.output
    }

    fn accepts(&self, inputs: &[BitVector; N]) -> bool {
        self.pattern
            .iter()
            .zip(inputs)
            .all(|(pattern, input)| pattern_accepts(pattern, *input))
    }
}

fn pattern_accepts(pattern: &str, input: BitVector) -> bool {
    if pattern.chars().count() != input.width() {
        return false;
    }
    pattern.chars().enumerate().all(|(offset, c)| {
        let bit = input.at(input.width() - 1 - offset);
        match c {
            '0' => bit == Ok(false),
            '1' => bit == Ok(true),
            other => DONT_CARE.contains(&other),
        }
    })
}

fn pattern_is_well_formed(pattern: &str, width: usize) -> bool {
    pattern.chars().count() == width
        && pattern
            .chars()
            .all(|c| c == '0' || c == '1' || DONT_CARE.contains(&c))
}

/// An ordered, named list of rows over `N` inputs.
#[derive(Debug, Clone, Copy)]
pub struct TruthTable<'a, T, const N: usize> {
    name: &'static str,
    rows: &'a [Row<'a, T, N>],
}

impl<'a, T, const N: usize> TruthTable<'a, T, N> {
    /// Creates a table; `name` appears in lookup errors.
    pub const fn new(name: &'static str, rows: &'a [Row<'a, T, N>]) -> Self {
        Self { name, rows }
    }

    /// Table name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Rows in match order.
    pub const fn rows(&self) -> &'a [Row<'a, T, N>] {
        self.rows
    }

    /// Returns the output of the first row accepting `inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`TruthTableError::NoMatch`] when no row applies.
    pub fn lookup(&self, inputs: [BitVector; N]) -> Result<&'a T, TruthTableError> {
        self.rows
            .iter()
            .find(|row| row.accepts(&inputs))
            .map(|row| &row.output)
            .ok_or_else(|| TruthTableError::NoMatch {
                table: self.name,
                inputs: inputs.iter().map(ToString::to_string).collect(),
            })
    }

    /// Checks every pattern against the expected input widths.
    ///
    /// # Errors
    ///
    /// Returns [`TruthTableError::MalformedPattern`] for the first bad pattern.
    pub fn validate(&self, widths: [usize; N]) -> Result<(), TruthTableError> {
        for (row, entry) in self.rows.iter().enumerate() {
            for (pattern, width) in entry.pattern.iter().zip(widths) {
                if !pattern_is_well_formed(pattern, width) {
                    return Err(TruthTableError::MalformedPattern {
                        table: self.name,
                        row,
                        pattern: (*pattern).to_string(),
                        width,
                    });
                }
            }
        }
        Ok(())
    }
}
