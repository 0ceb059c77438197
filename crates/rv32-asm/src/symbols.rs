//! Symbol table and pass-1 instruction assignment.
//!
//! This module implements the first pass of assembly: walking parsed
//! statements, lowering each instruction statement through the rule table,
//! and recording every label as the index of the next real instruction.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::AssemblerError;
use crate::instruction::Instruction;
use crate::parser::Statement;
use crate::rules;

/// A label with its instruction index and definition line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Index of the instruction the label names; not a byte address.
    pub index: usize,
    /// Source line number where the label was defined.
    pub defined_at: usize,
}

/// Symbol table mapping label names to their definitions.
pub type SymbolTable = HashMap<String, Symbol>;

/// Error during symbol table construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolError {
    /// Kind of error.
    pub kind: SymbolErrorKind,
    /// Source line where the error occurred.
    pub line: usize,
    /// Column of the offending label.
    pub column: usize,
}

/// Classification of symbol errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolErrorKind {
    /// Duplicate label definition.
    DuplicateLabel {
        /// The label name.
        name: String,
        /// Line of the first definition.
        first_definition: usize,
    },
}

impl std::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for SymbolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateLabel {
                name,
                first_definition,
            } => {
                write!(
                    f,
                    "duplicate label '{name}' (first defined at line {first_definition})"
                )
            }
        }
    }
}

impl std::error::Error for SymbolError {}

/// Result of pass 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Real instructions in program order.
    pub instructions: Vec<Instruction>,
    /// Label definitions.
    pub symbols: SymbolTable,
}

/// Runs pass 1 over parsed statements.
///
/// A label at the end of the program gets the index one past the last
/// instruction.
///
/// # Errors
///
/// Returns an error for a statement no instruction rule accepts, or for a
/// label defined twice.
pub fn assign(statements: &[Statement]) -> Result<Assignment, AssemblerError> {
    let mut instructions = Vec::new();
    let mut symbols = SymbolTable::new();

    for statement in statements {
        match statement {
            Statement::Label { name, location } => {
                if let Some(existing) = symbols.get(name) {
                    return Err(SymbolError {
                        kind: SymbolErrorKind::DuplicateLabel {
                            name: name.clone(),
                            first_definition: existing.defined_at,
                        },
                        line: location.line,
                        column: location.column,
                    }
                    .into());
                }
                symbols.insert(
                    name.clone(),
                    Symbol {
                        index: instructions.len(),
                        defined_at: location.line,
                    },
                );
            }
            Statement::Instruction(parsed) => instructions.extend(rules::lower(parsed)?),
        }
    }

    debug!(
        instructions = instructions.len(),
        labels = symbols.len(),
        "pass 1 complete"
    );
    Ok(Assignment {
        instructions,
        symbols,
    })
}
