//! Top-level assembler pipeline.
//!
//! 1. **Pass 1**: parsing, rule matching and label assignment
//!    ([`parse_program`], [`assign`])
//! 2. **Pass 2**: encoding each real instruction to a machine word
//!
//! The output keeps the 1-indexed source line of every word so a front end
//! can map the PC back to the text it came from.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::encoder::encode;
use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::parser::parse_program;
use crate::symbols::assign;

/// One machine word and the source line it was assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembledWord {
    /// 1-indexed source line.
    pub line: usize,
    /// Encoded instruction.
    pub word: u32,
}

/// Assembles source text.
///
/// # Errors
///
/// Returns the first error of either pass; no partial output is produced.
pub fn assemble(source: &str) -> Result<Vec<AssembledWord>, AssemblerError> {
    let statements = parse_program(source)?;
    let assignment = assign(&statements)?;

    let words = assignment
        .instructions
        .iter()
        .enumerate()
        .map(|(index, instruction)| {
            Ok(AssembledWord {
                line: instruction.location.line,
                word: encode(instruction, index, &assignment.symbols)?,
            })
        })
        .collect::<Result<Vec<_>, AssemblerError>>()?;

    debug!(words = words.len(), "pass 2 complete");
    Ok(words)
}

/// Reads and assembles a source file.
///
/// # Errors
///
/// Returns [`AssemblerErrorKind::Io`] when the file cannot be read, otherwise
/// as [`assemble`], with the path attached to the error location.
pub fn assemble_file(path: &Path) -> Result<Vec<AssembledWord>, AssemblerError> {
    let source = fs::read_to_string(path).map_err(|e| {
        AssemblerError::new(AssemblerErrorKind::Io(format!("{}: {e}", path.display())))
    })?;
    assemble(&source).map_err(|e| e.with_file(path))
}

/// Machine words without their line numbers.
#[must_use]
pub fn words(assembled: &[AssembledWord]) -> Vec<u32> {
    assembled.iter().map(|word| word.word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_keep_source_lines() {
        let assembled = assemble("# setup\nli a0, 0x12345678\n\nloop: j loop\n").unwrap();
        assert_eq!(
            assembled,
            vec![
                AssembledWord {
                    line: 2,
                    word: 0x1234_5537,
                },
                AssembledWord {
                    line: 2,
                    word: 0x6785_0513,
                },
                AssembledWord {
                    line: 4,
                    word: 0x0000_006F,
                },
            ]
        );
        assert_eq!(
            words(&assembled),
            vec![0x1234_5537, 0x6785_0513, 0x0000_006F]
        );
    }

    #[test]
    fn empty_source_assembles_to_nothing() {
        assert_eq!(assemble(""), Ok(vec![]));
        assert_eq!(assemble("only: # a label\n"), Ok(vec![]));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = assemble_file(Path::new("/nonexistent/prog.s")).unwrap_err();
        assert!(matches!(err.kind, AssemblerErrorKind::Io(_)));
        assert!(err.location.is_none());
    }
}
