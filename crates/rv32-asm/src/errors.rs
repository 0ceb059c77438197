//! Structured error reporting for assembler phases.
//!
//! Each phase has its own error type ([`ParseError`], [`SymbolError`],
//! [`EncodeError`]); [`AssemblerError`] unifies them with a source location.
//!
//! # Error Format
//!
//! Errors format to stderr in the standard style, followed by a preview of the
//! offending line when the source text is available:
//! ```text
//! prog.s:3:9: error: unknown register: x99
//!     3 | add x1, x99, x2
//!       | ^
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::encoder::EncodeError;
use crate::parser::ParseError;
use crate::symbols::SymbolError;

/// A source location for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    /// File path, when assembling from a file.
    pub file: Option<PathBuf>,
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed column number (1 if unknown).
    pub column: usize,
}

impl SourceLoc {
    /// Creates a location with no file.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    /// Formats as `file:line:column`, or `line:column` without a file.
    #[must_use]
    pub fn format_location(&self) -> String {
        match &self.file {
            Some(file) => format!("{}:{}:{}", file.display(), self.line, self.column),
            None => format!("{}:{}", self.line, self.column),
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_location())
    }
}

/// A unified assembler error with source context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerError {
    /// The kind of error.
    pub kind: AssemblerErrorKind,
    /// Source location if available.
    pub location: Option<SourceLoc>,
}

impl AssemblerError {
    /// Creates a new assembler error.
    #[must_use]
    pub const fn new(kind: AssemblerErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Attaches the file the source came from.
    #[must_use]
    pub fn with_file(mut self, path: &Path) -> Self {
        if let Some(location) = &mut self.location {
            location.file = Some(path.to_path_buf());
        }
        self
    }

    /// Formats the error for stderr output.
    ///
    /// With `source`, the offending line is echoed beneath the message with a
    /// caret under the reported column.
    #[must_use]
    pub fn format_for_stderr(&self, source: Option<&str>) -> String {
        let Some(location) = &self.location else {
            return format!("error: {}", self.kind);
        };
        let mut out = format!("{}: error: {}", location.format_location(), self.kind);
        let text = source.and_then(|source| source.lines().nth(location.line.checked_sub(1)?));
        if let Some(text) = text {
            let gutter = location.line.to_string();
            let pad = " ".repeat(gutter.len());
            let caret = " ".repeat(location.column.saturating_sub(1));
            out.push_str(&format!("\n    {gutter} | {text}\n    {pad} | {caret}^"));
        }
        out
    }
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AssemblerError {}

impl From<ParseError> for AssemblerError {
    fn from(e: ParseError) -> Self {
        Self {
            location: Some(SourceLoc::new(e.location.line, e.location.column)),
            kind: AssemblerErrorKind::Parse(e),
        }
    }
}

impl From<SymbolError> for AssemblerError {
    fn from(e: SymbolError) -> Self {
        Self {
            location: Some(SourceLoc::new(e.line, e.column)),
            kind: AssemblerErrorKind::Symbol(e),
        }
    }
}

impl From<EncodeError> for AssemblerError {
    fn from(e: EncodeError) -> Self {
        Self {
            location: Some(SourceLoc::new(e.location.line, e.location.column)),
            kind: AssemblerErrorKind::Encode(e),
        }
    }
}

/// Classification of assembler errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblerErrorKind {
    /// Syntax, numeric literal or instruction-shape error.
    Parse(ParseError),
    /// Symbol table error (duplicate label).
    Symbol(SymbolError),
    /// Encoding error (unknown register or label, immediate out of range).
    Encode(EncodeError),
    /// I/O error reading source file.
    Io(String),
}

impl fmt::Display for AssemblerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Symbol(e) => write!(f, "{e}"),
            Self::Encode(e) => write!(f, "{e}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}
