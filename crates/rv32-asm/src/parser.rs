//! Assembly source parser for labels and instruction statements.
//!
//! This is the front half of pass 1: each source line is tokenized and turned
//! into zero or more [`Statement`]s. Operands stay untyped ([`Argument::Id`] or
//! [`Argument::Num`]) until the rule pass matches them against an instruction
//! shape, so register names and label references look the same here.

use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed column number.
    pub column: usize,
}

/// An untyped operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Register name or label reference.
    Id(String),
    /// Numeric literal.
    Num(i64),
}

/// Shape of an [`Argument`], used when matching instruction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// Identifier.
    Id,
    /// Number.
    Num,
}

impl Argument {
    /// The argument's shape.
    #[must_use]
    pub const fn kind(&self) -> ArgumentKind {
        match self {
            Self::Id(_) => ArgumentKind::Id,
            Self::Num(_) => ArgumentKind::Num,
        }
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id"),
            Self::Num => f.write_str("num"),
        }
    }
}

/// Operand syntax of an instruction statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    /// `mnemonic op1, op2, ...`
    Basic,
    /// `mnemonic rd, imm(rs1)`, with arguments stored as `[rd, imm, rs1]`.
    Displacement,
}

/// A parsed instruction statement, before rule matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// The mnemonic as written.
    pub mnemonic: String,
    /// Arguments in source order.
    pub args: Vec<Argument>,
    /// Operand syntax.
    pub form: Form,
    /// Location of the mnemonic.
    pub location: SourceLocation,
}

/// A single parsed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `name:` declaration.
    Label {
        /// Label name.
        name: String,
        /// Location of the name.
        location: SourceLocation,
    },
    /// Instruction line.
    Instruction(ParsedInstruction),
}

/// Parse error with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Location of the error.
    pub location: SourceLocation,
    /// Kind of parse error.
    pub kind: ParseErrorKind,
}

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Token that does not fit the grammar.
    InvalidSyntax(String),
    /// Line ended while an operand was still expected.
    UnexpectedEnd,
    /// Malformed or overflowing numeric literal.
    InvalidNumber(String),
    /// No instruction rule accepts this mnemonic and argument shape.
    UnknownInstruction {
        /// Mnemonic as written.
        mnemonic: String,
        /// Argument shape, e.g. `id, id, num`.
        shape: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSyntax(s) => write!(f, "invalid syntax: {s}"),
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
            Self::InvalidNumber(n) => write!(f, "invalid number: {n}"),
            Self::UnknownInstruction { mnemonic, shape } if shape.is_empty() => {
                write!(f, "unknown instruction or incorrect args: {mnemonic}")
            }
            Self::UnknownInstruction { mnemonic, shape } => {
                write!(f, "unknown instruction or incorrect args: {mnemonic} {shape}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Number(i64),
    Comma,
    Colon,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "'{name}'"),
            Self::Number(value) => write!(f, "number {value}"),
            Self::Comma => f.write_str("','"),
            Self::Colon => f.write_str("':'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    column: usize,
    len: usize,
}

/// Parses a numeric literal: decimal, `0x`/`0X` hex or `0b`/`0B` binary, with
/// an optional leading `-`.
#[must_use]
pub fn parse_number(text: &str) -> Option<i64> {
    let (negative, body) = text
        .strip_prefix('-')
        .map_or((false, text), |rest| (true, rest));
    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, bin)
    } else {
        (10, body)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '.'
}

const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(text: &str, line: usize) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        let start = i;
        let kind = match c {
            '#' | ';' => break,
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if is_ident_start(c) => {
                while chars.get(i + 1).is_some_and(|&c| is_ident_continue(c)) {
                    i += 1;
                }
                TokenKind::Ident(chars[start..=i].iter().collect())
            }
            c if c.is_ascii_digit() || c == '-' => {
                while chars.get(i + 1).is_some_and(char::is_ascii_alphanumeric) {
                    i += 1;
                }
                let literal: String = chars[start..=i].iter().collect();
                let value = parse_number(&literal).ok_or_else(|| ParseError {
                    location: SourceLocation {
                        line,
                        column: start + 1,
                    },
                    kind: ParseErrorKind::InvalidNumber(literal.clone()),
                })?;
                TokenKind::Number(value)
            }
            other => {
                return Err(ParseError {
                    location: SourceLocation {
                        line,
                        column: start + 1,
                    },
                    kind: ParseErrorKind::InvalidSyntax(format!("unexpected character '{other}'")),
                });
            }
        };
        i += 1;
        tokens.push(Token {
            kind,
            column: start + 1,
            len: i - start,
        });
    }

    Ok(tokens)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    position: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    const fn new(tokens: &'a [Token], line: usize) -> Self {
        Self {
            tokens,
            position: 0,
            line,
        }
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.position).map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    const fn location(&self, column: usize) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column,
        }
    }

    fn unexpected_end(&self) -> ParseError {
        let column = self
            .tokens
            .last()
            .map_or(1, |token| token.column + token.len);
        ParseError {
            location: self.location(column),
            kind: ParseErrorKind::UnexpectedEnd,
        }
    }

    fn syntax(&self, token: &Token, expected: &str) -> ParseError {
        ParseError {
            location: self.location(token.column),
            kind: ParseErrorKind::InvalidSyntax(format!("expected {expected}, found {}", token.kind)),
        }
    }

    /// Consumes `reg)` after an opening parenthesis.
    fn base_register(&mut self, args: &mut Vec<Argument>) -> Result<(), ParseError> {
        let token = self.advance().ok_or_else(|| self.unexpected_end())?;
        let TokenKind::Ident(name) = &token.kind else {
            return Err(self.syntax(token, "base register"));
        };
        args.push(Argument::Id(name.clone()));
        let token = self.advance().ok_or_else(|| self.unexpected_end())?;
        if token.kind != TokenKind::RParen {
            return Err(self.syntax(token, "')'"));
        }
        Ok(())
    }
}

/// Parses one source line into its labels and optional instruction.
///
/// # Errors
///
/// Returns a `ParseError` for characters outside the grammar, malformed
/// numbers, misplaced punctuation, or a line that ends mid-operand.
pub fn parse_line(text: &str, line_number: usize) -> Result<Vec<Statement>, ParseError> {
    let tokens = tokenize(text, line_number)?;
    let mut cursor = Cursor::new(&tokens, line_number);
    let mut statements = Vec::new();

    while let (Some(TokenKind::Ident(name)), Some(TokenKind::Colon)) = (
        tokens.get(cursor.position).map(|t| &t.kind),
        tokens.get(cursor.position + 1).map(|t| &t.kind),
    ) {
        statements.push(Statement::Label {
            name: name.clone(),
            location: cursor.location(tokens[cursor.position].column),
        });
        cursor.position += 2;
    }

    let Some(token) = cursor.advance() else {
        return Ok(statements);
    };
    let TokenKind::Ident(mnemonic) = &token.kind else {
        return Err(cursor.syntax(token, "label or mnemonic"));
    };
    let location = cursor.location(token.column);

    let mut args = Vec::new();
    let mut form = Form::Basic;
    if cursor.peek_kind().is_some() {
        loop {
            let token = cursor.advance().ok_or_else(|| cursor.unexpected_end())?;
            match &token.kind {
                TokenKind::Ident(name) => args.push(Argument::Id(name.clone())),
                TokenKind::Number(value) => {
                    args.push(Argument::Num(*value));
                    if cursor.peek_kind() == Some(&TokenKind::LParen) {
                        cursor.advance();
                        cursor.base_register(&mut args)?;
                        form = Form::Displacement;
                    }
                }
                TokenKind::LParen => {
                    args.push(Argument::Num(0));
                    cursor.base_register(&mut args)?;
                    form = Form::Displacement;
                }
                _ => return Err(cursor.syntax(token, "operand")),
            }
            match cursor.advance() {
                None => break,
                Some(token) if token.kind == TokenKind::Comma && form == Form::Basic => {}
                Some(token) if form == Form::Displacement => {
                    return Err(cursor.syntax(token, "end of line after displacement operand"));
                }
                Some(token) => return Err(cursor.syntax(token, "',' or end of line")),
            }
        }
    }

    statements.push(Statement::Instruction(ParsedInstruction {
        mnemonic: mnemonic.clone(),
        args,
        form,
        location,
    }));
    Ok(statements)
}

/// Parses a whole program, line by line.
///
/// # Errors
///
/// Returns the first `ParseError` encountered.
pub fn parse_program(source: &str) -> Result<Vec<Statement>, ParseError> {
    let mut statements = Vec::new();
    for (index, line) in source.lines().enumerate() {
        statements.extend(parse_line(line, index + 1)?);
    }
    Ok(statements)
}
