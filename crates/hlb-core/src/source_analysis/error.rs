// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for the HLB front end.
//!
//! Errors carry source locations ([`Span`] and [`Position`]) so that
//! [`crate::diagnostics`] can render them with source context.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::fmt;

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::{Position, Span, TokenClass};

/// A lexical error: the input at `span` matches no token class.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(hlb::lexical))]
pub struct LexError {
    /// The kind of lexical error.
    #[source]
    pub kind: LexErrorKind,
    /// The source location of the error.
    #[label("here")]
    pub span: Span,
    /// Line and column of the first offending character.
    pub position: Position,
}

impl LexError {
    /// Creates a new lexical error.
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span, position: Position) -> Self {
        Self {
            kind,
            span,
            position,
        }
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    /// A character that cannot start any token.
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),

    /// A byte that is not valid UTF-8.
    #[error("unexpected byte 0x{0:02x}")]
    UnexpectedByte(u8),

    /// A string literal without its closing quote.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// An unknown escape sequence in a string.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(EcoString),

    /// A string literal whose content is not valid UTF-8.
    #[error("string literal is not valid UTF-8")]
    InvalidUtf8,

    /// The underlying reader failed.
    #[error("failed to read input: {0}")]
    Read(EcoString),
}

/// Something the parser would have accepted at the point of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expected {
    /// An exact token text such as `"exec"` or `"}"`.
    Literal(&'static str),
    /// Any token of a lexical class, such as any string.
    Class(TokenClass),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{text:?}"),
            Self::Class(class) => write!(f, "{class}"),
        }
    }
}

/// A grammatical error: well-formed tokens in an invalid order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(hlb::syntax))]
pub struct SyntaxError {
    /// The kind of syntax error.
    pub kind: SyntaxErrorKind,
    /// The offending token.
    #[label("here")]
    pub span: Span,
    /// Line and column of the offending token.
    pub position: Position,
}

impl SyntaxError {
    /// Creates a new syntax error.
    #[must_use]
    pub fn new(kind: SyntaxErrorKind, span: Span, position: Position) -> Self {
        Self {
            kind,
            span,
            position,
        }
    }

    /// The tokens that would have been accepted, if this is an
    /// unexpected-token error.
    #[must_use]
    pub fn expected(&self) -> &[Expected] {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { expected, .. } => expected,
            SyntaxErrorKind::InvalidInteger(_) | SyntaxErrorKind::NestingTooDeep(_) => &[],
        }
    }
}

/// The kind of syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// The next token cannot continue the current production.
    #[error("unexpected {found}, expected {}", describe_expected(expected))]
    UnexpectedToken {
        /// Display form of the token found (`"}"`, `end of input`, ...).
        found: EcoString,
        /// The acceptable tokens, in grammar order, without duplicates.
        expected: Vec<Expected>,
    },

    /// An integer literal that does not fit its field.
    #[error("invalid integer literal {0}: expected a 32-bit unsigned value")]
    InvalidInteger(EcoString),

    /// State bodies nested deeper than the parser allows.
    #[error("states are nested too deeply (maximum {0} levels)")]
    NestingTooDeep(usize),
}

fn describe_expected(expected: &[Expected]) -> String {
    let items: Vec<String> = expected.iter().map(ToString::to_string).collect();
    match items.as_slice() {
        [] => "nothing".to_string(),
        [single] => single.clone(),
        _ => format!("one of {}", items.join(", ")),
    }
}

/// Any error that ends a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The tokenizer failed.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// The token sequence violates the grammar.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl ParseError {
    /// The span of the failure.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Lex(error) => error.span,
            Self::Syntax(error) => error.span,
        }
    }
}
