// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for HLB lexical analysis.
//!
//! Each token consists of:
//! - A [`TokenKind`] indicating the type of token
//! - A [`Span`] with its byte range in the source
//! - A [`Position`] with the 1-based line and column of its first character
//!
//! Whitespace and comments never become tokens.

use std::fmt;

use ecow::EcoString;

use super::{Position, Span};

/// The kind of token, not including source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The reserved word `state`.
    Keyword(EcoString),

    /// An identifier: `foo`, `exec`, `keepGitDir`
    ///
    /// Words such as `exec` or `scratch` are ordinary identifiers; the
    /// grammar matches them by text.
    Identifier(EcoString),

    /// An unsigned integer literal, kept as written: `0755`, `1000`
    Integer(EcoString),

    /// A quoted string with quotes removed and escapes resolved.
    String(EcoString),

    /// Left brace: `{`
    LeftBrace,

    /// Right brace: `}`
    RightBrace,

    /// Statement terminator: `;`
    Semicolon,

    /// Left parenthesis: `(`
    LeftParen,

    /// Right parenthesis: `)`
    RightParen,

    /// Comma: `,`
    Comma,

    /// End of input
    Eof,
}

/// The lexical class of a token, used to describe what the parser expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// The `state` keyword.
    Keyword,
    /// Any identifier.
    Identifier,
    /// Any integer literal.
    Integer,
    /// Any string literal.
    String,
    /// One of `{ } ; ( ) ,`.
    Operator,
    /// End of input.
    Eof,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword => write!(f, "<keyword>"),
            Self::Identifier => write!(f, "<ident>"),
            Self::Integer => write!(f, "<int>"),
            Self::String => write!(f, "<string>"),
            Self::Operator => write!(f, "<operator>"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

impl TokenKind {
    /// Returns the lexical class of this token.
    #[must_use]
    pub const fn class(&self) -> TokenClass {
        match self {
            Self::Keyword(_) => TokenClass::Keyword,
            Self::Identifier(_) => TokenClass::Identifier,
            Self::Integer(_) => TokenClass::Integer,
            Self::String(_) => TokenClass::String,
            Self::LeftBrace
            | Self::RightBrace
            | Self::Semicolon
            | Self::LeftParen
            | Self::RightParen
            | Self::Comma => TokenClass::Operator,
            Self::Eof => TokenClass::Eof,
        }
    }

    /// Returns `true` if this is the identifier `word`.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Self::Identifier(name) if name == word)
    }

    /// Returns `true` if this is the `state` keyword.
    #[must_use]
    pub fn is_state_keyword(&self) -> bool {
        matches!(self, Self::Keyword(word) if word == "state")
    }

    /// Returns `true` if this is the end-of-input marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns the string content if this token carries one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Keyword(s) | Self::Identifier(s) | Self::Integer(s) | Self::String(s) => Some(s),
            Self::LeftBrace
            | Self::RightBrace
            | Self::Semicolon
            | Self::LeftParen
            | Self::RightParen
            | Self::Comma
            | Self::Eof => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(s) | Self::Identifier(s) | Self::Integer(s) => write!(f, "{s}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::Semicolon => write!(f, ";"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::Comma => write!(f, ","),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}

/// A token with its source location.
///
/// # Examples
///
/// ```
/// use hlb_core::source_analysis::{Position, Span, Token, TokenKind};
///
/// let token = Token::new(
///     TokenKind::Identifier("exec".into()),
///     Span::new(0, 4),
///     Position::START,
/// );
/// assert!(token.kind().is_word("exec"));
/// assert_eq!(token.text(), "exec");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    span: Span,
    position: Position,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, position: Position) -> Self {
        Self {
            kind,
            span,
            position,
        }
    }

    /// Returns the kind of this token.
    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Consumes the token and returns its kind.
    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// Returns the source span of this token.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns the line/column position of the token's first character.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns the token text as the parser sees it.
    ///
    /// String tokens return their unquoted value; operators their symbol.
    #[must_use]
    pub fn text(&self) -> EcoString {
        match self.kind.as_str() {
            Some(text) => text.into(),
            None if self.kind.is_eof() => EcoString::new(),
            None => self.kind.to_string().into(),
        }
    }

    /// Returns `true` if this is the end-of-input marker.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.kind.is_eof()
    }
}
