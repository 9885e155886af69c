// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexing and parsing of HLB source code.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] pulls bytes from any reader and produces a stream of
//! [`Token`]s. Each token carries a [`Span`] and a [`Position`].
//!
//! ```
//! use hlb_core::source_analysis::Lexer;
//!
//! let tokens: Vec<_> = Lexer::new("state foo() { scratch }".as_bytes()).collect();
//! assert_eq!(tokens.len(), 7);
//! ```
//!
//! # Source Capture
//!
//! Input passes through a [`TeeReader`] that records it into a
//! [`SourceBuffer`], so diagnostics can quote the offending line without
//! re-reading the input.
//!
//! # Parsing
//!
//! [`parse_ast`] converts the token stream into an [`Ast`](crate::ast::Ast)
//! by recursive descent over ordered-choice rule tables. Parsing stops at
//! the first error; see [`crate::parse`] for the entry point that also
//! renders diagnostics.

mod error;
mod lexer;
mod parser;
mod source_buffer;
mod span;
mod token;

#[cfg(test)]
mod lexer_property_tests;

pub use error::{
    Expected, LexError, LexErrorKind, ParseError, SyntaxError, SyntaxErrorKind,
};
pub use lexer::{Lexer, lex, lex_with_eof};
pub use parser::{MAX_NESTING_DEPTH, ParseOutcome, parse_ast};
pub use source_buffer::{SourceBuffer, TeeReader};
pub use span::{Position, Span};
pub use token::{Token, TokenClass, TokenKind};
