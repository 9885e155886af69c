// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! HLB front end.
//!
//! This crate turns HLB build-pipeline source into an AST:
//! - Lexical analysis (tokenization) over any reader
//! - Parsing (AST construction) by recursive descent
//! - Diagnostics that quote the offending line and point at the column
//! - Canonical printing of an AST back to source
//!
//! Parsing stops at the first error. The entries completed before it are
//! kept, so tools can still show what was understood.

#![doc = include_str!("../../../README.md")]

pub mod ast;
pub mod diagnostics;
pub mod options;
pub mod source_analysis;
pub mod unparse;

use std::io::{Read, Write};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::ast::Ast;
use crate::diagnostics::{Diagnostic, diagnose};
use crate::source_analysis::parse_ast;

pub use crate::options::ParseOptions;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Ast, Entry, Identifier, OpKind, SourceKind, StateEntry};
    pub use crate::diagnostics::{Diagnostic, DiagnosticKind};
    pub use crate::options::ParseOptions;
    pub use crate::source_analysis::{Position, Span};
    pub use crate::{ParseFailure, parse, parse_str};
}

/// A parse that stopped at an error.
///
/// Displays as the rendered diagnostic.
#[derive(Debug, Error)]
#[error("{}", .diagnostic.rendered())]
pub struct ParseFailure {
    diagnostic: Diagnostic,
    partial: Ast,
}

impl ParseFailure {
    /// The diagnostic describing the error.
    #[must_use]
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    /// The entries completed before the error, if there were any.
    #[must_use]
    pub fn partial(&self) -> Option<&Ast> {
        (!self.partial.is_empty()).then_some(&self.partial)
    }

    /// Splits the failure into its diagnostic and partial AST.
    #[must_use]
    pub fn into_parts(self) -> (Diagnostic, Option<Ast>) {
        let partial = (!self.partial.is_empty()).then_some(self.partial);
        (self.diagnostic, partial)
    }
}

/// Parses HLB source read from `input`.
///
/// On failure the rendered diagnostic is also written to the options' stderr
/// stream. Write failures on that stream are ignored; the diagnostic is still
/// returned.
///
/// # Errors
///
/// Returns a [`ParseFailure`] on the first lexical or syntax error.
///
/// # Example
///
/// ```
/// use hlb_core::{ParseOptions, parse};
///
/// let mut options = ParseOptions::new();
/// let ast = parse("state a { scratch }".as_bytes(), &mut options).unwrap();
/// assert_eq!(ast.len(), 1);
/// ```
#[instrument(skip_all, fields(source = %options.source_name()))]
pub fn parse(input: impl Read, options: &mut ParseOptions) -> Result<Ast, ParseFailure> {
    let outcome = parse_ast(input);
    let Some(error) = outcome.error else {
        debug!(entries = outcome.ast.len(), "parsed");
        return Ok(outcome.ast);
    };

    let diagnostic = diagnose(
        &outcome.buffer,
        &error,
        options.source_name(),
        options.color(),
    );
    debug!(
        kind = %diagnostic.kind(),
        line = diagnostic.line(),
        column = diagnostic.column(),
        completed = outcome.ast.len(),
        "parse failed"
    );
    let stderr = options.stderr();
    let _ = stderr.write_all(diagnostic.rendered().as_bytes());
    let _ = stderr.flush();
    Err(ParseFailure {
        diagnostic,
        partial: outcome.ast,
    })
}

/// Parses HLB source held in memory.
///
/// # Errors
///
/// Returns a [`ParseFailure`] on the first lexical or syntax error.
pub fn parse_str(source: &str, options: &mut ParseOptions) -> Result<Ast, ParseFailure> {
    parse(source.as_bytes(), options)
}
