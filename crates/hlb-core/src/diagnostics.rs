// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Position-accurate error diagnostics using miette.
//!
//! Converts lexical and syntax errors into [`Diagnostic`]s with:
//! - The message and its line/column position
//! - The text of the offending line, recovered from the [`SourceBuffer`]
//! - A rendered report pointing at the offending column, plain or coloured
//!
//! Rendering is deterministic: the same buffer and error always produce the
//! same report.

use std::fmt;

use miette::{
    GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode, SourceSpan,
};
use thiserror::Error;

use crate::source_analysis::{
    Expected, LexError, ParseError, Position, SourceBuffer, Span, SyntaxError,
};

/// Which stage rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// The tokenizer found input matching no token class.
    Lexical,
    /// The parser found tokens in an invalid order.
    Syntax,
}

impl DiagnosticKind {
    /// The diagnostic code shown in reports.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Lexical => "hlb::lexical",
            Self::Syntax => "hlb::syntax",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical error"),
            Self::Syntax => write!(f, "syntax error"),
        }
    }
}

/// A rendered, position-accurate description of a failed parse.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Diagnostic {
    kind: DiagnosticKind,
    message: String,
    label: String,
    source_name: String,
    position: Position,
    span: Span,
    line_text: String,
    expected: Vec<Expected>,
    rendered: String,
    named_source: NamedSource<String>,
}

impl Diagnostic {
    /// Returns whether this is a lexical or syntax diagnostic.
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// The one-line error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The name the input was given (a path, or `<stdin>`).
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Line, column and byte offset of the first offending character.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// 1-based line of the error.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.position.line
    }

    /// 1-based column of the error, in characters.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.position.column
    }

    /// Byte range of the offending token or character.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// The full text of the offending line.
    #[must_use]
    pub fn line_text(&self) -> &str {
        &self.line_text
    }

    /// What the parser would have accepted (empty for lexical errors).
    #[must_use]
    pub fn expected(&self) -> &[Expected] {
        &self.expected
    }

    /// The report: message, source line and a pointer at the column.
    #[must_use]
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.named_source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span: SourceSpan = self.span.into();
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.label.clone()),
            span,
        ))))
    }
}

/// Builds the diagnostic for a tokenizer failure.
#[must_use]
pub fn lexical_diagnostic(
    buffer: &SourceBuffer,
    error: &LexError,
    source_name: &str,
    color: bool,
) -> Diagnostic {
    build(
        DiagnosticKind::Lexical,
        error.to_string(),
        "here".to_string(),
        error.span,
        Vec::new(),
        buffer,
        source_name,
        color,
    )
}

/// Builds the diagnostic for a grammar failure.
#[must_use]
pub fn syntax_diagnostic(
    buffer: &SourceBuffer,
    error: &SyntaxError,
    source_name: &str,
    color: bool,
) -> Diagnostic {
    let label = match error.expected() {
        [] => "here".to_string(),
        [single] => format!("expected {single}"),
        _ => "unexpected token".to_string(),
    };
    build(
        DiagnosticKind::Syntax,
        error.to_string(),
        label,
        error.span,
        error.expected().to_vec(),
        buffer,
        source_name,
        color,
    )
}

/// Builds the diagnostic for either kind of parse error.
#[must_use]
pub fn diagnose(
    buffer: &SourceBuffer,
    error: &ParseError,
    source_name: &str,
    color: bool,
) -> Diagnostic {
    match error {
        ParseError::Lex(error) => lexical_diagnostic(buffer, error, source_name, color),
        ParseError::Syntax(error) => syntax_diagnostic(buffer, error, source_name, color),
    }
}

#[expect(
    clippy::too_many_arguments,
    reason = "private constructor shared by both diagnostic kinds"
)]
fn build(
    kind: DiagnosticKind,
    message: String,
    label: String,
    span: Span,
    expected: Vec<Expected>,
    buffer: &SourceBuffer,
    source_name: &str,
    color: bool,
) -> Diagnostic {
    let position = buffer.position(span.start());
    let line_text = buffer
        .line(position.line as usize)
        .map(|line| line.into_owned())
        .unwrap_or_default();
    let mut diagnostic = Diagnostic {
        kind,
        message,
        label,
        source_name: source_name.to_string(),
        position,
        span,
        line_text,
        expected,
        rendered: String::new(),
        named_source: NamedSource::new(source_name, buffer.to_offset_text().into_owned()),
    };
    diagnostic.rendered = render(&diagnostic, color);
    diagnostic
}

/// Renders the report, falling back to a one-line form if miette fails.
fn render(diagnostic: &Diagnostic, color: bool) -> String {
    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme).with_links(false);
    let mut out = String::new();
    match handler.render_report(&mut out, diagnostic) {
        Ok(()) => out,
        Err(_) => format!(
            "{}:{}: {}\n{}\n",
            diagnostic.source_name, diagnostic.position, diagnostic.message, diagnostic.line_text
        ),
    }
}
