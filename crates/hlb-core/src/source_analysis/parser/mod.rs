// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for HLB source code.
//!
//! The parser pulls tokens from a streaming [`Lexer`] with at most two
//! tokens of lookahead and builds an [`Ast`].
//!
//! # Design Philosophy
//!
//! - **Ordered choice** - Each alternative set is a static table of
//!   [`Rule`]s tried top to bottom; the first match commits
//! - **No backtracking** - A failure after commit is never retried against
//!   later rules
//! - **Stop at the first error** - The entries completed before the error
//!   are kept, nothing after it is parsed
//! - **Precise spans** - Every node covers its first through last token
//!
//! # Grammar
//!
//! ```text
//! AST        := (Entry ";"?)*
//! Entry      := "state" Identifier Signature? StateBody
//! Signature  := "(" (Identifier Identifier)* ")"
//! StateBody  := "{" Source ";"? (Op ";"?)* "}"
//! State      := "state"? StateBody
//! OptBlock   := "with" ("option" "{" (Field ";"?)* "}" | Identifier)
//! ```
//!
//! Sources live in `sources.rs`, operations in `operations.rs` and option
//! field vocabularies in `options.rs`.
//!
//! # Usage
//!
//! ```
//! use hlb_core::source_analysis::parse_ast;
//!
//! let outcome = parse_ast("state a { scratch; mkdir \"/x\" 0755 }".as_bytes());
//! assert!(outcome.error.is_none());
//! assert_eq!(outcome.ast.len(), 1);
//! ```

use std::collections::VecDeque;
use std::io::Read;

use ecow::{EcoString, eco_format};
use tracing::trace;

use crate::ast::{Ast, BlockEnd, Entry, FileMode, Identifier, Integer, StringLiteral};

use super::{
    Expected, Lexer, ParseError, SourceBuffer, Span, SyntaxError, SyntaxErrorKind, Token,
    TokenClass, TokenKind,
};

mod operations;
mod options;
mod sources;


/// Maximum nesting depth of state bodies before the parser bails out.
///
/// Each level costs several stack frames (body, op, state), so hostile
/// input such as `copy { copy { copy { ...` must be cut off.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Result type for grammar productions.
pub(super) type PResult<T> = Result<T, ParseError>;

/// Everything a parse produced.
#[derive(Debug)]
pub struct ParseOutcome {
    /// The entries completed before any error.
    pub ast: Ast,
    /// The error that stopped the parse, if any.
    pub error: Option<ParseError>,
    /// The input read, through at least the end of the failing line.
    pub buffer: SourceBuffer,
}

impl ParseOutcome {
    /// Discards the partial AST and the buffer on failure.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the parse.
    pub fn into_result(self) -> Result<Ast, ParseError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.ast),
        }
    }
}

/// Parses HLB source read from `input`.
///
/// Never fails outright: the outcome carries whatever was parsed, the first
/// error, and the captured input for diagnostics.
pub fn parse_ast(input: impl Read) -> ParseOutcome {
    let mut parser = Parser::new(input);
    let mut entries = Vec::new();
    let error = parser.parse_entries(&mut entries).err();
    if let Some(error) = &error {
        parser.lexer.capture_line_at(error.span().start());
    }
    let span = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) => first.span().merge(last.span()),
        _ => Span::default(),
    };
    ParseOutcome {
        ast: Ast::new(entries, span),
        error,
        buffer: parser.lexer.into_buffer(),
    }
}

// ============================================================================
// Rule tables
// ============================================================================

/// A second-token guard on a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Lookahead {
    /// An anonymous state follows: `state` or `{`.
    State,
    /// An identifier follows.
    Identifier,
}

impl Lookahead {
    fn accepts(self, kind: &TokenKind) -> bool {
        match self {
            Self::State => kind.is_state_keyword() || kind == &TokenKind::LeftBrace,
            Self::Identifier => matches!(kind, TokenKind::Identifier(_)),
        }
    }

    fn expected(self) -> &'static [Expected] {
        match self {
            Self::State => &[Expected::Literal("state"), Expected::Literal("{")],
            Self::Identifier => &[Expected::Class(TokenClass::Identifier)],
        }
    }
}

/// One alternative of an ordered choice.
///
/// A rule matches when the current token is the identifier `keyword` and,
/// if a guard is set, the token after it satisfies the guard. `parse` runs
/// after the keyword has been consumed.
pub(super) struct Rule<T> {
    pub(super) keyword: &'static str,
    lookahead: Option<Lookahead>,
    parse: fn(&mut Parser<'_>) -> PResult<T>,
}

impl<T> Rule<T> {
    /// A rule selected by its keyword alone.
    pub(super) const fn new(keyword: &'static str, parse: fn(&mut Parser<'_>) -> PResult<T>) -> Self {
        Self {
            keyword,
            lookahead: None,
            parse,
        }
    }

    /// A rule selected by its keyword and the token after it.
    pub(super) const fn guarded(
        keyword: &'static str,
        lookahead: Lookahead,
        parse: fn(&mut Parser<'_>) -> PResult<T>,
    ) -> Self {
        Self {
            keyword,
            lookahead: Some(lookahead),
            parse,
        }
    }
}

/// The keywords of a rule table, as expectations in table order.
pub(super) fn keywords<T>(rules: &'static [Rule<T>]) -> impl Iterator<Item = Expected> {
    rules.iter().map(|rule| Expected::Literal(rule.keyword))
}

/// Converts an integer literal: a leading `0` followed by more digits means octal.
pub(super) fn integer_value(text: &str) -> Option<u32> {
    match text.strip_prefix('0') {
        Some(octal) if !octal.is_empty() => u32::from_str_radix(octal, 8).ok(),
        _ => text.parse().ok(),
    }
}

/// How a token is named in "unexpected ..." messages.
fn describe_token(kind: &TokenKind) -> EcoString {
    match kind {
        TokenKind::Eof => "end of input".into(),
        TokenKind::String(_) => eco_format!("string {kind}"),
        _ => eco_format!("{:?}", kind.to_string()),
    }
}

// ============================================================================
// Parser
// ============================================================================

/// The parser state.
pub(super) struct Parser<'src> {
    /// Token source; also owns the captured input.
    lexer: Lexer<'src>,
    /// Tokens read but not yet consumed. Never holds more than two.
    lookahead: VecDeque<Token>,
    /// End offset of the last consumed token.
    previous_end: u32,
    /// Current state-body nesting depth.
    nesting_depth: usize,
}

impl<'src> Parser<'src> {
    fn new(input: impl Read + 'src) -> Self {
        Self {
            lexer: Lexer::new(input),
            lookahead: VecDeque::with_capacity(2),
            previous_end: 0,
            nesting_depth: 0,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the token `n` positions ahead, reading it if needed.
    ///
    /// Past the end of input this is the end-of-input token.
    pub(super) fn nth(&mut self, n: usize) -> PResult<&Token> {
        while self.lookahead.len() <= n && !self.lookahead.back().is_some_and(Token::is_eof) {
            let token = self.lexer.next_token()?;
            self.lookahead.push_back(token);
        }
        let index = n.min(self.lookahead.len() - 1);
        Ok(&self.lookahead[index])
    }

    /// Returns the current token.
    pub(super) fn current(&mut self) -> PResult<&Token> {
        self.nth(0)
    }

    /// Consumes and returns the current token. End of input is never consumed.
    pub(super) fn advance(&mut self) -> PResult<Token> {
        let token = self.current()?.clone();
        if !token.is_eof() {
            self.lookahead.pop_front();
            self.previous_end = token.span().end();
        }
        Ok(token)
    }

    /// Checks if the current token is exactly `kind`.
    pub(super) fn check(&mut self, kind: &TokenKind) -> PResult<bool> {
        Ok(self.current()?.kind() == kind)
    }

    /// Checks if the current token is the identifier `word`.
    pub(super) fn at_word(&mut self, word: &str) -> PResult<bool> {
        Ok(self.current()?.kind().is_word(word))
    }

    /// Consumes the current token if it is exactly `kind`.
    pub(super) fn eat(&mut self, kind: &TokenKind) -> PResult<bool> {
        if self.check(kind)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes an optional `;` terminator, reporting whether there was one.
    pub(super) fn eat_terminator(&mut self) -> PResult<bool> {
        self.eat(&TokenKind::Semicolon)
    }

    /// Consumes `kind`, or fails expecting `literal`.
    pub(super) fn expect(&mut self, kind: &TokenKind, literal: &'static str) -> PResult<Token> {
        if self.check(kind)? {
            self.advance()
        } else {
            self.unexpected([Expected::Literal(literal)])
        }
    }

    /// Consumes an identifier.
    pub(super) fn expect_identifier(&mut self) -> PResult<Identifier> {
        let token = self.current()?;
        if let TokenKind::Identifier(name) = token.kind() {
            let identifier = Identifier::new(name.clone(), token.span());
            self.advance()?;
            Ok(identifier)
        } else {
            self.unexpected([Expected::Class(TokenClass::Identifier)])
        }
    }

    /// Consumes a string literal.
    pub(super) fn expect_string(&mut self) -> PResult<StringLiteral> {
        let token = self.current()?;
        if let TokenKind::String(value) = token.kind() {
            let literal = StringLiteral::new(value.clone(), token.span());
            self.advance()?;
            Ok(literal)
        } else {
            self.unexpected([Expected::Class(TokenClass::String)])
        }
    }

    /// Consumes an integer literal that fits in a `u32`.
    pub(super) fn expect_integer(&mut self) -> PResult<Integer> {
        let token = self.current()?.clone();
        let TokenKind::Integer(text) = token.kind() else {
            return self.unexpected([Expected::Class(TokenClass::Integer)]);
        };
        let Some(value) = integer_value(text) else {
            return Err(SyntaxError::new(
                SyntaxErrorKind::InvalidInteger(text.clone()),
                token.span(),
                token.position(),
            )
            .into());
        };
        self.advance()?;
        Ok(Integer {
            value,
            span: token.span(),
        })
    }

    /// Consumes a file mode such as `0644`.
    pub(super) fn expect_file_mode(&mut self) -> PResult<FileMode> {
        let Integer { value, span } = self.expect_integer()?;
        Ok(FileMode { value, span })
    }

    /// Consumes one of a fixed set of words.
    pub(super) fn expect_word<T: Copy>(&mut self, choices: &[(&'static str, T)]) -> PResult<T> {
        for &(word, value) in choices {
            if self.at_word(word)? {
                self.advance()?;
                return Ok(value);
            }
        }
        self.unexpected(choices.iter().map(|&(word, _)| Expected::Literal(word)))
    }

    /// Fails at the current token, listing what would have been accepted.
    ///
    /// Duplicates are removed; first occurrence wins, so the order follows
    /// the grammar.
    pub(super) fn unexpected<T>(
        &mut self,
        expected: impl IntoIterator<Item = Expected>,
    ) -> PResult<T> {
        let mut set: Vec<Expected> = Vec::new();
        for item in expected {
            if !set.contains(&item) {
                set.push(item);
            }
        }
        let token = self.current()?;
        Err(SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken {
                found: describe_token(token.kind()),
                expected: set,
            },
            token.span(),
            token.position(),
        )
        .into())
    }

    /// Creates a span from `start` through the last consumed token.
    pub(super) fn span_from(&self, start: Span) -> Span {
        Span::new(start.start(), self.previous_end.max(start.start()))
    }

    /// Increments the nesting depth, failing at `open` if it exceeds
    /// [`MAX_NESTING_DEPTH`]. Pair with [`Self::leave_nesting`].
    pub(super) fn enter_nesting(&mut self, open: &Token) -> PResult<()> {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            return Err(SyntaxError::new(
                SyntaxErrorKind::NestingTooDeep(MAX_NESTING_DEPTH),
                open.span(),
                open.position(),
            )
            .into());
        }
        self.nesting_depth += 1;
        Ok(())
    }

    /// Decrements the nesting depth (pair with [`Self::enter_nesting`]).
    pub(super) fn leave_nesting(&mut self) {
        debug_assert!(
            self.nesting_depth > 0,
            "leave_nesting called without matching enter_nesting"
        );
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    // ========================================================================
    // Ordered Choice
    // ========================================================================

    /// Tries `rules` top to bottom against the current token.
    ///
    /// Returns `Ok(None)` when no keyword matches, leaving the input
    /// untouched. When a keyword matches but every guard for it fails, the
    /// keyword is consumed and the error lists what the guards accept.
    pub(super) fn choose<T>(&mut self, rules: &'static [Rule<T>]) -> PResult<Option<T>> {
        let word = match self.current()?.kind() {
            TokenKind::Identifier(word) => word.clone(),
            _ => return Ok(None),
        };
        let mut guards: Vec<Expected> = Vec::new();
        for rule in rules.iter().filter(|rule| rule.keyword == word.as_str()) {
            if let Some(lookahead) = rule.lookahead {
                if !lookahead.accepts(self.nth(1)?.kind()) {
                    guards.extend_from_slice(lookahead.expected());
                    continue;
                }
            }
            trace!(keyword = rule.keyword, "committed to alternative");
            self.advance()?;
            return (rule.parse)(self).map(Some);
        }
        if guards.is_empty() {
            Ok(None)
        } else {
            self.advance()?;
            self.unexpected(guards)
        }
    }

    /// Parses `(R ";"?)* "}"` where `R` is any of `rules`.
    ///
    /// `terminated` says whether the token before the sequence was a `;`
    /// (or something after which `;` is not allowed).
    pub(super) fn parse_sequence<T, N>(
        &mut self,
        rules: &'static [Rule<T>],
        mut terminated: bool,
        wrap: impl Fn(T, Span) -> N,
    ) -> PResult<(Vec<N>, BlockEnd)> {
        let mut items = Vec::new();
        loop {
            let start = self.current()?.span();
            if let Some(item) = self.choose(rules)? {
                items.push(wrap(item, self.span_from(start)));
                terminated = self.eat_terminator()?;
                continue;
            }
            if self.check(&TokenKind::RightBrace)? {
                let close = self.advance()?;
                return Ok((items, BlockEnd { span: close.span() }));
            }
            let terminator = (!terminated).then_some(Expected::Literal(";"));
            return self.unexpected(
                terminator
                    .into_iter()
                    .chain(keywords(rules))
                    .chain([Expected::Literal("}")]),
            );
        }
    }

    // ========================================================================
    // Top Level
    // ========================================================================

    /// Parses `(Entry ";"?)*` up to end of input, pushing each completed
    /// entry so that it survives a later error.
    fn parse_entries(&mut self, entries: &mut Vec<Entry>) -> PResult<()> {
        let mut terminated = true;
        loop {
            let (at_end, at_state) = {
                let token = self.current()?;
                (token.is_eof(), token.kind().is_state_keyword())
            };
            if at_end {
                return Ok(());
            }
            if !at_state {
                let terminator = (!terminated).then_some(Expected::Literal(";"));
                return self.unexpected(terminator.into_iter().chain([
                    Expected::Literal("state"),
                    Expected::Class(TokenClass::Eof),
                ]));
            }
            let entry = self.parse_state_entry()?;
            trace!(name = %entry.name.name, ops = entry.body.ops.len(), "parsed state");
            entries.push(Entry::State(entry));
            terminated = self.eat_terminator()?;
        }
    }
}
