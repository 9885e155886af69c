// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! State and source parsing for HLB.
//!
//! This module handles:
//! - `state` declarations with their optional signature
//! - State bodies: one source, then operations, then `}`
//! - Anonymous states used by `from`, `copy` and `mount`
//! - The source alternatives (`from`, `scratch`, `image`, `http`, `git`)

use crate::ast::{Arg, Op, Signature, Source, SourceKind, State, StateBody, StateEntry};
use crate::source_analysis::{Expected, Span, TokenClass, TokenKind};

use super::operations::OP_RULES;
use super::options::{GIT_FIELDS, HTTP_FIELDS, IMAGE_FIELDS};
use super::{Lookahead, PResult, Parser, Rule, keywords};

/// Source alternatives, in ordered-choice order.
pub(super) static SOURCE_RULES: &[Rule<SourceKind>] = &[
    Rule::guarded("from", Lookahead::State, |p| {
        Ok(SourceKind::FromState(Box::new(p.parse_state()?)))
    }),
    Rule::guarded("from", Lookahead::Identifier, |p| {
        Ok(SourceKind::From(p.expect_identifier()?))
    }),
    Rule::new("scratch", |_| Ok(SourceKind::Scratch)),
    Rule::new("image", |p| {
        Ok(SourceKind::Image {
            reference: p.expect_string()?,
            option: p.parse_with(IMAGE_FIELDS)?,
        })
    }),
    Rule::new("http", |p| {
        Ok(SourceKind::Http {
            url: p.expect_string()?,
            option: p.parse_with(HTTP_FIELDS)?,
        })
    }),
    Rule::new("git", |p| {
        Ok(SourceKind::Git {
            remote: p.expect_string()?,
            reference: p.expect_string()?,
            option: p.parse_with(GIT_FIELDS)?,
        })
    }),
];

impl Parser<'_> {
    // ========================================================================
    // State Declarations
    // ========================================================================

    /// Parses a `state` declaration. The current token is `state`.
    ///
    /// Syntax:
    /// ```text
    /// state <name> (<type> <name> ...)? { <source> <op>* }
    /// ```
    pub(super) fn parse_state_entry(&mut self) -> PResult<StateEntry> {
        let start = self.advance()?.span();
        let name = self.expect_identifier()?;

        let signature = if self.check(&TokenKind::LeftParen)? {
            Some(self.parse_signature()?)
        } else if self.check(&TokenKind::LeftBrace)? {
            None
        } else {
            return self.unexpected([Expected::Literal("("), Expected::Literal("{")]);
        };

        let body = self.parse_state_body()?;
        Ok(StateEntry {
            name,
            signature,
            body,
            span: self.span_from(start),
        })
    }

    /// Parses `( <type> <name> ... )`. Pairs have no separators.
    fn parse_signature(&mut self) -> PResult<Signature> {
        let start = self.advance()?.span();
        let mut args = Vec::new();
        loop {
            if self.eat(&TokenKind::RightParen)? {
                return Ok(Signature {
                    args,
                    span: self.span_from(start),
                });
            }
            if !matches!(self.current()?.kind(), TokenKind::Identifier(_)) {
                return self.unexpected([
                    Expected::Class(TokenClass::Identifier),
                    Expected::Literal(")"),
                ]);
            }
            let ty = self.expect_identifier()?;
            let name = self.expect_identifier()?;
            args.push(Arg { ty, name });
        }
    }

    // ========================================================================
    // State Bodies
    // ========================================================================

    /// Parses an anonymous state: `state { ... }` or `{ ... }`.
    pub(super) fn parse_state(&mut self) -> PResult<State> {
        let start = self.current()?.span();
        let explicit = self.current()?.kind().is_state_keyword();
        if explicit {
            self.advance()?;
        }
        let body = self.parse_state_body()?;
        Ok(State {
            explicit,
            body,
            span: self.span_from(start),
        })
    }

    /// Parses `{ <source> ;? (<op> ;?)* }`.
    pub(super) fn parse_state_body(&mut self) -> PResult<StateBody> {
        let open = self.expect(&TokenKind::LeftBrace, "{")?;
        self.enter_nesting(&open)?;
        let result = self.parse_state_body_contents(open.span());
        self.leave_nesting();
        result
    }

    fn parse_state_body_contents(&mut self, start: Span) -> PResult<StateBody> {
        let source_start = self.current()?.span();
        let Some(kind) = self.choose(SOURCE_RULES)? else {
            return self.unexpected(keywords(SOURCE_RULES));
        };
        let source = Source {
            kind,
            span: self.span_from(source_start),
        };
        let terminated = self.eat_terminator()?;

        let (ops, block_end) =
            self.parse_sequence(OP_RULES, terminated, |kind, span| Op { kind, span })?;

        Ok(StateBody {
            source,
            ops,
            block_end,
            span: self.span_from(start),
        })
    }
}
