// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the HLB lexer.
//!
//! 1. **Lexer never panics**: arbitrary input yields tokens or one error
//! 2. **Token spans within input**: every span ends inside the source
//! 3. **Token spans are ordered**: spans never overlap and only move forward
//! 4. **EOF is always last**: `lex_with_eof` ends with exactly one EOF
//! 5. **Chunking is invisible**: one-byte reads give the same tokens
//! 6. **Valid fragments produce no errors**

use std::io::{self, Read};

use proptest::prelude::*;

use super::lexer::{Lexer, lex, lex_with_eof};
use super::token::TokenKind;

// ============================================================================
// Generators
// ============================================================================

/// Known-valid fragments that should lex without errors.
const VALID_FRAGMENTS: &[&str] = &[
    "state",
    "stateful",
    "scratch",
    "image",
    "exec",
    "keepGitDir",
    "0755",
    "1000",
    "\"alpine\"",
    "'single'",
    "\"with \\\"escape\\\"\"",
    "\"multi\nline\"",
    "{",
    "}",
    ";",
    "(",
    ")",
    ",",
    "// comment\n",
    "state foo() { scratch; }",
    "exec \"echo hi\" with option { readonlyRootfs; }",
];

fn valid_fragment() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_FRAGMENTS).prop_map(ToString::to_string)
}

/// Space-separated sequences of valid fragments.
fn valid_sequence() -> impl Strategy<Value = String> {
    prop::collection::vec(valid_fragment(), 0..12).prop_map(|parts| parts.join(" "))
}

/// Reads one byte per call.
struct OneByte<'a>(&'a [u8]);

impl Read for OneByte<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.0;
        match (data.split_first(), buf.first_mut()) {
            (Some((&byte, rest)), Some(slot)) => {
                *slot = byte;
                self.0 = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn lexer_never_panics(input in "\\PC{0,300}") {
        let _ = lex(&input);
    }

    #[test]
    fn lexer_never_panics_on_bytes(input in prop::collection::vec(any::<u8>(), 0..300)) {
        let _: Vec<_> = Lexer::new(input.as_slice()).collect();
    }

    #[test]
    fn token_spans_within_input(input in "\\PC{0,300}") {
        let len = u32::try_from(input.len()).unwrap();
        for token in Lexer::new(input.as_bytes()).map_while(Result::ok) {
            prop_assert!(token.span().end() <= len);
            prop_assert!(token.span().start() <= token.span().end());
        }
        if let Err(error) = lex(&input) {
            prop_assert!(error.span.end() <= len);
        }
    }

    #[test]
    fn token_spans_are_ordered(input in valid_sequence()) {
        let tokens = lex(&input).unwrap();
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].span().end() <= pair[1].span().start());
            prop_assert!(pair[0].position().offset < pair[1].position().offset);
        }
    }

    #[test]
    fn eof_is_always_last(input in valid_sequence()) {
        let tokens = lex_with_eof(&input).unwrap();
        let eofs = tokens.iter().filter(|t| t.is_eof()).count();
        prop_assert_eq!(eofs, 1);
        prop_assert!(tokens.last().is_some_and(|t| t.kind() == &TokenKind::Eof));
    }

    #[test]
    fn one_byte_reads_match_whole_reads(input in "\\PC{0,200}") {
        let whole: Vec<_> = Lexer::new(input.as_bytes()).collect();
        let trickled: Vec<_> = Lexer::new(OneByte(input.as_bytes())).collect();
        prop_assert_eq!(whole, trickled);
    }

    #[test]
    fn valid_fragments_lex_cleanly(input in valid_sequence()) {
        prop_assert!(lex(&input).is_ok(), "failed to lex {:?}", input);
    }
}
