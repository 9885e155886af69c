// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for parser crash safety.
//!
//! Feeds arbitrary bytes, including invalid UTF-8, straight to the parser as
//! a reader. Any outcome is acceptable except a panic. When the parse fails,
//! the diagnostic is built too, since rendering slices the captured buffer
//! at the error position.
//!
//! Seed the corpus in `fuzz/corpus/parse_arbitrary/` with the files from
//! `crates/hlb-core/tests/cases/`.

#![no_main]

use hlb_core::diagnostics::diagnose;
use hlb_core::source_analysis::parse_ast;
use hlb_core::unparse::unparse_ast;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let outcome = parse_ast(data);
    match &outcome.error {
        Some(error) => {
            let _ = diagnose(&outcome.buffer, error, "<fuzz>", false);
        }
        None => {
            let _ = unparse_ast(&outcome.ast);
        }
    }
});
