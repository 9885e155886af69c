// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Behaviour of the public parse entry points.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use hlb_core::ast::{OpKind, SourceKind};
use hlb_core::diagnostics::DiagnosticKind;
use hlb_core::source_analysis::{Expected, Position, TokenClass};
use hlb_core::unparse::unparse_ast;
use hlb_core::{ParseOptions, parse, parse_str};
use tracing_subscriber::EnvFilter;

/// A reader that hands out one byte per call.
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

/// A writer whose contents can be inspected after it is moved.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const PIPELINE: &str = r#"
// Build, then copy the binary into an empty image.
state build() {
    image "golang:1.22"
    exec "go build -o /out/app" with option { mount { scratch } "/out" }
}

state release() {
    scratch
    copy build "/out/app" "/app"
}

state debug() { from release; user "root" }
"#;

#[test]
fn states_are_entries_in_source_order() {
    let ast = parse_str(PIPELINE, &mut ParseOptions::new()).unwrap();
    let names: Vec<&str> = ast.states().map(|s| s.name.name.as_str()).collect();
    assert_eq!(names, ["build", "release", "debug"]);
}

#[test]
fn canonical_text_reparses_to_the_same_tree() {
    let ast = parse_str(PIPELINE, &mut ParseOptions::new()).unwrap();
    let canonical = unparse_ast(&ast);
    let reparsed = parse_str(&canonical, &mut ParseOptions::new()).unwrap();
    assert_eq!(unparse_ast(&reparsed), canonical);
}

#[test]
fn positions_account_for_comments_and_escapes() {
    let source = "// c\nstate a {\n  image \"a\\\"b\" @ }";
    let failure = parse_str(source, &mut ParseOptions::new()).unwrap_err();
    let diagnostic = failure.diagnostic();
    assert_eq!(diagnostic.kind(), DiagnosticKind::Lexical);
    assert_eq!((diagnostic.line(), diagnostic.column()), (3, 16));
    assert_eq!(diagnostic.line_text(), "  image \"a\\\"b\" @ }");
}

#[test]
fn columns_count_characters_not_bytes() {
    let failure = parse_str("state a { image \"é\" @ }", &mut ParseOptions::new()).unwrap_err();
    assert_eq!(
        failure.diagnostic().position(),
        Position {
            line: 1,
            column: 21,
            offset: 21
        }
    );
}

#[test]
fn missing_exec_argument_expects_a_string() {
    let failure = parse_str("state foo { scratch; exec }", &mut ParseOptions::new()).unwrap_err();
    let diagnostic = failure.diagnostic();
    assert_eq!(diagnostic.kind(), DiagnosticKind::Syntax);
    assert!(diagnostic
        .expected()
        .contains(&Expected::Class(TokenClass::String)));
    assert_eq!(diagnostic.column(), 27);
}

#[test]
fn unterminated_string_points_at_the_quote() {
    let failure =
        parse_str("state foo { image \"busybox }", &mut ParseOptions::new()).unwrap_err();
    let diagnostic = failure.diagnostic();
    assert_eq!(diagnostic.kind(), DiagnosticKind::Lexical);
    assert_eq!(diagnostic.column(), 19);
    assert_eq!(diagnostic.message(), "unterminated string literal");
}

#[test]
fn mkdir_mode_is_octal() {
    let ast = parse_str(
        "state a { scratch; mkdir \"/x\" 0755; }",
        &mut ParseOptions::new(),
    )
    .unwrap();
    let body = &ast.state("a").unwrap().body;
    assert_eq!(body.source.kind, SourceKind::Scratch);
    assert_eq!(body.ops.len(), 1);
    match &body.ops[0].kind {
        OpKind::Mkdir { path, mode, option } => {
            assert_eq!(path.as_str(), "/x");
            assert_eq!(mode.value, 493);
            assert!(option.is_none());
        }
        other => panic!("Expected mkdir, got {other:?}"),
    }
}

#[test]
fn copy_inputs_are_states_or_names() {
    let ast = parse_str(
        r#"state a {
            scratch
            copy state { scratch; mkfile "/f" 0644 "hi" } "/f" "/f"
            copy other "/f" "/f"
        }"#,
        &mut ParseOptions::new(),
    )
    .unwrap();
    let ops = &ast.state("a").unwrap().body.ops;
    assert!(matches!(&ops[0].kind, OpKind::CopyState { input, .. } if input.body.ops.len() == 1));
    assert!(matches!(&ops[1].kind, OpKind::Copy { input, .. } if input.name.as_str() == "other"));
}

#[test]
fn terminators_do_not_change_the_tree() {
    let bare = parse_str(
        "state a { image \"x\" dir \"/\" exec \"ls\" }",
        &mut ParseOptions::new(),
    )
    .unwrap();
    let terminated = parse_str(
        "state a { image \"x\"; dir \"/\"; exec \"ls\"; };",
        &mut ParseOptions::new(),
    )
    .unwrap();
    assert_eq!(unparse_ast(&bare), unparse_ast(&terminated));
}

#[test]
fn one_byte_reads_match_whole_reads() {
    let source = PIPELINE.as_bytes();
    let whole = parse(source, &mut ParseOptions::new()).unwrap();
    let trickled = parse(OneByte(source), &mut ParseOptions::new()).unwrap();
    assert_eq!(whole, trickled);

    let broken = b"state a {\n  scratch\n  exec 42\n}\n";
    let whole = parse(&broken[..], &mut ParseOptions::new()).unwrap_err();
    let trickled = parse(OneByte(broken), &mut ParseOptions::new()).unwrap_err();
    assert_eq!(whole.to_string(), trickled.to_string());
    assert_eq!(trickled.diagnostic().line_text(), "  exec 42");
}

#[test]
fn parses_on_many_threads_agree() {
    let broken = "state a { scratch }\nstate b { scratch; env \"K\" }";
    let expected_ok = parse_str(PIPELINE, &mut ParseOptions::new()).unwrap();
    let expected_err = parse_str(broken, &mut ParseOptions::new())
        .unwrap_err()
        .to_string();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let ok = parse_str(PIPELINE, &mut ParseOptions::new()).unwrap();
                    let err = parse_str(broken, &mut ParseOptions::new())
                        .unwrap_err()
                        .to_string();
                    (ok, err)
                })
            })
            .collect();
        for handle in handles {
            let (ok, err) = handle.join().unwrap();
            assert_eq!(ok, expected_ok);
            assert_eq!(err, expected_err);
        }
    });
}

#[test]
fn failure_is_written_to_stderr() {
    let stderr = Captured::default();
    let stdout = Captured::default();
    let mut options = ParseOptions::new()
        .with_source_name("deploy.hlb")
        .with_stderr(stderr.clone())
        .with_stdout(stdout.clone());

    let failure = parse_str("state a { scratch; rm }", &mut options).unwrap_err();
    let written = stderr.text();
    assert_eq!(written, failure.to_string());
    assert!(written.contains("deploy.hlb"), "{written}");
    assert!(written.contains("state a { scratch; rm }"), "{written}");
    assert!(stdout.text().is_empty());
}

#[test]
fn success_writes_nothing() {
    let stderr = Captured::default();
    let mut options = ParseOptions::new().with_stderr(stderr.clone());
    parse_str("state a { scratch }", &mut options).unwrap();
    assert!(stderr.text().is_empty());
}

#[test]
fn color_only_changes_rendering() {
    let source = "state a { scratch; user }";
    let plain = parse_str(source, &mut ParseOptions::new()).unwrap_err();
    let colored = parse_str(source, &mut ParseOptions::new().with_color(true)).unwrap_err();
    assert_eq!(plain.diagnostic().message(), colored.diagnostic().message());
    assert_eq!(plain.diagnostic().position(), colored.diagnostic().position());
    assert!(!plain.to_string().contains('\u{1b}'));
    assert!(colored.to_string().contains('\u{1b}'));
}

#[test]
fn empty_and_comment_only_inputs_are_empty_programs() {
    for source in ["", "   \n\t", "// nothing here\n// at all"] {
        let ast = parse_str(source, &mut ParseOptions::new()).unwrap();
        assert!(ast.is_empty(), "{source:?}");
    }
}

#[test]
fn parse_outcomes_are_traced() {
    let logs = Captured::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("hlb_core=trace"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut options = ParseOptions::new().with_source_name("traced.hlb");
        parse_str("state a { scratch }", &mut options).unwrap();
        parse_str("state b { scratch; exec }", &mut options).unwrap_err();
    });

    let text = logs.text();
    assert!(text.contains("committed to alternative"), "{text}");
    assert!(text.contains("parsed"), "{text}");
    assert!(text.contains("parse failed"), "{text}");
    assert!(text.contains("traced.hlb"), "{text}");
}
