// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Operation parsing for HLB.
//!
//! Operations follow the source in a state body. Each is selected by its
//! leading word; `copy` takes either an anonymous state or a state name as
//! its input, told apart by the token after `copy`.

use crate::ast::{CopyArgs, OpKind};

use super::options::{COPY_FIELDS, EXEC_FIELDS, MKDIR_FIELDS, MKFILE_FIELDS, RM_FIELDS};
use super::{Lookahead, PResult, Parser, Rule};

/// Operation alternatives, in ordered-choice order.
pub(super) static OP_RULES: &[Rule<OpKind>] = &[
    Rule::new("exec", |p| {
        Ok(OpKind::Exec {
            command: p.expect_string()?,
            option: p.parse_with(EXEC_FIELDS)?,
        })
    }),
    Rule::new("env", |p| {
        Ok(OpKind::Env {
            key: p.expect_string()?,
            value: p.expect_string()?,
        })
    }),
    Rule::new("dir", |p| {
        Ok(OpKind::Dir {
            path: p.expect_string()?,
        })
    }),
    Rule::new("user", |p| {
        Ok(OpKind::User {
            name: p.expect_string()?,
        })
    }),
    Rule::new("mkdir", |p| {
        Ok(OpKind::Mkdir {
            path: p.expect_string()?,
            mode: p.expect_file_mode()?,
            option: p.parse_with(MKDIR_FIELDS)?,
        })
    }),
    Rule::new("mkfile", |p| {
        Ok(OpKind::Mkfile {
            path: p.expect_string()?,
            mode: p.expect_file_mode()?,
            content: p.expect_string()?,
            option: p.parse_with(MKFILE_FIELDS)?,
        })
    }),
    Rule::new("rm", |p| {
        Ok(OpKind::Rm {
            path: p.expect_string()?,
            option: p.parse_with(RM_FIELDS)?,
        })
    }),
    Rule::guarded("copy", Lookahead::State, |p| {
        Ok(OpKind::CopyState {
            input: Box::new(p.parse_state()?),
            args: p.parse_copy_args()?,
        })
    }),
    Rule::guarded("copy", Lookahead::Identifier, |p| {
        Ok(OpKind::Copy {
            input: p.expect_identifier()?,
            args: p.parse_copy_args()?,
        })
    }),
];

impl Parser<'_> {
    /// Parses `<src> <dst> (with ...)?` after the copy input.
    fn parse_copy_args(&mut self) -> PResult<CopyArgs> {
        Ok(CopyArgs {
            src: self.expect_string()?,
            dst: self.expect_string()?,
            option: self.parse_with(COPY_FIELDS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_ok, parse_syntax_err};
    use crate::ast::{
        CopyField, ExecField, MkdirField, MkfileField, NetworkMode, OpKind, RmField, SourceKind,
        WithOption,
    };
    use crate::source_analysis::{Expected, SyntaxErrorKind, TokenClass};

    fn ops(source: &str) -> Vec<OpKind> {
        let ast = parse_ok(source);
        let entry = ast.states().next().expect("one state");
        entry.body.ops.iter().map(|op| op.kind.clone()).collect()
    }

    fn only_op(source: &str) -> OpKind {
        let mut ops = ops(source);
        assert_eq!(ops.len(), 1, "Expected one op in {source:?}");
        ops.remove(0)
    }

    #[test]
    fn parse_simple_ops() {
        let ops = ops(r#"state a {
            scratch
            env "PATH" "/bin"
            dir "/src"
            user "builder"
            rm "/tmp/x"
        }"#);
        assert!(
            matches!(&ops[0], OpKind::Env { key, value } if key.as_str() == "PATH" && value.as_str() == "/bin")
        );
        assert!(matches!(&ops[1], OpKind::Dir { path } if path.as_str() == "/src"));
        assert!(matches!(&ops[2], OpKind::User { name } if name.as_str() == "builder"));
        assert!(matches!(&ops[3], OpKind::Rm { path, option: None } if path.as_str() == "/tmp/x"));
    }

    #[test]
    fn parse_mkfile() {
        match only_op("state a { scratch; mkfile \"/etc/motd\" 0644 \"hello\\n\" }") {
            OpKind::Mkfile {
                path,
                mode,
                content,
                option,
            } => {
                assert_eq!(path.as_str(), "/etc/motd");
                assert_eq!(mode.value, 0o644);
                assert_eq!(content.as_str(), "hello\n");
                assert!(option.is_none());
            }
            other => panic!("Expected mkfile, got {other:?}"),
        }
    }

    #[test]
    fn parse_decimal_mode() {
        match only_op("state a { scratch; mkdir \"/x\" 493 }") {
            OpKind::Mkdir { mode, .. } => assert_eq!(mode.value, 493),
            other => panic!("Expected mkdir, got {other:?}"),
        }
    }

    #[test]
    fn parse_copy_from_anonymous_state() {
        let op = only_op(
            "state a { scratch; copy state { scratch; mkfile \"/f\" 0644 \"hi\" } \"/f\" \"/f\" }",
        );
        match op {
            OpKind::CopyState { input, args } => {
                assert!(input.explicit);
                assert_eq!(input.body.source.kind, SourceKind::Scratch);
                assert_eq!(input.body.ops.len(), 1);
                assert_eq!(args.src.as_str(), "/f");
                assert_eq!(args.dst.as_str(), "/f");
            }
            other => panic!("Expected copy-state, got {other:?}"),
        }
    }

    #[test]
    fn parse_copy_from_named_state() {
        match only_op("state a { scratch; copy other \"/f\" \"/g\" }") {
            OpKind::Copy { input, args } => {
                assert_eq!(input.name.as_str(), "other");
                assert_eq!(args.dst.as_str(), "/g");
            }
            other => panic!("Expected copy, got {other:?}"),
        }
    }

    #[test]
    fn parse_copy_options() {
        match only_op(
            r#"state a { scratch; copy { image "x" } "/" "/" with option {
                followSymlinks; contentsOnly; unpack; createDestPath
                allowWildcard; allowEmptyWildcard; chown "1:1"; createdTime "2020-01-01T00:00:00Z"
            } }"#,
        ) {
            OpKind::CopyState { input, args } => {
                assert!(!input.explicit);
                let fields: Vec<CopyField> = args
                    .option
                    .unwrap()
                    .fields()
                    .iter()
                    .map(|f| f.field.clone())
                    .collect();
                assert_eq!(fields.len(), 8);
                assert_eq!(fields[0], CopyField::FollowSymlinks);
                assert_eq!(fields[5], CopyField::AllowEmptyWildcard);
                assert!(matches!(&fields[6], CopyField::Chown(s) if s.as_str() == "1:1"));
            }
            other => panic!("Expected copy-state, got {other:?}"),
        }
    }

    #[test]
    fn parse_exec_options() {
        match only_op(
            r#"state a { scratch; exec "make" with option {
                readonlyRootfs
                env "CC" "clang"
                network none
                mount { scratch } "/out" with option { tmpfs }
            } }"#,
        ) {
            OpKind::Exec { command, option } => {
                assert_eq!(command.as_str(), "make");
                let option = option.unwrap();
                let fields = option.fields();
                assert_eq!(fields.len(), 4);
                assert_eq!(fields[0].field, ExecField::ReadonlyRootfs);
                assert_eq!(fields[2].field, ExecField::Network(NetworkMode::None));
                assert!(matches!(&fields[3].field, ExecField::MountState { target, .. } if target.as_str() == "/out"));
            }
            other => panic!("Expected exec, got {other:?}"),
        }
    }

    #[test]
    fn parse_mkdir_and_mkfile_and_rm_options() {
        let ops = ops(r#"state a {
            scratch
            mkdir "/a/b" 0755 with option { createParents; chown "root" }
            mkfile "/f" 0600 "" with option { createdTime "now" }
            rm "/x*" with option { allowNotFound; allowWildcard }
        }"#);
        match &ops[0] {
            OpKind::Mkdir {
                option: Some(option),
                ..
            } => assert_eq!(option.fields()[0].field, MkdirField::CreateParents),
            other => panic!("Expected mkdir with options, got {other:?}"),
        }
        match &ops[1] {
            OpKind::Mkfile {
                option: Some(option),
                ..
            } => assert!(matches!(&option.fields()[0].field, MkfileField::CreatedTime(_))),
            other => panic!("Expected mkfile with options, got {other:?}"),
        }
        match &ops[2] {
            OpKind::Rm {
                option: Some(option),
                ..
            } => assert_eq!(option.fields()[1].field, RmField::AllowWildcard),
            other => panic!("Expected rm with options, got {other:?}"),
        }
    }

    #[test]
    fn parse_named_option_on_op() {
        match only_op("state a { scratch; exec \"ls\" with execopts }") {
            OpKind::Exec {
                option: Some(WithOption::Named(name)),
                ..
            } => assert_eq!(name.name.as_str(), "execopts"),
            other => panic!("Expected exec with a named option, got {other:?}"),
        }
    }

    #[test]
    fn error_copy_input() {
        let error = parse_syntax_err("state a { scratch; copy \"/f\" \"/g\" }");
        assert_eq!(
            error.expected(),
            &[
                Expected::Literal("state"),
                Expected::Literal("{"),
                Expected::Class(TokenClass::Identifier),
            ]
        );
    }

    #[test]
    fn error_mode_must_be_integer() {
        let error = parse_syntax_err("state a { scratch; mkdir \"/x\" \"0755\" }");
        assert_eq!(error.expected(), &[Expected::Class(TokenClass::Integer)]);
    }

    #[test]
    fn error_mode_out_of_range() {
        let error = parse_syntax_err("state a { scratch; mkdir \"/x\" 99999999999 }");
        assert_eq!(
            error.kind,
            SyntaxErrorKind::InvalidInteger("99999999999".into())
        );
    }
}
