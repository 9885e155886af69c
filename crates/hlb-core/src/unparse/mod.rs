// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! AST unparser: prints an [`Ast`] back as canonical HLB source.
//!
//! The printer builds a [`Document`] per node and renders it once. Canonical
//! text has a fixed layout:
//!
//! - One statement per line, with no `;` terminators
//! - Blocks indented by four spaces
//! - Strings re-escaped, file modes in octal with a leading `0`
//! - Anonymous states keep the `state` keyword only if it was written
//!
//! Parsing canonical text yields the same tree up to spans, so two ASTs are
//! structurally equal exactly when their canonical texts are equal.

pub mod document;

use std::fmt::Write as _;

use crate::ast::{
    Arg, Ast, CopyArgs, CopyField, Entry, ExecField, FileMode, GitField, HttpField, Identifier,
    ImageField, Integer, MkdirField, MkfileField, MountField, Op, OpKind, RmField, SecretField,
    Signature, Source, SourceKind, SshField, State, StateBody, StateEntry, StringLiteral,
    WithOption,
};
use crate::docvec;
use document::{Document, INDENT, join, line, nest, nil};

/// Prints `ast` as canonical HLB source, ending with a newline unless empty.
///
/// # Example
///
/// ```
/// use hlb_core::{ParseOptions, parse_str, unparse::unparse_ast};
///
/// let ast = parse_str("state a { scratch; mkdir \"/x\" 493 }", &mut ParseOptions::new()).unwrap();
/// assert_eq!(unparse_ast(&ast), "state a {\n    scratch\n    mkdir \"/x\" 0755\n}\n");
/// ```
#[must_use]
pub fn unparse_ast(ast: &Ast) -> String {
    if ast.is_empty() {
        return String::new();
    }
    let entries = ast.entries.iter().map(unparse_entry);
    docvec![join(entries, &docvec![line(), line()]), line()].to_pretty_string()
}

/// Prints a single state declaration without a trailing newline.
#[must_use]
pub fn unparse_state_entry(entry: &StateEntry) -> String {
    state_entry_doc(entry).to_pretty_string()
}

// --- Declarations ---

fn unparse_entry(entry: &Entry) -> Document<'static> {
    match entry {
        Entry::State(state) => state_entry_doc(state),
    }
}

fn state_entry_doc(entry: &StateEntry) -> Document<'static> {
    let signature = entry.signature.as_ref().map_or_else(nil, signature_doc);
    docvec![
        "state ",
        ident(&entry.name),
        signature,
        " ",
        body_doc(&entry.body),
    ]
}

fn signature_doc(signature: &Signature) -> Document<'static> {
    let args = signature
        .args
        .iter()
        .map(|Arg { ty, name }| docvec![ident(ty), " ", ident(name)]);
    docvec!["(", join(args, &Document::Str(" ")), ")"]
}

fn state_doc(state: &State) -> Document<'static> {
    let keyword = if state.explicit { "state " } else { "" };
    docvec![keyword, body_doc(&state.body)]
}

fn body_doc(body: &StateBody) -> Document<'static> {
    let mut statements = vec![source_doc(&body.source)];
    statements.extend(body.ops.iter().map(op_doc));
    block(statements)
}

/// `{`, then each statement on its own indented line, then `}`.
fn block(statements: Vec<Document<'static>>) -> Document<'static> {
    let mut inner = Vec::with_capacity(statements.len() * 2);
    for statement in statements {
        inner.push(line());
        inner.push(statement);
    }
    docvec!["{", nest(INDENT, Document::Vec(inner)), line(), "}"]
}

// --- Sources ---

fn source_doc(source: &Source) -> Document<'static> {
    match &source.kind {
        SourceKind::FromState(state) => docvec!["from ", state_doc(state)],
        SourceKind::From(name) => docvec!["from ", ident(name)],
        SourceKind::Scratch => Document::Str("scratch"),
        SourceKind::Image { reference, option } => docvec![
            "image ",
            string(reference),
            with_doc(option.as_ref(), image_field),
        ],
        SourceKind::Http { url, option } => {
            docvec!["http ", string(url), with_doc(option.as_ref(), http_field)]
        }
        SourceKind::Git {
            remote,
            reference,
            option,
        } => docvec![
            "git ",
            string(remote),
            " ",
            string(reference),
            with_doc(option.as_ref(), git_field),
        ],
    }
}

// --- Operations ---

fn op_doc(op: &Op) -> Document<'static> {
    match &op.kind {
        OpKind::Exec { command, option } => {
            docvec!["exec ", string(command), with_doc(option.as_ref(), exec_field)]
        }
        OpKind::Env { key, value } => docvec!["env ", string(key), " ", string(value)],
        OpKind::Dir { path } => docvec!["dir ", string(path)],
        OpKind::User { name } => docvec!["user ", string(name)],
        OpKind::Mkdir { path, mode, option } => docvec![
            "mkdir ",
            string(path),
            " ",
            file_mode(*mode),
            with_doc(option.as_ref(), mkdir_field),
        ],
        OpKind::Mkfile {
            path,
            mode,
            content,
            option,
        } => docvec![
            "mkfile ",
            string(path),
            " ",
            file_mode(*mode),
            " ",
            string(content),
            with_doc(option.as_ref(), mkfile_field),
        ],
        OpKind::Rm { path, option } => {
            docvec!["rm ", string(path), with_doc(option.as_ref(), rm_field)]
        }
        OpKind::CopyState { input, args } => docvec!["copy ", state_doc(input), copy_args(args)],
        OpKind::Copy { input, args } => docvec!["copy ", ident(input), copy_args(args)],
    }
}

fn copy_args(args: &CopyArgs) -> Document<'static> {
    docvec![
        " ",
        string(&args.src),
        " ",
        string(&args.dst),
        with_doc(args.option.as_ref(), copy_field),
    ]
}

// --- Option blocks ---

/// Prints ` with option { ... }` or ` with name`; nothing when absent.
fn with_doc<F>(
    option: Option<&WithOption<F>>,
    field_doc: fn(&F) -> Document<'static>,
) -> Document<'static> {
    match option {
        None => nil(),
        Some(WithOption::Named(name)) => docvec![" with ", ident(name)],
        Some(WithOption::Inline { fields, .. }) => {
            let fields = fields.iter().map(|field| field_doc(&field.field)).collect();
            docvec![" with option ", block(fields)]
        }
    }
}

fn image_field(field: &ImageField) -> Document<'static> {
    match field {
        ImageField::Resolve => Document::Str("resolve"),
    }
}

fn http_field(field: &HttpField) -> Document<'static> {
    match field {
        HttpField::Checksum(digest) => docvec!["checksum ", string(digest)],
        HttpField::Chmod(mode) => docvec!["chmod ", file_mode(*mode)],
        HttpField::Filename(name) => docvec!["filename ", string(name)],
    }
}

fn git_field(field: &GitField) -> Document<'static> {
    match field {
        GitField::KeepGitDir => Document::Str("keepGitDir"),
    }
}

fn exec_field(field: &ExecField) -> Document<'static> {
    match field {
        ExecField::ReadonlyRootfs => Document::Str("readonlyRootfs"),
        ExecField::Env { key, value } => docvec!["env ", string(key), " ", string(value)],
        ExecField::Dir(path) => docvec!["dir ", string(path)],
        ExecField::User(name) => docvec!["user ", string(name)],
        ExecField::Network(mode) => docvec!["network ", mode.as_str()],
        ExecField::Security(mode) => docvec!["security ", mode.as_str()],
        ExecField::Host { name, address } => {
            docvec!["host ", string(name), " ", string(address)]
        }
        ExecField::Ssh(option) => docvec!["ssh", with_doc(option.as_ref(), ssh_field)],
        ExecField::Secret { path, option } => {
            docvec!["secret ", string(path), with_doc(option.as_ref(), secret_field)]
        }
        ExecField::MountState {
            input,
            target,
            option,
        } => docvec![
            "mount ",
            state_doc(input),
            " ",
            string(target),
            with_doc(option.as_ref(), mount_field),
        ],
        ExecField::Mount {
            input,
            target,
            option,
        } => docvec![
            "mount ",
            ident(input),
            " ",
            string(target),
            with_doc(option.as_ref(), mount_field),
        ],
    }
}

fn ssh_field(field: &SshField) -> Document<'static> {
    match field {
        SshField::Mountpoint(path) => docvec!["mountpoint ", string(path)],
        SshField::Id(id) => docvec!["id ", string(id)],
        SshField::Uid(uid) => docvec!["uid ", integer(*uid)],
        SshField::Gid(gid) => docvec!["gid ", integer(*gid)],
        SshField::Mode(mode) => docvec!["mode ", file_mode(*mode)],
        SshField::Optional => Document::Str("optional"),
    }
}

fn secret_field(field: &SecretField) -> Document<'static> {
    match field {
        SecretField::Id(id) => docvec!["id ", string(id)],
        SecretField::Uid(uid) => docvec!["uid ", integer(*uid)],
        SecretField::Gid(gid) => docvec!["gid ", integer(*gid)],
        SecretField::Mode(mode) => docvec!["mode ", file_mode(*mode)],
        SecretField::Optional => Document::Str("optional"),
    }
}

fn mount_field(field: &MountField) -> Document<'static> {
    match field {
        MountField::Readonly => Document::Str("readonly"),
        MountField::Tmpfs => Document::Str("tmpfs"),
        MountField::Source(path) => docvec!["source ", string(path)],
        MountField::Cache { id, sharing } => {
            docvec!["cache ", string(id), " ", sharing.as_str()]
        }
    }
}

fn mkdir_field(field: &MkdirField) -> Document<'static> {
    match field {
        MkdirField::CreateParents => Document::Str("createParents"),
        MkdirField::Chown(owner) => docvec!["chown ", string(owner)],
        MkdirField::CreatedTime(time) => docvec!["createdTime ", string(time)],
    }
}

fn mkfile_field(field: &MkfileField) -> Document<'static> {
    match field {
        MkfileField::Chown(owner) => docvec!["chown ", string(owner)],
        MkfileField::CreatedTime(time) => docvec!["createdTime ", string(time)],
    }
}

fn rm_field(field: &RmField) -> Document<'static> {
    match field {
        RmField::AllowNotFound => Document::Str("allowNotFound"),
        RmField::AllowWildcard => Document::Str("allowWildcard"),
    }
}

fn copy_field(field: &CopyField) -> Document<'static> {
    match field {
        CopyField::FollowSymlinks => Document::Str("followSymlinks"),
        CopyField::ContentsOnly => Document::Str("contentsOnly"),
        CopyField::Unpack => Document::Str("unpack"),
        CopyField::CreateDestPath => Document::Str("createDestPath"),
        CopyField::AllowWildcard => Document::Str("allowWildcard"),
        CopyField::AllowEmptyWildcard => Document::Str("allowEmptyWildcard"),
        CopyField::Chown(owner) => docvec!["chown ", string(owner)],
        CopyField::CreatedTime(time) => docvec!["createdTime ", string(time)],
    }
}

// --- Leaves ---

fn ident(identifier: &Identifier) -> Document<'static> {
    Document::String(identifier.name.to_string())
}

fn integer(integer: Integer) -> Document<'static> {
    Document::String(integer.value.to_string())
}

/// Octal with a leading zero, so the parser reads it back as octal.
fn file_mode(mode: FileMode) -> Document<'static> {
    if mode.value == 0 {
        Document::Str("0")
    } else {
        Document::String(format!("0{:o}", mode.value))
    }
}

fn string(literal: &StringLiteral) -> Document<'static> {
    Document::String(quote(literal.as_str()))
}

/// Quotes `value` so that the lexer reads back exactly `value`.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            '\0' => quoted.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{{{:x}}}", u32::from(c));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
