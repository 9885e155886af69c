// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for HLB.
//!
//! The AST is passive data: the parser builds it, downstream tools (graph
//! compilers, formatters) consume it. No semantic validation happens here;
//! an identifier naming an undefined state is still a well-formed AST.
//!
//! Every node carries a [`Span`] covering its first through last token.
//! The tree is exclusively owned; nesting goes through `Box<State>`.
//!
//! # Example
//!
//! ```ignore
//! // Source: state a { scratch; mkdir "/x" 0755 }
//! Ast {
//!     entries: vec![Entry::State(StateEntry {
//!         name: Identifier { name: "a".into(), span: ... },
//!         signature: None,
//!         body: StateBody {
//!             source: Source { kind: SourceKind::Scratch, span: ... },
//!             ops: vec![Op {
//!                 kind: OpKind::Mkdir { path: ..., mode: FileMode { value: 0o755, .. }, option: None },
//!                 span: ...
//!             }],
//!             ...
//!         },
//!         span: ...
//!     })],
//!     span: ...
//! }
//! ```

use ecow::EcoString;

use crate::source_analysis::Span;

/// The root of a parsed HLB program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    /// Top-level entries in source order.
    pub entries: Vec<Entry>,
    /// Source location spanning all entries.
    pub span: Span,
}

impl Ast {
    /// Creates an AST from its entries.
    #[must_use]
    pub fn new(entries: Vec<Entry>, span: Span) -> Self {
        Self { entries, span }
    }

    /// Iterates over the `state` declarations.
    pub fn states(&self) -> impl Iterator<Item = &StateEntry> {
        self.entries.iter().filter_map(Entry::as_state)
    }

    /// Finds a state declaration by name.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&StateEntry> {
        self.states().find(|state| state.name.name.as_str() == name)
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the program declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A top-level declaration.
///
/// Only `state` declarations exist today. The enum is non-exhaustive so that
/// other declaration kinds can be added without breaking matches downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Entry {
    /// `state name(sig) { ... }`
    State(StateEntry),
}

impl Entry {
    /// Returns the state declaration, if this is one.
    #[must_use]
    pub fn as_state(&self) -> Option<&StateEntry> {
        match self {
            Self::State(state) => Some(state),
        }
    }

    /// Source location of the whole entry, including `state`.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::State(state) => state.span,
        }
    }
}

/// A named state declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    /// The declared name.
    pub name: Identifier,
    /// The parameter list, if written (`()` counts as written).
    pub signature: Option<Signature>,
    /// The state's source and operations.
    pub body: StateBody,
    /// From `state` through the closing brace.
    pub span: Span,
}

/// A parameter list: `(string path fs base)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Parameters in declaration order.
    pub args: Vec<Arg>,
    /// From `(` through `)`.
    pub span: Span,
}

/// One `type name` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub ty: Identifier,
    pub name: Identifier,
}

/// An identifier with its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The identifier text.
    pub name: EcoString,
    /// Source location.
    pub span: Span,
}

impl Identifier {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(name: impl Into<EcoString>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A string literal, unquoted with escapes resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringLiteral {
    pub value: EcoString,
    pub span: Span,
}

impl StringLiteral {
    /// Creates a new string literal.
    #[must_use]
    pub fn new(value: impl Into<EcoString>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }

    /// The literal's value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// An unsigned integer such as a uid or gid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Integer {
    pub value: u32,
    pub span: Span,
}

/// A file permission mode. `0755` in source is octal, so `value` is 493.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode {
    pub value: u32,
    pub span: Span,
}

/// An anonymous state: `state { ... }` or `{ ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Whether the `state` keyword was written.
    pub explicit: bool,
    pub body: StateBody,
    pub span: Span,
}

/// The braced body of a state: one source then zero or more operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBody {
    pub source: Source,
    pub ops: Vec<Op>,
    /// The closing brace.
    pub block_end: BlockEnd,
    /// From `{` through `}`.
    pub span: Span,
}

impl StateBody {
    /// The source the state starts from.
    #[must_use]
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The operations, in application order.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }
}

/// The closing brace of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockEnd {
    pub span: Span,
}

// ============================================================================
// Sources
// ============================================================================

/// Where a state's initial filesystem comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub kind: SourceKind,
    pub span: Span,
}

/// The kinds of source, in the order the grammar tries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// `from state { ... }` or `from { ... }`
    FromState(Box<State>),
    /// `from name`
    From(Identifier),
    /// `scratch`: the empty filesystem.
    Scratch,
    /// `image "alpine"`
    Image {
        reference: StringLiteral,
        option: Option<WithOption<ImageField>>,
    },
    /// `http "https://..."`
    Http {
        url: StringLiteral,
        option: Option<WithOption<HttpField>>,
    },
    /// `git "remote" "ref"`
    Git {
        remote: StringLiteral,
        reference: StringLiteral,
        option: Option<WithOption<GitField>>,
    },
}

// ============================================================================
// Operations
// ============================================================================

/// One transformation applied on top of a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    pub kind: OpKind,
    pub span: Span,
}

/// The kinds of operation, in the order the grammar tries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpKind {
    /// `exec "command"`
    Exec {
        command: StringLiteral,
        option: Option<WithOption<ExecField>>,
    },
    /// `env "KEY" "value"`
    Env {
        key: StringLiteral,
        value: StringLiteral,
    },
    /// `dir "/path"`
    Dir { path: StringLiteral },
    /// `user "name"`
    User { name: StringLiteral },
    /// `mkdir "/path" 0755`
    Mkdir {
        path: StringLiteral,
        mode: FileMode,
        option: Option<WithOption<MkdirField>>,
    },
    /// `mkfile "/path" 0644 "content"`
    Mkfile {
        path: StringLiteral,
        mode: FileMode,
        content: StringLiteral,
        option: Option<WithOption<MkfileField>>,
    },
    /// `rm "/path"`
    Rm {
        path: StringLiteral,
        option: Option<WithOption<RmField>>,
    },
    /// `copy { ... } "src" "dst"`: copy from an inline state.
    CopyState { input: Box<State>, args: CopyArgs },
    /// `copy name "src" "dst"`: copy from a named state.
    Copy { input: Identifier, args: CopyArgs },
}

/// The arguments shared by both forms of `copy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyArgs {
    pub src: StringLiteral,
    pub dst: StringLiteral,
    pub option: Option<WithOption<CopyField>>,
}

// ============================================================================
// Option blocks
// ============================================================================

/// A trailing `with` clause, generic over its field vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithOption<F> {
    /// `with option { field; field }`
    Inline {
        fields: Vec<OptionField<F>>,
        block_end: BlockEnd,
        /// From `option` through `}`.
        span: Span,
    },
    /// `with name`: a reference to options declared elsewhere.
    Named(Identifier),
}

impl<F> WithOption<F> {
    /// The inline fields, or an empty slice for a named reference.
    #[must_use]
    pub fn fields(&self) -> &[OptionField<F>] {
        match self {
            Self::Inline { fields, .. } => fields,
            Self::Named(_) => &[],
        }
    }

    /// Source location of the clause after `with`.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Inline { span, .. } => *span,
            Self::Named(name) => name.span,
        }
    }
}

/// One field inside an inline option block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionField<F> {
    pub field: F,
    pub span: Span,
}

/// Options for `image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageField {
    Resolve,
}

/// Options for `http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpField {
    Checksum(StringLiteral),
    Chmod(FileMode),
    Filename(StringLiteral),
}

/// Options for `git`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitField {
    KeepGitDir,
}

/// Options for `exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecField {
    ReadonlyRootfs,
    Env {
        key: StringLiteral,
        value: StringLiteral,
    },
    Dir(StringLiteral),
    User(StringLiteral),
    Network(NetworkMode),
    Security(SecurityMode),
    Host {
        name: StringLiteral,
        address: StringLiteral,
    },
    /// `ssh`, forwarding the agent socket.
    Ssh(Option<WithOption<SshField>>),
    /// `secret "/local/path"`
    Secret {
        path: StringLiteral,
        option: Option<WithOption<SecretField>>,
    },
    /// `mount { ... } "/target"`
    MountState {
        input: Box<State>,
        target: StringLiteral,
        option: Option<WithOption<MountField>>,
    },
    /// `mount name "/target"`
    Mount {
        input: Identifier,
        target: StringLiteral,
        option: Option<WithOption<MountField>>,
    },
}

/// Network mode for `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkMode {
    Unset,
    Host,
    None,
}

impl NetworkMode {
    /// The keyword for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Host => "host",
            Self::None => "none",
        }
    }
}

/// Security mode for `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityMode {
    Sandbox,
    Insecure,
}

impl SecurityMode {
    /// The keyword for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Insecure => "insecure",
        }
    }
}

/// Options for `ssh` inside `exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshField {
    Mountpoint(StringLiteral),
    Id(StringLiteral),
    Uid(Integer),
    Gid(Integer),
    Mode(FileMode),
    Optional,
}

/// Options for `secret` inside `exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretField {
    Id(StringLiteral),
    Uid(Integer),
    Gid(Integer),
    Mode(FileMode),
    Optional,
}

/// Options for `mount` inside `exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountField {
    Readonly,
    Tmpfs,
    Source(StringLiteral),
    Cache {
        id: StringLiteral,
        sharing: CacheSharing,
    },
}

/// How a cache mount is shared between concurrent builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSharing {
    Shared,
    Private,
    Locked,
}

impl CacheSharing {
    /// The keyword for this sharing mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Private => "private",
            Self::Locked => "locked",
        }
    }
}

/// Options for `mkdir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MkdirField {
    CreateParents,
    Chown(StringLiteral),
    CreatedTime(StringLiteral),
}

/// Options for `mkfile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MkfileField {
    Chown(StringLiteral),
    CreatedTime(StringLiteral),
}

/// Options for `rm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RmField {
    AllowNotFound,
    AllowWildcard,
}

/// Options for `copy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyField {
    FollowSymlinks,
    ContentsOnly,
    Unpack,
    CreateDestPath,
    AllowWildcard,
    AllowEmptyWildcard,
    Chown(StringLiteral),
    CreatedTime(StringLiteral),
}
