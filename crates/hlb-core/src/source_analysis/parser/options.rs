// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Option block parsing for HLB.
//!
//! Sources, operations and some exec fields take a trailing `with` clause:
//! either an inline `with option { ... }` block of fields, or `with name`
//! naming options declared elsewhere. Each construct has its own field
//! vocabulary, kept here as one rule table per vocabulary.

use crate::ast::{
    CacheSharing, CopyField, ExecField, GitField, HttpField, ImageField, MkdirField, MkfileField,
    MountField, NetworkMode, OptionField, RmField, SecretField, SecurityMode, SshField, WithOption,
};
use crate::source_analysis::{Expected, TokenClass, TokenKind};

use super::{Lookahead, PResult, Parser, Rule};

impl Parser<'_> {
    /// Parses an optional `with` clause whose inline fields come from `fields`.
    ///
    /// Syntax:
    /// ```text
    /// with option { <field> ;? ... }
    /// with <name>
    /// ```
    ///
    /// `option` only opens an inline block when `{` follows it; otherwise it
    /// is an ordinary name.
    pub(super) fn parse_with<F>(
        &mut self,
        fields: &'static [Rule<F>],
    ) -> PResult<Option<WithOption<F>>> {
        if !self.at_word("with")? {
            return Ok(None);
        }
        self.advance()?;

        let inline = self.at_word("option")? && self.nth(1)?.kind() == &TokenKind::LeftBrace;
        if inline {
            let start = self.advance()?.span();
            self.advance()?; // {
            let (fields, block_end) =
                self.parse_sequence(fields, true, |field, span| OptionField { field, span })?;
            return Ok(Some(WithOption::Inline {
                fields,
                block_end,
                span: self.span_from(start),
            }));
        }

        if matches!(self.current()?.kind(), TokenKind::Identifier(_)) {
            return Ok(Some(WithOption::Named(self.expect_identifier()?)));
        }
        self.unexpected([
            Expected::Literal("option"),
            Expected::Class(TokenClass::Identifier),
        ])
    }
}

const NETWORK_MODES: &[(&str, NetworkMode)] = &[
    ("unset", NetworkMode::Unset),
    ("host", NetworkMode::Host),
    ("none", NetworkMode::None),
];

const SECURITY_MODES: &[(&str, SecurityMode)] = &[
    ("sandbox", SecurityMode::Sandbox),
    ("insecure", SecurityMode::Insecure),
];

const CACHE_SHARING: &[(&str, CacheSharing)] = &[
    ("shared", CacheSharing::Shared),
    ("private", CacheSharing::Private),
    ("locked", CacheSharing::Locked),
];

// ============================================================================
// Source fields
// ============================================================================

pub(super) static IMAGE_FIELDS: &[Rule<ImageField>] =
    &[Rule::new("resolve", |_| Ok(ImageField::Resolve))];

pub(super) static HTTP_FIELDS: &[Rule<HttpField>] = &[
    Rule::new("checksum", |p| Ok(HttpField::Checksum(p.expect_string()?))),
    Rule::new("chmod", |p| Ok(HttpField::Chmod(p.expect_file_mode()?))),
    Rule::new("filename", |p| Ok(HttpField::Filename(p.expect_string()?))),
];

pub(super) static GIT_FIELDS: &[Rule<GitField>] =
    &[Rule::new("keepGitDir", |_| Ok(GitField::KeepGitDir))];

// ============================================================================
// Exec fields
// ============================================================================

pub(super) static EXEC_FIELDS: &[Rule<ExecField>] = &[
    Rule::new("readonlyRootfs", |_| Ok(ExecField::ReadonlyRootfs)),
    Rule::new("env", |p| {
        Ok(ExecField::Env {
            key: p.expect_string()?,
            value: p.expect_string()?,
        })
    }),
    Rule::new("dir", |p| Ok(ExecField::Dir(p.expect_string()?))),
    Rule::new("user", |p| Ok(ExecField::User(p.expect_string()?))),
    Rule::new("network", |p| {
        Ok(ExecField::Network(p.expect_word(NETWORK_MODES)?))
    }),
    Rule::new("security", |p| {
        Ok(ExecField::Security(p.expect_word(SECURITY_MODES)?))
    }),
    Rule::new("host", |p| {
        Ok(ExecField::Host {
            name: p.expect_string()?,
            address: p.expect_string()?,
        })
    }),
    Rule::new("ssh", |p| Ok(ExecField::Ssh(p.parse_with(SSH_FIELDS)?))),
    Rule::new("secret", |p| {
        Ok(ExecField::Secret {
            path: p.expect_string()?,
            option: p.parse_with(SECRET_FIELDS)?,
        })
    }),
    Rule::guarded("mount", Lookahead::State, |p| {
        Ok(ExecField::MountState {
            input: Box::new(p.parse_state()?),
            target: p.expect_string()?,
            option: p.parse_with(MOUNT_FIELDS)?,
        })
    }),
    Rule::guarded("mount", Lookahead::Identifier, |p| {
        Ok(ExecField::Mount {
            input: p.expect_identifier()?,
            target: p.expect_string()?,
            option: p.parse_with(MOUNT_FIELDS)?,
        })
    }),
];

static SSH_FIELDS: &[Rule<SshField>] = &[
    Rule::new("mountpoint", |p| Ok(SshField::Mountpoint(p.expect_string()?))),
    Rule::new("id", |p| Ok(SshField::Id(p.expect_string()?))),
    Rule::new("uid", |p| Ok(SshField::Uid(p.expect_integer()?))),
    Rule::new("gid", |p| Ok(SshField::Gid(p.expect_integer()?))),
    Rule::new("mode", |p| Ok(SshField::Mode(p.expect_file_mode()?))),
    Rule::new("optional", |_| Ok(SshField::Optional)),
];

static SECRET_FIELDS: &[Rule<SecretField>] = &[
    Rule::new("id", |p| Ok(SecretField::Id(p.expect_string()?))),
    Rule::new("uid", |p| Ok(SecretField::Uid(p.expect_integer()?))),
    Rule::new("gid", |p| Ok(SecretField::Gid(p.expect_integer()?))),
    Rule::new("mode", |p| Ok(SecretField::Mode(p.expect_file_mode()?))),
    Rule::new("optional", |_| Ok(SecretField::Optional)),
];

static MOUNT_FIELDS: &[Rule<MountField>] = &[
    Rule::new("readonly", |_| Ok(MountField::Readonly)),
    Rule::new("tmpfs", |_| Ok(MountField::Tmpfs)),
    Rule::new("source", |p| Ok(MountField::Source(p.expect_string()?))),
    Rule::new("cache", |p| {
        Ok(MountField::Cache {
            id: p.expect_string()?,
            sharing: p.expect_word(CACHE_SHARING)?,
        })
    }),
];

// ============================================================================
// File operation fields
// ============================================================================

pub(super) static MKDIR_FIELDS: &[Rule<MkdirField>] = &[
    Rule::new("createParents", |_| Ok(MkdirField::CreateParents)),
    Rule::new("chown", |p| Ok(MkdirField::Chown(p.expect_string()?))),
    Rule::new("createdTime", |p| {
        Ok(MkdirField::CreatedTime(p.expect_string()?))
    }),
];

pub(super) static MKFILE_FIELDS: &[Rule<MkfileField>] = &[
    Rule::new("chown", |p| Ok(MkfileField::Chown(p.expect_string()?))),
    Rule::new("createdTime", |p| {
        Ok(MkfileField::CreatedTime(p.expect_string()?))
    }),
];

pub(super) static RM_FIELDS: &[Rule<RmField>] = &[
    Rule::new("allowNotFound", |_| Ok(RmField::AllowNotFound)),
    Rule::new("allowWildcard", |_| Ok(RmField::AllowWildcard)),
];

pub(super) static COPY_FIELDS: &[Rule<CopyField>] = &[
    Rule::new("followSymlinks", |_| Ok(CopyField::FollowSymlinks)),
    Rule::new("contentsOnly", |_| Ok(CopyField::ContentsOnly)),
    Rule::new("unpack", |_| Ok(CopyField::Unpack)),
    Rule::new("createDestPath", |_| Ok(CopyField::CreateDestPath)),
    Rule::new("allowWildcard", |_| Ok(CopyField::AllowWildcard)),
    Rule::new("allowEmptyWildcard", |_| Ok(CopyField::AllowEmptyWildcard)),
    Rule::new("chown", |p| Ok(CopyField::Chown(p.expect_string()?))),
    Rule::new("createdTime", |p| {
        Ok(CopyField::CreatedTime(p.expect_string()?))
    }),
];
