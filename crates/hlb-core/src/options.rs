// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Configuration for [`crate::parse`].
//!
//! Options only affect how failures are reported, never what is parsed.

use std::fmt;
use std::io::{self, Write};

/// The source name used when none is given.
pub const DEFAULT_SOURCE_NAME: &str = "<stdin>";

/// Output streams and rendering switches for a parse.
///
/// # Example
///
/// ```
/// use hlb_core::ParseOptions;
///
/// let mut options = ParseOptions::new()
///     .with_source_name("build.hlb")
///     .with_color(false)
///     .with_stderr(Vec::new());
/// assert_eq!(options.source_name(), "build.hlb");
/// ```
pub struct ParseOptions {
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    color: bool,
    source_name: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("color", &self.color)
            .field("source_name", &self.source_name)
            .finish_non_exhaustive()
    }
}

impl ParseOptions {
    /// Options that discard all output and render without colour.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdout: Box::new(io::sink()),
            stderr: Box::new(io::sink()),
            color: false,
            source_name: DEFAULT_SOURCE_NAME.to_string(),
        }
    }

    /// Options with colour decided by the environment.
    ///
    /// `CLICOLOR_FORCE=1` turns colour on unless `NO_COLOR` is set to a
    /// non-empty value.
    #[must_use]
    pub fn from_env() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
        let force = std::env::var_os("CLICOLOR_FORCE").is_some_and(|value| value == "1");
        Self::new().with_color(force && !no_color)
    }

    /// Sets the stream for informational output.
    ///
    /// The parser itself writes nothing here; the stream travels with the
    /// options for tools built on top of it.
    #[must_use]
    pub fn with_stdout(mut self, stdout: impl Write + Send + 'static) -> Self {
        self.stdout = Box::new(stdout);
        self
    }

    /// Sets the stream that receives the rendered diagnostic on failure.
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Write + Send + 'static) -> Self {
        self.stderr = Box::new(stderr);
        self
    }

    /// Enables or disables ANSI colour in rendered diagnostics.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Sets the name shown in diagnostics, usually a file path.
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Whether diagnostics are coloured.
    #[must_use]
    pub fn color(&self) -> bool {
        self.color
    }

    /// The name shown in diagnostics.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The informational output stream.
    pub fn stdout(&mut self) -> &mut (dyn Write + Send) {
        self.stdout.as_mut()
    }

    /// The diagnostic output stream.
    pub fn stderr(&mut self) -> &mut (dyn Write + Send) {
        self.stderr.as_mut()
    }
}
