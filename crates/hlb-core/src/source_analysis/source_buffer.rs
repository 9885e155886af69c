// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Capture of the raw input for diagnostics.
//!
//! The lexer reads its input through a [`TeeReader`], which appends every
//! byte it hands out to a [`SourceBuffer`]. Diagnostics use the buffer after
//! the fact to recover line text and line/column positions, so the input
//! never has to be seekable (a pipe works as well as a file).
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use hlb_core::source_analysis::TeeReader;
//!
//! let mut tee = TeeReader::new("state a {\n  scratch\n}".as_bytes());
//! let mut sink = String::new();
//! tee.read_to_string(&mut sink).unwrap();
//!
//! let buffer = tee.into_buffer();
//! assert_eq!(buffer.line(2).as_deref(), Some("  scratch"));
//! assert_eq!(buffer.line(4), None);
//! ```

use std::borrow::Cow;
use std::io::{self, Read};

use super::Position;

/// Append-only log of the bytes read so far, indexed by line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
    /// Byte offset of the first byte of each line. Always starts with `0`.
    line_starts: Vec<usize>,
}

impl Default for SourceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            line_starts: vec![0],
        }
    }

    /// Appends a chunk of input.
    pub fn append(&mut self, chunk: &[u8]) {
        let base = self.bytes.len();
        self.line_starts.extend(
            chunk
                .iter()
                .enumerate()
                .filter(|&(_, &byte)| byte == b'\n')
                .map(|(i, _)| base + i + 1),
        );
        self.bytes.extend_from_slice(chunk);
    }

    /// Number of bytes captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing has been captured yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The captured bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The captured input as text, with every byte of an invalid UTF-8
    /// sequence replaced by `?`.
    ///
    /// Byte offsets into the result match offsets into the input, and each
    /// character of the result is one column of [`position`](Self::position).
    #[must_use]
    pub fn to_offset_text(&self) -> Cow<'_, str> {
        offset_text(&self.bytes)
    }

    /// Number of lines captured so far (a trailing partial line counts).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the text of 1-based line `line`, without its line terminator.
    ///
    /// Returns `None` when that line has not been captured. A line that is
    /// still being read is returned as far as it has been captured. Bytes of
    /// invalid UTF-8 sequences read as `?`.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<Cow<'_, str>> {
        let index = line.checked_sub(1)?;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.bytes.len(), |next| next - 1);
        let text = &self.bytes[start..end];
        let text = text.strip_suffix(b"\r").unwrap_or(text);
        Some(offset_text(text))
    }

    /// Converts a byte offset into a line/column position.
    ///
    /// Offsets past the captured input are clamped to its end.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    pub fn position(&self, offset: u32) -> Position {
        let offset = (offset as usize).min(self.bytes.len());
        let index = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[index];
        let column = column_width(&self.bytes[line_start..offset]) + 1;
        Position {
            line: index as u32 + 1,
            column: column as u32,
            offset: offset as u32,
        }
    }
}

fn offset_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        text.extend(std::iter::repeat_n('?', chunk.invalid().len()));
    }
    Cow::Owned(text)
}

/// Columns spanned by `bytes`: one per character, and one per byte of an
/// invalid UTF-8 sequence.
fn column_width(bytes: &[u8]) -> usize {
    bytes
        .utf8_chunks()
        .map(|chunk| chunk.valid().chars().count() + chunk.invalid().len())
        .sum()
}

/// A reader decorator that records everything it reads into a
/// [`SourceBuffer`].
#[derive(Debug)]
pub struct TeeReader<R> {
    inner: R,
    buffer: SourceBuffer,
}

impl<R: Read> TeeReader<R> {
    /// Wraps `inner`, starting with an empty buffer.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: SourceBuffer::new(),
        }
    }

    /// The bytes captured so far.
    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    /// Consumes the reader and returns the captured bytes.
    pub fn into_buffer(self) -> SourceBuffer {
        self.buffer
    }
}

impl<R: Read> Read for TeeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.buffer.append(&buf[..n]);
        Ok(n)
    }
}
