// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for HLB source code.
//!
//! The lexer pulls bytes from any [`Read`] through a [`TeeReader`], so the
//! input is consumed exactly once, left to right, and every byte it has seen
//! stays available to diagnostics in the [`SourceBuffer`].
//!
//! # Design Principles
//!
//! - **Streaming**: input is read in chunks only when the next token needs it
//! - **Longest match**: `stateful` is one identifier, not `state` + `ful`
//! - **Precise positions**: every token carries its span, line and column
//! - **Fail fast**: the first byte that starts no token is a [`LexError`]
//!
//! # Example
//!
//! ```
//! use hlb_core::source_analysis::{TokenKind, lex};
//!
//! let tokens = lex("image \"alpine\" // base").unwrap();
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[1].kind(), &TokenKind::String("alpine".into()));
//! ```

use std::io::{self, Read};

use ecow::EcoString;

use super::{
    LexError, LexErrorKind, Position, SourceBuffer, Span, TeeReader, Token, TokenKind,
};

/// Bytes requested from the reader per fill.
const CHUNK_SIZE: usize = 4096;

/// A streaming tokenizer for HLB source.
///
/// Implements [`Iterator`], yielding `Ok(token)` until the input ends or a
/// lexical error occurs; the error, if any, is the last item.
pub struct Lexer<'src> {
    /// The input, recorded into a [`SourceBuffer`] as it is read.
    input: TeeReader<Box<dyn Read + 'src>>,
    /// Current byte offset into the captured input.
    position: usize,
    /// The reader reported end of input.
    exhausted: bool,
    /// A read failure not yet reported as a token error.
    read_error: Option<io::Error>,
    /// The iterator has produced its last item.
    finished: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("captured", &self.input.buffer().len())
            .finish_non_exhaustive()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a lexer reading from `input`.
    pub fn new(input: impl Read + 'src) -> Self {
        Self {
            input: TeeReader::new(Box::new(input)),
            position: 0,
            exhausted: false,
            read_error: None,
            finished: false,
        }
    }

    /// The input captured so far.
    #[must_use]
    pub fn buffer(&self) -> &SourceBuffer {
        self.input.buffer()
    }

    /// Consumes the lexer and returns the captured input.
    #[must_use]
    pub fn into_buffer(self) -> SourceBuffer {
        self.input.into_buffer()
    }

    /// Reads ahead until the line containing byte `offset` is fully captured
    /// (or the input ends), so diagnostics can show the whole line.
    pub fn capture_line_at(&mut self, offset: u32) {
        let start = offset as usize;
        while !self
            .input
            .buffer()
            .as_bytes()
            .get(start..)
            .is_some_and(|rest| rest.contains(&b'\n'))
        {
            if !self.fill() {
                return;
            }
        }
    }

    /// Reads one more chunk. Returns false when nothing more can be read.
    fn fill(&mut self) -> bool {
        if self.exhausted || self.read_error.is_some() {
            return false;
        }
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            match self.input.read(&mut chunk) {
                Ok(0) => {
                    self.exhausted = true;
                    return false;
                }
                Ok(_) => return true,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.read_error = Some(e);
                    return false;
                }
            }
        }
    }

    /// Peeks at the byte `ahead` positions past the current one.
    fn peek_byte_at(&mut self, ahead: usize) -> Option<u8> {
        let index = self.position + ahead;
        while index >= self.input.buffer().len() {
            if !self.fill() {
                return None;
            }
        }
        Some(self.input.buffer().as_bytes()[index])
    }

    /// Peeks at the next byte without consuming it.
    fn peek_byte(&mut self) -> Option<u8> {
        self.peek_byte_at(0)
    }

    /// Consumes the next byte and returns it.
    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.position += 1;
        Some(byte)
    }

    /// Consumes bytes while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while self.peek_byte().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_offset(&self) -> u32 {
        self.position as u32
    }

    /// Returns the current line/column position.
    ///
    /// Derived from the captured buffer so tokens and diagnostics agree.
    fn current_position(&self) -> Position {
        self.input.buffer().position(self.current_offset())
    }

    /// Creates a span from start to the current position.
    fn span_from(&self, start: Position) -> Span {
        Span::new(start.offset, self.current_offset())
    }

    /// Extracts captured text for a span of ASCII token bytes.
    fn text_for(&self, span: Span) -> EcoString {
        String::from_utf8_lossy(&self.input.buffer().as_bytes()[span.as_range()]).into()
    }

    /// Skips whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c') => {
                    self.advance();
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'/') => {
                    self.advance_while(|b| b != b'\n');
                }
                _ => break,
            }
        }
    }

    /// Lexes the next token, returning an `Eof` token at the end of input.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] when the input at the current position starts
    /// no token, or when the underlying reader fails.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let start = self.current_position();

        let kind = match self.peek_byte() {
            None => {
                if let Some(error) = self.read_error.take() {
                    return Err(LexError::new(
                        LexErrorKind::Read(error.to_string().into()),
                        Span::new(start.offset, start.offset),
                        start,
                    ));
                }
                TokenKind::Eof
            }
            Some(byte) => self.lex_token_kind(byte, start)?,
        };

        Ok(Token::new(kind, self.span_from(start), start))
    }

    /// Lexes a token kind based on its first byte.
    fn lex_token_kind(&mut self, byte: u8, start: Position) -> Result<TokenKind, LexError> {
        let kind = match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_identifier_or_keyword(start),
            b'0'..=b'9' => {
                self.advance_while(|b| b.is_ascii_digit());
                TokenKind::Integer(self.text_for(self.span_from(start)))
            }
            b'"' | b'\'' => return self.lex_string(byte, start),
            b'{' => self.single(TokenKind::LeftBrace),
            b'}' => self.single(TokenKind::RightBrace),
            b';' => self.single(TokenKind::Semicolon),
            b'(' => self.single(TokenKind::LeftParen),
            b')' => self.single(TokenKind::RightParen),
            b',' => self.single(TokenKind::Comma),
            _ => return Err(self.unexpected_character(start)),
        };
        Ok(kind)
    }

    /// Consumes a one-byte operator.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Lexes an identifier, or the `state` keyword when the whole word is `state`.
    fn lex_identifier_or_keyword(&mut self, start: Position) -> TokenKind {
        self.advance_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        let text = self.text_for(self.span_from(start));
        if text.as_str() == "state" {
            TokenKind::Keyword(text)
        } else {
            TokenKind::Identifier(text)
        }
    }

    /// Lexes a quoted string, resolving escapes.
    ///
    /// The closing quote must match the opening one. Strings may span lines.
    fn lex_string(&mut self, quote: u8, start: Position) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        let mut content = Vec::new();

        loop {
            match self.peek_byte() {
                None => {
                    // Report at the opening quote, not at end of input.
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start.offset, start.offset + 1),
                        start,
                    ));
                }
                Some(b) if b == quote => {
                    self.advance(); // closing quote
                    break;
                }
                Some(b'\\') => {
                    let escape_start = self.current_position();
                    self.advance(); // backslash
                    self.lex_escape(escape_start, &mut content)?;
                }
                Some(b) => {
                    self.advance();
                    content.push(b);
                }
            }
        }

        match String::from_utf8(content) {
            Ok(text) => Ok(TokenKind::String(text.into())),
            Err(_) => Err(LexError::new(
                LexErrorKind::InvalidUtf8,
                self.span_from(start),
                start,
            )),
        }
    }

    /// Lexes the escape sequence after a backslash into `content`.
    fn lex_escape(&mut self, start: Position, content: &mut Vec<u8>) -> Result<(), LexError> {
        let Some(byte) = self.peek_byte() else {
            // `"abc\` at end of input: the string never closes.
            return Ok(());
        };
        self.advance();
        let resolved = match byte {
            b'\\' => b'\\',
            b'"' => b'"',
            b'\'' => b'\'',
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'0' => b'\0',
            b'a' => b'\x07',
            b'b' => b'\x08',
            b'f' => b'\x0c',
            b'v' => b'\x0b',
            b'x' => {
                let ch = self.lex_hex_escape(start)?;
                push_char(content, ch);
                return Ok(());
            }
            b'u' => {
                let ch = self.lex_unicode_escape(start)?;
                push_char(content, ch);
                return Ok(());
            }
            _ => return Err(self.invalid_escape(start)),
        };
        content.push(resolved);
        Ok(())
    }

    /// Lexes the two hex digits of `\xHH`; only ASCII values are allowed.
    fn lex_hex_escape(&mut self, start: Position) -> Result<char, LexError> {
        let mut value = 0u32;
        for _ in 0..2 {
            let digit = self
                .peek_byte()
                .and_then(|b| char::from(b).to_digit(16))
                .ok_or_else(|| self.invalid_escape(start))?;
            self.advance();
            value = value * 16 + digit;
        }
        char::from_u32(value)
            .filter(char::is_ascii)
            .ok_or_else(|| self.invalid_escape(start))
    }

    /// Lexes the braced hex digits of `\u{...}`.
    fn lex_unicode_escape(&mut self, start: Position) -> Result<char, LexError> {
        if self.peek_byte() != Some(b'{') {
            return Err(self.invalid_escape(start));
        }
        self.advance();
        let mut value = 0u32;
        let mut digits = 0;
        loop {
            match self.peek_byte() {
                Some(b'}') if digits > 0 => {
                    self.advance();
                    break;
                }
                Some(b) if digits < 6 && b.is_ascii_hexdigit() => {
                    self.advance();
                    value = value * 16 + char::from(b).to_digit(16).unwrap_or(0);
                    digits += 1;
                }
                _ => return Err(self.invalid_escape(start)),
            }
        }
        char::from_u32(value).ok_or_else(|| self.invalid_escape(start))
    }

    /// Builds an invalid-escape error covering the escape read so far.
    fn invalid_escape(&self, start: Position) -> LexError {
        let span = self.span_from(start);
        let text = self.text_for(span);
        let sequence = text.strip_prefix('\\').unwrap_or(&text);
        LexError::new(LexErrorKind::InvalidEscape(sequence.into()), span, start)
    }

    /// Builds an error for the character at the current position.
    fn unexpected_character(&mut self, start: Position) -> LexError {
        let lead = self.peek_byte().unwrap_or(0);
        let width = utf8_width(lead);
        let mut bytes = Vec::with_capacity(width);
        for ahead in 0..width {
            match self.peek_byte_at(ahead) {
                Some(b) => bytes.push(b),
                None => break,
            }
        }
        let kind = match std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) {
            Some(c) => LexErrorKind::UnexpectedCharacter(c),
            None => LexErrorKind::UnexpectedByte(lead),
        };
        let len = match kind {
            LexErrorKind::UnexpectedCharacter(c) => c.len_utf8(),
            _ => 1,
        };
        #[expect(clippy::cast_possible_truncation, reason = "at most four bytes")]
        let span = Span::new(start.offset, start.offset + len as u32);
        LexError::new(kind, span, start)
    }
}

/// Appends a character to a byte buffer as UTF-8.
fn push_char(content: &mut Vec<u8>, ch: char) {
    let mut encoded = [0u8; 4];
    content.extend_from_slice(ch.encode_utf8(&mut encoded).as_bytes());
}

/// Length of the UTF-8 sequence introduced by `lead`.
const fn utf8_width(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.is_eof() => {
                self.finished = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

/// Lexes source text into tokens, excluding the end-of-input marker.
///
/// # Errors
///
/// Returns the first [`LexError`] in the source.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source.as_bytes()).collect()
}

/// Lexes source text into tokens, including the end-of-input marker.
///
/// # Errors
///
/// Returns the first [`LexError`] in the source.
pub fn lex_with_eof(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source.as_bytes());
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to lex and extract just the token kinds.
    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("source should lex")
            .into_iter()
            .map(Token::into_kind)
            .collect()
    }

    fn lex_error(source: &str) -> LexError {
        lex(source).expect_err("source should fail to lex")
    }

    /// A reader that hands out one byte per call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
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

    /// A reader that fails after its content.
    struct Broken<'a>(&'a [u8]);

    impl Read for Broken<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Err(io::Error::other("pipe closed"));
            }
            let n = self.0.read(buf)?;
            Ok(n)
        }
    }

    #[test]
    fn lex_empty() {
        assert!(lex_kinds("").is_empty());
        assert!(lex_kinds("  \t\r\n").is_empty());
        assert!(lex_kinds("// comment only").is_empty());
    }

    #[test]
    fn lex_identifiers() {
        assert_eq!(
            lex_kinds("foo _bar keepGitDir x1"),
            vec![
                TokenKind::Identifier("foo".into()),
                TokenKind::Identifier("_bar".into()),
                TokenKind::Identifier("keepGitDir".into()),
                TokenKind::Identifier("x1".into()),
            ]
        );
    }

    #[test]
    fn lex_state_keyword_only_for_whole_word() {
        assert_eq!(
            lex_kinds("state stateful"),
            vec![
                TokenKind::Keyword("state".into()),
                TokenKind::Identifier("stateful".into()),
            ]
        );
    }

    #[test]
    fn lex_integers() {
        assert_eq!(
            lex_kinds("0 0755 1000"),
            vec![
                TokenKind::Integer("0".into()),
                TokenKind::Integer("0755".into()),
                TokenKind::Integer("1000".into()),
            ]
        );
    }

    #[test]
    fn lex_integer_followed_by_identifier() {
        assert_eq!(
            lex_kinds("12ab"),
            vec![
                TokenKind::Integer("12".into()),
                TokenKind::Identifier("ab".into()),
            ]
        );
    }

    #[test]
    fn lex_strings_are_unquoted() {
        assert_eq!(
            lex_kinds(r#""busybox" 'single'"#),
            vec![
                TokenKind::String("busybox".into()),
                TokenKind::String("single".into()),
            ]
        );
    }

    #[test]
    fn lex_string_escapes() {
        assert_eq!(
            lex_kinds(r#""a\"b\\c\n\t" 'it\'s' "\x41\u{e9}""#),
            vec![
                TokenKind::String("a\"b\\c\n\t".into()),
                TokenKind::String("it's".into()),
                TokenKind::String("Aé".into()),
            ]
        );
    }

    #[test]
    fn lex_other_quote_inside_string() {
        assert_eq!(
            lex_kinds(r#""it's" 'say "hi"'"#),
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("say \"hi\"".into()),
            ]
        );
    }

    #[test]
    fn lex_multiline_string() {
        assert_eq!(
            lex_kinds("\"line one\nline two\""),
            vec![TokenKind::String("line one\nline two".into())]
        );
    }

    #[test]
    fn lex_operators() {
        assert_eq!(
            lex_kinds("{ } ; ( ) ,"),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Semicolon,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn lex_comment_is_discarded() {
        assert_eq!(
            lex_kinds("scratch // the empty root\nexec"),
            vec![
                TokenKind::Identifier("scratch".into()),
                TokenKind::Identifier("exec".into()),
            ]
        );
    }

    #[test]
    fn lex_with_eof_ends_with_eof() {
        let tokens = lex_with_eof("a").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].is_eof());
        assert_eq!(tokens[1].span(), Span::new(1, 1));
    }

    #[test]
    fn lex_spans_and_positions() {
        let tokens = lex("state a {\n  scratch\n}").unwrap();
        let scratch = &tokens[3];
        assert_eq!(scratch.kind(), &TokenKind::Identifier("scratch".into()));
        assert_eq!(scratch.span(), Span::new(12, 19));
        assert_eq!(
            scratch.position(),
            Position {
                line: 2,
                column: 3,
                offset: 12
            }
        );
        let close = &tokens[4];
        assert_eq!((close.position().line, close.position().column), (3, 1));
    }

    #[test]
    fn lex_columns_count_characters() {
        let tokens = lex("\"é\" x").unwrap();
        assert_eq!(tokens[1].position().column, 5);
        assert_eq!(tokens[1].position().offset, 5);
    }

    #[test]
    fn lex_error_unexpected_character() {
        let err = lex_error("scratch @");
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
        assert_eq!(err.span, Span::new(8, 9));
        assert_eq!((err.position.line, err.position.column), (1, 9));
    }

    #[test]
    fn lex_error_unexpected_multibyte_character() {
        let err = lex_error("a ☃");
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('☃'));
        assert_eq!(err.span.len(), 3);
    }

    #[test]
    fn lex_error_single_slash() {
        let err = lex_error("a / b");
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('/'));
    }

    #[test]
    fn lex_error_unterminated_string_points_at_quote() {
        let err = lex_error("image \"busybox }");
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span, Span::new(6, 7));
        assert_eq!((err.position.line, err.position.column), (1, 7));
    }

    #[test]
    fn lex_error_invalid_escape() {
        let err = lex_error(r#"exec "a\qb""#);
        assert_eq!(err.kind, LexErrorKind::InvalidEscape("q".into()));
        assert_eq!(err.position.column, 8);
    }

    #[test]
    fn lex_error_non_ascii_hex_escape() {
        let err = lex_error(r#""\xff""#);
        assert!(matches!(err.kind, LexErrorKind::InvalidEscape(_)));
    }

    #[test]
    fn lex_error_invalid_utf8_outside_string() {
        let mut lexer = Lexer::new(&b"a \xff"[..]);
        assert!(lexer.next().unwrap().is_ok());
        let err = lexer.next().unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedByte(0xff));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn lex_invalid_bytes_in_comments_do_not_shift_positions() {
        let tokens: Vec<Token> = Lexer::new(&b"// \xff\xe9\n  x"[..])
            .map(Result::unwrap)
            .collect();
        let position = tokens[0].position();
        assert_eq!((position.line, position.column, position.offset), (2, 3, 8));
    }

    #[test]
    fn lex_error_invalid_utf8_inside_string() {
        let err = Lexer::new(&b"\"\xff\""[..]).next().unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidUtf8);
    }

    #[test]
    fn lex_one_byte_at_a_time() {
        let source = "state a {\n  image \"alpine\" // base\n}";
        let streamed: Vec<TokenKind> = Lexer::new(Trickle(source.as_bytes()))
            .map(|t| t.unwrap().into_kind())
            .collect();
        assert_eq!(streamed, lex_kinds(source));
    }

    #[test]
    fn lex_captures_input_into_buffer() {
        let mut lexer = Lexer::new("state a\n{".as_bytes());
        let count = lexer.by_ref().count();
        assert_eq!(count, 3);
        let buffer = lexer.into_buffer();
        assert_eq!(buffer.line(1).as_deref(), Some("state a"));
        assert_eq!(buffer.line(2).as_deref(), Some("{"));
    }

    #[test]
    fn lex_read_failure_is_a_lex_error() {
        let mut lexer = Lexer::new(Broken(b"scratch "));
        assert!(lexer.next().unwrap().is_ok());
        let err = lexer.next().unwrap().unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::Read(ref message) if message.contains("pipe closed")));
        assert_eq!(err.position.offset, 8);
    }

    #[test]
    fn capture_line_reads_to_end_of_line() {
        let mut lexer = Lexer::new(Trickle(b"ab cd\nef"));
        let first = lexer.next_token().unwrap();
        // Only the bytes needed to end the first token have been read.
        assert_eq!(lexer.buffer().line(1).as_deref(), Some("ab "));
        lexer.capture_line_at(first.span().start());
        assert_eq!(lexer.buffer().line(1).as_deref(), Some("ab cd"));
        assert_eq!(lexer.buffer().line_count(), 2);
    }
}
