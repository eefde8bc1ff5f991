//! Character cursor shared by the line-oriented formats.
//!
//! Quoted values may span lines, so parsing walks characters rather than
//! lines and tracks the current line for error context.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, FormatError, Result};

pub(super) struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    pub(super) fn new(raw: &'a str, source: &'a str) -> Self {
        Self {
            chars: raw.chars().peekable(),
            line: 1,
            source,
        }
    }

    pub(super) fn line(&self) -> usize {
        self.line
    }

    pub(super) fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    pub(super) fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch == Some('\n') {
            self.line += 1;
        }
        ch
    }

    /// Skip whitespace including line breaks.
    pub(super) fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Skip spaces and tabs; returns how many were skipped.
    pub(super) fn skip_inline_ws(&mut self) -> usize {
        let mut n = 0;
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
            n += 1;
        }
        n
    }

    /// Consume through the next line break.
    pub(super) fn skip_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Take characters up to (not including) the first match of `stop` or
    /// a line break.
    pub(super) fn take_until(&mut self, stop: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' || stop(ch) {
                break;
            }
            out.push(ch);
            self.bump();
        }
        out
    }

    /// The remainder of the current line, consuming the line break.
    ///
    /// A trailing `\r` is dropped.
    pub(super) fn rest_of_line(&mut self) -> String {
        let mut out = self.take_until(|_| false);
        self.bump();
        if out.ends_with('\r') {
            out.pop();
        }
        out
    }

    /// After a quoted value only whitespace or a comment may follow.
    pub(super) fn finish_line(&mut self, extra: &[char]) -> Result<()> {
        self.skip_inline_ws();
        match self.peek() {
            None => Ok(()),
            Some('\n') | Some('\r') | Some('#') => {
                self.skip_line();
                Ok(())
            }
            Some(c) if extra.contains(&c) => {
                self.skip_line();
                Ok(())
            }
            Some(c) => Err(self.error(self.line, format!("unexpected '{c}' after value"))),
        }
    }

    pub(super) fn error(&self, line: usize, reason: impl Into<String>) -> Error {
        FormatError::Malformed {
            source_name: self.source.to_string(),
            line,
            reason: reason.into(),
        }
        .into()
    }
}

/// Strip a leading `export` keyword from a key.
pub(super) fn strip_export(key: &str) -> &str {
    let key = key.trim();
    match key.strip_prefix("export") {
        Some(rest) if rest.starts_with([' ', '\t']) => rest.trim(),
        _ => key,
    }
}
