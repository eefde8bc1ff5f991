//! Dotenv format.
//!
//! - `KEY=value`, optionally prefixed with `export`
//! - `#` starts a comment at line start or after whitespace
//! - double quotes support `\n`, `\r`, `\"` and `\\` and may span lines
//! - single quotes are literal

use super::lexer::{strip_export, Cursor};
use super::{check_line_key, Format, SecretMapping};
use crate::error::Result;

pub(super) fn parse(raw: &str, source: &str) -> Result<SecretMapping> {
    let mut cursor = Cursor::new(raw, source);
    let mut mapping = SecretMapping::new();

    loop {
        cursor.skip_blank();
        let Some(first) = cursor.peek() else { break };
        let line = cursor.line();

        if first == '#' {
            cursor.skip_line();
            continue;
        }

        let key_part = cursor.take_until(|c| c == '=');
        if cursor.peek() != Some('=') {
            return Err(cursor.error(line, "expected KEY=VALUE"));
        }
        cursor.bump();

        let key = strip_export(&key_part);
        if check_line_key(key, Format::Dotenv).is_err() {
            return Err(cursor.error(line, format!("invalid key '{}'", key)));
        }
        let key = key.to_string();

        let skipped = cursor.skip_inline_ws();
        let value = match cursor.peek() {
            Some('"') => {
                cursor.bump();
                let value = double_quoted(&mut cursor, line)?;
                cursor.finish_line(&[])?;
                value
            }
            Some('\'') => {
                cursor.bump();
                let value = cursor_until_quote(&mut cursor, line)?;
                cursor.finish_line(&[])?;
                value
            }
            Some('#') if skipped > 0 => {
                cursor.skip_line();
                String::new()
            }
            _ => unquoted(&cursor.rest_of_line()),
        };

        mapping.insert(key, value);
    }

    Ok(mapping)
}

fn double_quoted(cursor: &mut Cursor<'_>, line: usize) -> Result<String> {
    let mut out = String::new();
    loop {
        match cursor.bump() {
            None => return Err(cursor.error(line, "unterminated double quote")),
            Some('"') => return Ok(out),
            Some('\\') => match cursor.bump() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return Err(cursor.error(line, "unterminated double quote")),
            },
            Some(ch) => out.push(ch),
        }
    }
}

fn cursor_until_quote(cursor: &mut Cursor<'_>, line: usize) -> Result<String> {
    let mut out = String::new();
    loop {
        match cursor.bump() {
            None => return Err(cursor.error(line, "unterminated single quote")),
            Some('\'') => return Ok(out),
            Some(ch) => out.push(ch),
        }
    }
}

/// Unquoted values end at a `#` preceded by whitespace and are trimmed.
fn unquoted(raw: &str) -> String {
    let mut prev_ws = false;
    for (i, ch) in raw.char_indices() {
        if ch == '#' && prev_ws {
            return raw[..i].trim().to_string();
        }
        prev_ws = ch.is_whitespace();
    }
    raw.trim().to_string()
}

pub(super) fn render(mapping: &SecretMapping) -> Result<String> {
    let mut output = String::new();
    for (key, value) in mapping.iter() {
        check_line_key(key, Format::Dotenv)?;
        if needs_quotes(value) {
            output.push_str(&format!("{}=\"{}\"\n", key, escape(value)));
        } else {
            output.push_str(&format!("{}={}\n", key, value));
        }
    }
    Ok(output)
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|ch| ch.is_whitespace() || ch.is_control())
        || value.contains(['#', '=', '"', '\'', '\\'])
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
