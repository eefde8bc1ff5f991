//! Shell export script.
//!
//! Rendered as `export KEY='value'`; a single quote inside a value becomes
//! `'\''`. Parsing accepts POSIX words made of single-quoted, double-quoted
//! and unquoted runs, so scripts written by hand load too.

use super::lexer::{strip_export, Cursor};
use super::{Format, SecretMapping};
use crate::error::{FormatError, Result};

const HEADER: &str = "#!/bin/sh\n# Generated by secrets-manager. Load with: . ./this-file\n";

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
            return Err(cursor.error(line, "expected export KEY=VALUE"));
        }
        cursor.bump();

        let key = strip_export(&key_part);
        if !is_identifier(key) {
            return Err(cursor.error(line, format!("invalid variable name '{}'", key)));
        }
        let key = key.to_string();

        let value = word(&mut cursor, line)?;
        cursor.finish_line(&[';'])?;
        mapping.insert(key, value);
    }

    Ok(mapping)
}

/// Read one shell word.
fn word(cursor: &mut Cursor<'_>, line: usize) -> Result<String> {
    let mut out = String::new();
    while let Some(ch) = cursor.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' | ';' => break,
            '\'' => {
                cursor.bump();
                loop {
                    match cursor.bump() {
                        None => return Err(cursor.error(line, "unterminated single quote")),
                        Some('\'') => break,
                        Some(c) => out.push(c),
                    }
                }
            }
            '"' => {
                cursor.bump();
                loop {
                    match cursor.bump() {
                        None => return Err(cursor.error(line, "unterminated double quote")),
                        Some('"') => break,
                        Some('\\') => match cursor.peek() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => {
                                cursor.bump();
                                out.push(c);
                            }
                            Some('\n') => {
                                cursor.bump();
                            }
                            _ => out.push('\\'),
                        },
                        Some(c) => out.push(c),
                    }
                }
            }
            '\\' => {
                cursor.bump();
                match cursor.bump() {
                    Some('\n') | None => {}
                    Some(c) => out.push(c),
                }
            }
            _ => {
                cursor.bump();
                out.push(ch);
            }
        }
    }
    Ok(out)
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(super) fn render(mapping: &SecretMapping) -> Result<String> {
    let mut output = String::from(HEADER);
    for (key, value) in mapping.iter() {
        if !is_identifier(key) {
            return Err(FormatError::IllegalValue {
                key: key.to_string(),
                format: Format::Shell.to_string(),
                reason: "not a valid shell variable name".to_string(),
            }
            .into());
        }
        if value.contains('\0') {
            return Err(FormatError::IllegalValue {
                key: key.to_string(),
                format: Format::Shell.to_string(),
                reason: "contains a NUL byte".to_string(),
            }
            .into());
        }
        output.push_str(&format!("export {}='{}'\n", key, value.replace('\'', "'\\''")));
    }
    Ok(output)
}
