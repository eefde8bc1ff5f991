//! GitHub Actions environment file (`$GITHUB_ENV`).
//!
//! Single-line values are written verbatim as `KEY=value`. Multi-line
//! values use the heredoc form:
//!
//! ```text
//! KEY<<EOF
//! line one
//! line two
//! EOF
//! ```
//!
//! The delimiter is chosen so it never appears as a line of the value.
//! Carriage returns cannot be represented.

use super::lexer::Cursor;
use super::{check_line_key, Format, SecretMapping};
use crate::error::{FormatError, Result};

const DELIMITER: &str = "EOF";

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

        let entry = cursor.rest_of_line();
        let heredoc = entry.find("<<");
        let assign = entry.find('=');

        match (assign, heredoc) {
            (Some(eq), Some(hd)) if eq < hd => {
                let (key, value) = (&entry[..eq], &entry[eq + 1..]);
                insert(&mut mapping, &cursor, line, key, value.to_string())?;
            }
            (Some(eq), None) => {
                let (key, value) = (&entry[..eq], &entry[eq + 1..]);
                insert(&mut mapping, &cursor, line, key, value.to_string())?;
            }
            (_, Some(hd)) => {
                let key = &entry[..hd];
                let delimiter = entry[hd + 2..].trim();
                if delimiter.is_empty() {
                    return Err(cursor.error(line, "missing heredoc delimiter"));
                }
                let value = heredoc_body(&mut cursor, line, delimiter)?;
                insert(&mut mapping, &cursor, line, key, value)?;
            }
            (None, None) => return Err(cursor.error(line, "expected KEY=VALUE or KEY<<DELIMITER")),
        }
    }

    Ok(mapping)
}

fn heredoc_body(cursor: &mut Cursor<'_>, line: usize, delimiter: &str) -> Result<String> {
    let mut lines = Vec::new();
    loop {
        if cursor.peek().is_none() {
            return Err(cursor.error(line, format!("heredoc not closed by {delimiter}")));
        }
        let next = cursor.rest_of_line();
        if next == delimiter {
            return Ok(lines.join("\n"));
        }
        lines.push(next);
    }
}

fn insert(
    mapping: &mut SecretMapping,
    cursor: &Cursor<'_>,
    line: usize,
    key: &str,
    value: String,
) -> Result<()> {
    let key = key.trim();
    if check_line_key(key, Format::GithubEnv).is_err() {
        return Err(cursor.error(line, format!("invalid key '{}'", key)));
    }
    mapping.insert(key, value);
    Ok(())
}

pub(super) fn render(mapping: &SecretMapping) -> Result<String> {
    let mut output = String::new();
    for (key, value) in mapping.iter() {
        check_line_key(key, Format::GithubEnv)?;
        if value.contains('\r') {
            return Err(FormatError::IllegalValue {
                key: key.to_string(),
                format: Format::GithubEnv.to_string(),
                reason: "carriage returns are not supported".to_string(),
            }
            .into());
        }

        if value.contains('\n') {
            let delimiter = delimiter_for(value);
            output.push_str(&format!("{key}<<{delimiter}\n{value}\n{delimiter}\n"));
        } else {
            output.push_str(&format!("{key}={value}\n"));
        }
    }
    Ok(output)
}

/// `EOF`, or `EOF_<n>` when the value has a line equal to `EOF`.
fn delimiter_for(value: &str) -> String {
    let taken = |candidate: &str| value.split('\n').any(|l| l == candidate);
    if !taken(DELIMITER) {
        return DELIMITER.to_string();
    }
    (1..)
        .map(|n| format!("{DELIMITER}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| DELIMITER.to_string())
}
