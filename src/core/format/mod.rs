//! Import/export formats.
//!
//! Every format parses raw text into a [`SecretMapping`] and renders a
//! mapping back. For any mapping holding only characters a format can
//! represent, `parse(render(m)) == m`. Formatting details (whitespace,
//! comments, ordering of nested keys) are not preserved.
//!
//! | Format       | Shape                                    |
//! |--------------|------------------------------------------|
//! | `dotenv`     | `KEY=value`, double quotes with escapes  |
//! | `json`       | nested object, flattened with `.`        |
//! | `yaml`       | nested mapping, flattened with `.`       |
//! | `github-env` | `KEY=value`, `KEY<<DELIM` for multi-line |
//! | `shell`      | `export KEY='value'`                     |

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, FormatError, Result};

mod dotenv;
mod github_env;
mod lexer;
mod shell;
mod tree;

/// Source name used in errors when parsing text without a file.
const INLINE_SOURCE: &str = "<input>";

/// Supported formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    Dotenv,
    Json,
    Yaml,
    GithubEnv,
    Shell,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Dotenv,
        Format::Json,
        Format::Yaml,
        Format::GithubEnv,
        Format::Shell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Dotenv => "dotenv",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::GithubEnv => "github-env",
            Format::Shell => "shell",
        }
    }

    /// Guess a format from a file name, falling back to dotenv.
    ///
    /// `.json`, `.yml`/`.yaml` and `.sh` select their formats; file names
    /// mentioning `github` select github-env.
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Format::Json,
            Some("yml") | Some("yaml") => Format::Yaml,
            Some("sh") | Some("bash") => Format::Shell,
            _ if file_name.contains("github") => Format::GithubEnv,
            _ => Format::Dotenv,
        }
    }

    /// Parse raw content in this format.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::Malformed` with line context on bad input.
    pub fn parse(self, raw: &str) -> Result<SecretMapping> {
        self.parse_source(raw, INLINE_SOURCE)
    }

    /// Parse raw content, naming `source` in errors.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::Malformed` with `source` and line context.
    pub fn parse_source(self, raw: &str, source: &str) -> Result<SecretMapping> {
        match self {
            Format::Dotenv => dotenv::parse(raw, source),
            Format::Json => tree::parse_json(raw, source),
            Format::Yaml => tree::parse_yaml(raw, source),
            Format::GithubEnv => github_env::parse(raw, source),
            Format::Shell => shell::parse(raw, source),
        }
    }

    /// Render a mapping in this format.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::IllegalValue` or `FormatError::Conflict` when
    /// the mapping cannot be represented.
    pub fn render(self, mapping: &SecretMapping) -> Result<String> {
        match self {
            Format::Dotenv => dotenv::render(mapping),
            Format::Json => tree::render_json(mapping),
            Format::Yaml => tree::render_yaml(mapping),
            Format::GithubEnv => github_env::render(mapping),
            Format::Shell => shell::render(mapping),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dotenv" | "env" | ".env" => Ok(Format::Dotenv),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "github-env" | "github" => Ok(Format::GithubEnv),
            "shell" | "sh" => Ok(Format::Shell),
            other => Err(FormatError::Unsupported(other.to_string()).into()),
        }
    }
}

/// Parse raw content in `format`.
///
/// # Errors
///
/// See [`Format::parse`].
pub fn parse(raw: &str, format: Format) -> Result<SecretMapping> {
    format.parse(raw)
}

/// Render a mapping in `format`.
///
/// # Errors
///
/// See [`Format::render`].
pub fn render(mapping: &SecretMapping, format: Format) -> Result<String> {
    format.render(mapping)
}

/// Ordered key → value mapping used as the unit of import and export.
///
/// Insertion order drives preview and output order. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretMapping(IndexMap<String, String>);

impl SecretMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for SecretMapping {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Reject a key a line format cannot carry.
fn check_line_key(key: &str, format: Format) -> Result<()> {
    let problem = if key.is_empty() {
        Some("empty key")
    } else if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some("key may only contain letters, digits, '_', '.' and '-'")
    } else {
        None
    };

    match problem {
        Some(reason) => Err(FormatError::IllegalValue {
            key: key.to_string(),
            format: format.to_string(),
            reason: reason.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}
