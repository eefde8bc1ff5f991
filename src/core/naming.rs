//! Physical secret naming.
//!
//! The single authority mapping logical references to store identifiers:
//!
//! ```text
//! <prefix>--<KEY>
//! <prefix>--<project>--<KEY>
//! ```
//!
//! Prefixes and project identifiers are checked when the configuration is
//! loaded, so [`resolve`] is total. [`parse`] only fails when that load-time
//! invariant was bypassed.

use std::fmt;

use serde::Serialize;

use crate::core::constants::SEPARATOR;
use crate::error::{NameError, Result};

/// A fully-qualified identifier in the secret store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PhysicalName(String);

impl PhysicalName {
    /// Wrap a raw store identifier without checking it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhysicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhysicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Components recovered from a physical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub prefix: String,
    pub project: Option<String>,
    pub key: String,
}

/// Map a logical reference to its physical name.
pub fn resolve(prefix: &str, project: Option<&str>, key: &str) -> PhysicalName {
    let name = match project {
        Some(project) => format!("{prefix}{SEPARATOR}{project}{SEPARATOR}{key}"),
        None => format!("{prefix}{SEPARATOR}{key}"),
    };
    PhysicalName(name)
}

/// Split a physical name back into its components.
///
/// # Errors
///
/// Returns `NameError::Ambiguous` when the name has more segments than a
/// project-scoped name, and `NameError::Unrecognized` when it has no
/// separator or an empty segment.
pub fn parse(raw: &str) -> Result<ParsedName> {
    let parts: Vec<&str> = raw.split(SEPARATOR).collect();

    if parts.iter().any(|p| p.is_empty()) && parts.len() <= 3 {
        return Err(NameError::Unrecognized(raw.to_string()).into());
    }

    match parts.as_slice() {
        [prefix, key] => Ok(ParsedName {
            prefix: (*prefix).to_string(),
            project: None,
            key: (*key).to_string(),
        }),
        [prefix, project, key] => Ok(ParsedName {
            prefix: (*prefix).to_string(),
            project: Some((*project).to_string()),
            key: (*key).to_string(),
        }),
        [_] => Err(NameError::Unrecognized(raw.to_string()).into()),
        _ => Err(NameError::Ambiguous(raw.to_string()).into()),
    }
}

/// Store listing prefix selecting every secret of an environment.
pub fn environment_filter(prefix: &str) -> String {
    format!("{prefix}{SEPARATOR}")
}

/// A `env[.project].SECRET` reference typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub env: String,
    pub project: Option<String>,
    pub key: Option<String>,
}

impl Target {
    /// Parse a dotted target.
    ///
    /// A two-part target is `env.SECRET` when the second part looks like a
    /// logical key (uppercase or containing `_`), otherwise `env.project`.
    ///
    /// # Errors
    ///
    /// Returns `NameError::InvalidTarget` for empty segments.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(NameError::InvalidTarget(raw.to_string()).into());
        }

        let target = match parts.as_slice() {
            [env] => Self {
                env: (*env).to_string(),
                project: None,
                key: None,
            },
            [env, second] if looks_like_key(second) => Self {
                env: (*env).to_string(),
                project: None,
                key: Some((*second).to_string()),
            },
            [env, project] => Self {
                env: (*env).to_string(),
                project: Some((*project).to_string()),
                key: None,
            },
            [env, project, rest @ ..] => Self {
                env: (*env).to_string(),
                project: Some((*project).to_string()),
                key: Some(rest.join(".")),
            },
            [] => return Err(NameError::InvalidTarget(raw.to_string()).into()),
        };
        Ok(target)
    }

    /// The secret key, required by single-secret commands.
    ///
    /// # Errors
    ///
    /// Returns `NameError::InvalidTarget` when the target names no secret.
    pub fn require_key(&self) -> Result<&str> {
        self.key
            .as_deref()
            .ok_or_else(|| NameError::InvalidTarget(self.to_string()).into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.env)?;
        if let Some(project) = &self.project {
            write!(f, ".{project}")?;
        }
        if let Some(key) = &self.key {
            write!(f, ".{key}")?;
        }
        Ok(())
    }
}

fn looks_like_key(segment: &str) -> bool {
    segment.contains('_')
        || (segment.chars().any(|c| c.is_ascii_alphabetic())
            && !segment.chars().any(|c| c.is_ascii_lowercase()))
}
