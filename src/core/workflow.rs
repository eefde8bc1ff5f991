//! CI workflow reference extraction.
//!
//! Scans GitHub Actions workflow files for `${{ secrets.NAME }}` and
//! `${{ env.NAME }}` expressions so `check` can flag references to keys
//! that no scope declares. `env.NAME` references to variables the
//! workflow defines itself in an `env:` block are not references.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::constants::CI_BUILTIN_SECRETS;
use crate::error::Result;

static EXPRESSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{\{(.*?)\}\}").ok());

static REFERENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(secrets|env)\.([A-Za-z_][A-Za-z0-9_]*)").ok());

/// Keys referenced by workflow files, with the files referencing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowReferences {
    refs: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl WorkflowReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference found in `file`.
    pub fn insert(&mut self, key: impl Into<String>, file: impl Into<PathBuf>) {
        self.refs.entry(key.into()).or_default().insert(file.into());
    }

    /// Referenced keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.refs.keys().map(String::as_str)
    }

    /// Files referencing `key`.
    pub fn files(&self, key: &str) -> Vec<&Path> {
        self.refs
            .get(key)
            .map(|files| files.iter().map(PathBuf::as_path).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Scan a workflow file, or every `*.yml`/`*.yaml` below a directory.
    ///
    /// A missing path yields no references.
    ///
    /// # Errors
    ///
    /// Returns an IO error if a workflow file cannot be read.
    pub fn scan(path: &Path) -> Result<Self> {
        let mut refs = Self::new();
        if !path.exists() {
            debug!(path = %path.display(), "no workflows to scan");
            return Ok(refs);
        }

        if path.is_file() {
            refs.scan_file(path)?;
            return Ok(refs);
        }

        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable workflow entry");
                    None
                }
            })
        {
            if entry.file_type().is_file() && is_workflow_file(entry.path()) {
                refs.scan_file(entry.path())?;
            }
        }

        debug!(path = %path.display(), keys = refs.len(), "workflows scanned");
        Ok(refs)
    }

    fn scan_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)?;
        for key in extract(&contents) {
            self.insert(key, path);
        }
        Ok(())
    }
}

/// Keys referenced in one workflow document.
///
/// CI built-ins such as `GITHUB_TOKEN` are left out, as are `env.NAME`
/// references to variables set in one of the document's `env:` blocks.
pub fn extract(contents: &str) -> BTreeSet<String> {
    let (Some(expression), Some(reference)) = (EXPRESSION.as_ref(), REFERENCE.as_ref()) else {
        return BTreeSet::new();
    };
    let local = local_env(contents);

    expression
        .captures_iter(contents)
        .filter_map(|c| c.get(1))
        .flat_map(|body| {
            reference
                .captures_iter(body.as_str())
                .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str().to_string())))
                .collect::<Vec<_>>()
        })
        .filter(|(context, key)| !(*context == "env" && local.contains(key)))
        .map(|(_, key)| key)
        .filter(|key| !CI_BUILTIN_SECRETS.contains(&key.as_str()))
        .collect()
}

/// Variable names defined by `env:` mappings at any level of a workflow.
///
/// A document that is not valid YAML defines nothing.
fn local_env(contents: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    match serde_yaml::from_str::<serde_yaml::Value>(contents) {
        Ok(document) => collect_env(&document, &mut names),
        Err(e) => debug!(error = %e, "workflow is not valid YAML"),
    }
    names
}

fn collect_env(value: &serde_yaml::Value, names: &mut BTreeSet<String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, child) in map {
                if let (Some("env"), serde_yaml::Value::Mapping(vars)) = (key.as_str(), child) {
                    names.extend(vars.keys().filter_map(|k| k.as_str().map(str::to_string)));
                }
                collect_env(child, names);
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                collect_env(item, names);
            }
        }
        _ => {}
    }
}

fn is_workflow_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}
