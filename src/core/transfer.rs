//! Import and export between files and the store.
//!
//! An import is computed as an [`ImportPlan`] first. The dry-run preview
//! and the real import both come from the same plan, so the preview shows
//! exactly what applying would do.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::Scope;
use crate::core::constants::{MASK_MIN_LEN, MASK_VISIBLE};
use crate::core::format::{Format, SecretMapping};
use crate::core::naming::PhysicalName;
use crate::core::placeholder::matched_token;
use crate::core::secrets::{load_scopes, LoadedSecrets};
use crate::core::store::SecretStore;
use crate::core::types::LogicalKey;
use crate::core::validation::{normalize_key, validate_key};
use crate::error::{Error, Result};

/// Mask a value for display.
///
/// Values longer than eight characters keep their first four; shorter
/// values are fully hidden.
pub fn mask(value: &str) -> String {
    if value.chars().count() > MASK_MIN_LEN {
        let visible: String = value.chars().take(MASK_VISIBLE).collect();
        format!("{visible}...")
    } else {
        "***".to_string()
    }
}

/// Read and parse a secrets file.
///
/// The format is `format` when given, otherwise guessed from the path.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read, or
/// `FormatError::Malformed` naming the file and line.
pub fn read_mapping(path: &Path, format: Option<Format>) -> Result<SecretMapping> {
    let format = format.unwrap_or_else(|| Format::from_path(path));
    let raw = std::fs::read_to_string(path)?;
    let mapping = format.parse_source(&raw, &path.display().to_string())?;
    debug!(path = %path.display(), %format, keys = mapping.len(), "parsed");
    Ok(mapping)
}

/// Import options.
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Skip values that contain a placeholder token.
    pub filter_placeholders: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            filter_placeholders: true,
        }
    }
}

/// Why an entry is not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "reason", content = "detail")]
pub enum SkipReason {
    Placeholder(&'static str),
    InvalidKey(String),
    Unreadable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Placeholder(token) => write!(f, "placeholder ({token})"),
            SkipReason::InvalidKey(reason) => write!(f, "invalid key: {reason}"),
            SkipReason::Unreadable(reason) => write!(f, "store read failed: {reason}"),
        }
    }
}

/// What applying an entry does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportAction {
    Create,
    Update,
    Unchanged,
    Skip(SkipReason),
}

impl ImportAction {
    pub fn label(&self) -> &'static str {
        match self {
            ImportAction::Create => "create",
            ImportAction::Update => "update",
            ImportAction::Unchanged => "unchanged",
            ImportAction::Skip(_) => "skip",
        }
    }

    fn writes(&self) -> bool {
        matches!(self, ImportAction::Create | ImportAction::Update)
    }
}

/// One planned key.
#[derive(Debug, Clone, Serialize)]
pub struct ImportEntry {
    /// Key as written in the source file.
    pub source_key: String,
    /// Normalised logical key.
    pub key: LogicalKey,
    pub name: Option<PhysicalName>,
    pub declared: bool,
    pub action: ImportAction,
    #[serde(skip)]
    value: String,
}

impl ImportEntry {
    /// The value with [`mask`] applied.
    pub fn masked_value(&self) -> String {
        mask(&self.value)
    }
}

/// Per-key decisions for importing a mapping into a scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportPlan {
    entries: Vec<ImportEntry>,
}

impl ImportPlan {
    /// Decide an action for every key of `mapping`.
    ///
    /// Reads the current value of each candidate; performs no writes. When
    /// two source keys normalise to the same logical key the later one
    /// wins.
    pub fn compute(
        scope: &Scope<'_>,
        store: &dyn SecretStore,
        mapping: &SecretMapping,
        options: ImportOptions,
    ) -> Self {
        let mut entries: Vec<ImportEntry> = Vec::new();

        for (source_key, value) in mapping.iter() {
            let key = normalize_key(source_key);
            let declared = scope.secret(&key).is_some();
            let mut entry = ImportEntry {
                source_key: source_key.to_string(),
                key: key.clone(),
                name: None,
                declared,
                action: ImportAction::Unchanged,
                value: value.to_string(),
            };

            entry.action = if let Err(e) = validate_key(&key) {
                ImportAction::Skip(SkipReason::InvalidKey(e.to_string()))
            } else if let Some(token) = matched_token(value).filter(|_| options.filter_placeholders) {
                ImportAction::Skip(SkipReason::Placeholder(token))
            } else {
                let name = scope.physical_name(&key);
                let action = match store.get_secret(&name, None) {
                    Ok(current) if current == value => ImportAction::Unchanged,
                    Ok(_) => ImportAction::Update,
                    Err(Error::Store(e)) if e.is_not_found() => ImportAction::Create,
                    Err(e) => {
                        warn!(name = %name, error = %e, "cannot read current value");
                        ImportAction::Skip(SkipReason::Unreadable(e.to_string()))
                    }
                };
                entry.name = Some(name);
                action
            };

            debug!(key = %entry.key, action = entry.action.label(), "planned");
            match entries.iter().position(|e| e.key == entry.key) {
                Some(i) => entries[i] = entry,
                None => entries.push(entry),
            }
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    pub fn creates(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Create))
    }

    pub fn updates(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Update))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Skip(_)))
    }

    /// Apply the plan; only create and update entries write.
    ///
    /// A failed write is recorded and the rest of the plan still runs.
    pub fn apply(&self, store: &dyn SecretStore) -> ImportOutcome {
        let mut outcome = ImportOutcome {
            unchanged: self.unchanged(),
            skipped: self.skipped(),
            ..ImportOutcome::default()
        };

        for entry in self.entries.iter().filter(|e| e.action.writes()) {
            let Some(name) = &entry.name else { continue };
            match store.set_secret(name, &entry.value) {
                Ok(version) => {
                    info!(name = %name, %version, "imported");
                    match entry.action {
                        ImportAction::Create => outcome.created += 1,
                        _ => outcome.updated += 1,
                    }
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "import write failed");
                    outcome.failed.push((entry.key.clone(), e.to_string()));
                }
            }
        }
        outcome
    }

    fn count(&self, pred: impl Fn(&ImportAction) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.action)).count()
    }
}

/// Counts after applying a plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: Vec<(LogicalKey, String)>,
}

impl ImportOutcome {
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }
}

/// Collect a mapping for export.
///
/// Declared secrets of every scope, with defaults for absent ones.
pub fn export_mapping(scopes: &[Scope<'_>], store: &dyn SecretStore) -> LoadedSecrets {
    load_scopes(scopes, store)
}
