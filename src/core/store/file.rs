//! JSON-file secret store.
//!
//! Keeps every store project in one document:
//!
//! ```json
//! {
//!   "projects": {
//!     "botmaro-test": {
//!       "secrets": {
//!         "botmaro-staging--API_KEY": {
//!           "versions": [{ "id": "1", "value": "...", "created": "..." }],
//!           "policy": { "bindings": [{ "member": "...", "role": "..." }] }
//!         }
//!       },
//!       "denied": ["botmaro-staging--LOCKED"]
//!     }
//!   }
//! }
//! ```
//!
//! The document is read on every call and rewritten after each mutation,
//! so nothing is cached between calls.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::state::StoreState;
use super::{IamPolicy, SecretStore, SecretVersion};
use crate::core::naming::PhysicalName;
use crate::core::types::VersionId;
use crate::error::{Result, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileDocument {
    #[serde(default)]
    projects: BTreeMap<String, StoreState>,
}

/// File-backed store scoped to one store project.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    project: String,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            project: project.into(),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<FileDocument> {
        if !self.path.exists() {
            return Ok(FileDocument::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(FileDocument::default());
        }
        serde_json::from_str(&contents).map_err(|e| {
            StoreError::Backend(format!("corrupt store file {}: {}", self.path.display(), e)).into()
        })
    }

    fn save(&self, doc: &FileDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(serde_json::to_string_pretty(doc)?.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        trace!(path = %self.path.display(), "store file written");
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> Result<T>) -> Result<T> {
        let doc = self.load()?;
        let empty = StoreState::default();
        f(doc.projects.get(&self.project).unwrap_or(&empty))
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut doc = self.load()?;
        let value = f(doc.projects.entry(self.project.clone()).or_default())?;
        self.save(&doc)?;
        Ok(value)
    }
}

impl SecretStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get_secret(&self, name: &PhysicalName, version: Option<&str>) -> Result<String> {
        self.read(|state| state.get(name, version))
    }

    fn set_secret(&self, name: &PhysicalName, value: &str) -> Result<VersionId> {
        self.write(|state| state.set(name, value))
    }

    fn list_secrets(&self, prefix: &str) -> Result<Vec<PhysicalName>> {
        self.read(|state| Ok(state.list(prefix)))
    }

    fn delete_secret(&self, name: &PhysicalName) -> Result<()> {
        self.write(|state| state.delete(name))
    }

    fn versions(&self, name: &PhysicalName) -> Result<Vec<SecretVersion>> {
        self.read(|state| state.versions(name))
    }

    fn get_iam_policy(&self, name: &PhysicalName) -> Result<IamPolicy> {
        self.read(|state| state.policy(name))
    }

    fn set_iam_policy(&self, name: &PhysicalName, policy: &IamPolicy) -> Result<()> {
        self.write(|state| state.set_policy(name, policy))
    }
}
