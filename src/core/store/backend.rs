//! Backend selection for the secret store.
//!
//! Chosen from `SECRETS_MANAGER_STORE`:
//! - unset or `gcloud`: Google Secret Manager via the gcloud CLI
//! - `file:<path>`: JSON document at `<path>`
//! - `memory`: ephemeral in-process state

use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use super::{FileStore, GcloudStore, MemoryStore, SecretStore};
use crate::core::config::Environment;
use crate::core::constants::STORE_ENV;
use crate::error::{ConfigError, Error, Result};

/// A store backend selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Gcloud,
    File(PathBuf),
    Memory,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "gcloud" => Ok(StoreKind::Gcloud),
            "memory" => Ok(StoreKind::Memory),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(StoreKind::File(PathBuf::from(path))),
                _ => Err(ConfigError::UnknownBackend(other.to_string()).into()),
            },
        }
    }
}

impl StoreKind {
    /// Read the selector from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownBackend` for an unrecognised value.
    pub fn from_env() -> Result<Self> {
        match std::env::var(STORE_ENV) {
            Ok(value) => value.parse(),
            Err(_) => Ok(StoreKind::Gcloud),
        }
    }
}

/// Open the store holding an environment's secrets.
///
/// # Errors
///
/// Returns an error if the selector is invalid or the backend is unavailable.
pub fn open_store(env: &Environment) -> Result<Box<dyn SecretStore>> {
    let kind = StoreKind::from_env()?;
    info!(backend = ?kind, project = %env.gcp_project, "opening secret store");

    Ok(match kind {
        StoreKind::Gcloud => Box::new(GcloudStore::new(env.gcp_project.clone())?),
        StoreKind::File(path) => Box::new(FileStore::new(path, env.gcp_project.clone())),
        StoreKind::Memory => Box::new(MemoryStore::new()),
    })
}
