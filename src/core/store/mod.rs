//! Secret store abstraction.
//!
//! The remote store (secrets, versions and IAM policies keyed by physical
//! name) is an external collaborator. The core only talks to it through the
//! [`SecretStore`] trait and never caches what it returns beyond a single
//! pass.
//!
//! ## Backends
//!
//! - **gcloud**: Google Secret Manager through the `gcloud` CLI (default).
//! - **file**: a JSON document on disk, re-read on every call.
//! - **memory**: in-process state, used by tests.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `SecretStore` trait
//! 2. Add the implementation in a new file
//! 3. Wire it into `backend::open_store`

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::naming::PhysicalName;
use crate::core::types::{Role, VersionId};
use crate::error::Result;

mod backend;
mod file;
mod gcloud;
mod memory;
mod state;

pub use backend::{open_store, StoreKind};
pub use file::FileStore;
pub use gcloud::GcloudStore;
pub use memory::MemoryStore;
#[cfg(test)]
pub(crate) use memory::RestrictedStore;

/// One (member, role) entry of a secret's IAM policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Binding {
    /// Service-account identifier (no `serviceAccount:` prefix).
    pub member: String,
    pub role: Role,
}

impl Binding {
    pub fn new(member: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            role: role.into(),
        }
    }
}

/// The IAM policy attached to one secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamPolicy {
    pub bindings: BTreeSet<Binding>,
}

impl IamPolicy {
    /// Whether `member` holds `role`.
    pub fn grants(&self, member: &str, role: &str) -> bool {
        self.bindings
            .iter()
            .any(|b| b.member == member && b.role == role)
    }
}

/// Metadata for one stored version of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretVersion {
    pub id: VersionId,
    pub state: String,
    pub created: Option<DateTime<Utc>>,
}

/// Secret store trait.
///
/// Every method is keyed by physical name. `NotFound`, `PermissionDenied`
/// and backend failures are reported through `StoreError` so callers can
/// turn them into per-item results.
pub trait SecretStore {
    /// Backend name for display.
    fn name(&self) -> &'static str;

    /// Read a secret payload; `version` defaults to the latest.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the secret or version is absent.
    fn get_secret(&self, name: &PhysicalName, version: Option<&str>) -> Result<String>;

    /// Create the secret if needed and add a new version.
    ///
    /// # Returns
    ///
    /// The new version id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write is rejected.
    fn set_secret(&self, name: &PhysicalName, value: &str) -> Result<VersionId>;

    /// Names of all secrets starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if listing fails.
    fn list_secrets(&self, prefix: &str) -> Result<Vec<PhysicalName>>;

    /// Delete a secret and all its versions.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the secret is absent.
    fn delete_secret(&self, name: &PhysicalName) -> Result<()>;

    /// Version history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the secret is absent.
    fn versions(&self, name: &PhysicalName) -> Result<Vec<SecretVersion>>;

    /// Current IAM policy of a secret.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the policy cannot be read.
    fn get_iam_policy(&self, name: &PhysicalName) -> Result<IamPolicy>;

    /// Replace the IAM policy of a secret.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the policy cannot be written.
    fn set_iam_policy(&self, name: &PhysicalName, policy: &IamPolicy) -> Result<()>;

    /// Add one binding to a secret's policy.
    ///
    /// The default reads the current policy and writes it back with the
    /// binding added.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if reading or writing the policy fails.
    fn add_binding(&self, name: &PhysicalName, binding: &Binding) -> Result<()> {
        let mut policy = self.get_iam_policy(name)?;
        if policy.bindings.insert(binding.clone()) {
            self.set_iam_policy(name, &policy)?;
        }
        Ok(())
    }

    /// Whether a secret exists.
    ///
    /// # Errors
    ///
    /// Returns errors other than `NotFound`.
    fn exists(&self, name: &PhysicalName) -> Result<bool> {
        match self.versions(name) {
            Ok(_) => Ok(true),
            Err(crate::error::Error::Store(e)) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
