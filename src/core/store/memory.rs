//! In-memory secret store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::state::StoreState;
use super::{IamPolicy, SecretStore, SecretVersion};
use crate::core::naming::PhysicalName;
use crate::core::types::VersionId;
use crate::error::Result;

/// Ephemeral store holding state for the lifetime of the process.
///
/// Counts mutating calls so callers can assert idempotence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    mutations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret without counting it as a mutation.
    pub fn with_secret(self, name: &str, value: &str) -> Self {
        // Seeding cannot be denied: the deny list is empty until `deny`.
        let _ = self.lock().set(&PhysicalName::from_raw(name), value);
        self
    }

    /// Make every call touching `name` answer `PermissionDenied`.
    pub fn deny(&self, name: &str) {
        self.lock().denied.insert(name.to_string());
    }

    /// Number of successful mutating calls so far.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutated<T>(&self, result: Result<T>) -> Result<T> {
        if result.is_ok() {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

impl SecretStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_secret(&self, name: &PhysicalName, version: Option<&str>) -> Result<String> {
        self.lock().get(name, version)
    }

    fn set_secret(&self, name: &PhysicalName, value: &str) -> Result<VersionId> {
        let result = self.lock().set(name, value);
        self.mutated(result)
    }

    fn list_secrets(&self, prefix: &str) -> Result<Vec<PhysicalName>> {
        Ok(self.lock().list(prefix))
    }

    fn delete_secret(&self, name: &PhysicalName) -> Result<()> {
        let result = self.lock().delete(name);
        self.mutated(result)
    }

    fn versions(&self, name: &PhysicalName) -> Result<Vec<SecretVersion>> {
        self.lock().versions(name)
    }

    fn get_iam_policy(&self, name: &PhysicalName) -> Result<IamPolicy> {
        self.lock().policy(name)
    }

    fn set_iam_policy(&self, name: &PhysicalName, policy: &IamPolicy) -> Result<()> {
        let result = self.lock().set_policy(name, policy);
        self.mutated(result)
    }
}

/// Memory store that refuses selected operations on every secret.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RestrictedStore {
    pub inner: MemoryStore,
    pub deny_versions: bool,
    pub deny_policy: bool,
}

#[cfg(test)]
impl RestrictedStore {
    fn refuse<T>(name: &PhysicalName) -> Result<T> {
        Err(crate::error::StoreError::PermissionDenied(name.to_string()).into())
    }
}

#[cfg(test)]
impl SecretStore for RestrictedStore {
    fn name(&self) -> &'static str {
        "restricted"
    }

    fn get_secret(&self, name: &PhysicalName, version: Option<&str>) -> Result<String> {
        self.inner.get_secret(name, version)
    }

    fn set_secret(&self, name: &PhysicalName, value: &str) -> Result<VersionId> {
        self.inner.set_secret(name, value)
    }

    fn list_secrets(&self, prefix: &str) -> Result<Vec<PhysicalName>> {
        self.inner.list_secrets(prefix)
    }

    fn delete_secret(&self, name: &PhysicalName) -> Result<()> {
        self.inner.delete_secret(name)
    }

    fn versions(&self, name: &PhysicalName) -> Result<Vec<SecretVersion>> {
        if self.deny_versions {
            return Self::refuse(name);
        }
        self.inner.versions(name)
    }

    fn get_iam_policy(&self, name: &PhysicalName) -> Result<IamPolicy> {
        if self.deny_policy {
            return Self::refuse(name);
        }
        self.inner.get_iam_policy(name)
    }

    fn set_iam_policy(&self, name: &PhysicalName, policy: &IamPolicy) -> Result<()> {
        if self.deny_policy {
            return Self::refuse(name);
        }
        self.inner.set_iam_policy(name, policy)
    }
}
