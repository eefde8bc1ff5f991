//! Secret operations (set, get, delete, versions, list, load).
//!
//! Every operation works on one [`Scope`] and resolves logical keys through
//! the naming rules before touching the store.

use serde::Serialize;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::core::config::{Scope, SecretSpec};
use crate::core::format::SecretMapping;
use crate::core::naming::{self, PhysicalName};
use crate::core::store::{SecretStore, SecretVersion};
use crate::core::types::{LogicalKey, VersionId};
use crate::core::validation::{validate_key, validate_value};
use crate::error::{Error, Result};

/// Whether a write created the secret or added a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteKind {
    Created,
    Updated,
}

/// Result of [`set_secret`].
#[derive(Debug, Clone, Serialize)]
pub struct SetOutcome {
    pub name: PhysicalName,
    pub version: VersionId,
    pub kind: WriteKind,
    /// Whether the key is declared in the scope.
    pub declared: bool,
}

/// Write a secret value.
///
/// Undeclared keys are accepted; the outcome says so.
///
/// # Errors
///
/// Returns `ValidationError` for a bad key or empty value, or the store
/// error if the write fails.
pub fn set_secret(
    scope: &Scope<'_>,
    store: &dyn SecretStore,
    key: &str,
    value: &str,
) -> Result<SetOutcome> {
    validate_key(key)?;
    validate_value(key, value)?;

    let name = scope.physical_name(key);
    let existed = store.exists(&name)?;
    let version = store.set_secret(&name, value)?;
    let kind = if existed {
        WriteKind::Updated
    } else {
        WriteKind::Created
    };
    info!(name = %name, version = %version, ?kind, "secret written");

    Ok(SetOutcome {
        name,
        version,
        kind,
        declared: scope.secret(key).is_some(),
    })
}

/// Read a secret value, the latest version unless `version` is given.
///
/// # Errors
///
/// Returns `StoreError::NotFound` if the secret or version is absent.
pub fn get_secret(
    scope: &Scope<'_>,
    store: &dyn SecretStore,
    key: &str,
    version: Option<&str>,
) -> Result<Zeroizing<String>> {
    let name = scope.physical_name(key);
    debug!(name = %name, ?version, "reading secret");
    Ok(Zeroizing::new(store.get_secret(&name, version)?))
}

/// Delete a secret with all its versions.
///
/// # Errors
///
/// Returns `StoreError::NotFound` if the secret is absent.
pub fn delete_secret(scope: &Scope<'_>, store: &dyn SecretStore, key: &str) -> Result<PhysicalName> {
    let name = scope.physical_name(key);
    store.delete_secret(&name)?;
    info!(name = %name, "secret deleted");
    Ok(name)
}

/// Version history of a secret, newest first.
///
/// # Errors
///
/// Returns `StoreError::NotFound` if the secret is absent.
pub fn versions(scope: &Scope<'_>, store: &dyn SecretStore, key: &str) -> Result<Vec<SecretVersion>> {
    store.versions(&scope.physical_name(key))
}

/// Store status of a listed secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "error")]
pub enum SecretStatus {
    Set,
    Missing,
    Error(String),
}

/// One row of [`list_scope`].
#[derive(Debug, Clone, Serialize)]
pub struct ListedSecret {
    pub key: LogicalKey,
    pub name: PhysicalName,
    pub declared: bool,
    pub required: bool,
    #[serde(flatten)]
    pub status: SecretStatus,
    #[serde(skip)]
    pub value: Option<Zeroizing<String>>,
}

/// Declared secrets of a scope with their status, followed by secrets
/// found under the scope's prefix that nothing declares.
///
/// Values are only read when `with_values` is set.
///
/// # Errors
///
/// Returns the store error if listing the prefix fails.
pub fn list_scope(
    scope: &Scope<'_>,
    store: &dyn SecretStore,
    with_values: bool,
) -> Result<Vec<ListedSecret>> {
    let mut rows: Vec<ListedSecret> = scope
        .secrets()
        .into_iter()
        .map(|spec| declared_row(scope, store, spec, with_values))
        .collect();

    let env = scope.environment();
    for name in store.list_secrets(&naming::environment_filter(&env.prefix))? {
        let parsed = match naming::parse(name.as_str()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(name = %name, error = %e, "skipping unrecognised secret");
                continue;
            }
        };
        if parsed.prefix != env.prefix || parsed.project.as_deref() != scope.project_id() {
            continue;
        }
        if rows.iter().any(|r| r.key == parsed.key) {
            continue;
        }

        let value = if with_values {
            store.get_secret(&name, None).ok().map(Zeroizing::new)
        } else {
            None
        };
        rows.push(ListedSecret {
            key: parsed.key,
            name,
            declared: false,
            required: false,
            status: SecretStatus::Set,
            value,
        });
    }

    Ok(rows)
}

fn declared_row(
    scope: &Scope<'_>,
    store: &dyn SecretStore,
    spec: &SecretSpec,
    with_values: bool,
) -> ListedSecret {
    let name = scope.physical_name(&spec.name);
    let (status, value) = if with_values {
        match store.get_secret(&name, None) {
            Ok(value) => (SecretStatus::Set, Some(Zeroizing::new(value))),
            Err(Error::Store(e)) if e.is_not_found() => (SecretStatus::Missing, None),
            Err(e) => (SecretStatus::Error(e.to_string()), None),
        }
    } else {
        match store.exists(&name) {
            Ok(true) => (SecretStatus::Set, None),
            Ok(false) => (SecretStatus::Missing, None),
            Err(e) => (SecretStatus::Error(e.to_string()), None),
        }
    };

    ListedSecret {
        key: spec.name.clone(),
        name,
        declared: true,
        required: spec.required,
        status,
        value,
    }
}

/// Values loaded for one or more scopes.
#[derive(Debug, Default)]
pub struct LoadedSecrets {
    pub mapping: SecretMapping,
    /// Keys filled from their declared default.
    pub defaulted: Vec<LogicalKey>,
    /// Required keys with neither a stored value nor a default.
    pub missing: Vec<LogicalKey>,
    /// Keys whose read failed for another reason.
    pub failed: Vec<(LogicalKey, String)>,
}

impl LoadedSecrets {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }

    /// Fail when a required secret could not be loaded.
    ///
    /// # Errors
    ///
    /// Returns `Error::BootstrapFailed` with the number of unavailable keys.
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::BootstrapFailed {
                missing: self.missing.len() + self.failed.len(),
            })
        }
    }
}

/// Load every declared secret of `scopes` in order.
///
/// Later scopes override earlier ones, so a project value wins over an
/// environment value with the same key. Absent secrets fall back to their
/// declared default. Nothing stops at the first failure.
pub fn load_scopes(scopes: &[Scope<'_>], store: &dyn SecretStore) -> LoadedSecrets {
    let mut loaded = LoadedSecrets::default();

    for scope in scopes {
        for spec in scope.secrets() {
            let name = scope.physical_name(&spec.name);
            match store.get_secret(&name, None) {
                Ok(value) => {
                    loaded.mapping.insert(spec.name.clone(), value);
                }
                Err(Error::Store(e)) if e.is_not_found() => match &spec.default {
                    Some(default) => {
                        debug!(name = %name, "using declared default");
                        loaded.mapping.insert(spec.name.clone(), default.clone());
                        loaded.defaulted.push(spec.name.clone());
                    }
                    None if spec.required => {
                        warn!(name = %name, "required secret missing");
                        loaded.missing.push(spec.name.clone());
                    }
                    None => debug!(name = %name, "optional secret absent"),
                },
                Err(e) => {
                    warn!(name = %name, error = %e, "secret read failed");
                    loaded.failed.push((spec.name.clone(), e.to_string()));
                }
            }
        }
    }

    info!(
        loaded = loaded.mapping.len(),
        missing = loaded.missing.len(),
        failed = loaded.failed.len(),
        "secrets loaded"
    );
    loaded
}
