//! Plain store state shared by the file and memory backends.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{IamPolicy, SecretVersion};
use crate::core::naming::PhysicalName;
use crate::core::types::VersionId;
use crate::error::{Result, StoreError};

const ENABLED: &str = "enabled";

/// All secrets of one store project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct StoreState {
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretRecord>,
    /// Names whose every access answers `PermissionDenied`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub denied: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SecretRecord {
    #[serde(default)]
    pub versions: Vec<StoredVersion>,
    #[serde(default)]
    pub policy: IamPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredVersion {
    pub id: VersionId,
    pub value: String,
    pub created: DateTime<Utc>,
    #[serde(default = "enabled")]
    pub state: String,
}

fn enabled() -> String {
    ENABLED.to_string()
}

impl StoreState {
    fn guard(&self, name: &PhysicalName) -> Result<()> {
        if self.denied.contains(name.as_str()) {
            return Err(StoreError::PermissionDenied(name.to_string()).into());
        }
        Ok(())
    }

    fn record(&self, name: &PhysicalName) -> Result<&SecretRecord> {
        self.guard(name)?;
        self.secrets
            .get(name.as_str())
            .ok_or_else(|| StoreError::NotFound(name.to_string()).into())
    }

    fn record_mut(&mut self, name: &PhysicalName) -> Result<&mut SecretRecord> {
        self.guard(name)?;
        self.secrets
            .get_mut(name.as_str())
            .ok_or_else(|| StoreError::NotFound(name.to_string()).into())
    }

    pub fn get(&self, name: &PhysicalName, version: Option<&str>) -> Result<String> {
        let record = self.record(name)?;
        let found = match version {
            None | Some("latest") => record.versions.iter().rev().find(|v| v.state == ENABLED),
            Some(id) => record.versions.iter().find(|v| v.id == id),
        };
        found
            .map(|v| v.value.clone())
            .ok_or_else(|| StoreError::NotFound(format!("{name}@{}", version.unwrap_or("latest"))).into())
    }

    pub fn set(&mut self, name: &PhysicalName, value: &str) -> Result<VersionId> {
        self.guard(name)?;
        let record = self.secrets.entry(name.to_string()).or_default();
        let id = (record.versions.len() + 1).to_string();
        record.versions.push(StoredVersion {
            id: id.clone(),
            value: value.to_string(),
            created: Utc::now(),
            state: enabled(),
        });
        Ok(id)
    }

    pub fn list(&self, prefix: &str) -> Vec<PhysicalName> {
        self.secrets
            .keys()
            .filter(|name| name.starts_with(prefix))
            .map(PhysicalName::from_raw)
            .collect()
    }

    pub fn delete(&mut self, name: &PhysicalName) -> Result<()> {
        self.guard(name)?;
        self.secrets
            .remove(name.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()).into())
    }

    pub fn versions(&self, name: &PhysicalName) -> Result<Vec<SecretVersion>> {
        let record = self.record(name)?;
        Ok(record
            .versions
            .iter()
            .rev()
            .map(|v| SecretVersion {
                id: v.id.clone(),
                state: v.state.clone(),
                created: Some(v.created),
            })
            .collect())
    }

    pub fn policy(&self, name: &PhysicalName) -> Result<IamPolicy> {
        Ok(self.record(name)?.policy.clone())
    }

    pub fn set_policy(&mut self, name: &PhysicalName, policy: &IamPolicy) -> Result<()> {
        self.record_mut(name)?.policy = policy.clone();
        Ok(())
    }
}
