//! Google Secret Manager backend.
//!
//! Drives Secret Manager through the `gcloud` CLI, scoped to one GCP
//! project.
//!
//! ## Requirements
//!
//! - `gcloud` CLI must be installed and authenticated
//! - The caller needs `secretmanager.secrets.*` and
//!   `secretmanager.versions.*` permissions, plus `setIamPolicy` for
//!   access grants

use std::io::Write;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::{debug, trace};

use super::{Binding, IamPolicy, SecretStore, SecretVersion};
use crate::core::constants::SERVICE_ACCOUNT_MEMBER;
use crate::core::naming::PhysicalName;
use crate::core::types::VersionId;
use crate::error::{Result, StoreError};

/// Secret Manager store using the gcloud CLI.
#[derive(Debug, Clone)]
pub struct GcloudStore {
    project: String,
}

#[derive(Debug, Deserialize)]
struct WirePolicy {
    #[serde(default)]
    bindings: Vec<WireBinding>,
    #[serde(default)]
    etag: Option<String>,
}

#[derive(Debug, Deserialize, serde::Serialize)]
struct WireBinding {
    role: String,
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireVersion {
    name: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, rename = "createTime")]
    create_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl GcloudStore {
    /// Create a store for a GCP project.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if `gcloud` is not on `PATH`.
    pub fn new(project: impl Into<String>) -> Result<Self> {
        which::which("gcloud").map_err(|_| {
            StoreError::Unavailable(
                "gcloud CLI not found. Install it from https://cloud.google.com/sdk/docs/install"
                    .to_string(),
            )
        })?;
        Ok(Self {
            project: project.into(),
        })
    }

    fn run(&self, subject: &str, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        trace!(project = %self.project, ?args, "gcloud");

        let mut child = Command::new("gcloud")
            .args(args)
            .args(["--project", self.project.as_str(), "--quiet"])
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StoreError::Unavailable(format!("failed to spawn gcloud: {}", e)))?;

        if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(data)
                .map_err(|e| StoreError::Backend(format!("failed to write to gcloud: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| StoreError::Backend(format!("gcloud command failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify(subject, &stderr).into());
        }
        Ok(output.stdout)
    }

    fn run_text(&self, subject: &str, args: &[&str]) -> Result<String> {
        let stdout = self.run(subject, args, None)?;
        String::from_utf8(stdout)
            .map_err(|e| StoreError::Backend(format!("gcloud returned invalid UTF-8: {}", e)).into())
    }
}

/// Map gcloud stderr onto a store error.
fn classify(subject: &str, stderr: &str) -> StoreError {
    if stderr.contains("NOT_FOUND") || stderr.contains("not found") {
        StoreError::NotFound(subject.to_string())
    } else if stderr.contains("PERMISSION_DENIED") || stderr.contains("does not have permission") {
        StoreError::PermissionDenied(subject.to_string())
    } else {
        StoreError::Backend(format!("{}: {}", subject, stderr.trim()))
    }
}

/// `serviceAccount:a@b` → `a@b`; other member kinds are kept verbatim.
fn member_to_account(member: &str) -> String {
    member
        .strip_prefix(SERVICE_ACCOUNT_MEMBER)
        .unwrap_or(member)
        .to_string()
}

/// `a@b` → `serviceAccount:a@b`; values already carrying a kind are kept.
fn account_to_member(account: &str) -> String {
    if account.contains(':') {
        account.to_string()
    } else {
        format!("{SERVICE_ACCOUNT_MEMBER}{account}")
    }
}

fn last_segment(resource: &str) -> &str {
    resource.rsplit('/').next().unwrap_or(resource)
}

impl SecretStore for GcloudStore {
    fn name(&self) -> &'static str {
        "gcloud"
    }

    fn get_secret(&self, name: &PhysicalName, version: Option<&str>) -> Result<String> {
        let version = version.unwrap_or("latest");
        let payload = self.run(
            name.as_str(),
            &["secrets", "versions", "access", version, "--secret", name.as_str()],
            None,
        )?;
        String::from_utf8(payload).map_err(|e| {
            StoreError::Backend(format!("{} is not valid UTF-8: {}", name, e)).into()
        })
    }

    fn set_secret(&self, name: &PhysicalName, value: &str) -> Result<VersionId> {
        if !self.exists(name)? {
            debug!(name = %name, "creating secret");
            self.run(
                name.as_str(),
                &[
                    "secrets",
                    "create",
                    name.as_str(),
                    "--replication-policy=automatic",
                ],
                None,
            )?;
        }

        let out = self.run(
            name.as_str(),
            &[
                "secrets",
                "versions",
                "add",
                name.as_str(),
                "--data-file=-",
                "--format=value(name)",
            ],
            Some(value.as_bytes()),
        )?;
        let resource = String::from_utf8_lossy(&out);
        Ok(last_segment(resource.trim()).to_string())
    }

    fn list_secrets(&self, prefix: &str) -> Result<Vec<PhysicalName>> {
        let filter = format!("--filter=name:{prefix}");
        let out = self.run_text(prefix, &["secrets", "list", &filter, "--format=value(name)"])?;
        let mut names: Vec<PhysicalName> = out
            .lines()
            .map(|line| last_segment(line.trim()))
            .filter(|name| !name.is_empty() && name.starts_with(prefix))
            .map(PhysicalName::from_raw)
            .collect();
        names.sort();
        Ok(names)
    }

    fn delete_secret(&self, name: &PhysicalName) -> Result<()> {
        self.run(name.as_str(), &["secrets", "delete", name.as_str()], None)?;
        Ok(())
    }

    fn versions(&self, name: &PhysicalName) -> Result<Vec<SecretVersion>> {
        let out = self.run_text(
            name.as_str(),
            &[
                "secrets",
                "versions",
                "list",
                name.as_str(),
                "--format=json",
            ],
        )?;
        let wire: Vec<WireVersion> = serde_json::from_str(&out)?;
        Ok(wire
            .into_iter()
            .map(|v| SecretVersion {
                id: last_segment(&v.name).to_string(),
                state: v.state.unwrap_or_default().to_lowercase(),
                created: v.create_time,
            })
            .collect())
    }

    fn get_iam_policy(&self, name: &PhysicalName) -> Result<IamPolicy> {
        let out = self.run_text(
            name.as_str(),
            &["secrets", "get-iam-policy", name.as_str(), "--format=json"],
        )?;
        let wire: WirePolicy = serde_json::from_str(&out)?;
        trace!(name = %name, etag = ?wire.etag, "policy read");

        let mut policy = IamPolicy::default();
        for binding in wire.bindings {
            for member in binding.members {
                policy
                    .bindings
                    .insert(Binding::new(member_to_account(&member), binding.role.clone()));
            }
        }
        Ok(policy)
    }

    fn set_iam_policy(&self, name: &PhysicalName, policy: &IamPolicy) -> Result<()> {
        let mut by_role: std::collections::BTreeMap<&str, Vec<String>> =
            std::collections::BTreeMap::new();
        for binding in &policy.bindings {
            by_role
                .entry(binding.role.as_str())
                .or_default()
                .push(account_to_member(&binding.member));
        }
        let bindings: Vec<WireBinding> = by_role
            .into_iter()
            .map(|(role, members)| WireBinding {
                role: role.to_string(),
                members,
            })
            .collect();
        let document = serde_json::json!({ "bindings": bindings });

        let mut file = tempfile::Builder::new()
            .prefix("secrets-manager-policy")
            .suffix(".json")
            .tempfile()?;
        file.write_all(serde_json::to_string(&document)?.as_bytes())?;
        file.flush()?;

        let policy_path = file.path().to_string_lossy().to_string();
        self.run(
            name.as_str(),
            &["secrets", "set-iam-policy", name.as_str(), &policy_path],
            None,
        )?;
        Ok(())
    }

    fn add_binding(&self, name: &PhysicalName, binding: &Binding) -> Result<()> {
        let member = format!("--member={}", account_to_member(&binding.member));
        let role = format!("--role={}", binding.role);
        self.run(
            name.as_str(),
            &[
                "secrets",
                "add-iam-policy-binding",
                name.as_str(),
                &member,
                &role,
            ],
            None,
        )?;
        Ok(())
    }
}
