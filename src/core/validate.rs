//! Consistency checks.
//!
//! Cross-references the declared configuration against a snapshot of the
//! store and against workflow references. Every check runs regardless of
//! what earlier checks found, and findings never cause mutation.
//!
//! Findings are ordered by check, then by subject:
//!
//! 1. `missing-secret`: required secrets absent from the store
//! 2. `placeholder-value`: present secrets holding a placeholder token
//! 3. `placeholder-account`: declared accounts that look like templates
//! 4. `missing-access`: accounts lacking the accessor role on a secret
//! 5. `undeclared-workflow-reference`: workflow keys no scope declares
//!
//! Store reads that fail during capture are reported last as `store-error`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::config::Scope;
use crate::core::naming::PhysicalName;
use crate::core::placeholder::{is_placeholder_account, matched_token};
use crate::core::store::{Binding, IamPolicy, SecretStore};
use crate::core::workflow::WorkflowReferences;
use crate::error::{Error, Result};

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    MissingSecret,
    PlaceholderValue,
    PlaceholderAccount,
    MissingAccess,
    UndeclaredWorkflowReference,
    StoreError,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MissingSecret => "missing-secret",
            Category::PlaceholderValue => "placeholder-value",
            Category::PlaceholderAccount => "placeholder-account",
            Category::MissingAccess => "missing-access",
            Category::UndeclaredWorkflowReference => "undeclared-workflow-reference",
            Category::StoreError => "store-error",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    /// Physical name, service account or workflow key.
    pub subject: String,
    pub message: String,
}

impl Finding {
    fn new(
        severity: Severity,
        category: Category,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Store state read once for a validation pass.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    values: BTreeMap<PhysicalName, String>,
    policies: BTreeMap<PhysicalName, IamPolicy>,
    failures: BTreeMap<PhysicalName, String>,
}

impl StoreSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value and policy of every secret declared in `scopes`.
    ///
    /// Absent secrets are simply left out. Other read failures are kept
    /// and surface as `store-error` findings.
    pub fn capture(store: &dyn SecretStore, scopes: &[Scope<'_>]) -> Self {
        let mut snapshot = Self::new();
        let names: BTreeSet<PhysicalName> =
            scopes.iter().flat_map(|s| s.physical_names()).collect();

        for name in names {
            match store.get_secret(&name, None) {
                Ok(value) => {
                    snapshot.values.insert(name.clone(), value);
                }
                Err(Error::Store(e)) if e.is_not_found() => {
                    debug!(name = %name, "absent");
                    continue;
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "secret read failed");
                    snapshot.failures.insert(name, e.to_string());
                    continue;
                }
            }

            match store.get_iam_policy(&name) {
                Ok(policy) => {
                    snapshot.policies.insert(name, policy);
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "policy read failed");
                    snapshot.failures.insert(name, e.to_string());
                }
            }
        }
        snapshot
    }

    /// Record a present secret.
    pub fn with_secret(mut self, name: &str, value: &str) -> Self {
        self.values
            .insert(PhysicalName::from_raw(name), value.to_string());
        self
    }

    /// Record a binding on a secret's policy.
    pub fn with_binding(mut self, name: &str, account: &str, role: &str) -> Self {
        self.policies
            .entry(PhysicalName::from_raw(name))
            .or_default()
            .bindings
            .insert(Binding::new(account, role));
        self
    }

    /// Record a failed read.
    pub fn with_failure(mut self, name: &str, reason: &str) -> Self {
        self.failures
            .insert(PhysicalName::from_raw(name), reason.to_string());
        self
    }

    pub fn contains(&self, name: &PhysicalName) -> bool {
        self.values.contains_key(name)
    }

    pub fn value(&self, name: &PhysicalName) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn policy(&self, name: &PhysicalName) -> Option<&IamPolicy> {
        self.policies.get(name)
    }

    fn failed(&self, name: &PhysicalName) -> bool {
        self.failures.contains_key(name)
    }
}

/// Run every check over `scopes`.
///
/// `role` is the role each declared account must hold on each required
/// secret of its scope.
pub fn validate(
    scopes: &[Scope<'_>],
    snapshot: &StoreSnapshot,
    references: &WorkflowReferences,
    role: &str,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(check_existence(scopes, snapshot));
    findings.extend(check_placeholder_values(scopes, snapshot));
    findings.extend(check_placeholder_accounts(scopes));
    findings.extend(check_access(scopes, snapshot, role));
    findings.extend(check_workflow_references(scopes, references));
    findings.extend(store_errors(snapshot));
    findings
}

fn sorted(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| a.subject.cmp(&b.subject).then(a.message.cmp(&b.message)));
    findings
}

fn check_existence(scopes: &[Scope<'_>], snapshot: &StoreSnapshot) -> Vec<Finding> {
    let mut findings = Vec::new();
    for scope in scopes {
        for spec in scope.secrets() {
            let name = scope.physical_name(&spec.name);
            if snapshot.contains(&name) || snapshot.failed(&name) {
                continue;
            }
            if spec.required {
                findings.push(Finding::new(
                    Severity::Error,
                    Category::MissingSecret,
                    name.as_str(),
                    format!("required secret {} is not set in {}", spec.name, scope.label()),
                ));
            } else {
                findings.push(Finding::new(
                    Severity::Info,
                    Category::MissingSecret,
                    name.as_str(),
                    format!("optional secret {} is not set in {}", spec.name, scope.label()),
                ));
            }
        }
    }
    sorted(findings)
}

fn check_placeholder_values(scopes: &[Scope<'_>], snapshot: &StoreSnapshot) -> Vec<Finding> {
    let mut findings = Vec::new();
    for scope in scopes {
        for name in scope.physical_names() {
            let Some(value) = snapshot.value(&name) else {
                continue;
            };
            if let Some(token) = matched_token(value) {
                findings.push(Finding::new(
                    Severity::Warning,
                    Category::PlaceholderValue,
                    name.as_str(),
                    format!("value contains placeholder token {token}"),
                ));
            }
        }
    }
    sorted(findings)
}

fn check_placeholder_accounts(scopes: &[Scope<'_>]) -> Vec<Finding> {
    let mut declared: BTreeMap<&str, String> = BTreeMap::new();
    for scope in scopes {
        let own = match scope.project() {
            Some(project) => &project.service_accounts,
            None => &scope.environment().service_accounts,
        };
        for account in own {
            declared
                .entry(account.as_str())
                .or_insert_with(|| scope.label());
        }
    }

    declared
        .into_iter()
        .filter(|(account, _)| is_placeholder_account(account))
        .map(|(account, label)| {
            Finding::new(
                Severity::Warning,
                Category::PlaceholderAccount,
                account,
                format!("service account declared in {label} looks like a placeholder"),
            )
        })
        .collect()
}

fn check_access(scopes: &[Scope<'_>], snapshot: &StoreSnapshot, role: &str) -> Vec<Finding> {
    let empty = IamPolicy::default();
    let mut findings = Vec::new();
    for scope in scopes {
        let accounts = scope.service_accounts();
        for spec in scope.secrets().into_iter().filter(|s| s.required) {
            let name = scope.physical_name(&spec.name);
            // A failed read is already a store-error finding
            if !snapshot.contains(&name) || snapshot.failed(&name) {
                continue;
            }
            let policy = snapshot.policy(&name).unwrap_or(&empty);
            for account in &accounts {
                if !policy.grants(account, role) {
                    findings.push(Finding::new(
                        Severity::Error,
                        Category::MissingAccess,
                        name.as_str(),
                        format!("{account} lacks {role}"),
                    ));
                }
            }
        }
    }
    sorted(findings)
}

fn check_workflow_references(
    scopes: &[Scope<'_>],
    references: &WorkflowReferences,
) -> Vec<Finding> {
    let declared: BTreeSet<&str> = scopes
        .iter()
        .flat_map(|s| s.secrets())
        .map(|s| s.name.as_str())
        .collect();

    references
        .keys()
        .filter(|key| !declared.contains(key))
        .map(|key| {
            let files: Vec<String> = references
                .files(key)
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            Finding::new(
                Severity::Warning,
                Category::UndeclaredWorkflowReference,
                key,
                format!("referenced by {} but not declared", files.join(", ")),
            )
        })
        .collect()
}

fn store_errors(snapshot: &StoreSnapshot) -> Vec<Finding> {
    snapshot
        .failures
        .iter()
        .map(|(name, reason)| {
            Finding::new(Severity::Error, Category::StoreError, name.as_str(), reason.clone())
        })
        .collect()
}

/// Summary of a validation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn is_clean(&self) -> bool {
        self.errors() == 0
    }

    /// Fail when any error-severity finding is present.
    ///
    /// # Errors
    ///
    /// Returns `Error::CheckFailed` with the error and warning counts.
    pub fn into_result(self) -> Result<Self> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(Error::CheckFailed {
                errors: self.errors(),
                warnings: self.warnings(),
            })
        }
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}
