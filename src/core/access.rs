//! Access reconciliation.
//!
//! Grants service accounts read access to secrets, touching the store only
//! where a binding is actually missing. Every pair re-reads the current
//! policy before deciding, so a re-run after a partial failure only repairs
//! what is still absent.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::Scope;
use crate::core::naming::PhysicalName;
use crate::core::store::{Binding, SecretStore};
use crate::core::types::{Role, ServiceAccount};
use crate::error::{Error, Result};

/// A (secret, account, role) triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AccessBinding {
    pub name: PhysicalName,
    pub account: ServiceAccount,
    pub role: Role,
}

impl fmt::Display for AccessBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} ({})", self.name, self.account, self.role)
    }
}

/// Outcome of one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "error")]
pub enum PairStatus {
    AlreadyGranted,
    Granted,
    Failed(String),
}

/// Result for one (secret, account) pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    #[serde(flatten)]
    pub binding: AccessBinding,
    #[serde(flatten)]
    pub status: PairStatus,
}

/// The resolved set of pairs a grant would touch, sorted by physical name.
#[derive(Debug, Clone, Default)]
pub struct GrantPlan {
    pairs: Vec<AccessBinding>,
}

impl GrantPlan {
    /// Cross every name with every account.
    pub fn new(
        names: &BTreeSet<PhysicalName>,
        accounts: &BTreeSet<ServiceAccount>,
        role: &str,
    ) -> Self {
        let pairs = names
            .iter()
            .flat_map(|name| {
                accounts.iter().map(move |account| AccessBinding {
                    name: name.clone(),
                    account: account.clone(),
                    role: role.to_string(),
                })
            })
            .collect();
        Self { pairs }
    }

    /// Expand a scope's declared secrets against the given accounts.
    pub fn for_scope(scope: &Scope<'_>, accounts: &BTreeSet<ServiceAccount>, role: &str) -> Self {
        Self::new(&scope.physical_names(), accounts, role)
    }

    pub fn pairs(&self) -> &[AccessBinding] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Aggregate outcome of a reconciliation pass, sorted by physical name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccessReport {
    outcomes: Vec<PairOutcome>,
}

impl AccessReport {
    pub fn outcomes(&self) -> &[PairOutcome] {
        &self.outcomes
    }

    pub fn granted(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Granted))
    }

    pub fn already_granted(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::AlreadyGranted))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Failed(_)))
    }

    /// Whether no pair failed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Convert into a command result.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessFailed` if any pair failed.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::AccessFailed {
                failed: self.failed(),
                total: self.len(),
            })
        }
    }

    fn count(&self, pred: impl Fn(&PairStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Computes and applies missing IAM bindings.
pub struct AccessReconciler<'s> {
    store: &'s dyn SecretStore,
}

impl<'s> AccessReconciler<'s> {
    pub fn new(store: &'s dyn SecretStore) -> Self {
        Self { store }
    }

    /// Ensure every account holds `role` on every named secret.
    ///
    /// Per-pair failures are recorded in the report and never stop the
    /// remaining pairs.
    pub fn ensure_access(
        &self,
        names: &BTreeSet<PhysicalName>,
        accounts: &BTreeSet<ServiceAccount>,
        role: &str,
    ) -> AccessReport {
        self.apply(&GrantPlan::new(names, accounts, role))
    }

    /// The subset of `names` that can carry a binding.
    ///
    /// Only secrets known to be absent are dropped. A name whose existence
    /// cannot be determined stays, so its pairs fail in the report.
    pub fn grantable(
        &self,
        names: impl IntoIterator<Item = PhysicalName>,
    ) -> BTreeSet<PhysicalName> {
        names
            .into_iter()
            .filter(|name| match self.store.exists(name) {
                Ok(exists) => exists,
                Err(e) => {
                    warn!(name = %name, error = %e, "existence check failed");
                    true
                }
            })
            .collect()
    }

    /// Apply a previously computed plan.
    pub fn apply(&self, plan: &GrantPlan) -> AccessReport {
        let mut outcomes: Vec<PairOutcome> = plan
            .pairs()
            .iter()
            .map(|binding| PairOutcome {
                binding: binding.clone(),
                status: self.reconcile_pair(binding),
            })
            .collect();
        outcomes.sort_by(|a, b| a.binding.cmp(&b.binding));

        let report = AccessReport { outcomes };
        info!(
            granted = report.granted(),
            already = report.already_granted(),
            failed = report.failed(),
            "access reconciled"
        );
        report
    }

    /// Scope-level grant with a confirmation gate.
    ///
    /// `confirm` receives the full plan before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` when the plan is declined, or the error
    /// raised by `confirm`.
    pub fn grant_access_bulk(
        &self,
        scope: &Scope<'_>,
        accounts: &BTreeSet<ServiceAccount>,
        role: &str,
        confirm: impl FnOnce(&GrantPlan) -> Result<bool>,
    ) -> Result<AccessReport> {
        let plan = GrantPlan::for_scope(scope, accounts, role);
        debug!(scope = %scope.label(), pairs = plan.len(), "grant plan resolved");

        if !confirm(&plan)? {
            return Err(Error::Cancelled);
        }
        Ok(self.apply(&plan))
    }

    fn reconcile_pair(&self, pair: &AccessBinding) -> PairStatus {
        let policy = match self.store.get_iam_policy(&pair.name) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(name = %pair.name, account = %pair.account, error = %e, "policy read failed");
                return PairStatus::Failed(e.to_string());
            }
        };

        if policy.grants(&pair.account, &pair.role) {
            debug!(name = %pair.name, account = %pair.account, "already granted");
            return PairStatus::AlreadyGranted;
        }

        match self
            .store
            .add_binding(&pair.name, &Binding::new(pair.account.clone(), pair.role.clone()))
        {
            Ok(()) => {
                debug!(name = %pair.name, account = %pair.account, "granted");
                PairStatus::Granted
            }
            Err(e) => {
                warn!(name = %pair.name, account = %pair.account, error = %e, "grant failed");
                PairStatus::Failed(e.to_string())
            }
        }
    }
}
