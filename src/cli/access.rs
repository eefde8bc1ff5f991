//! Grant-access command.
//!
//! Shows every (secret, account) pair a grant would touch, asks once, then
//! reconciles each pair and prints what happened to it.

use std::collections::BTreeSet;
use std::path::Path;

use crate::cli::context::{confirm, load_config};
use crate::cli::output::{self, Level};
use crate::core::access::{AccessReconciler, AccessReport, GrantPlan, PairStatus};
use crate::core::placeholder::is_placeholder_account;
use crate::core::store::open_store;
use crate::error::{Error, Result};

/// Grant service accounts a role on every secret of a scope.
///
/// Without explicit accounts, the scope's configured accounts are used.
pub fn execute(
    config: &Path,
    env: &str,
    project: Option<&str>,
    service_accounts: Vec<String>,
    role: &str,
    yes: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let scope = config.scope(env, project)?;

    let accounts: BTreeSet<String> = if service_accounts.is_empty() {
        scope.service_accounts()
    } else {
        service_accounts.into_iter().collect()
    };
    if accounts.is_empty() {
        return Err(Error::Other(format!(
            "no service accounts configured for {}; pass --service-account",
            scope.label()
        )));
    }
    for account in accounts.iter().filter(|a| is_placeholder_account(a)) {
        output::warn(&format!("{} looks like a placeholder account", account));
    }

    let store = open_store(scope.environment())?;
    let reconciler = AccessReconciler::new(store.as_ref());
    let report = reconciler.grant_access_bulk(&scope, &accounts, role, |plan| {
        preview(plan);
        confirm(&format!("Grant {} on {} pair(s)?", role, plan.len()), yes)
    })?;

    print_report(&report);
    report.into_result().map(|_| ())
}

/// Print a grant plan to stderr before confirmation.
pub fn preview(plan: &GrantPlan) {
    output::note(&format!("{} pair(s) to reconcile:", plan.len()));
    for pair in plan.pairs() {
        output::note(&format!("  {}", pair));
    }
}

/// Print per-pair outcomes and a summary line.
pub fn print_report(report: &AccessReport) {
    for outcome in report.outcomes() {
        let (word, level) = match &outcome.status {
            PairStatus::Granted => ("granted", Level::Ok),
            PairStatus::AlreadyGranted => ("present", Level::Quiet),
            PairStatus::Failed(_) => ("failed", Level::Fail),
        };
        let mut line = format!(
            "{:<8} {} → {}",
            output::status(word, level),
            output::key(outcome.binding.name.as_str()),
            outcome.binding.account
        );
        if let PairStatus::Failed(reason) = &outcome.status {
            line.push_str(&format!("  {}", reason));
        }
        output::list_item(&line);
    }

    let summary = format!(
        "{} granted, {} already present, {} failed",
        report.granted(),
        report.already_granted(),
        report.failed()
    );
    if report.is_success() {
        output::success(&summary);
    } else {
        output::error(&summary);
    }
}
