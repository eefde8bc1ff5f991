//! Check command.
//!
//! Validates an environment against the store and CI workflows and prints
//! every finding grouped by check.

use std::path::Path;

use tracing::info;

use crate::cli::context::load_config;
use crate::cli::output::{self, Level};
use crate::core::constants::ACCESSOR_ROLE;
use crate::core::store::open_store;
use crate::core::validate::{validate, CheckReport, Finding, Severity, StoreSnapshot};
use crate::core::workflow::WorkflowReferences;
use crate::error::Result;

/// Run every check for an environment, or for one of its projects.
///
/// Fails when any error-severity finding is present.
pub fn execute(
    config: &Path,
    env: &str,
    project: Option<&str>,
    workflows: &Path,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let environment = config.environment(env)?;
    let scopes = match project {
        Some(project) => vec![environment.scope(), environment.project_scope(project)?],
        None => environment.all_scopes(),
    };

    let store = open_store(environment)?;
    let snapshot = StoreSnapshot::capture(store.as_ref(), &scopes);
    let references = WorkflowReferences::scan(workflows)?;
    info!(
        scopes = scopes.len(),
        references = references.len(),
        "running checks"
    );

    let report = CheckReport::new(validate(&scopes, &snapshot, &references, ACCESSOR_ROLE));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&environment.name, &report);
    }

    report.into_result().map(|_| ())
}

fn print_report(env: &str, report: &CheckReport) {
    output::section(&format!("check {}", env));

    if report.findings.is_empty() {
        output::success("all checks passed");
        return;
    }

    let mut current = None;
    for finding in &report.findings {
        if current != Some(finding.category) {
            current = Some(finding.category);
            println!();
            output::header(finding.category.as_str());
        }
        output::list_item(&line(finding));
    }

    println!();
    let summary = format!(
        "{} error(s), {} warning(s)",
        report.errors(),
        report.warnings()
    );
    if report.is_clean() {
        output::success(&summary);
    } else {
        output::error(&summary);
    }
}

fn line(finding: &Finding) -> String {
    let level = match finding.severity {
        Severity::Error => Level::Fail,
        Severity::Warning => Level::Warn,
        Severity::Info => Level::Quiet,
    };
    format!(
        "{:<7} {}  {}",
        output::status(&finding.severity.to_string(), level),
        output::key(&finding.subject),
        finding.message
    )
}
