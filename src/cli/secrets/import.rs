//! Import command.
//!
//! Loads secrets from one or more files into a scope. Each file is planned
//! on its own; a file that cannot be read or parsed is reported and the
//! rest still run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cli::context::load_config;
use crate::cli::output::{self, Level};
use crate::core::format::Format;
use crate::core::store::open_store;
use crate::core::transfer::{read_mapping, ImportAction, ImportOptions, ImportPlan};
use crate::error::{Error, Result};

/// Flags shared by every file of one import.
#[derive(Debug, Clone, Copy)]
pub struct ImportFlags {
    pub format: Option<Format>,
    pub dry_run: bool,
    pub filter_placeholders: bool,
}

/// Import secrets from files.
pub fn execute(
    config: &Path,
    env: &str,
    project: Option<&str>,
    files: &[PathBuf],
    flags: ImportFlags,
) -> Result<()> {
    let config = load_config(config)?;
    let scope = config.scope(env, project)?;
    let store = open_store(scope.environment())?;
    let options = ImportOptions {
        filter_placeholders: flags.filter_placeholders,
    };

    let mut failed = 0;
    for file in files {
        let mapping = match read_mapping(file, flags.format) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(path = %file.display(), error = %e, "import source unreadable");
                output::error(&format!("{}: {}", file.display(), e));
                failed += 1;
                continue;
            }
        };

        let plan = ImportPlan::compute(&scope, store.as_ref(), &mapping, options);
        output::section(&format!("{} → {}", file.display(), scope.label()));
        print_plan(&plan);

        if flags.dry_run {
            output::dimmed(&format!(
                "dry run: {} to create, {} to update, {} unchanged, {} skipped",
                plan.creates(),
                plan.updates(),
                plan.unchanged(),
                plan.skipped()
            ));
            continue;
        }

        let outcome = plan.apply(store.as_ref());
        for (key, reason) in &outcome.failed {
            output::error(&format!("{}: {}", output::key(key), reason));
        }
        failed += outcome.failed.len();
        info!(
            path = %file.display(),
            imported = outcome.imported(),
            failed = outcome.failed.len(),
            "file imported"
        );
        output::success(&format!(
            "imported {} secret(s): {} created, {} updated, {} unchanged, {} skipped",
            outcome.imported(),
            outcome.created,
            outcome.updated,
            outcome.unchanged,
            outcome.skipped
        ));
    }

    if failed > 0 {
        return Err(Error::ImportFailed { failed });
    }
    Ok(())
}

fn print_plan(plan: &ImportPlan) {
    if plan.entries().is_empty() {
        output::dimmed("no keys found");
        return;
    }

    for entry in plan.entries() {
        let level = match &entry.action {
            ImportAction::Create => Level::Ok,
            ImportAction::Update => Level::Warn,
            ImportAction::Unchanged => Level::Quiet,
            ImportAction::Skip(_) => Level::Fail,
        };
        let mut line = format!(
            "{:<9} {}",
            output::status(entry.action.label(), level),
            output::key(&entry.key)
        );
        if entry.source_key != entry.key {
            line.push_str(&format!(" (from {})", entry.source_key));
        }
        match &entry.action {
            ImportAction::Skip(reason) => line.push_str(&format!("  {}", reason)),
            _ => line.push_str(&format!("  {}", entry.masked_value())),
        }
        if !entry.declared && !matches!(entry.action, ImportAction::Skip(_)) {
            line.push_str(&format!(" {}", output::status("undeclared", Level::Warn)));
        }
        output::list_item(&line);
    }
}
