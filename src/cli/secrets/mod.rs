//! Secret management commands.
//!
//! Implements set, get, list, delete and versions, plus import and export.

mod export;
mod import;

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::cli::access::print_report;
use crate::cli::context::{confirm, load_config, read_value, target_scope};
use crate::cli::output::{self, Level};
use crate::core::access::AccessReconciler;
use crate::core::constants::ACCESSOR_ROLE;
use crate::core::secrets::{self, SecretStatus, WriteKind};
use crate::core::store::open_store;
use crate::core::transfer::mask;
use crate::error::{Error, Result};

pub use export::execute as export;
pub use import::{execute as import, ImportFlags};

/// Set a secret value, optionally granting read access afterwards.
pub fn set(config: &Path, target: &str, value: Option<String>, grant: &[String]) -> Result<()> {
    let config = load_config(config)?;
    let (scope, key) = target_scope(&config, target)?;
    let value = read_value(&key, value)?;

    let store = open_store(scope.environment())?;
    let outcome = secrets::set_secret(&scope, store.as_ref(), &key, &value)?;

    let verb = match outcome.kind {
        WriteKind::Created => "created",
        WriteKind::Updated => "updated",
    };
    output::success(&format!(
        "{} {} (version {})",
        verb,
        output::key(outcome.name.as_str()),
        outcome.version
    ));
    if !outcome.declared {
        output::warn(&format!(
            "{} is not declared in {}",
            output::key(&key),
            scope.label()
        ));
    }

    if grant.is_empty() {
        return Ok(());
    }

    let names = BTreeSet::from([outcome.name]);
    let accounts: BTreeSet<String> = grant.iter().cloned().collect();
    let report = AccessReconciler::new(store.as_ref()).ensure_access(&names, &accounts, ACCESSOR_ROLE);
    print_report(&report);
    report.into_result().map(|_| ())
}

/// Print a secret value, masked unless `reveal` is set.
pub fn get(config: &Path, target: &str, version: Option<&str>, reveal: bool) -> Result<()> {
    let config = load_config(config)?;
    let (scope, key) = target_scope(&config, target)?;
    let store = open_store(scope.environment())?;

    let value = secrets::get_secret(&scope, store.as_ref(), &key, version)?;
    if reveal {
        // Plain output for scripting - no decoration
        println!("{}", value.as_str());
    } else {
        println!("{}={}", key, mask(&value));
        output::note("use --reveal to print the value");
    }
    Ok(())
}

/// List declared and stored secrets of a scope.
pub fn list(config: &Path, env: &str, project: Option<&str>, reveal: bool, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let scope = config.scope(env, project)?;
    let store = open_store(scope.environment())?;
    let rows = secrets::list_scope(&scope, store.as_ref(), reveal)?;

    if json {
        let values: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| -> Result<serde_json::Value> {
                let mut value = serde_json::to_value(row)?;
                if let (Some(secret), Some(obj)) = (&row.value, value.as_object_mut()) {
                    obj.insert("value".to_string(), secret.as_str().into());
                }
                Ok(value)
            })
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    output::section(&scope.label());
    if rows.is_empty() {
        output::dimmed("no secrets declared");
        return Ok(());
    }

    for row in &rows {
        let state = match &row.status {
            SecretStatus::Set => output::status("set", Level::Ok),
            SecretStatus::Missing if row.required => output::status("missing", Level::Fail),
            SecretStatus::Missing => output::status("missing", Level::Quiet),
            SecretStatus::Error(_) => output::status("error", Level::Fail),
        };
        let mut line = format!("{:<28} {}", output::key(&row.key), state);
        if !row.declared {
            line.push_str(&format!(" {}", output::status("undeclared", Level::Warn)));
        } else if !row.required {
            line.push_str(&format!(" {}", output::status("optional", Level::Quiet)));
        }
        if let Some(value) = &row.value {
            line.push_str(&format!("  {}", mask(value)));
        }
        if let SecretStatus::Error(reason) = &row.status {
            line.push_str(&format!("  {}", reason));
        }
        output::list_item(&line);
    }

    let set = rows
        .iter()
        .filter(|r| r.status == SecretStatus::Set)
        .count();
    println!();
    output::dimmed(&format!("{} of {} secret(s) set", set, rows.len()));
    Ok(())
}

/// Delete a secret after confirmation.
pub fn delete(config: &Path, target: &str, force: bool) -> Result<()> {
    let config = load_config(config)?;
    let (scope, key) = target_scope(&config, target)?;
    let name = scope.physical_name(&key);

    if !confirm(&format!("Delete {} and all its versions?", name), force)? {
        return Err(Error::Cancelled);
    }

    info!(name = %name, "deleting secret");
    let store = open_store(scope.environment())?;
    let name = secrets::delete_secret(&scope, store.as_ref(), &key)?;
    output::success(&format!("deleted {}", output::key(name.as_str())));
    Ok(())
}

/// Print the version history of a secret.
pub fn versions(config: &Path, target: &str, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let (scope, key) = target_scope(&config, target)?;
    let store = open_store(scope.environment())?;
    let versions = secrets::versions(&scope, store.as_ref(), &key)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    output::section(scope.physical_name(&key).as_str());
    for version in &versions {
        let level = if version.state.eq_ignore_ascii_case("enabled") {
            Level::Ok
        } else {
            Level::Quiet
        };
        let created = version
            .created
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default();
        output::list_item(&format!(
            "{:<6} {:<10} {}",
            version.id,
            output::status(&version.state.to_lowercase(), level),
            created
        ));
    }
    Ok(())
}
