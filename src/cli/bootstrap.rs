//! Bootstrap command.
//!
//! Loads every declared secret of an environment (and optionally one
//! project) so a deployment can start. Values can be written to a file,
//! printed as shell exports, or both. Status output goes to stderr when
//! exports are printed, so stdout stays sourceable.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::access::preview;
use crate::cli::context::{confirm, layered_scopes, load_config, write_private};
use crate::cli::output;
use crate::core::access::{AccessReconciler, GrantPlan, PairStatus};
use crate::core::constants::ACCESSOR_ROLE;
use crate::core::format::Format;
use crate::core::secrets::load_scopes;
use crate::core::store::open_store;
use crate::error::{Error, Result};

/// Parsed bootstrap flags.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub env: String,
    pub project: Option<String>,
    /// Runtime and deployer accounts to grant read access.
    pub accounts: BTreeSet<String>,
    pub yes: bool,
    pub output: Option<PathBuf>,
    pub format: Option<Format>,
    pub export: bool,
}

/// Load secrets for a deployment.
///
/// Every missing required secret is reported before the command fails.
/// Nothing is written or granted unless all of them are available.
/// Access is granted on the stored secrets of every loaded scope.
pub fn execute(config: &Path, opts: Options) -> Result<()> {
    let config = load_config(config)?;
    let scopes = layered_scopes(&config, &opts.env, opts.project.as_deref())?;
    let target = scopes[scopes.len() - 1];
    let store = open_store(target.environment())?;

    let status = |msg: &str| {
        if opts.export {
            output::note(msg);
        } else {
            output::success(msg);
        }
    };

    let loaded = load_scopes(&scopes, store.as_ref());
    for key in &loaded.missing {
        output::error(&format!("{} is required but not set", output::key(key)));
    }
    for (key, reason) in &loaded.failed {
        output::error(&format!("{}: {}", output::key(key), reason));
    }
    if !loaded.is_complete() {
        output::hint(&format!(
            "set them with {}",
            output::cmd(&format!("secrets-manager set {}.KEY", target.label()))
        ));
    }
    let loaded = loaded.into_result()?;

    for key in &loaded.defaulted {
        output::note(&format!("{} uses its declared default", key));
    }
    status(&format!(
        "loaded {} secret(s) for {}",
        loaded.mapping.len(),
        target.label()
    ));

    if !opts.accounts.is_empty() {
        // Defaults and absent optional secrets have nothing to bind to
        let reconciler = AccessReconciler::new(store.as_ref());
        let names =
            reconciler.grantable(scopes.iter().flat_map(|scope| scope.physical_names()));
        let plan = GrantPlan::new(&names, &opts.accounts, ACCESSOR_ROLE);
        preview(&plan);
        if !confirm(&format!("Grant access on {} pair(s)?", plan.len()), opts.yes)? {
            return Err(Error::Cancelled);
        }

        let report = reconciler.apply(&plan);
        for outcome in report.outcomes() {
            if let PairStatus::Failed(reason) = &outcome.status {
                output::error(&format!("{}: {}", outcome.binding, reason));
            }
        }
        status(&format!(
            "access: {} granted, {} already present",
            report.granted(),
            report.already_granted()
        ));
        report.into_result()?;
    }

    if let Some(path) = &opts.output {
        let format = opts.format.unwrap_or_else(|| Format::from_path(path));
        write_private(path, &format.render(&loaded.mapping)?)?;
        info!(path = %path.display(), %format, "bootstrap file written");
        status(&format!("wrote {} ({})", path.display(), format));
    }

    if opts.export {
        output::raw(&Format::Shell.render(&loaded.mapping)?);
    }

    Ok(())
}
