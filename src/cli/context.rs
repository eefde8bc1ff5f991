//! Configuration, scope and input helpers shared by commands.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use dialoguer::{Confirm, Password};
use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::core::config::{Scope, SecretsConfig};
use crate::core::naming::Target;
use crate::error::{Error, Result};

/// Load the configuration file.
pub fn load_config(path: &Path) -> Result<SecretsConfig> {
    let config = SecretsConfig::load(path)?;
    debug!(
        path = %path.display(),
        environments = config.environments.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Resolve the scope named by a `env[.project].SECRET` target.
///
/// Returns the scope and the logical key.
pub fn target_scope<'a>(config: &'a SecretsConfig, raw: &str) -> Result<(Scope<'a>, String)> {
    let target = Target::parse(raw)?;
    let key = target.require_key()?.to_string();
    let scope = config.scope(&target.env, target.project.as_deref())?;
    Ok((scope, key))
}

/// The environment scope, followed by the project scope when one is named.
///
/// Loading these in order lets project values override environment values.
pub fn layered_scopes<'a>(
    config: &'a SecretsConfig,
    env: &str,
    project: Option<&str>,
) -> Result<Vec<Scope<'a>>> {
    let environment = config.environment(env)?;
    let mut scopes = vec![environment.scope()];
    if let Some(project) = project {
        scopes.push(environment.project_scope(project)?);
    }
    Ok(scopes)
}

/// Ask before a destructive or wide-reaching change.
///
/// `yes` answers for the user. Without a terminal and without `yes` the
/// command fails instead of guessing.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(Error::ConfirmationRequired);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Write rendered secrets to a file readable only by the owner.
///
/// New files are created with mode 0600. An existing file is truncated and
/// restricted before any value is written to it.
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(0o600)
            .open(path)?;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, contents.as_bytes())?;
    }

    debug!(path = %path.display(), "secrets file written");
    Ok(())
}

/// Value for `set`: the flag, piped stdin, or a hidden prompt.
pub fn read_value(key: &str, value: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(value) = value {
        return Ok(Zeroizing::new(value));
    }

    if !io::stdin().is_terminal() {
        let mut input = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut input)?;
        let trimmed = input
            .strip_suffix('\n')
            .map(|s| s.strip_suffix('\r').unwrap_or(s))
            .unwrap_or(input.as_str());
        return Ok(Zeroizing::new(trimmed.to_string()));
    }

    let value = Password::new()
        .with_prompt(format!("Value for {}", output::key(key)))
        .interact()?;
    Ok(Zeroizing::new(value))
}
