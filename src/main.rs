//! secrets-manager - Multi-environment secrets on Google Secret Manager.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use secrets_manager::cli::output;
use secrets_manager::cli::{execute, Cli};
use secrets_manager::core::constants::{LOG_ENV, STORE_ENV};
use secrets_manager::error::{ConfigError, Error, StoreError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("secrets_manager=debug")
        } else {
            EnvFilter::new("secrets_manager=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli.command, &cli.config) {
        output::error(&e.to_string());
        if let Some(hint) = suggestion(&e) {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}

/// Hint for errors with a well-known fix.
fn suggestion(e: &Error) -> Option<String> {
    match e {
        Error::Config(ConfigError::NotFound(_)) => {
            Some("pass --config or set SECRETS_CONFIG_PATH".to_string())
        }
        Error::Config(ConfigError::UnknownBackend(_)) => Some(format!(
            "{} must be gcloud, memory or file:<path>",
            STORE_ENV
        )),
        Error::Store(StoreError::Unavailable(_)) => {
            Some("install the gcloud CLI and run: gcloud auth login".to_string())
        }
        Error::Store(StoreError::PermissionDenied(_)) => {
            Some("check the IAM roles of the active gcloud account".to_string())
        }
        Error::CheckFailed { .. } => Some("re-run with --json for details".to_string()),
        Error::AccessFailed { .. } => {
            Some("re-run the same command; granted pairs are skipped".to_string())
        }
        _ => None,
    }
}
