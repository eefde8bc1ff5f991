//! Error types.
//!
//! One enum per domain, wrapped by the top-level [`Error`]. Store and
//! format errors are recoverable per item; configuration and naming
//! errors are fatal and abort a command before any store call.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("check failed: {errors} error(s), {warnings} warning(s)")]
    CheckFailed { errors: usize, warnings: usize },

    #[error("access grant failed for {failed} of {total} pair(s)")]
    AccessFailed { failed: usize, total: usize },

    #[error("bootstrap incomplete: {missing} required secret(s) unavailable")]
    BootstrapFailed { missing: usize },

    #[error("import finished with {failed} failure(s)")]
    ImportFailed { failed: usize },

    #[error("export incomplete: {failed} secret(s) could not be read")]
    ExportFailed { failed: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("confirmation required: re-run with --yes to proceed unattended")]
    ConfirmationRequired,

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

/// Malformed or inconsistent configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported config file type: {}", .0.display())]
    UnsupportedType(PathBuf),

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("unknown project '{project}' in environment '{env}'")]
    UnknownProject { env: String, project: String },

    #[error("invalid identifier '{value}' for {field}: {reason}")]
    InvalidIdentifier {
        field: String,
        value: String,
        reason: String,
    },

    #[error("duplicate secret '{key}' in scope {scope}")]
    DuplicateSecret { scope: String, key: String },

    #[error("environment '{0}' has no gcp_project")]
    MissingStoreProject(String),

    #[error("project key '{key}' does not match project_id '{project_id}'")]
    ProjectIdMismatch { key: String, project_id: String },

    #[error("environments '{first}' and '{second}' share prefix '{prefix}' in {gcp_project}")]
    DuplicatePrefix {
        first: String,
        second: String,
        prefix: String,
        gcp_project: String,
    },

    #[error("unknown store backend: {0}")]
    UnknownBackend(String),
}

/// Physical-name invariant violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("ambiguous secret name: {0}")]
    Ambiguous(String),

    #[error("not a managed secret name: {0}")]
    Unrecognized(String),

    #[error("invalid target '{0}': expected env[.project].SECRET")]
    InvalidTarget(String),
}

/// Secret store and IAM failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("permission denied on {0}")]
    PermissionDenied(String),

    #[error("secret store unavailable: {0}")]
    Unavailable(String),

    #[error("secret store error: {0}")]
    Backend(String),
}

/// Import/export format failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("{source_name}:{line}: {reason}")]
    Malformed {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("unsupported format: {0}")]
    Unsupported(String),

    #[error("conflicting keys for nested output: {0}")]
    Conflict(String),

    #[error("value of {key} cannot be written as {format}: {reason}")]
    IllegalValue {
        key: String,
        format: String,
        reason: String,
    },
}

/// Invalid user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("secret key cannot be empty")]
    EmptyKey,

    #[error("invalid secret key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value for {0} cannot be empty")]
    EmptyValue(String),
}

impl StoreError {
    /// Whether the error means the secret does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
