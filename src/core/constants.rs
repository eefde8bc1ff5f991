//! Constants used throughout secrets-manager.
//!
//! Centralizes magic strings and configuration values.

/// Separator between prefix, project and key in a physical secret name.
pub const SEPARATOR: &str = "--";

/// Default configuration file name.
pub const CONFIG_FILE: &str = "secrets.yml";

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "SECRETS_CONFIG_PATH";

/// Environment variable selecting the store backend.
pub const STORE_ENV: &str = "SECRETS_MANAGER_STORE";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "SECRETS_MANAGER_LOG";

/// Prefix used when an environment does not declare one.
pub const DEFAULT_PREFIX_ROOT: &str = "botmaro";

/// IAM role that lets a principal read secret payloads.
pub const ACCESSOR_ROLE: &str = "roles/secretmanager.secretAccessor";

/// IAM member prefix for service accounts.
pub const SERVICE_ACCOUNT_MEMBER: &str = "serviceAccount:";

/// Sentinel tokens marking an unfilled secret value (compared uppercase).
pub const PLACEHOLDER_TOKENS: &[&str] = &[
    "PLACEHOLDER",
    "CHANGEME",
    "CHANGE_ME",
    "REPLACE_ME",
    "REPLACEME",
    "TODO",
    "FIXME",
    "YOUR_",
];

/// Sentinel fragments marking an unfilled service-account local part.
pub const ACCOUNT_SENTINELS: &[&str] = &["example", "changeme", "placeholder", "your-"];

/// Workflow directory scanned by `check` when none is given.
pub const WORKFLOW_DIR: &str = ".github/workflows";

/// Workflow references provided by CI itself.
pub const CI_BUILTIN_SECRETS: &[&str] = &["GITHUB_TOKEN"];

/// Number of characters shown when a value is masked.
pub const MASK_VISIBLE: usize = 4;

/// Values this short are fully masked.
pub const MASK_MIN_LEN: usize = 8;
