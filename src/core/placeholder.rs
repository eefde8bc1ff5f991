//! Placeholder detection.
//!
//! Shared by `check` and `import` so both classify values identically.
//! Matching is a case-insensitive substring test, which means a legitimate
//! value such as `https://host/todo-list` is also reported.

use crate::core::constants::{ACCOUNT_SENTINELS, PLACEHOLDER_TOKENS};

/// Whether a secret value contains a placeholder token.
pub fn is_placeholder_value(value: &str) -> bool {
    matched_token(value).is_some()
}

/// The first placeholder token contained in `value`, if any.
pub fn matched_token(value: &str) -> Option<&'static str> {
    let upper = value.to_uppercase();
    PLACEHOLDER_TOKENS
        .iter()
        .copied()
        .find(|token| upper.contains(token))
}

/// Whether a service-account identifier is a placeholder.
///
/// Only the local part (before `@`) is inspected, so real accounts in a
/// project named `example-corp` are not flagged.
pub fn is_placeholder_account(account: &str) -> bool {
    let local = account.split('@').next().unwrap_or(account).to_lowercase();
    ACCOUNT_SENTINELS.iter().any(|s| local.contains(s))
}
