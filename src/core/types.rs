//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A logical secret key (e.g., DATABASE_URL, API_KEY).
///
/// Uppercase identifier, unique within its scope.
pub type LogicalKey = String;

/// A service-account identifier, usually an email address.
pub type ServiceAccount = String;

/// An IAM role name (e.g., `roles/secretmanager.secretAccessor`).
pub type Role = String;

/// A secret version identifier as reported by the store.
pub type VersionId = String;
