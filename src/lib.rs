//! secrets-manager - Multi-environment secrets on Google Secret Manager.
//!
//! Secrets are declared per environment (and per project inside an
//! environment) in a YAML document, stored under deterministic physical
//! names `prefix--KEY` / `prefix--project--KEY`, and loaded, validated,
//! imported or exported as a unit.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── bootstrap     # Load an environment for a deployment
//! │   ├── secrets/      # set, get, list, delete, versions, import, export
//! │   ├── check         # Validation report
//! │   ├── access        # grant-access
//! │   ├── context       # Config, scope and prompt helpers
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # secrets.yml model and scopes
//!     ├── naming        # Physical names and CLI targets
//!     ├── store/        # Secret store backends
//!     │   ├── mod       # SecretStore trait
//!     │   ├── gcloud    # Google Secret Manager via gcloud
//!     │   ├── file      # JSON document store
//!     │   └── memory    # In-process store
//!     ├── secrets       # Secret operations and loading
//!     ├── access        # IAM access reconciliation
//!     ├── validate      # check engine
//!     ├── workflow      # CI workflow reference scanning
//!     ├── format/       # dotenv, json, yaml, github-env, shell
//!     └── transfer      # Import plans and export
//! ```
//!
//! # Features
//!
//! - One naming rule shared by every command
//! - Idempotent access grants with per-pair results
//! - Non-short-circuiting validation with ordered findings
//! - Dry-run import plans with placeholder filtering

pub mod cli;
pub mod core;
pub mod error;
