//! Core library components.
//!
//! Configuration, naming, store access and the engines built on them:
//! access reconciliation, validation and import/export. Nothing in here
//! prints; the CLI layer turns results into output.

pub mod access;
pub mod config;
pub mod constants;
pub mod format;
pub mod naming;
pub mod placeholder;
pub mod secrets;
pub mod store;
pub mod transfer;
pub mod types;
pub mod validate;
pub mod validation;
pub mod workflow;
