//! Test support utilities for secrets-manager integration tests.
//!
//! Provides an isolated project directory with a config file and a
//! file-backed store, plus helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test environment with an isolated project directory.
///
/// The store lives in `store.json` inside the directory. No process-global
/// state is mutated, so tests can run in parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl Test {
    /// Create a project with the standard fixture config.
    pub fn new() -> Self {
        Self::with_config(CONFIG)
    }

    /// Create a project with a custom `secrets.yml`.
    pub fn with_config(config: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::write(dir.path().join("secrets.yml"), config).expect("failed to write config");
        Self { dir }
    }

    /// Create a project and store the given staging secrets.
    pub fn with_secrets(secrets: &[(&str, &str)]) -> Self {
        let t = Self::new();
        for (target, value) in secrets {
            let output = t.set(target, value);
            assert!(
                output.status.success(),
                "Failed to set secret {}: {}",
                target,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    /// Path inside the project directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Path of the file-backed store.
    pub fn store_path(&self) -> PathBuf {
        self.path("store.json")
    }

    /// Write a file into the project directory.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }

    /// Read a file from the project directory.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("failed to read file")
    }

    /// Raw store document.
    pub fn store(&self) -> serde_json::Value {
        read_json(&self.store_path())
    }

    /// Make every access to `name` in store project `project` fail with
    /// permission denied.
    pub fn deny(&self, project: &str, name: &str) {
        let path = self.store_path();
        let mut doc = if path.exists() {
            read_json(&path)
        } else {
            serde_json::json!({ "projects": {} })
        };
        let state = doc["projects"]
            .as_object_mut()
            .expect("projects must be an object")
            .entry(project.to_string())
            .or_insert_with(|| serde_json::json!({ "secrets": {} }));
        let denied = state
            .as_object_mut()
            .expect("project state must be an object")
            .entry("denied".to_string())
            .or_insert_with(|| serde_json::json!([]));
        denied
            .as_array_mut()
            .expect("denied must be a list")
            .push(name.into());
        std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    }

    /// Members bound to `role` on a stored secret.
    pub fn members(&self, project: &str, name: &str, role: &str) -> Vec<String> {
        let doc = self.store();
        doc["projects"][project]["secrets"][name]["policy"]["bindings"]
            .as_array()
            .map(|bindings| {
                bindings
                    .iter()
                    .filter(|b| b["role"] == role)
                    .filter_map(|b| b["member"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stored versions of a secret.
    pub fn version_count(&self, project: &str, name: &str) -> usize {
        self.store()["projects"][project]["secrets"][name]["versions"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(path).expect("failed to read store");
    serde_json::from_str(&raw).expect("store is not valid JSON")
}
