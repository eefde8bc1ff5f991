//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a secrets-manager command with an isolated environment.
    ///
    /// Returns a Command configured with:
    /// - Current directory set to the test project directory
    /// - A file-backed store inside that directory
    /// - Colors and inherited config overrides disabled
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd =
            Command::cargo_bin("secrets-manager").expect("failed to find secrets-manager binary");
        cmd.current_dir(self.dir.path());
        cmd.env(
            "SECRETS_MANAGER_STORE",
            format!("file:{}", self.store_path().display()),
        );
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("SECRETS_CONFIG_PATH");
        cmd.env_remove("SECRETS_MANAGER_LOG");
        cmd
    }

    /// Run with arguments and capture the output.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run secrets-manager")
    }

    /// Shortcut for `secrets-manager set TARGET --value VALUE`.
    pub fn set(&self, target: &str, value: &str) -> Output {
        self.run(&["set", target, "--value", value])
    }

    /// Shortcut for `secrets-manager get TARGET --reveal`.
    pub fn get(&self, target: &str) -> Output {
        self.run(&["get", target, "--reveal"])
    }

    /// Shortcut for `secrets-manager list ENV`.
    pub fn list(&self, env: &str) -> Output {
        self.run(&["list", env])
    }

    /// Shortcut for `secrets-manager check ENV`.
    pub fn check(&self, env: &str) -> Output {
        self.run(&["check", env])
    }

    /// Shortcut for `secrets-manager check ENV --json`, parsed.
    pub fn check_json(&self, env: &str) -> (Output, serde_json::Value) {
        let output = self.run(&["check", env, "--json"]);
        let value = serde_json::from_slice(&output.stdout).expect("check --json is not JSON");
        (output, value)
    }
}
