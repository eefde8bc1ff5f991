//! Error handling and global option tests.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_missing_config() {
    let t = Test::new();

    let output = t.run(&["list", "staging", "--config", "missing.yml"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "config file not found: missing.yml");
    assert_stderr_contains(&output, "SECRETS_CONFIG_PATH");
}

#[test]
fn test_config_from_env_and_flag() {
    let t = Test::new();
    t.write("conf/alt.yml", CONFIG);
    std::fs::remove_file(t.path("secrets.yml")).unwrap();

    let output = t
        .cmd()
        .env("SECRETS_CONFIG_PATH", "conf/alt.yml")
        .args(["list", "staging"])
        .output()
        .unwrap();
    assert_success(&output);

    let output = t.run(&["-c", "conf/alt.yml", "list", "prod"]);
    assert_success(&output);
}

#[test]
fn test_invalid_config_is_fatal() {
    let t = Test::with_config(
        r#"
environments:
  staging:
    gcp_project: botmaro-test
    prefix: botmaro--staging
"#,
    );

    let output = t.list("staging");
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid identifier");
}

#[test]
fn test_unknown_environment() {
    let t = Test::new();

    let output = t.get("qa.API_KEY");
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown environment: qa");
}

#[test]
fn test_unknown_project() {
    let t = Test::new();

    let output = t.get("staging.mobile.API_KEY");
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown project 'mobile' in environment 'staging'");
}

#[test]
fn test_target_without_key() {
    let t = Test::new();

    let output = t.get("staging.web-app");
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid target 'staging.web-app'");
}

#[test]
fn test_invalid_key() {
    let t = Test::new();

    let output = t.set("staging.bad-key", "value");
    assert_failure(&output);
}

#[test]
fn test_unknown_store_backend() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("SECRETS_MANAGER_STORE", "vault")
        .args(["list", "staging"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown store backend: vault");
    assert_stderr_contains(&output, "file:<path>");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["--verbose", "export", "staging"]);
    assert_success(&output);
    assert_stderr_contains(&output, "secrets loaded");
    assert_stdout_excludes(&output, "secrets loaded");
}

#[test]
fn test_completions() {
    let t = Test::new();

    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secrets-manager"))
        .stdout(predicate::str::contains("grant-access"));
}

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrap"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_missing_target_is_usage_error() {
    let t = Test::new();

    t.cmd()
        .arg("get")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TARGET"));
}
