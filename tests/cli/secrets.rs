//! Tests for set, get, list, delete and versions.

use crate::support::*;

#[test]
fn test_set_creates_then_updates() {
    let t = Test::new();

    let output = t.set("staging.API_KEY", "first-value");
    assert_success(&output);
    assert_stdout_contains(&output, "created botmaro-staging--API_KEY (version 1)");

    let output = t.set("staging.API_KEY", "second-value");
    assert_success(&output);
    assert_stdout_contains(&output, "updated botmaro-staging--API_KEY (version 2)");

    assert_eq!(t.version_count(STAGING_PROJECT, "botmaro-staging--API_KEY"), 2);
}

#[test]
fn test_get_reveals_latest() {
    let t = Test::with_secrets(&[("staging.API_KEY", "old"), ("staging.API_KEY", "new")]);

    let output = t.get("staging.API_KEY");
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "new");

    let output = t.run(&["get", "staging.API_KEY", "--version", "1", "--reveal"]);
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "old");
}

#[test]
fn test_get_masks_by_default() {
    let t = Test::with_secrets(&[("staging.API_KEY", "sk-live-1234567890")]);

    let output = t.run(&["get", "staging.API_KEY"]);
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "API_KEY=sk-l...");
    assert_stdout_excludes(&output, "1234567890");
}

#[test]
fn test_project_target_uses_project_name() {
    let t = Test::new();

    let output = t.set("staging.web-app.FRONTEND_URL", "https://app.example.com");
    assert_success(&output);
    assert_stdout_contains(&output, "botmaro-staging--web-app--FRONTEND_URL");

    let output = t.get("staging.web-app.FRONTEND_URL");
    assert_eq!(stdout(&output).trim(), "https://app.example.com");

    // The environment scope does not see the project secret
    assert_failure(&t.get("staging.FRONTEND_URL"));
}

#[test]
fn test_set_undeclared_warns() {
    let t = Test::new();

    let output = t.set("staging.NEW_KEY", "value-1");
    assert_success(&output);
    assert_stdout_contains(&output, "not declared in staging");
}

#[test]
fn test_set_via_stdin() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["set", "staging.DATABASE_URL"])
        .write_stdin("postgres://piped/db\n")
        .output()
        .unwrap();
    assert_success(&output);

    let output = t.get("staging.DATABASE_URL");
    assert_eq!(stdout(&output).trim(), "postgres://piped/db");
}

#[test]
fn test_set_empty_value_fails() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["set", "staging.API_KEY"])
        .write_stdin("\n")
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "cannot be empty");
    assert!(!t.store_path().exists());
}

#[test]
fn test_set_with_grant() {
    let t = Test::new();

    let output = t.run(&[
        "set",
        "staging.API_KEY",
        "--value",
        "sk-1",
        "--grant",
        RUNTIME_SA,
    ]);
    assert_success(&output);
    assert_stdout_contains(&output, "1 granted, 0 already present, 0 failed");
    assert_eq!(
        t.members(STAGING_PROJECT, "botmaro-staging--API_KEY", ACCESSOR),
        vec![RUNTIME_SA.to_string()]
    );

    let output = t.run(&[
        "set",
        "staging.API_KEY",
        "--value",
        "sk-2",
        "--grant",
        RUNTIME_SA,
    ]);
    assert_success(&output);
    assert_stdout_contains(&output, "0 granted, 1 already present, 0 failed");
}

#[test]
fn test_list_shows_status() {
    let t = Test::with_secrets(&[
        ("staging.API_KEY", "sk-live-1234567890"),
        ("staging.ORPHAN", "left-over"),
        ("staging.web-app.FRONTEND_URL", "https://app"),
    ]);

    let output = t.list("staging");
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("API_KEY"));
    assert!(out.contains("DATABASE_URL"));
    assert!(out.contains("missing"));
    assert!(out.contains("optional"));
    assert!(out.contains("ORPHAN"));
    assert!(out.contains("undeclared"));
    assert!(!out.contains("FRONTEND_URL"));
    assert!(!out.contains("sk-l..."));
}

#[test]
fn test_list_reveal_masks_values() {
    let t = Test::with_secrets(&[("staging.API_KEY", "sk-live-1234567890")]);

    let output = t.run(&["list", "staging", "--reveal"]);
    assert_success(&output);
    assert_stdout_contains(&output, "sk-l...");
    assert_stdout_excludes(&output, "1234567890");
}

#[test]
fn test_list_json() {
    let t = Test::with_secrets(&[("staging.API_KEY", "sk-live-1234567890")]);

    let output = t.run(&["list", "staging", "--json"]);
    assert_success(&output);
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["key"], "API_KEY");
    assert_eq!(rows[0]["status"], "set");
    assert_eq!(rows[0]["name"], "botmaro-staging--API_KEY");
    assert_eq!(rows[1]["status"], "missing");
    assert!(rows[0].get("value").is_none());
}

#[test]
fn test_list_project_scope() {
    let t = Test::with_secrets(&[("staging.web-app.FRONTEND_URL", "https://app")]);

    let output = t.run(&["list", "staging", "-p", "web-app", "--json"]);
    assert_success(&output);
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["name"], "botmaro-staging--web-app--FRONTEND_URL");
    assert_eq!(rows[0]["status"], "set");
}

#[test]
fn test_delete_requires_confirmation() {
    let t = Test::with_secrets(&[("staging.API_KEY", "value-1")]);

    let output = t.run(&["delete", "staging.API_KEY"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "confirmation required");
    assert_success(&t.get("staging.API_KEY"));
}

#[test]
fn test_delete_force() {
    let t = Test::with_secrets(&[("staging.API_KEY", "value-1")]);

    let output = t.run(&["delete", "staging.API_KEY", "--force"]);
    assert_success(&output);
    assert_stdout_contains(&output, "deleted botmaro-staging--API_KEY");

    let output = t.get("staging.API_KEY");
    assert_failure(&output);
    assert_stderr_contains(&output, "not found");
}

#[test]
fn test_versions() {
    let t = Test::with_secrets(&[("staging.API_KEY", "a"), ("staging.API_KEY", "b")]);

    let output = t.run(&["versions", "staging.API_KEY", "--json"]);
    assert_success(&output);
    let versions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let versions = versions.as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["id"], "2");
    assert_eq!(versions[1]["id"], "1");
    assert_eq!(versions[0]["state"], "enabled");

    let output = t.run(&["versions", "staging.API_KEY"]);
    assert_success(&output);
    assert_stdout_contains(&output, "botmaro-staging--API_KEY");
    assert_stdout_contains(&output, "enabled");
}
