//! Tests for `secrets-manager bootstrap`.

use crate::support::*;

#[test]
fn test_reports_every_missing_secret() {
    let t = Test::new();

    let output = t.run(&["bootstrap", "staging", "-o", ".env"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "API_KEY is required but not set");
    assert_stderr_contains(&output, "DATABASE_URL is required but not set");
    assert_stderr_contains(&output, "2 required secret(s) unavailable");
    assert!(!t.path(".env").exists());
}

#[test]
fn test_writes_output_file() {
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["bootstrap", "staging", "-o", ".env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "loaded 3 secret(s) for staging");

    let contents = t.read(".env");
    assert!(contents.contains("API_KEY=sk-live-1234567890\n"));
    assert!(contents.contains("DATABASE_URL=postgres://db.internal/app\n"));
    assert!(contents.contains("LOG_LEVEL=info\n"));
}

#[test]
fn test_output_format_from_extension() {
    let t = Test::with_secrets(STAGING_SECRETS);

    assert_success(&t.run(&["bootstrap", "staging", "-o", "secrets.json"]));
    let value: serde_json::Value = serde_json::from_str(&t.read("secrets.json")).unwrap();
    assert_eq!(value["API_KEY"], "sk-live-1234567890");

    assert_success(&t.run(&[
        "bootstrap",
        "staging",
        "-o",
        "out.env",
        "--format",
        "github-env",
    ]));
    assert!(t.read("out.env").contains("LOG_LEVEL=info\n"));
}

#[test]
fn test_export_keeps_stdout_sourceable() {
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["bootstrap", "staging", "--export"]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.starts_with("#!/bin/sh\n"));
    assert!(out.contains("export API_KEY='sk-live-1234567890'\n"));
    assert!(out.contains("export LOG_LEVEL='info'\n"));
    assert!(!out.contains('✓'));
    assert_stderr_contains(&output, "loaded 3 secret(s)");
}

#[test]
fn test_project_values_override_environment() {
    let t = Test::with_secrets(STAGING_SECRETS);
    assert_success(&t.set("staging.web-app.API_KEY", "project-key-123"));
    assert_success(&t.set("staging.web-app.FRONTEND_URL", "https://app"));

    let output = t.run(&["bootstrap", "staging", "-p", "web-app", "--export"]);
    assert_success(&output);
    assert_stdout_contains(&output, "export API_KEY='project-key-123'");
    assert_stdout_contains(&output, "export FRONTEND_URL='https://app'");
    assert_stdout_excludes(&output, "sk-live-1234567890");
}

#[test]
fn test_missing_project_secret_fails() {
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["bootstrap", "staging", "-p", "web-app"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "FRONTEND_URL is required but not set");
}

#[test]
fn test_grant_requires_confirmation() {
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["bootstrap", "staging", "--runtime-sa", RUNTIME_SA]);
    assert_failure(&output);
    assert_stderr_contains(&output, "confirmation required");
    assert!(t
        .members(STAGING_PROJECT, "botmaro-staging--API_KEY", ACCESSOR)
        .is_empty());
}

#[test]
fn test_grant_with_yes() {
    let t = Test::with_secrets(STAGING_SECRETS);
    let deployer = "deployer@botmaro-test.iam.gserviceaccount.com";

    let output = t.run(&[
        "bootstrap",
        "staging",
        "--runtime-sa",
        RUNTIME_SA,
        "--deployer-sa",
        deployer,
        "--yes",
    ]);
    assert_success(&output);
    assert_stdout_contains(&output, "access: 4 granted, 0 already present");
    assert_stderr_contains(&output, "4 pair(s) to reconcile");

    for name in ["botmaro-staging--API_KEY", "botmaro-staging--DATABASE_URL"] {
        let members = t.members(STAGING_PROJECT, name, ACCESSOR);
        assert!(members.contains(&RUNTIME_SA.to_string()));
        assert!(members.contains(&deployer.to_string()));
    }

    let output = t.run(&["bootstrap", "staging", "--runtime-sa", RUNTIME_SA, "--yes"]);
    assert_success(&output);
    assert_stdout_contains(&output, "access: 0 granted, 2 already present");
}
