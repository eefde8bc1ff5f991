//! Tests for `secrets-manager import` and `export`.

use crate::support::*;

#[test]
fn test_import_dry_run_writes_nothing() {
    let t = Test::new();
    t.write("dev.env", SAMPLE_ENV);

    let output = t.run(&["import", "staging", "dev.env", "--dry-run"]);
    assert_success(&output);
    assert_stdout_contains(
        &output,
        "dry run: 2 to create, 0 to update, 0 unchanged, 1 skipped",
    );
    assert_stdout_contains(&output, "sk-i...");
    assert_stdout_contains(&output, "placeholder (REPLACE_ME)");
    assert_stdout_excludes(&output, "sk-imported-abcdef");
    assert!(!t.store_path().exists());
}

#[test]
fn test_import_skips_placeholders() {
    let t = Test::new();
    t.write("dev.env", SAMPLE_ENV);

    let output = t.run(&["import", "staging", "dev.env"]);
    assert_success(&output);
    assert_stdout_contains(
        &output,
        "imported 2 secret(s): 2 created, 0 updated, 0 unchanged, 1 skipped",
    );
    assert_eq!(stdout(&t.get("staging.API_KEY")).trim(), "sk-imported-abcdef");
    assert_eq!(
        stdout(&t.get("staging.DATABASE_URL")).trim(),
        "postgres://db/imported"
    );
    assert_failure(&t.get("staging.EXTRA_TOKEN"));

    let output = t.run(&["import", "staging", "dev.env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "0 created, 0 updated, 2 unchanged, 1 skipped");
    assert_eq!(t.version_count(STAGING_PROJECT, "botmaro-staging--API_KEY"), 1);
}

#[test]
fn test_import_no_filter() {
    let t = Test::new();
    t.write("dev.env", SAMPLE_ENV);

    let output = t.run(&["import", "staging", "dev.env", "--no-filter"]);
    assert_success(&output);
    assert_stdout_contains(&output, "imported 3 secret(s)");
    assert_eq!(stdout(&t.get("staging.EXTRA_TOKEN")).trim(), "REPLACE_ME");
}

#[test]
fn test_import_updates_changed_values() {
    let t = Test::with_secrets(&[("staging.API_KEY", "old-key-value")]);
    t.write("dev.env", "API_KEY=new-key-value\n");

    let output = t.run(&["import", "staging", "dev.env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "0 created, 1 updated");
    assert_eq!(stdout(&t.get("staging.API_KEY")).trim(), "new-key-value");
}

#[test]
fn test_import_normalises_tree_keys() {
    let t = Test::new();
    t.write(
        "secrets.json",
        r#"{"database": {"url": "postgres://nested/db"}, "api-key": "sk-nested-123"}"#,
    );

    let output = t.run(&["import", "staging", "secrets.json"]);
    assert_success(&output);
    assert_stdout_contains(&output, "(from database.url)");
    assert_eq!(
        stdout(&t.get("staging.DATABASE_URL")).trim(),
        "postgres://nested/db"
    );
    assert_eq!(stdout(&t.get("staging.API_KEY")).trim(), "sk-nested-123");
}

#[test]
fn test_import_into_project() {
    let t = Test::new();
    t.write("web.env", "FRONTEND_URL=https://app.example.com\n");

    let output = t.run(&["import", "staging", "web.env", "-p", "web-app"]);
    assert_success(&output);
    assert_eq!(
        stdout(&t.get("staging.web-app.FRONTEND_URL")).trim(),
        "https://app.example.com"
    );
}

#[test]
fn test_malformed_file_does_not_stop_batch() {
    let t = Test::new();
    t.write("bad.json", "{\n  \"a\": \n}");
    t.write("good.env", "API_KEY=sk-good-12345\n");

    let output = t.run(&["import", "staging", "bad.json", "good.env"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "bad.json:3:");
    assert_stderr_contains(&output, "import finished with 1 failure(s)");
    assert_eq!(stdout(&t.get("staging.API_KEY")).trim(), "sk-good-12345");
}

#[test]
fn test_import_explicit_format() {
    let t = Test::new();
    t.write("vars", "export API_KEY='sk-shell-9876'\n");

    let output = t.run(&["import", "staging", "vars", "--format", "shell"]);
    assert_success(&output);
    assert_eq!(stdout(&t.get("staging.API_KEY")).trim(), "sk-shell-9876");
}

#[test]
fn test_export_to_stdout() {
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["export", "staging"]);
    assert_success(&output);
    assert_eq!(
        stdout(&output),
        "API_KEY=sk-live-1234567890\nDATABASE_URL=postgres://db.internal/app\nLOG_LEVEL=info\n"
    );
}

#[test]
fn test_export_to_file() {
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["export", "staging", "-o", "secrets.yaml"]);
    assert_success(&output);
    assert_stdout_contains(&output, "exported 3 secret(s) to secrets.yaml (yaml)");

    let value: serde_json::Value = serde_yaml::from_str(&t.read("secrets.yaml")).unwrap();
    assert_eq!(value["DATABASE_URL"], "postgres://db.internal/app");

    let output = t.run(&["export", "staging", "--format", "shell"]);
    assert_success(&output);
    assert_stdout_contains(&output, "export LOG_LEVEL='info'");
}

#[test]
fn test_export_reports_missing() {
    let t = Test::with_secrets(&[("staging.API_KEY", "sk-live-1234567890")]);

    let output = t.run(&["export", "staging"]);
    assert_success(&output);
    assert_stderr_contains(&output, "DATABASE_URL is required but not set");
    assert_stdout_excludes(&output, "DATABASE_URL");
}

#[test]
fn test_export_fails_on_unreadable_secret() {
    let t = Test::with_secrets(STAGING_SECRETS);
    t.deny(STAGING_PROJECT, "botmaro-staging--API_KEY");

    let output = t.run(&["export", "staging", "-o", "out.env"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "export incomplete: 1 secret(s)");
    assert!(!t.path("out.env").exists());
}

#[test]
fn test_export_then_import_elsewhere() {
    let t = Test::with_secrets(STAGING_SECRETS);
    assert_success(&t.run(&["export", "staging", "-o", "staging.json"]));

    let output = t.run(&["import", "prod", "staging.json"]);
    assert_success(&output);
    assert_stdout_contains(&output, "3 created");
    assert_eq!(stdout(&t.get("prod.API_KEY")).trim(), "sk-live-1234567890");
}
