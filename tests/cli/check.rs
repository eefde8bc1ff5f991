//! Tests for `secrets-manager check`.

use crate::support::*;

/// Every required staging secret stored and readable by its accounts.
fn healthy() -> Test {
    let t = Test::new();
    for (target, value, accounts) in [
        ("staging.API_KEY", "sk-live-1234567890", vec![RUNTIME_SA]),
        ("staging.DATABASE_URL", "postgres://db/app", vec![RUNTIME_SA]),
        (
            "staging.web-app.FRONTEND_URL",
            "https://app",
            vec![RUNTIME_SA, WEB_SA],
        ),
    ] {
        let mut args = vec!["set", target, "--value", value];
        for account in accounts {
            args.extend(["--grant", account]);
        }
        assert_success(&t.run(&args));
    }
    t
}

#[test]
fn test_healthy_environment_passes() {
    let t = healthy();

    let (output, report) = t.check_json("staging");
    assert_success(&output);
    let all = report["findings"].as_array().unwrap();
    assert!(all.iter().all(|f| f["severity"] == "info"));
    // LOG_LEVEL and the project's optional API_KEY are absent
    assert_eq!(findings(&report, "missing-secret").len(), 2);

    let output = t.check("staging");
    assert_success(&output);
    assert_stdout_contains(&output, "check staging\n────");
    assert_stdout_contains(&output, "0 error(s), 0 warning(s)");
}

#[test]
fn test_single_missing_secret_is_one_error() {
    let t = healthy();
    assert_success(&t.run(&["delete", "staging.DATABASE_URL", "--force"]));

    let (output, report) = t.check_json("staging");
    assert_failure(&output);
    let errors: Vec<_> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["severity"] == "error")
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["category"], "missing-secret");
    assert_eq!(errors[0]["subject"], "botmaro-staging--DATABASE_URL");

    let output = t.check("staging");
    assert_failure(&output);
    assert_stderr_contains(&output, "check failed: 1 error(s), 0 warning(s)");
}

#[test]
fn test_placeholder_value_warns() {
    let t = healthy();
    assert_success(&t.set("staging.API_KEY", "CHANGEME"));

    let (output, report) = t.check_json("staging");
    assert_success(&output);
    let found = findings(&report, "placeholder-value");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["subject"], "botmaro-staging--API_KEY");
    assert_eq!(found[0]["severity"], "warning");
}

#[test]
fn test_missing_access_per_account() {
    let t = healthy();
    assert_success(&t.set("staging.web-app.API_KEY", "project-key-1"));
    assert_success(&t.set("staging.ORPHAN", "x"));

    let (output, report) = t.check_json("staging");
    assert_success(&output);
    // Optional secrets are not access-checked
    assert!(findings(&report, "missing-access").is_empty());

    let t = Test::new();
    assert_success(&t.set("staging.API_KEY", "sk-live-1234567890"));
    let (output, report) = t.check_json("staging");
    assert_failure(&output);
    let found = findings(&report, "missing-access");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["subject"], "botmaro-staging--API_KEY");
    assert!(found[0]["message"].as_str().unwrap().contains(RUNTIME_SA));
}

#[test]
fn test_workflow_references() {
    let t = healthy();
    t.write(".github/workflows/deploy.yml", WORKFLOW);

    let (output, report) = t.check_json("staging");
    assert_success(&output);
    let found = findings(&report, "undeclared-workflow-reference");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["subject"], "STRIPE_KEY");
    assert!(found[0]["message"].as_str().unwrap().contains("deploy.yml"));
}

#[test]
fn test_custom_workflow_path() {
    let t = healthy();
    t.write("ci/release.yaml", WORKFLOW);

    let (_, report) = t.check_json("staging");
    assert!(findings(&report, "undeclared-workflow-reference").is_empty());

    let output = t.run(&["check", "staging", "--workflows", "ci", "--json"]);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(findings(&report, "undeclared-workflow-reference").len(), 1);
}

#[test]
fn test_placeholder_account() {
    let t = Test::with_config(
        r#"
environments:
  staging:
    gcp_project: botmaro-test
    prefix: botmaro-staging
    service_accounts:
      - your-service-account@example.com
    global_secrets:
      - name: API_KEY
"#,
    );
    assert_success(&t.set("staging.API_KEY", "sk-live-1234567890"));

    let (output, report) = t.check_json("staging");
    assert_failure(&output);
    let accounts = findings(&report, "placeholder-account");
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["subject"], "your-service-account@example.com");
    assert_eq!(findings(&report, "missing-access").len(), 1);
}

#[test]
fn test_store_errors_do_not_abort() {
    let t = healthy();
    t.deny(STAGING_PROJECT, "botmaro-staging--DATABASE_URL");
    t.write(".github/workflows/deploy.yml", WORKFLOW);

    let (output, report) = t.check_json("staging");
    assert_failure(&output);
    let errors = findings(&report, "store-error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["subject"], "botmaro-staging--DATABASE_URL");
    assert!(findings(&report, "missing-secret")
        .iter()
        .all(|f| f["subject"] != "botmaro-staging--DATABASE_URL"));
    // Later checks still ran
    assert_eq!(findings(&report, "undeclared-workflow-reference").len(), 1);

    let categories: Vec<&str> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["category"].as_str())
        .collect();
    assert_eq!(categories.last(), Some(&"store-error"));
}

#[test]
fn test_project_only_check() {
    let t = healthy();

    let (output, report) = t.check_json("staging");
    assert_success(&output);
    let scoped = t.run(&["check", "staging", "-p", "web-app", "--json"]);
    assert_success(&scoped);
    let scoped: serde_json::Value = serde_json::from_slice(&scoped.stdout).unwrap();
    assert_eq!(
        findings(&scoped, "missing-secret").len(),
        findings(&report, "missing-secret").len()
    );

    assert_failure(&t.run(&["check", "staging", "-p", "mobile"]));
}
