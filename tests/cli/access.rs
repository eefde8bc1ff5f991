//! Tests for `secrets-manager grant-access`.

use crate::support::*;

fn all_staging() -> Test {
    let t = Test::with_secrets(STAGING_SECRETS);
    assert_success(&t.set("staging.LOG_LEVEL", "debug"));
    t
}

#[test]
fn test_grant_requires_confirmation() {
    let t = all_staging();

    let output = t.run(&["grant-access", "staging"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "3 pair(s) to reconcile");
    assert_stderr_contains(&output, "confirmation required");
    assert!(t
        .members(STAGING_PROJECT, "botmaro-staging--API_KEY", ACCESSOR)
        .is_empty());
}

#[test]
fn test_grant_is_idempotent() {
    let t = all_staging();

    let output = t.run(&["grant-access", "staging", "--yes"]);
    assert_success(&output);
    assert_stdout_contains(&output, "3 granted, 0 already present, 0 failed");
    let before = t.store();

    let output = t.run(&["grant-access", "staging", "--yes"]);
    assert_success(&output);
    assert_stdout_contains(&output, "0 granted, 3 already present, 0 failed");
    assert_eq!(t.store(), before);
}

#[test]
fn test_failed_pair_does_not_stop_others() {
    // LOG_LEVEL is never stored, so its pair fails
    let t = Test::with_secrets(STAGING_SECRETS);

    let output = t.run(&["grant-access", "staging", "--yes"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "2 granted, 0 already present, 1 failed");
    assert_stderr_contains(&output, "access grant failed for 1 of 3 pair(s)");
    assert_eq!(
        t.members(STAGING_PROJECT, "botmaro-staging--DATABASE_URL", ACCESSOR),
        vec![RUNTIME_SA.to_string()]
    );

    // A re-run only repairs what is still missing
    assert_success(&t.set("staging.LOG_LEVEL", "debug"));
    let output = t.run(&["grant-access", "staging", "--yes"]);
    assert_success(&output);
    assert_stdout_contains(&output, "1 granted, 2 already present, 0 failed");
}

#[test]
fn test_explicit_accounts_and_role() {
    let t = Test::with_secrets(&[
        ("staging.web-app.FRONTEND_URL", "https://app"),
        ("staging.web-app.API_KEY", "project-key-1"),
    ]);
    let viewer = "viewer@botmaro-test.iam.gserviceaccount.com";

    let output = t.run(&[
        "grant-access",
        "staging",
        "-p",
        "web-app",
        "--service-account",
        viewer,
        "--role",
        "roles/secretmanager.viewer",
        "--yes",
    ]);
    assert_success(&output);
    assert_stdout_contains(&output, "2 granted");
    assert_eq!(
        t.members(
            STAGING_PROJECT,
            "botmaro-staging--web-app--FRONTEND_URL",
            "roles/secretmanager.viewer"
        ),
        vec![viewer.to_string()]
    );
    assert!(t
        .members(
            STAGING_PROJECT,
            "botmaro-staging--web-app--FRONTEND_URL",
            ACCESSOR
        )
        .is_empty());
}

#[test]
fn test_project_scope_uses_union_of_accounts() {
    let t = Test::with_secrets(&[
        ("staging.web-app.FRONTEND_URL", "https://app"),
        ("staging.web-app.API_KEY", "project-key-1"),
    ]);

    let output = t.run(&["grant-access", "staging", "-p", "web-app", "--yes"]);
    assert_success(&output);
    assert_stdout_contains(&output, "4 granted");
    assert_eq!(
        t.members(
            STAGING_PROJECT,
            "botmaro-staging--web-app--FRONTEND_URL",
            ACCESSOR
        ),
        vec![RUNTIME_SA.to_string(), WEB_SA.to_string()]
    );
}

#[test]
fn test_no_accounts_configured() {
    let t = Test::new();

    let output = t.run(&["grant-access", "prod", "--yes"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "no service accounts configured for prod");
}
