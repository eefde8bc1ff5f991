//! Test fixtures and constants.

/// Store project of the staging environment.
pub const STAGING_PROJECT: &str = "botmaro-test";

/// Runtime account declared for staging.
pub const RUNTIME_SA: &str = "runtime@botmaro-test.iam.gserviceaccount.com";

/// Account declared for the web-app project.
pub const WEB_SA: &str = "web@botmaro-test.iam.gserviceaccount.com";

/// Role granted by default.
pub const ACCESSOR: &str = "roles/secretmanager.secretAccessor";

/// Standard configuration: staging with one project, and prod.
pub const CONFIG: &str = r#"
version: "1.0"
environments:
  staging:
    gcp_project: botmaro-test
    prefix: botmaro-staging
    service_accounts:
      - runtime@botmaro-test.iam.gserviceaccount.com
    global_secrets:
      - name: API_KEY
        description: Public API key
      - name: DATABASE_URL
      - name: LOG_LEVEL
        required: false
        default: info
    projects:
      web-app:
        secrets:
          - name: FRONTEND_URL
          - name: API_KEY
            required: false
        service_accounts:
          - web@botmaro-test.iam.gserviceaccount.com
  prod:
    gcp_project: botmaro-prod
    prefix: botmaro-prod
    global_secrets:
      - name: API_KEY
"#;

/// Staging values that satisfy every required staging secret.
pub const STAGING_SECRETS: &[(&str, &str)] = &[
    ("staging.API_KEY", "sk-live-1234567890"),
    ("staging.DATABASE_URL", "postgres://db.internal/app"),
];

/// Sample dotenv file for import tests.
pub const SAMPLE_ENV: &str = r#"
# imported from a developer machine
API_KEY=sk-imported-abcdef
DATABASE_URL="postgres://db/imported"
EXTRA_TOKEN=REPLACE_ME
"#;

/// Workflow referencing one declared and one undeclared secret.
pub const WORKFLOW: &str = r#"
name: deploy
on: push
jobs:
  deploy:
    runs-on: ubuntu-latest
    steps:
      - run: ./deploy.sh
        env:
          API_KEY: ${{ secrets.API_KEY }}
          STRIPE_KEY: ${{ secrets.STRIPE_KEY }}
          TOKEN: ${{ secrets.GITHUB_TOKEN }}
"#;
