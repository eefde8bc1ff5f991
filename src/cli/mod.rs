//! Command-line interface.

pub mod access;
pub mod bootstrap;
pub mod check;
pub mod completions;
pub mod context;
pub mod output;
pub mod secrets;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::core::constants::{ACCESSOR_ROLE, CONFIG_ENV, CONFIG_FILE};
use crate::core::format::Format;

/// secrets-manager - Multi-environment secrets on Google Secret Manager.
#[derive(Parser)]
#[command(
    name = "secrets-manager",
    about = "Multi-environment secrets on Google Secret Manager",
    version,
    after_help = "Targets are written env[.project].SECRET, e.g. staging.web-app.API_KEY"
)]
pub struct Cli {
    /// Path to the secrets configuration file
    #[arg(short, long, global = true, env = CONFIG_ENV, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Load an environment's secrets for a deployment
    Bootstrap {
        /// Environment name
        env: String,
        /// Also load one project's secrets (they override environment values)
        #[arg(short, long)]
        project: Option<String>,
        /// Runtime service account to grant read access
        #[arg(long)]
        runtime_sa: Option<String>,
        /// Deployer service account to grant read access
        #[arg(long)]
        deployer_sa: Option<String>,
        /// Grant access without asking
        #[arg(short, long)]
        yes: bool,
        /// Write the loaded secrets to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output file format (default: guessed from the file name)
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Print shell export statements to stdout
        #[arg(long)]
        export: bool,
    },

    /// Set a secret value
    Set {
        /// env[.project].SECRET
        target: String,
        /// Secret value (read from stdin or a prompt when omitted)
        #[arg(long)]
        value: Option<String>,
        /// Grant a service account read access after writing
        #[arg(long = "grant", value_name = "SERVICE_ACCOUNT")]
        grant: Vec<String>,
    },

    /// Get a secret value
    Get {
        /// env[.project].SECRET
        target: String,
        /// Read a specific version instead of the latest
        #[arg(long)]
        version: Option<String>,
        /// Print the plain value instead of a masked one
        #[arg(long)]
        reveal: bool,
    },

    /// List the secrets of an environment or project
    List {
        /// Environment name
        env: String,
        #[arg(short, long)]
        project: Option<String>,
        /// Show values (masked unless combined with --json)
        #[arg(long)]
        reveal: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a secret and all its versions
    Delete {
        /// env[.project].SECRET
        target: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show the version history of a secret
    Versions {
        /// env[.project].SECRET
        target: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an environment against the store and CI workflows
    Check {
        /// Environment name
        env: String,
        /// Only check this project (default: the environment and all projects)
        #[arg(short, long)]
        project: Option<String>,
        /// Workflow file or directory to scan
        #[arg(long, default_value = crate::core::constants::WORKFLOW_DIR)]
        workflows: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import secrets from files
    Import {
        /// Environment name
        env: String,
        /// Files to import (.env, .json, .yaml, .sh, github env)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        project: Option<String>,
        /// Input format (default: guessed from each file name)
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Import values that look like placeholders
        #[arg(long)]
        no_filter: bool,
    },

    /// Export secrets to a file or stdout
    Export {
        /// Environment name
        env: String,
        #[arg(short, long)]
        project: Option<String>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (default: guessed from the file name, dotenv on stdout)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },

    /// Grant service accounts read access to every secret in a scope
    GrantAccess {
        /// Environment name
        env: String,
        #[arg(short, long)]
        project: Option<String>,
        /// Service account to grant (default: the scope's configured accounts)
        #[arg(long = "service-account", value_name = "EMAIL")]
        service_accounts: Vec<String>,
        /// IAM role to grant
        #[arg(long, default_value = ACCESSOR_ROLE)]
        role: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Execute a command against the configuration at `config`.
pub fn execute(command: Command, config: &Path) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Bootstrap {
            env,
            project,
            runtime_sa,
            deployer_sa,
            yes,
            output,
            format,
            export,
        } => bootstrap::execute(
            config,
            bootstrap::Options {
                env,
                project,
                accounts: runtime_sa.into_iter().chain(deployer_sa).collect(),
                yes,
                output,
                format,
                export,
            },
        ),
        Set {
            target,
            value,
            grant,
        } => secrets::set(config, &target, value, &grant),
        Get {
            target,
            version,
            reveal,
        } => secrets::get(config, &target, version.as_deref(), reveal),
        List {
            env,
            project,
            reveal,
            json,
        } => secrets::list(config, &env, project.as_deref(), reveal, json),
        Delete { target, force } => secrets::delete(config, &target, force),
        Versions { target, json } => secrets::versions(config, &target, json),
        Check {
            env,
            project,
            workflows,
            json,
        } => check::execute(config, &env, project.as_deref(), &workflows, json),
        Import {
            env,
            files,
            project,
            format,
            dry_run,
            no_filter,
        } => secrets::import(
            config,
            &env,
            project.as_deref(),
            &files,
            secrets::ImportFlags {
                format,
                dry_run,
                filter_placeholders: !no_filter,
            },
        ),
        Export {
            env,
            project,
            output,
            format,
        } => secrets::export(config, &env, project.as_deref(), output.as_deref(), format),
        GrantAccess {
            env,
            project,
            service_accounts,
            role,
            yes,
        } => access::execute(
            config,
            &env,
            project.as_deref(),
            service_accounts,
            &role,
            yes,
        ),
        Completions { shell } => completions::execute(shell),
    }
}
