//! Completions command.
//!
//! Generates shell completion scripts for bash, zsh, fish, elvish and
//! PowerShell.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::error::Result;

/// Generate shell completions on stdout.
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "secrets-manager", &mut std::io::stdout());
    Ok(())
}
