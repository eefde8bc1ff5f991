//! Shared CLI output helpers.
//!
//! Color scheme (disabled for non-terminals and with NO_COLOR):
//! - Green: success, checkmarks
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: physical names, keys, hints
//! - Bold: headers, important values
//! - Dimmed: secondary info
//!
//! Results go to stdout. Errors and notes that must not mix with
//! scriptable output go to stderr.

use console::style;

const RULE_WIDTH: usize = 56;

/// Print a success message with checkmark (green).
///
/// Example: `✓ set botmaro-staging--API_KEY (version 3)`
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// Print an error message to stderr (red).
///
/// Example: `✗ secret not found: botmaro-staging--API_KEY`
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().for_stderr(), msg);
}

/// Print a warning message (yellow).
///
/// Example: `⚠ API_KEY is not declared in staging`
pub fn warn(msg: &str) {
    println!("{} {}", style("⚠").yellow(), msg);
}

/// Print a hint to stderr (cyan).
///
/// Example: `→ re-run with --yes to skip confirmation`
pub fn hint(msg: &str) {
    eprintln!(
        "{} {}",
        style("→").cyan().for_stderr(),
        style(msg).cyan().for_stderr()
    );
}

/// Print a dimmed note to stderr, keeping stdout clean for scripts.
pub fn note(msg: &str) {
    eprintln!("{}", style(msg).dim().for_stderr());
}

/// Print a bold section header.
pub fn header(title: &str) {
    println!("{}", style(title).bold());
}

/// Print a list item with bullet.
pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Format a key or physical name in cyan.
pub fn key(k: &str) -> String {
    style(k).cyan().to_string()
}

/// Format a command string in green.
pub fn cmd(c: &str) -> String {
    style(c).green().to_string()
}

/// Format a status word: green, yellow or red.
pub fn status(word: &str, level: Level) -> String {
    match level {
        Level::Ok => style(word).green().to_string(),
        Level::Warn => style(word).yellow().to_string(),
        Level::Fail => style(word).red().to_string(),
        Level::Quiet => style(word).dim().to_string(),
    }
}

/// Severity used by [`status`].
#[derive(Debug, Clone, Copy)]
pub enum Level {
    Ok,
    Warn,
    Fail,
    Quiet,
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    println!("{}", style(msg).dim());
}

/// Print a horizontal rule separator.
pub fn rule() {
    println!("{}", style("─".repeat(RULE_WIDTH)).dim());
}

/// Print a section header with a separator line.
///
/// ```text
/// staging.web-app
/// ────────────────────────────────────────────────────────
/// ```
pub fn section(title: &str) {
    println!();
    header(title);
    rule();
}

/// Print text verbatim, without a trailing newline added.
pub fn raw(text: &str) {
    print!("{}", text);
}
