//! Colored console output for speedclone
//!
//! Uses owo-colors for terminal colors. Progress bars live in [`super::progress`].

use owo_colors::OwoColorize;

/// Print an action header (blue, bold)
/// Example: "==> Resolving acme/widget"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print a cascade attempt with its position (cyan counter)
/// Example: "(2/6) tar.gz(stream)@branch"
pub fn attempt(current: usize, total: usize, label: &str) {
    println!(
        "  {} {}",
        format!("({}/{})", current, total).cyan(),
        label
    );
}

/// Print a detail line (dimmed prefix)
/// Example: "     default branch: main"
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a success message (green)
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Abbreviate a commit id for display (12 characters, like `git log --abbrev=12`).
pub fn short_commit(commit_id: &str) -> &str {
    commit_id.get(..12).unwrap_or(commit_id)
}
