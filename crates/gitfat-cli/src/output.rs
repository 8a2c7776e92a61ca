// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Shared output formatting for CLI commands.
//!
//! Messages for people go to stderr so that stdout only ever carries data:
//! filter output, digest lists, `find` lines and JSON.
//!
//! # Examples
//!
//! ```ignore
//! output::success("Filter driver installed");
//! output::detail("Objects", "42");
//! ```

use console::style;

/// Print a success message with a green check.
pub fn success(msg: &str) {
    eprintln!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message with a red cross.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print an informational message.
pub fn info(msg: &str) {
    eprintln!("{} {}", style("ℹ").cyan(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow(), msg);
}

/// Print a detail line with the value highlighted.
///
/// ```ignore
/// output::detail("Remote", "store.example.com:/srv/fat");
/// // Output:   Remote: store.example.com:/srv/fat
/// ```
pub fn detail(key: &str, value: &str) {
    eprintln!("  {}: {}", key, style(value).cyan());
}
