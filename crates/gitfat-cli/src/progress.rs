// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress indicators for the slow history scans.
///
/// Always drawn on stderr, and hidden entirely in quiet mode or when stderr
/// is not a terminal.
pub struct ProgressTracker {
    quiet: bool,
}

impl ProgressTracker {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Spinner for work of unknown length
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn format_bytes(bytes: u64) -> String {
        HumanBytes(bytes).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_bars_are_hidden() {
        let tracker = ProgressTracker::new(true);
        assert!(tracker.spinner("scanning").is_hidden());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(ProgressTracker::format_bytes(512), "512 B");
        assert_eq!(ProgressTracker::format_bytes(2048), "2.00 KiB");
    }
}
