// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

use crate::output;
use crate::progress::ProgressTracker;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::RevScope;

/// Delete cached objects that HEAD does not reference
#[derive(Debug, Args)]
pub struct GcCmd {
    /// Show what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

impl GcCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let store = repo.store();
        let garbage = repo
            .catalog(&store)?
            .reconcile(&RevScope::Head)
            .context("Failed to compare HEAD with the cache")?
            .garbage();

        let report = store.collect_garbage(garbage, self.dry_run);
        for (digest, size) in &report.removed {
            println!("{:>10} {}", size, digest);
        }
        for (digest, err) in &report.failed {
            output::warning(&format!("Could not remove {}: {}", digest, err));
        }

        if !repo.is_quiet() {
            let verb = if self.dry_run { "Would remove" } else { "Removed" };
            output::info(&format!(
                "{} {} objects ({})",
                verb,
                report.removed.len(),
                ProgressTracker::format_bytes(report.bytes_freed())
            ));
        }

        if !report.failed.is_empty() {
            anyhow::bail!("{} objects could not be removed", report.failed.len());
        }
        Ok(())
    }
}
