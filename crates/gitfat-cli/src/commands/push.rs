// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Send cached objects to the shared remote

use crate::output;
use crate::progress::ProgressTracker;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::{Direction, RevScope, RsyncTransfer, Transfer};
use tracing::info;

#[derive(Debug, Args)]
pub struct PushCmd {
    /// Push objects referenced by any revision, not just HEAD
    #[arg(long)]
    pub all: bool,
}

impl PushCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        // Fails before any history scan when no remote is configured.
        let transfer = RsyncTransfer::from_config(repo.config()).context("Cannot push")?;
        let scope = if self.all { RevScope::All } else { RevScope::Head };
        let store = repo.store();

        let spinner = ProgressTracker::new(repo.is_quiet()).spinner("Scanning history for placeholders");
        let reconciliation = repo
            .catalog(&store)?
            .reconcile(&scope)
            .context("Failed to compare history with the cache")?;
        spinner.finish_and_clear();

        let orphans = reconciliation.orphans();
        if !orphans.is_empty() && !repo.is_quiet() {
            output::warning(&format!(
                "{} referenced objects are not in the local cache and will not be pushed",
                orphans.len()
            ));
        }

        let to_push = reconciliation.to_push();
        if to_push.is_empty() {
            if !repo.is_quiet() {
                output::info("Nothing to push");
            }
            return Ok(());
        }

        info!("Pushing {} objects for {}", to_push.len(), scope);
        transfer.transfer(Direction::Push, &to_push)?;

        if !repo.is_quiet() {
            output::success(&format!("Pushed {} objects", to_push.len()));
        }
        Ok(())
    }
}
