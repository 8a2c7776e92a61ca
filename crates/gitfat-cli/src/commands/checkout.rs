// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Replace placeholders in the working tree with cached content

use crate::output;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Args)]
pub struct CheckoutCmd {}

impl CheckoutCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        restore(repo, true)
    }
}

/// Re-smudges every placeholder whose object is cached, optionally listing
/// the ones that are still unavailable.
pub fn restore(repo: &FatRepo, show_orphans: bool) -> Result<()> {
    let store = repo.store();
    let report = repo
        .work_tree()?
        .checkout(&store, show_orphans)
        .context("Failed to restore placeholders")?;

    if repo.is_quiet() {
        return Ok(());
    }
    for file in &report.restored {
        output::detail("Restored", &file.path);
    }
    for file in &report.orphans {
        output::warning(&format!("Data unavailable: {} {}", file.digest, file.path));
    }
    Ok(())
}
