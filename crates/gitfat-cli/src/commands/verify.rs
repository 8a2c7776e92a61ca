// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Check cached objects against their names

use crate::output;
use crate::progress::ProgressTracker;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Args)]
pub struct VerifyCmd {}

impl VerifyCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let store = repo.store();

        let spinner = ProgressTracker::new(repo.is_quiet()).spinner("Hashing cached objects");
        let corrupted = store.verify().context("Failed to verify the cache")?;
        spinner.finish_and_clear();

        if corrupted.is_empty() {
            if !repo.is_quiet() {
                output::success("All cached objects are intact");
            }
            return Ok(());
        }

        for entry in &corrupted {
            println!("{} data hash is {}", entry.expected, entry.actual);
        }
        anyhow::bail!("{} corrupted objects in {}", corrupted.len(), store.root().display())
    }
}
