// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Find paths in history that have held large blobs

use crate::progress::ProgressTracker;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::{find_large_files, format_large_files};

#[derive(Debug, Args)]
pub struct FindCmd {
    /// Size in bytes a blob must exceed
    #[arg(value_name = "THRESHOLD")]
    pub threshold: u64,
}

impl FindCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let spinner = ProgressTracker::new(repo.is_quiet()).spinner("Scanning history for large blobs");
        let files = find_large_files(repo.backend(), self.threshold)
            .context("Failed to scan history")?;
        spinner.finish_and_clear();

        // Output is a ready-made .gitattributes and index-filter FILELIST.
        for line in format_large_files(&files) {
            println!("{}", line);
        }
        Ok(())
    }
}
