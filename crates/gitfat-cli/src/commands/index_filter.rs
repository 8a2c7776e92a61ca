// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! History rewrite hook for `git filter-branch --index-filter`
//!
//! ```text
//! git fat find 10000000 > big-files
//! git filter-branch --index-filter 'git fat index-filter big-files' --tag-name-filter cat -- --all
//! ```

use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::{parse_file_list, IndexFilter, RewriteCache};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct IndexFilterCmd {
    /// File of paths to convert, bare or as printed by `git fat find`
    #[arg(value_name = "FILELIST")]
    pub filelist: PathBuf,

    /// Add a `filter=fat -text` line to .gitattributes for every converted path
    #[arg(long)]
    pub manage_gitattributes: bool,
}

impl IndexFilterCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let text = fs::read_to_string(&self.filelist)
            .with_context(|| format!("Failed to read {}", self.filelist.display()))?;
        let files = parse_file_list(&text);
        debug!("{} paths listed in {}", files.len(), self.filelist.display());

        let driver = repo.driver()?;
        let cache = RewriteCache::from_config(repo.config());
        let report = IndexFilter::new(repo.backend(), &driver, &cache)
            .with_manage_gitattributes(self.manage_gitattributes)
            .run(&files)
            .context("Index filter failed")?;

        debug!("{:?}", report);
        Ok(())
    }
}
