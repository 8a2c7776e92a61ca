// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Git filter driver commands (clean and smudge)
//!
//! Both stream stdin to stdout. Nothing else may be written to stdout.

use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::{CleanOutcome, SmudgeOutcome};
use std::io::{self, BufWriter, Write};
use tracing::debug;

#[derive(Debug, Args)]
pub struct FilterCleanCmd {
    /// Path being cleaned, as passed by git's %f
    #[arg(value_name = "FILE")]
    pub file_path: Option<String>,
}

#[derive(Debug, Args)]
pub struct FilterSmudgeCmd {
    /// Path being smudged, as passed by git's %f
    #[arg(value_name = "FILE")]
    pub file_path: Option<String>,
}

impl FilterCleanCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let driver = repo.driver()?;
        let path = self.file_path.as_deref().unwrap_or("<stdin>");
        let mut stdout = BufWriter::new(io::stdout().lock());

        let outcome = driver
            .clean(io::stdin().lock(), &mut stdout)
            .with_context(|| format!("Clean filter failed for {}", path))?;
        stdout.flush()?;

        match outcome {
            CleanOutcome::Stored {
                digest,
                size,
                newly_stored,
            } => debug!(
                "filter-clean {}: {} bytes as {}{}",
                path,
                size,
                digest,
                if newly_stored { "" } else { " (already cached)" }
            ),
            CleanOutcome::Hanging { digest } => {
                debug!("filter-clean {}: already a placeholder for {}", path, digest)
            }
        }
        Ok(())
    }
}

impl FilterSmudgeCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let driver = repo.driver()?;
        let path = self.file_path.as_deref().unwrap_or("<stdin>");
        let mut stdout = BufWriter::new(io::stdout().lock());

        let outcome = driver
            .smudge(io::stdin().lock(), &mut stdout)
            .with_context(|| format!("Smudge filter failed for {}", path))?;
        stdout.flush()?;

        match outcome {
            SmudgeOutcome::Restored { digest, size } => {
                debug!("filter-smudge {}: restored {} bytes from {}", path, size, digest)
            }
            SmudgeOutcome::Missing { digest } => {
                debug!("filter-smudge {}: {} not cached, placeholder kept", path, digest)
            }
            SmudgeOutcome::Passthrough { size } => {
                debug!("filter-smudge {}: {} bytes passed through", path, size)
            }
        }
        Ok(())
    }
}
