// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Fetch missing objects from the shared remote and restore them

use crate::commands::checkout;
use crate::output;
use crate::progress::ProgressTracker;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::{Digest, Direction, RevScope, RsyncTransfer, Transfer};
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Args)]
pub struct PullCmd {
    /// Fetch objects for every revision, not just what is checked out
    #[arg(long, conflicts_with = "revision")]
    pub all: bool,

    /// Revision whose objects to fetch (default: HEAD)
    #[arg(value_name = "REV")]
    pub revision: Option<String>,

    /// Only fetch objects for working tree files matching these patterns
    #[arg(last = true, value_name = "PATTERN")]
    pub patterns: Vec<String>,
}

impl PullCmd {
    fn scope(&self) -> RevScope {
        match (&self.revision, self.all) {
            (_, true) => RevScope::All,
            (Some(rev), false) => RevScope::Revision(rev.clone()),
            (None, false) => RevScope::Head,
        }
    }

    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let transfer = RsyncTransfer::from_config(repo.config()).context("Cannot pull")?;
        let scope = self.scope();
        let store = repo.store();

        let spinner = ProgressTracker::new(repo.is_quiet()).spinner("Scanning history for placeholders");
        let mut wanted = repo
            .catalog(&store)?
            .reconcile(&scope)
            .context("Failed to compare history with the cache")?
            .orphans();
        spinner.finish_and_clear();

        if !self.all {
            let present: HashSet<Digest> = repo
                .work_tree()?
                .placeholder_files(&self.patterns)
                .context("Failed to scan the working tree")?
                .into_iter()
                .map(|file| file.digest)
                .collect();
            debug!("{} placeholders in the working tree", present.len());
            wanted.retain(|digest| present.contains(digest));
        }

        if wanted.is_empty() {
            if !repo.is_quiet() {
                output::info("Nothing to pull");
            }
        } else {
            info!("Pulling {} objects for {}", wanted.len(), scope);
            transfer.transfer(Direction::Pull, &wanted)?;
            if !repo.is_quiet() {
                output::success(&format!("Pulled {} objects", wanted.len()));
            }
        }

        checkout::restore(repo, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        pull: PullCmd,
    }

    fn parse(args: &[&str]) -> PullCmd {
        Harness::parse_from(std::iter::once("pull").chain(args.iter().copied())).pull
    }

    #[test]
    fn test_default_scope_is_head() {
        let cmd = parse(&[]);
        assert_eq!(cmd.scope(), RevScope::Head);
        assert!(cmd.patterns.is_empty());
    }

    #[test]
    fn test_revision_and_patterns() {
        let cmd = parse(&["v1.0", "--", "assets/*.bin", "video"]);
        assert_eq!(cmd.scope(), RevScope::Revision("v1.0".to_string()));
        assert_eq!(cmd.patterns, vec!["assets/*.bin", "video"]);
    }

    #[test]
    fn test_all_scope() {
        assert_eq!(parse(&["--all"]).scope(), RevScope::All);
    }

    #[test]
    fn test_all_conflicts_with_revision() {
        let result = Harness::try_parse_from(["pull", "--all", "HEAD~1"]);
        assert!(result.is_err());
    }
}
