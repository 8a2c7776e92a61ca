// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Show which objects are missing from, or superfluous in, the cache

use crate::progress::ProgressTracker;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::{Digest, RevScope, StatusSummary};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct StatusCmd {
    /// Consider every revision instead of HEAD only
    #[arg(long)]
    pub all: bool,

    /// Machine-readable output
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    scope: String,
    orphans: Vec<Digest>,
    garbage: Vec<Digest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    referenced: Option<Vec<Digest>>,
}

impl StatusReport {
    fn new(scope: &RevScope, summary: StatusSummary, with_referenced: bool) -> Self {
        Self {
            scope: scope.to_string(),
            orphans: summary.orphans,
            garbage: summary.garbage,
            referenced: with_referenced.then_some(summary.referenced),
        }
    }
}

impl StatusCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let scope = if self.all { RevScope::All } else { RevScope::Head };
        let store = repo.store();

        let spinner = ProgressTracker::new(repo.is_quiet() || self.json)
            .spinner("Scanning history for placeholders");
        let reconciliation = repo
            .catalog(&store)?
            .reconcile(&scope)
            .context("Failed to compare history with the cache")?;
        spinner.finish_and_clear();

        let report = StatusReport::new(&scope, reconciliation.summary(), self.all);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        print_section("Orphan objects", &report.orphans);
        print_section("Garbage objects", &report.garbage);
        if let Some(referenced) = &report.referenced {
            print_section("Referenced objects", referenced);
        }
        Ok(())
    }
}

fn print_section(title: &str, digests: &[Digest]) {
    if digests.is_empty() {
        return;
    }
    println!("{}:", title);
    for digest in digests {
        println!("    {}", digest);
    }
}
