// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Install the git-fat filter driver

use crate::output;
use crate::repo::FatRepo;
use anyhow::{Context, Result};
use clap::Args;
use gitfat_git::{FilterDriver, InstallOutcome};

#[derive(Debug, Args)]
pub struct InitCmd {}

impl InitCmd {
    pub fn execute(self, repo: &FatRepo) -> Result<()> {
        let exe = std::env::current_exe().context("Failed to get git-fat executable path")?;
        let command = shell_quote(&exe.to_string_lossy());

        let outcome = FilterDriver::install(repo.repository(), &command)
            .context("Failed to write filter configuration")?;
        repo.store().ensure().context("Failed to create object cache")?;

        if repo.is_quiet() {
            return Ok(());
        }
        match outcome {
            InstallOutcome::Installed => {
                output::success("git-fat filter driver installed");
                output::detail("Command", &command);
                output::detail("Cache", &repo.config().paths.object_dir.display().to_string());
            }
            InstallOutcome::AlreadyInstalled => {
                output::info("git-fat is already configured; check filter.fat in .git/config");
            }
        }
        Ok(())
    }
}

/// Git runs filter commands through the shell.
fn shell_quote(word: &str) -> String {
    let plain = word
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-+:@%".contains(c));
    if plain && !word.is_empty() {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
