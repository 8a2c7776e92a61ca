// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! CLI command helpers for testing the git-fat binary.
//!
//! Provides convenient wrappers around assert_cmd for testing the `git-fat` CLI.

use assert_cmd::Command;
use std::path::Path;

/// Creates a new git-fat Command for testing.
///
/// Ambient `GIT_FAT_*` variables are cleared so the developer's environment
/// cannot change test outcomes.
///
/// # Example
/// ```ignore
/// use gitfat_test_utils::gitfat;
///
/// gitfat()
///     .arg("status")
///     .current_dir(repo.path())
///     .assert()
///     .success();
/// ```
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn gitfat() -> Command {
    let mut cmd = Command::cargo_bin("git-fat").expect("git-fat binary not found");
    for var in [
        "GIT_FAT_VERSION",
        "GIT_FAT_VERBOSE",
        "GIT_FAT_BLOCK_SIZE",
        "GIT_FAT_LOG_LEVEL",
        "GIT_FAT_LOG_FORMAT",
        "GIT_FAT_RSYNC",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Fluent API wrapper for common git-fat command patterns.
pub struct GitFatCommand {
    cmd: Command,
}

impl GitFatCommand {
    /// Create a new GitFatCommand.
    pub fn new() -> Self {
        Self { cmd: gitfat() }
    }

    /// Set the working directory for the command.
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    /// Add an argument to the command.
    pub fn arg(mut self, arg: &str) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Add multiple arguments to the command.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Feed bytes on stdin.
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.cmd.write_stdin(input.into());
        self
    }

    /// Execute the command and assert success.
    pub fn run_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Execute the command and assert failure.
    pub fn run_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Get the underlying Command for custom assertions.
    pub fn into_inner(self) -> Command {
        self.cmd
    }

    /// Install the filter driver in the given repository (quiet mode).
    pub fn init_quiet(dir: &Path) {
        gitfat().arg("-q").arg("init").current_dir(dir).assert().success();
    }

    /// Get repository status.
    pub fn status(dir: &Path) -> assert_cmd::assert::Assert {
        gitfat().arg("status").current_dir(dir).assert()
    }
}

impl Default for GitFatCommand {
    fn default() -> Self {
        Self::new()
    }
}
