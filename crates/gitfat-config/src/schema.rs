// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder wire version used for new writes unless configured otherwise.
pub const DEFAULT_PLACEHOLDER_VERSION: u8 = 2;

/// Read size for the streaming filters.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Smallest accepted block size; must exceed the longest placeholder record so
/// a placeholder always arrives as one whole first block.
pub const MIN_BLOCK_SIZE: usize = 128;

/// Per-repository settings file at the work-tree root (git-config syntax).
pub const GITFAT_FILE: &str = ".gitfat";

/// Top-level configuration, built once per process and passed to every component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Placeholder format and streaming settings
    pub placeholder: PlaceholderConfig,

    /// On-disk locations owned by git-fat
    pub paths: PathsConfig,

    /// Remote used by push/pull; absent until `.gitfat` names one
    pub rsync: Option<RsyncConfig>,

    /// Executable run in place of `rsync`, set through `GIT_FAT_RSYNC`
    #[serde(default)]
    pub transfer_program: Option<String>,

    /// Logging settings
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Default configuration for a repository whose git directory is `git_dir`.
    pub fn for_git_dir(git_dir: impl AsRef<Path>) -> Self {
        Self {
            paths: PathsConfig::for_git_dir(git_dir),
            ..Self::default()
        }
    }

    /// The rsync settings, or an error explaining where they should come from.
    pub fn require_rsync(&self) -> crate::ConfigResult<&RsyncConfig> {
        self.rsync
            .as_ref()
            .ok_or_else(|| crate::ConfigError::MissingRequired(format!("rsync.remote in {}", GITFAT_FILE)))
    }
}

/// How placeholder records are written and how content is streamed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceholderConfig {
    /// Wire version for newly written placeholders (1 or 2)
    #[serde(default = "default_version")]
    pub version: u8,

    /// Block size for streaming reads, in bytes
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            block_size: default_block_size(),
        }
    }
}

/// Directories under the git directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Content-addressed object cache, one file per digest
    pub object_dir: PathBuf,

    /// History-rewrite memo, one file per original blob hash
    pub memo_dir: PathBuf,
}

impl PathsConfig {
    /// Standard layout under `<git-dir>/fat`.
    pub fn for_git_dir(git_dir: impl AsRef<Path>) -> Self {
        let fat_dir = git_dir.as_ref().join("fat");
        Self {
            object_dir: fat_dir.join("objects"),
            memo_dir: fat_dir.join("index-filter"),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self::for_git_dir(".git")
    }
}

/// Settings for the bulk-transfer tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RsyncConfig {
    /// Destination such as `host:/srv/fat-store` or a local directory
    pub remote: String,

    /// Port passed to ssh via `--rsh`
    #[serde(default)]
    pub ssh_port: Option<u16>,

    /// Login passed to ssh via `--rsh`
    #[serde(default)]
    pub ssh_user: Option<String>,

    /// Extra rsync arguments, space separated
    #[serde(default)]
    pub options: Option<String>,
}

/// Diagnostics written to stderr
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Debug-level diagnostics on stderr
    #[serde(default)]
    pub verbose: bool,

    /// Explicit filter directive; overrides `verbose`
    #[serde(default)]
    pub log_level: Option<String>,

    /// One of `pretty`, `compact`, `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_level: None,
            log_format: default_log_format(),
        }
    }
}

impl ObservabilityConfig {
    /// Level handed to the subscriber.
    pub fn effective_level(&self) -> &str {
        match (&self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => "debug",
            (None, false) => "warn",
        }
    }
}

fn default_version() -> u8 {
    DEFAULT_PLACEHOLDER_VERSION
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_log_format() -> String {
    "compact".to_string()
}
