// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Repository context for git-fat commands
//!
//! Opens the surrounding git repository once, loads its [`Config`], and
//! builds the components every command shares.

use anyhow::{Context, Result};
use gitfat_config::{Config, ConfigLoader};
use gitfat_git::{
    FatError, FilterDriver, GitBackend, ObjectCatalog, ObjectStore, PlaceholderCodec, WorkTree,
};
use git2::Repository;
use std::path::PathBuf;
use tracing::debug;

/// An opened repository plus the git-fat components bound to it.
pub struct FatRepo {
    repo: Repository,
    config: Config,
    backend: GitBackend,
    cwd: PathBuf,
    quiet: bool,
}

impl FatRepo {
    /// Open the repository git itself would use from here.
    ///
    /// `GIT_DIR`, `GIT_WORK_TREE` and friends are honoured, so this also
    /// works inside `git filter-branch` and the filter processes git spawns.
    pub fn open(quiet: bool) -> Result<Self> {
        let repo = Repository::open_from_env()
            .context("Not a git repository (or any of the parent directories)")?;
        let config = ConfigLoader::new()
            .load(repo.path(), repo.workdir())
            .context("Failed to load git-fat configuration")?;
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        debug!(
            "Opened {} (objects in {})",
            repo.path().display(),
            config.paths.object_dir.display()
        );

        Ok(Self {
            repo,
            backend: GitBackend::new(&cwd),
            config,
            cwd,
            quiet,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn backend(&self) -> &GitBackend {
        &self.backend
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Fail with [`FatError::NotInitialized`] unless `init` has run.
    pub fn require_initialized(&self) -> Result<()> {
        if FilterDriver::is_installed(&self.repo)? {
            return Ok(());
        }
        Err(FatError::NotInitialized("run 'git fat init' first".to_string()).into())
    }

    pub fn codec(&self) -> Result<PlaceholderCodec> {
        Ok(PlaceholderCodec::from_config(&self.config)?)
    }

    pub fn store(&self) -> ObjectStore {
        ObjectStore::from_config(&self.config)
    }

    pub fn driver(&self) -> Result<FilterDriver> {
        Ok(FilterDriver::from_config(&self.config)?)
    }

    pub fn catalog<'a>(&'a self, store: &'a ObjectStore) -> Result<ObjectCatalog<'a, GitBackend>> {
        Ok(ObjectCatalog::new(&self.backend, store, self.codec()?))
    }

    /// Tracked paths are resolved relative to the directory git-fat runs in,
    /// matching what `git ls-files` prints.
    pub fn work_tree(&self) -> Result<WorkTree<'_, GitBackend>> {
        if self.repo.is_bare() {
            anyhow::bail!("This operation must be run in a work tree");
        }
        Ok(WorkTree::new(&self.backend, &self.cwd, self.codec()?))
    }
}
