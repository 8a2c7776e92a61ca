// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Synchronizing the cache with a remote store
//!
//! The bulk-transfer tool gets a NUL-separated list of digests on stdin and
//! copies those files between the cache directory and the remote, skipping
//! any that already exist at the destination.

use crate::digest::Digest;
use crate::error::{FatError, FatResult};
use gitfat_config::{Config, RsyncConfig};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Which way objects move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Cache → remote
    Push,
    /// Remote → cache
    Pull,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Push => f.write_str("push"),
            Direction::Pull => f.write_str("pull"),
        }
    }
}

/// Moves named objects between the cache and a remote
pub trait Transfer {
    /// Copies `digests` in `direction`
    fn transfer(&self, direction: Direction, digests: &[Digest]) -> FatResult<()>;
}

/// [`Transfer`] implemented with rsync.
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    settings: RsyncConfig,
    object_dir: PathBuf,
    program: String,
}

impl RsyncTransfer {
    /// Transfer between `object_dir` and the configured remote
    pub fn new(settings: RsyncConfig, object_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            object_dir: object_dir.into(),
            program: "rsync".to_string(),
        }
    }

    /// Transfer for the configured remote; fails if `.gitfat` names none
    pub fn from_config(config: &Config) -> FatResult<Self> {
        let settings = config.require_rsync()?.clone();
        let transfer = Self::new(settings, &config.paths.object_dir);
        Ok(match &config.transfer_program {
            Some(program) => transfer.with_program(program.clone()),
            None => transfer,
        })
    }

    /// Runs `program` instead of `rsync`, with the same arguments
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments for one invocation
    pub fn command_args(&self, direction: Direction) -> Vec<String> {
        let mut args = vec![
            "--progress".to_string(),
            "--ignore-existing".to_string(),
            "--from0".to_string(),
            "--files-from=-".to_string(),
        ];

        if self.settings.ssh_user.is_some() || self.settings.ssh_port.is_some() {
            let mut rsh = "--rsh=ssh".to_string();
            if let Some(user) = &self.settings.ssh_user {
                rsh.push_str(&format!(" -l {}", user));
            }
            if let Some(port) = self.settings.ssh_port {
                rsh.push_str(&format!(" -p {}", port));
            }
            args.push(rsh);
        }

        if let Some(options) = &self.settings.options {
            args.extend(options.split_whitespace().map(str::to_string));
        }

        let local = format!("{}/", self.object_dir.display());
        let remote = format!("{}/", self.settings.remote.trim_end_matches('/'));
        match direction {
            Direction::Push => args.extend([local, remote]),
            Direction::Pull => args.extend([remote, local]),
        }
        args
    }
}

impl Transfer for RsyncTransfer {
    fn transfer(&self, direction: Direction, digests: &[Digest]) -> FatResult<()> {
        if digests.is_empty() {
            info!("Nothing to {}", direction);
            return Ok(());
        }
        if direction == Direction::Pull {
            std::fs::create_dir_all(&self.object_dir)?;
        }

        let args = self.command_args(direction);
        debug!("Executing: {} {}", self.program, args.join(" "));
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| FatError::TransferFailure {
                message: format!("failed to start {}: {}", self.program, e),
                exit_code: None,
            })?;

        let list = digests
            .iter()
            .map(Digest::as_str)
            .collect::<Vec<_>>()
            .join("\0");
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(list.as_bytes()) {
                Ok(()) => {}
                // The exit status below says why it stopped reading.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(FatError::TransferFailure {
                message: format!("{} {} exited with {}", self.program, direction, status),
                exit_code: status.code(),
            });
        }

        info!("{} of {} objects complete", direction, digests.len());
        Ok(())
    }
}
