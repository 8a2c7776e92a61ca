// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Error types for git-fat operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for git-fat operations
pub type FatResult<T> = Result<T, FatError>;

/// Error types for git-fat operations
#[derive(Debug, Error)]
pub enum FatError {
    /// Bytes presented as a placeholder record do not parse as any known version
    #[error("Could not decode placeholder: {0}")]
    Decode(String),

    /// A string that should be a content digest is not one
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// A referenced object is absent from the local cache
    #[error("Object missing from cache: {0}")]
    ObjectMissing(String),

    /// An invocation of git failed to start or exited non-zero
    #[error("git {command} failed: {reason}")]
    BackendUnavailable {
        /// Subcommand and arguments, for the message
        command: String,
        /// Exit status or spawn error, plus stderr when available
        reason: String,
    },

    /// The bulk-transfer tool failed to start or exited non-zero
    #[error("Transfer failed: {message}")]
    TransferFailure {
        /// Human-readable cause
        message: String,
        /// Exit code of the transfer tool, when it ran
        exit_code: Option<i32>,
    },

    /// A cache entry could not be deleted even after clearing its read-only bit
    #[error("Permission denied removing {}: {source}", .path.display())]
    PermissionDenied {
        /// File that could not be removed
        path: PathBuf,
        /// Error from the second attempt
        source: std::io::Error,
    },

    /// Filter configuration is missing from the repository
    #[error("git-fat is not initialized: {0}")]
    NotInitialized(String),

    /// Output from git did not have the expected shape
    #[error("Invalid repository state: {0}")]
    InvalidRepositoryState(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] gitfat_config::ConfigError),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FatError {
    pub(crate) fn backend(command: impl Into<String>, reason: impl Into<String>) -> Self {
        FatError::BackendUnavailable {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// True when the error is a closed pipe, which pipeline code treats as
    /// the reader having finished early rather than as a failure.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, FatError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}
