// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or checking a [`Config`](crate::Config)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a settings source failed
    #[error("IO error reading configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration could not be rendered as JSON
    #[error("Failed to serialize configuration: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A cross-field check failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// `git config --file` could not read a settings file
    #[error("Failed to read {}: {reason}", .path.display())]
    UnreadableFile {
        /// The settings file
        path: PathBuf,
        /// What git reported
        reason: String,
    },

    /// A `GIT_FAT_*` variable held an unusable value
    #[error("Environment variable parsing error: {variable_name}={value}. {reason}")]
    EnvVarParsingError {
        /// Variable name
        variable_name: String,
        /// The rejected value
        value: String,
        /// What was expected instead
        reason: String,
    },

    /// A setting is out of range
    #[error("Invalid configuration value for field '{field}': {reason}")]
    InvalidValue {
        /// Dotted setting name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// A setting the operation needs is absent
    #[error("Missing required configuration field: {0}")]
    MissingRequired(String),
}

impl ConfigError {
    /// Create a [`ConfigError::ValidationError`]
    pub fn validation_error(message: impl Into<String>) -> Self {
        ConfigError::ValidationError(message.into())
    }

    /// Create a [`ConfigError::EnvVarParsingError`]
    pub fn env_var_parsing_error(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParsingError {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a [`ConfigError::InvalidValue`]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
