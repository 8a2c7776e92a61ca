// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;

/// Validator for configuration settings
pub trait Validator {
    /// Check the settings, naming the first offending field
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.placeholder.validate()?;
        if let Some(rsync) = &self.rsync {
            rsync.validate()?;
        }
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for PlaceholderConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(1..=2).contains(&self.version) {
            return Err(ConfigError::invalid_value(
                "placeholder.version",
                format!("known versions are 1 and 2, got {}", self.version),
            ));
        }

        if self.block_size < MIN_BLOCK_SIZE {
            return Err(ConfigError::invalid_value(
                "placeholder.block_size",
                format!("must be at least {} bytes, got {}", MIN_BLOCK_SIZE, self.block_size),
            ));
        }

        Ok(())
    }
}

impl Validator for RsyncConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.remote.trim().is_empty() {
            return Err(ConfigError::MissingRequired("rsync.remote".to_string()));
        }

        if self.ssh_port == Some(0) {
            return Err(ConfigError::invalid_value("rsync.sshport", "port must be between 1 and 65535"));
        }

        if matches!(&self.ssh_user, Some(user) if user.contains(char::is_whitespace)) {
            return Err(ConfigError::invalid_value("rsync.sshuser", "must not contain whitespace"));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if matches!(&self.log_level, Some(level) if level.trim().is_empty()) {
            return Err(ConfigError::invalid_value("observability.log_level", "must not be empty"));
        }

        Ok(())
    }
}
