// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Config, RsyncConfig, GITFAT_FILE};
use crate::validation::Validator;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Builds a [`Config`]: defaults, then `.gitfat`, then environment overrides.
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load the configuration for a repository.
    ///
    /// `work_tree` is `None` for bare repositories and while running under
    /// `git filter-branch`; `.gitfat` is only consulted when it is known.
    pub fn load(&self, git_dir: &Path, work_tree: Option<&Path>) -> ConfigResult<Config> {
        let mut config = Config::for_git_dir(git_dir);

        if let Some(root) = work_tree {
            let path = root.join(GITFAT_FILE);
            if path.exists() {
                let listing = read_git_config_file(&path)?;
                self.apply_listing(&mut config, &listing)?;
                info!("Loaded settings from {}", path.display());
            } else {
                debug!("No {} at {}", GITFAT_FILE, root.display());
            }
        }

        self.apply_env_overrides(&mut config)?;

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply the output of `git config --null --list`.
    ///
    /// Each entry is `key<LF>value<NUL>`, or `key<NUL>` for a valueless key.
    pub fn apply_listing(&self, config: &mut Config, listing: &str) -> ConfigResult<()> {
        for entry in listing.split('\0').filter(|e| !e.is_empty()) {
            let (key, value) = entry.split_once('\n').unwrap_or((entry, ""));
            match key.to_lowercase().as_str() {
                "rsync.remote" => {
                    rsync_mut(config).remote = value.trim().to_string();
                }
                "rsync.sshport" => {
                    let port = value.trim().parse().map_err(|_| {
                        ConfigError::invalid_value("rsync.sshport", format!("expected a port number, got '{}'", value))
                    })?;
                    rsync_mut(config).ssh_port = Some(port);
                }
                "rsync.sshuser" => {
                    rsync_mut(config).ssh_user = non_empty(value);
                }
                "rsync.options" => {
                    rsync_mut(config).options = non_empty(value);
                }
                other => debug!("Ignoring unknown {} key: {}", GITFAT_FILE, other),
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides<F>(&self, config: &mut Config, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GIT_FAT_VERSION") {
            config.placeholder.version = value.trim().parse().map_err(|_| {
                ConfigError::env_var_parsing_error("GIT_FAT_VERSION", &value, "expected 1 or 2")
            })?;
        }
        if let Some(value) = lookup("GIT_FAT_BLOCK_SIZE") {
            config.placeholder.block_size = value.trim().parse().map_err(|_| {
                ConfigError::env_var_parsing_error("GIT_FAT_BLOCK_SIZE", &value, "expected a byte count")
            })?;
        }
        if let Some(value) = lookup("GIT_FAT_VERBOSE") {
            config.observability.verbose = !value.is_empty() && parse_bool("GIT_FAT_VERBOSE", &value)?;
        }
        if let Some(value) = lookup("GIT_FAT_LOG_LEVEL") {
            config.observability.log_level = non_empty(&value);
        }
        if let Some(value) = lookup("GIT_FAT_LOG_FORMAT") {
            config.observability.log_format = value.trim().to_lowercase();
        }
        if let Some(value) = lookup("GIT_FAT_RSYNC") {
            config.transfer_program = non_empty(&value);
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn rsync_mut(config: &mut Config) -> &mut RsyncConfig {
    config.rsync.get_or_insert_with(RsyncConfig::default)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Read a git-config syntax file through git itself.
fn read_git_config_file(path: &Path) -> ConfigResult<String> {
    let output = Command::new("git")
        .arg("config")
        .arg("--file")
        .arg(path)
        .args(["--null", "--list"])
        .output()
        .map_err(|e| ConfigError::UnreadableFile {
            path: path.to_path_buf(),
            reason: format!("failed to run git config: {}", e),
        })?;

    if !output.status.success() {
        return Err(ConfigError::UnreadableFile {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse boolean from string (accepts: true, false, yes, no, 1, 0, on, off)
fn parse_bool(variable: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            variable,
            value,
            "expected 'true', 'false', 'yes', 'no', '1', '0', 'on', or 'off'",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "YES").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_listing_populates_rsync() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        let listing = "rsync.remote\nstore.example.com:/srv/fat\0rsync.sshport\n2222\0rsync.sshuser\nfat\0rsync.options\n--bwlimit=1000 -v\0";

        loader.apply_listing(&mut config, listing).unwrap();

        let rsync = config.rsync.unwrap();
        assert_eq!(rsync.remote, "store.example.com:/srv/fat");
        assert_eq!(rsync.ssh_port, Some(2222));
        assert_eq!(rsync.ssh_user.as_deref(), Some("fat"));
        assert_eq!(rsync.options.as_deref(), Some("--bwlimit=1000 -v"));
    }

    #[test]
    fn test_listing_rejects_bad_port() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        let result = loader.apply_listing(&mut config, "rsync.remote\nhost:/x\0rsync.sshport\nssh\0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_listing_ignores_unknown_keys() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        loader.apply_listing(&mut config, "core.whatever\nx\0flag\0").unwrap();
        assert!(config.rsync.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        let lookup = overrides(&[
            ("GIT_FAT_VERSION", "1"),
            ("GIT_FAT_VERBOSE", "1"),
            ("GIT_FAT_BLOCK_SIZE", "65536"),
        ]);

        loader.apply_overrides(&mut config, lookup).unwrap();

        assert_eq!(config.placeholder.version, 1);
        assert_eq!(config.placeholder.block_size, 65536);
        assert!(config.observability.verbose);
        assert_eq!(config.observability.effective_level(), "debug");
    }

    #[test]
    fn test_transfer_program_override() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        assert!(config.transfer_program.is_none());

        loader
            .apply_overrides(&mut config, overrides(&[("GIT_FAT_RSYNC", " /opt/bin/rsync ")]))
            .unwrap();
        assert_eq!(config.transfer_program.as_deref(), Some("/opt/bin/rsync"));

        loader
            .apply_overrides(&mut config, overrides(&[("GIT_FAT_RSYNC", "")]))
            .unwrap();
        assert!(config.transfer_program.is_none());
    }

    #[test]
    fn test_env_override_parse_error_names_variable() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        let err = loader
            .apply_overrides(&mut config, overrides(&[("GIT_FAT_VERSION", "two")]))
            .unwrap_err();
        assert!(err.to_string().contains("GIT_FAT_VERSION"));
    }

    #[test]
    fn test_empty_verbose_is_off() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        loader
            .apply_overrides(&mut config, overrides(&[("GIT_FAT_VERBOSE", "")]))
            .unwrap();
        assert!(!config.observability.verbose);
    }

    #[test]
    fn test_load_without_gitfat_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let git_dir = temp_dir.path().join(".git");

        let config = ConfigLoader::without_validation()
            .load(&git_dir, Some(temp_dir.path()))
            .unwrap();

        assert_eq!(config.paths.object_dir, git_dir.join("fat").join("objects"));
        assert!(config.rsync.is_none());
    }
}
