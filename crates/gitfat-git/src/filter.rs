// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Git filter driver implementation
//!
//! This module implements the clean and smudge filters git runs through the
//! `filter.fat.*` configuration.
//!
//! ## Filter Operations
//!
//! - **Clean**: content → cache entry + placeholder record (`git add`)
//! - **Smudge**: placeholder record → cached content (`git checkout`)
//!
//! Both stream in fixed-size blocks and treat their channels as raw bytes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gitfat_git::FilterDriver;
//! use gitfat_config::Config;
//! use std::io;
//!
//! let driver = FilterDriver::from_config(&Config::for_git_dir(".git"))?;
//! driver.clean(io::stdin().lock(), &mut io::stdout().lock())?;
//! # Ok::<(), gitfat_git::FatError>(())
//! ```

use crate::digest::{Digest, DigestWriter};
use crate::error::FatResult;
use crate::pointer::PlaceholderCodec;
use crate::store::{ObjectStore, PublishOutcome};
use gitfat_config::Config;
use git2::Repository;
use std::io::{self, Read, Write};
use tracing::{debug, info, warn};

/// Filter driver name used in Git configuration and attributes
pub const FILTER_DRIVER_NAME: &str = "fat";

/// What a clean pass did with its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    /// Content was hashed into the cache and replaced by a placeholder
    Stored {
        /// Digest of the content
        digest: Digest,
        /// Content length
        size: u64,
        /// False if the cache already held this content
        newly_stored: bool,
    },
    /// Input already was a placeholder; it was passed through unchanged
    Hanging {
        /// Digest the placeholder names
        digest: Digest,
    },
}

/// What a smudge pass wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmudgeOutcome {
    /// Placeholder replaced by cached content
    Restored {
        /// Digest of the content
        digest: Digest,
        /// Bytes written
        size: u64,
    },
    /// Placeholder names content the cache lacks; record re-emitted
    Missing {
        /// Digest the placeholder names
        digest: Digest,
    },
    /// Input was not a placeholder; copied through
    Passthrough {
        /// Bytes written
        size: u64,
    },
}

/// Result of [`FilterDriver::install`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Filter configuration was written
    Installed,
    /// A `filter.fat.clean` entry already existed and was left alone
    AlreadyInstalled,
}

/// Clean/smudge filter pair bound to one cache.
#[derive(Debug, Clone)]
pub struct FilterDriver {
    codec: PlaceholderCodec,
    store: ObjectStore,
    block_size: usize,
}

impl FilterDriver {
    /// Creates a new filter driver
    pub fn new(codec: PlaceholderCodec, store: ObjectStore, block_size: usize) -> Self {
        Self {
            codec,
            store,
            // A placeholder must always arrive as one whole first block.
            block_size: block_size.max(codec.max_len() + 1),
        }
    }

    /// Driver for the configured cache, wire version and block size
    pub fn from_config(config: &Config) -> FatResult<Self> {
        Ok(Self::new(
            PlaceholderCodec::from_config(config)?,
            ObjectStore::from_config(config),
            config.placeholder.block_size,
        ))
    }

    /// Placeholder codec in use
    pub fn codec(&self) -> &PlaceholderCodec {
        &self.codec
    }

    /// Cache in use
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Installs the filter driver in a Git repository
    ///
    /// `command` is the program git should run, normally the absolute path of
    /// the running `git-fat` binary. An existing installation is left as is.
    pub fn install(repo: &Repository, command: &str) -> FatResult<InstallOutcome> {
        if Self::is_installed(repo)? {
            debug!("Filter driver already configured");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let mut config = repo.config()?.open_level(git2::ConfigLevel::Local)?;
        config.set_str(
            &format!("filter.{}.clean", FILTER_DRIVER_NAME),
            &format!("{} filter-clean %f", command),
        )?;
        config.set_str(
            &format!("filter.{}.smudge", FILTER_DRIVER_NAME),
            &format!("{} filter-smudge %f", command),
        )?;

        info!("Filter driver installed");
        Ok(InstallOutcome::Installed)
    }

    /// Whether `filter.fat.clean` is configured for the repository
    pub fn is_installed(repo: &Repository) -> FatResult<bool> {
        let config = repo.config()?;
        let installed = config
            .get_string(&format!("filter.{}.clean", FILTER_DRIVER_NAME))
            .is_ok();
        Ok(installed)
    }

    /// Executes the clean filter (content → placeholder)
    ///
    /// Every block is hashed and staged in the cache. If the first block is
    /// itself a well-formed placeholder the input is copied to `output`
    /// verbatim and nothing is published; otherwise the staged file is
    /// published under its digest and the current-version record is written.
    pub fn clean<R: Read, W: Write + ?Sized>(&self, mut input: R, output: &mut W) -> FatResult<CleanOutcome> {
        self.store.ensure()?;
        let mut staged = self.store.stage()?;
        let mut hasher = DigestWriter::new();
        let mut block = vec![0u8; self.block_size];
        let mut first = true;

        loop {
            let n = read_full(&mut input, &mut block)?;
            if n == 0 {
                break;
            }
            let chunk = &block[..n];

            if first {
                first = false;
                if let Some(placeholder) = self.codec.try_decode(chunk) {
                    debug!("Input is already a placeholder for {}", placeholder.digest);
                    output.write_all(chunk)?;
                    io::copy(&mut input, output)?;
                    output.flush()?;
                    return Ok(CleanOutcome::Hanging {
                        digest: placeholder.digest,
                    });
                }
            }

            hasher.update(chunk);
            staged.write_all(chunk)?;
        }

        let size = hasher.bytes();
        let digest = hasher.finish();
        let newly_stored = self.store.publish(staged, &digest)? == PublishOutcome::Stored;

        output.write_all(&self.codec.encode(&digest, size))?;
        output.flush()?;

        debug!("Cleaned {} bytes into {}", size, digest);
        Ok(CleanOutcome::Stored {
            digest,
            size,
            newly_stored,
        })
    }

    /// Executes the smudge filter (placeholder → content)
    ///
    /// Only the first `max_len` bytes are inspected. Input that does not
    /// decode is copied through unchanged, prefix included.
    pub fn smudge<R: Read, W: Write + ?Sized>(&self, mut input: R, output: &mut W) -> FatResult<SmudgeOutcome> {
        let mut prefix = vec![0u8; self.codec.max_len()];
        let n = read_full(&mut input, &mut prefix)?;
        prefix.truncate(n);

        let Some(placeholder) = self.codec.try_decode(&prefix) else {
            output.write_all(&prefix)?;
            let rest = io::copy(&mut input, output)?;
            output.flush()?;
            return Ok(SmudgeOutcome::Passthrough {
                size: n as u64 + rest,
            });
        };

        // Whatever trails the record is not ours to interpret; drain it so
        // the writing side never sees a closed pipe.
        io::copy(&mut input, &mut io::sink())?;

        let digest = placeholder.digest;
        if !self.store.contains(&digest) {
            warn!("git-fat: cache miss for {}", digest);
            output.write_all(&prefix)?;
            output.flush()?;
            return Ok(SmudgeOutcome::Missing { digest });
        }

        let mut object = self.store.open(&digest)?;
        let size = io::copy(&mut object, output)?;
        output.flush()?;

        debug!("Restored {} bytes from {}", size, digest);
        Ok(SmudgeOutcome::Restored { digest, size })
    }
}

/// Fills `buf` from `reader`, stopping early only at end of input.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pointer::PlaceholderVersion;
    use std::fs;
    use tempfile::TempDir;

    fn driver(block_size: usize) -> (TempDir, FilterDriver) {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path().join("objects"));
        let driver = FilterDriver::new(PlaceholderCodec::default(), store, block_size);
        (temp_dir, driver)
    }

    fn clean(driver: &FilterDriver, input: &[u8]) -> (Vec<u8>, CleanOutcome) {
        let mut out = Vec::new();
        let outcome = driver.clean(input, &mut out).unwrap();
        (out, outcome)
    }

    fn smudge(driver: &FilterDriver, input: &[u8]) -> (Vec<u8>, SmudgeOutcome) {
        let mut out = Vec::new();
        let outcome = driver.smudge(input, &mut out).unwrap();
        (out, outcome)
    }

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_clean_hello_scenario() {
        let (_dir, driver) = driver(4096);
        let digest = Digest::of(b"hello");

        let (record, outcome) = clean(&driver, b"hello");

        assert_eq!(
            record,
            format!("#$# git-fat {}                    5\n", digest).into_bytes()
        );
        assert_eq!(
            outcome,
            CleanOutcome::Stored {
                digest: digest.clone(),
                size: 5,
                newly_stored: true
            }
        );
        assert_eq!(fs::read(driver.store().object_path(&digest)).unwrap(), b"hello");

        let (restored, outcome) = smudge(&driver, &record);
        assert_eq!(restored, b"hello");
        assert_eq!(outcome, SmudgeOutcome::Restored { digest, size: 5 });
    }

    #[test]
    fn test_smudge_with_empty_cache_reemits_record() {
        let (_dir, driver) = driver(4096);
        let record = driver.codec().encode(&Digest::of(b"hello"), 5);

        let (out, outcome) = smudge(&driver, &record);

        assert_eq!(out, record);
        assert!(matches!(outcome, SmudgeOutcome::Missing { .. }));
    }

    #[test]
    fn test_clean_twice_is_idempotent() {
        let (_dir, driver) = driver(4096);
        let (first, _) = clean(&driver, b"twice");
        let (second, outcome) = clean(&driver, b"twice");

        assert_eq!(first, second);
        assert!(matches!(outcome, CleanOutcome::Stored { newly_stored: false, .. }));
        assert_eq!(driver.store().catalog().unwrap().len(), 1);
    }

    #[test]
    fn test_clean_placeholder_is_hanging() {
        let (_dir, driver) = driver(4096);
        let digest = Digest::of(b"not here");
        let record = driver.codec().encode(&digest, 8);

        let (out, outcome) = clean(&driver, &record);

        assert_eq!(out, record);
        assert_eq!(outcome, CleanOutcome::Hanging { digest });
        // Nothing published, and no staging file left behind.
        assert_eq!(fs::read_dir(driver.store().root()).unwrap().count(), 0);
    }

    #[test]
    fn test_clean_accepts_v1_placeholder_as_hanging() {
        let (_dir, driver) = driver(4096);
        let digest = Digest::of(b"old");
        let record = PlaceholderCodec::encode_as(PlaceholderVersion::V1, &digest, 3);
        let (out, outcome) = clean(&driver, &record);
        assert_eq!(out, record);
        assert!(matches!(outcome, CleanOutcome::Hanging { .. }));
    }

    #[test]
    fn test_clean_streams_multiple_blocks() {
        let (_dir, driver) = driver(128);
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let mut record = Vec::new();
        driver
            .clean(Trickle { data: &data, step: 7 }, &mut record)
            .unwrap();
        let (restored, _) = smudge(&driver, &record);

        assert_eq!(restored, data);
    }

    #[test]
    fn test_empty_input_round_trips() {
        let (_dir, driver) = driver(4096);
        let (record, _) = clean(&driver, b"");
        assert_eq!(record.len(), PlaceholderVersion::V2.encoded_len());
        let (restored, outcome) = smudge(&driver, &record);
        assert!(restored.is_empty());
        assert!(matches!(outcome, SmudgeOutcome::Restored { size: 0, .. }));
    }

    #[test]
    fn test_smudge_passthrough_keeps_prefix() {
        let (_dir, driver) = driver(4096);
        let data = vec![b'z'; 1000];
        let (out, outcome) = smudge(&driver, &data);
        assert_eq!(out, data);
        assert_eq!(outcome, SmudgeOutcome::Passthrough { size: 1000 });

        let (out, _) = smudge(&driver, b"short");
        assert_eq!(out, b"short");
    }

    #[test]
    fn test_smudge_v1_record_with_cache() {
        let (_dir, driver) = driver(4096);
        clean(&driver, b"legacy");
        let record = PlaceholderCodec::encode_as(PlaceholderVersion::V1, &Digest::of(b"legacy"), 6);
        let (out, _) = smudge(&driver, &record);
        assert_eq!(out, b"legacy");
    }

    #[test]
    fn test_read_full_across_short_reads() {
        let data = b"abcdefghij";
        let mut reader = Trickle { data, step: 3 };
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"abcdefgh");
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 2);
    }

    #[test]
    fn test_install_in_fresh_repo() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();

        assert!(!FilterDriver::is_installed(&repo).unwrap());
        let outcome = FilterDriver::install(&repo, "/usr/local/bin/git-fat").unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
        assert!(FilterDriver::is_installed(&repo).unwrap());

        let config = repo.config().unwrap();
        assert_eq!(
            config.get_string("filter.fat.smudge").unwrap(),
            "/usr/local/bin/git-fat filter-smudge %f"
        );
        assert_eq!(
            FilterDriver::install(&repo, "other").unwrap(),
            InstallOutcome::AlreadyInstalled
        );
    }
}
