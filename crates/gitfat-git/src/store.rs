// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Local content-addressed object cache
//!
//! One flat directory, one file per [`Digest`], holding the exact original
//! bytes. Entries are never rewritten: writers stage into a private temp file
//! inside the same directory and publish it with a no-clobber rename, so
//! concurrent cleans of identical content need no lock. The flat layout is
//! what the bulk-transfer tool copies file-for-file to and from the remote.
//!
//! # Examples
//!
//! ```rust,no_run
//! use gitfat_git::{Digest, ObjectStore};
//! use std::io::Write;
//!
//! let store = ObjectStore::new(".git/fat/objects");
//! store.ensure()?;
//!
//! let mut staged = store.stage()?;
//! staged.write_all(b"hello")?;
//! store.publish(staged, &Digest::of(b"hello"))?;
//!
//! assert!(store.contains(&Digest::of(b"hello")));
//! # Ok::<(), gitfat_git::FatError>(())
//! ```

use crate::digest::{Digest, DigestWriter};
use crate::error::{FatError, FatResult};
use gitfat_config::Config;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Name prefix of staging files; never a valid digest.
const STAGING_PREFIX: &str = ".staging-";

/// Flat directory of immutable, content-named objects.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

/// A partially written object, deleted on drop unless published.
#[derive(Debug)]
pub struct StagedObject {
    file: NamedTempFile,
}

impl Write for StagedObject {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Result of publishing a staged object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The staged file became the entry
    Stored,
    /// An entry with that name already existed; the staged copy was discarded
    AlreadyPresent,
}

/// An entry whose content no longer hashes to its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Corruption {
    /// Digest the entry is filed under
    pub expected: Digest,
    /// Digest its bytes actually have
    pub actual: Digest,
}

/// Outcome of a garbage collection run
#[derive(Debug, Default)]
pub struct GcReport {
    /// Entries removed (or, in a dry run, that would be), with their sizes
    pub removed: Vec<(Digest, u64)>,
    /// Entries that could not be removed
    pub failed: Vec<(Digest, FatError)>,
}

impl GcReport {
    /// Total size of the removed entries
    pub fn bytes_freed(&self) -> u64 {
        self.removed.iter().map(|(_, size)| size).sum()
    }
}

impl ObjectStore {
    /// Store rooted at `root`; nothing is created until [`ObjectStore::ensure`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store at the configured object directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.paths.object_dir)
    }

    /// Directory holding the entries
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory (and parents) if it is missing.
    pub fn ensure(&self) -> FatResult<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Path an entry for `digest` lives at, whether or not it exists
    pub fn object_path(&self, digest: &Digest) -> PathBuf {
        self.root.join(digest.as_str())
    }

    /// Whether an entry for `digest` exists
    pub fn contains(&self, digest: &Digest) -> bool {
        self.object_path(digest).is_file()
    }

    /// Opens an entry for reading.
    pub fn open(&self, digest: &Digest) -> FatResult<File> {
        File::open(self.object_path(digest)).map_err(|e| missing_or_io(digest, e))
    }

    /// Size of an entry in bytes
    pub fn size(&self, digest: &Digest) -> FatResult<u64> {
        fs::metadata(self.object_path(digest))
            .map(|m| m.len())
            .map_err(|e| missing_or_io(digest, e))
    }

    /// Every digest with an entry on disk.
    ///
    /// Names that are not valid digests (staging files, stray files) are
    /// skipped. A store that was never created is empty.
    pub fn catalog(&self) -> FatResult<HashSet<Digest>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut catalog = HashSet::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            match name.to_str().map(Digest::parse) {
                Some(Ok(digest)) => {
                    catalog.insert(digest);
                }
                _ => debug!("Skipping non-object entry {:?}", name),
            }
        }
        Ok(catalog)
    }

    /// Opens a private staging file inside the store.
    pub fn stage(&self) -> FatResult<StagedObject> {
        let file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.root)?;
        Ok(StagedObject { file })
    }

    /// Publishes a staged file under `digest`.
    ///
    /// The entry is made read-only first. If an entry already exists the staged
    /// copy is dropped; content addressing means the existing bytes are the same.
    pub fn publish(&self, staged: StagedObject, digest: &Digest) -> FatResult<PublishOutcome> {
        let StagedObject { mut file } = staged;
        file.flush()?;
        set_read_only(file.as_file())?;

        let target = self.object_path(digest);
        match file.persist_noclobber(&target) {
            Ok(_) => {
                debug!("Stored object {}", digest);
                Ok(PublishOutcome::Stored)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Object {} already present", digest);
                drop(e.file);
                Ok(PublishOutcome::AlreadyPresent)
            }
            Err(e) => Err(e.error.into()),
        }
    }

    /// Deletes an entry. A missing entry counts as removed.
    ///
    /// On a permission failure the entry's read-only bit is cleared and the
    /// removal retried once.
    pub fn remove(&self, digest: &Digest) -> FatResult<()> {
        let path = self.object_path(digest);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!("Clearing read-only bit on {}", path.display());
                let retry = set_writable(&path).and_then(|()| fs::remove_file(&path));
                match retry {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                    Err(source) => Err(FatError::PermissionDenied { path, source }),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every digest in `garbage`, continuing past per-entry failures.
    ///
    /// With `dry_run` nothing is deleted; the report lists what would be.
    pub fn collect_garbage<I>(&self, garbage: I, dry_run: bool) -> GcReport
    where
        I: IntoIterator<Item = Digest>,
    {
        let mut report = GcReport::default();
        for digest in garbage {
            let size = match self.size(&digest) {
                Ok(size) => size,
                Err(FatError::ObjectMissing(_)) => continue,
                Err(e) => {
                    report.failed.push((digest, e));
                    continue;
                }
            };

            if dry_run {
                report.removed.push((digest, size));
                continue;
            }

            match self.remove(&digest) {
                Ok(()) => report.removed.push((digest, size)),
                Err(e) => {
                    warn!("Could not remove {}: {}", digest, e);
                    report.failed.push((digest, e));
                }
            }
        }

        info!(
            "Garbage collection: {} removed ({} bytes), {} failed",
            report.removed.len(),
            report.bytes_freed(),
            report.failed.len()
        );
        report
    }

    /// Rehashes every entry and returns those whose content does not match
    /// their name, in digest order.
    pub fn verify(&self) -> FatResult<Vec<Corruption>> {
        let catalog: Vec<Digest> = self.catalog()?.into_iter().collect();
        debug!("Verifying {} objects", catalog.len());

        let results: FatResult<Vec<Option<Corruption>>> = catalog
            .into_par_iter()
            .map(|expected| {
                let mut file = self.open(&expected)?;
                let mut hasher = DigestWriter::new();
                io::copy(&mut file, &mut hasher)?;
                let actual = hasher.finish();
                Ok((actual != expected).then_some(Corruption { expected, actual }))
            })
            .collect();

        let mut corrupted: Vec<Corruption> = results?.into_iter().flatten().collect();
        corrupted.sort_by(|a, b| a.expected.cmp(&b.expected));
        Ok(corrupted)
    }
}

fn missing_or_io(digest: &Digest, e: io::Error) -> FatError {
    if e.kind() == io::ErrorKind::NotFound {
        FatError::ObjectMissing(digest.to_string())
    } else {
        FatError::Io(e)
    }
}

#[cfg(unix)]
fn set_read_only(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o444))
}

#[cfg(not(unix))]
fn set_read_only(file: &File) -> io::Result<()> {
    let mut permissions = file.metadata()?.permissions();
    permissions.set_readonly(true);
    file.set_permissions(permissions)
}

#[cfg(unix)]
fn set_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn set_writable(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}
