// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Placeholders sitting in the working tree

use crate::backend::Backend;
use crate::digest::Digest;
use crate::error::FatResult;
use crate::pointer::PlaceholderCodec;
use crate::store::ObjectStore;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// A tracked file whose working copy is a placeholder record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderFile {
    /// Digest the record names
    pub digest: Digest,
    /// Path as git reports it
    pub path: String,
}

/// Outcome of [`WorkTree::checkout`]
#[derive(Debug, Default)]
pub struct CheckoutReport {
    /// Files re-smudged from the cache
    pub restored: Vec<PlaceholderFile>,
    /// Files whose content is not cached; only collected when asked for
    pub orphans: Vec<PlaceholderFile>,
}

/// The working tree as seen through a backend.
pub struct WorkTree<'a, B: Backend + ?Sized> {
    backend: &'a B,
    root: PathBuf,
    codec: PlaceholderCodec,
}

impl<'a, B: Backend + ?Sized> WorkTree<'a, B> {
    /// `root` is the directory tracked paths are relative to.
    pub fn new(backend: &'a B, root: impl Into<PathBuf>, codec: PlaceholderCodec) -> Self {
        Self {
            backend,
            root: root.into(),
            codec,
        }
    }

    /// Tracked files matching `patterns` whose content is a placeholder.
    ///
    /// Files are only opened when their size is a known placeholder length.
    pub fn placeholder_files(&self, patterns: &[String]) -> FatResult<Vec<PlaceholderFile>> {
        let mut found = Vec::new();
        for path in self.backend.list_tracked_paths(patterns)? {
            let full = self.root.join(&path);
            let metadata = match fs::symlink_metadata(&full) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() || !self.codec.is_candidate_len(metadata.len()) {
                continue;
            }
            if let Some(placeholder) = self.codec.try_decode(&fs::read(&full)?) {
                found.push(PlaceholderFile {
                    digest: placeholder.digest,
                    path,
                });
            }
        }
        debug!("{} placeholder files in the working tree", found.len());
        Ok(found)
    }

    /// Re-smudges every placeholder whose content is now cached.
    ///
    /// The file's mtime is first pushed back to the epoch. An mtime that
    /// matches the index entry lets git run the clean filter to compare
    /// content, and a placeholder cleans to the same blob, so
    /// `checkout-index` would skip the file.
    pub fn checkout(&self, store: &ObjectStore, show_orphans: bool) -> FatResult<CheckoutReport> {
        let mut report = CheckoutReport::default();
        for file in self.placeholder_files(&[])? {
            if store.contains(&file.digest) {
                touch(&self.root.join(&file.path))?;
                self.backend.checkout_index(&file.path)?;
                info!("Restored {}", file.path);
                report.restored.push(file);
            } else if show_orphans {
                report.orphans.push(file);
            }
        }
        Ok(report)
    }
}

/// Stamp a time no index entry written since 1970 can carry.
const STALE_MTIME: Duration = Duration::from_secs(1);

fn touch(path: &Path) -> io::Result<()> {
    File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::UNIX_EPOCH + STALE_MTIME)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::IndexEntry;
    use std::io::Write;
    use tempfile::TempDir;

    fn track(backend: &MemoryBackend, path: &str) {
        backend.index.lock().unwrap().push(IndexEntry {
            mode: IndexEntry::FILE_MODE.to_string(),
            id: "0".repeat(40),
            stage: 0,
            path: path.to_string(),
        });
    }

    #[test]
    fn test_placeholder_scan_and_checkout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("work");
        fs::create_dir_all(root.join("assets")).unwrap();
        let store = ObjectStore::new(temp_dir.path().join("objects"));
        store.ensure().unwrap();
        let codec = PlaceholderCodec::default();

        let present = Digest::of(b"present");
        let mut staged = store.stage().unwrap();
        staged.write_all(b"present").unwrap();
        store.publish(staged, &present).unwrap();

        let absent = Digest::of(b"absent");
        fs::write(root.join("assets/a.bin"), codec.encode(&present, 7)).unwrap();
        fs::write(root.join("assets/b.bin"), codec.encode(&absent, 6)).unwrap();
        fs::write(root.join("README"), b"ordinary text").unwrap();

        let backend = MemoryBackend::default();
        for path in ["assets/a.bin", "assets/b.bin", "README", "deleted.bin"] {
            track(&backend, path);
        }

        let tree = WorkTree::new(&backend, &root, codec);
        let found = tree.placeholder_files(&[]).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|f| f.digest == present && f.path == "assets/a.bin"));

        let report = tree.checkout(&store, true).unwrap();
        assert_eq!(report.restored.len(), 1);
        assert_eq!(report.orphans.len(), 1);
        assert_eq!(report.orphans[0].digest, absent);
        assert_eq!(*backend.checked_out.lock().unwrap(), vec!["assets/a.bin".to_string()]);

        let quiet = tree.checkout(&store, false).unwrap();
        assert!(quiet.orphans.is_empty());
    }

    #[test]
    fn test_checkout_stales_mtime_before_rewrite() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("work");
        fs::create_dir_all(&root).unwrap();
        let store = ObjectStore::new(temp_dir.path().join("objects"));
        store.ensure().unwrap();
        let codec = PlaceholderCodec::default();

        let digest = Digest::of(b"payload");
        let mut staged = store.stage().unwrap();
        staged.write_all(b"payload").unwrap();
        store.publish(staged, &digest).unwrap();

        let path = root.join("clip.bin");
        fs::write(&path, codec.encode(&digest, 7)).unwrap();
        let written = fs::metadata(&path).unwrap().modified().unwrap();

        let backend = MemoryBackend::default();
        track(&backend, "clip.bin");
        WorkTree::new(&backend, &root, codec).checkout(&store, false).unwrap();

        let stamped = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(stamped, SystemTime::UNIX_EPOCH + STALE_MTIME);
        assert!(stamped < written);
    }
}
