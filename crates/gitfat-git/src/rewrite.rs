// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! History rewrite support
//!
//! Backs `git filter-branch --index-filter 'git fat index-filter FILELIST'`.
//! Each listed blob in the index is replaced by its cleaned placeholder. The
//! mapping from original blob id to replacement id is memoized on disk, so a
//! blob that appears in a thousand commits is cleaned once.
//!
//! # Memo layout
//!
//! ```text
//! <git-dir>/fat/index-filter/
//!   <original blob id>      contains "<replacement blob id>\n"
//! ```

use crate::backend::{Backend, IndexEntry};
use crate::error::{FatError, FatResult};
use crate::filter::{CleanOutcome, FilterDriver, FILTER_DRIVER_NAME};
use gitfat_config::Config;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Path of the attributes file in the index
pub const GITATTRIBUTES: &str = ".gitattributes";

/// On-disk memo of blob replacements.
#[derive(Debug, Clone)]
pub struct RewriteCache {
    memo_dir: PathBuf,
}

impl RewriteCache {
    /// Memo stored in `memo_dir`, created on first write
    pub fn new(memo_dir: impl Into<PathBuf>) -> Self {
        Self {
            memo_dir: memo_dir.into(),
        }
    }

    /// Memo at the configured location
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.paths.memo_dir)
    }

    /// Directory holding memo entries
    pub fn memo_dir(&self) -> &Path {
        &self.memo_dir
    }

    fn entry_path(&self, blob: &str) -> FatResult<PathBuf> {
        if blob.is_empty() || !blob.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FatError::InvalidRepositoryState(format!(
                "not a blob id: {:?}",
                blob
            )));
        }
        Ok(self.memo_dir.join(blob))
    }

    /// Recorded replacement for `blob`, if any
    pub fn lookup(&self, blob: &str) -> FatResult<Option<String>> {
        match fs::read_to_string(self.entry_path(blob)?) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Records `replacement` for `blob`.
    pub fn record(&self, blob: &str, replacement: &str) -> FatResult<()> {
        let path = self.entry_path(blob)?;
        fs::create_dir_all(&self.memo_dir)?;
        let mut staged = tempfile::Builder::new()
            .prefix(".memo-")
            .tempfile_in(&self.memo_dir)?;
        writeln!(staged, "{}", replacement)?;
        staged.persist(&path).map_err(|e| FatError::Io(e.error))?;
        Ok(())
    }

    /// Replacement for `blob`, running `clean` only when none is recorded.
    pub fn replacement<F>(&self, blob: &str, clean: F) -> FatResult<String>
    where
        F: FnOnce() -> FatResult<String>,
    {
        if let Some(cached) = self.lookup(blob)? {
            debug!("Memo hit for {}", blob);
            return Ok(cached);
        }
        let replacement = clean()?;
        self.record(blob, &replacement)?;
        Ok(replacement)
    }
}

/// Outcome of one [`IndexFilter::run`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexFilterReport {
    /// Index entries whose blob changed
    pub rewritten: usize,
    /// Listed paths skipped because they are symbolic links
    pub skipped_symlinks: usize,
    /// Whether `.gitattributes` was rewritten
    pub attributes_updated: bool,
}

/// Rewrites the current index for one commit of a history rewrite.
pub struct IndexFilter<'a, B: Backend + ?Sized> {
    backend: &'a B,
    driver: &'a FilterDriver,
    cache: &'a RewriteCache,
    manage_gitattributes: bool,
}

impl<'a, B: Backend + ?Sized> IndexFilter<'a, B> {
    /// Creates an index filter
    pub fn new(backend: &'a B, driver: &'a FilterDriver, cache: &'a RewriteCache) -> Self {
        Self {
            backend,
            driver,
            cache,
            manage_gitattributes: false,
        }
    }

    /// Also mark every rewritten path in `.gitattributes`
    pub fn with_manage_gitattributes(mut self, enabled: bool) -> Self {
        self.manage_gitattributes = enabled;
        self
    }

    /// Replaces every index entry whose path is in `filelist`.
    pub fn run(&self, filelist: &HashSet<String>) -> FatResult<IndexFilterReport> {
        let entries = self.backend.list_index()?;
        let mut report = IndexFilterReport::default();
        let mut updates = Vec::new();
        let mut managed = Vec::new();

        for entry in &entries {
            if !filelist.contains(&entry.path) {
                continue;
            }
            if entry.is_symlink() {
                debug!("Not rewriting symbolic link {}", entry.path);
                report.skipped_symlinks += 1;
                continue;
            }

            let replacement = self
                .cache
                .replacement(&entry.id, || self.clean_blob(&entry.id))?;
            if replacement != entry.id {
                updates.push(IndexEntry {
                    id: replacement,
                    ..entry.clone()
                });
                report.rewritten += 1;
            }
            managed.push(entry.path.clone());
        }

        if self.manage_gitattributes && !managed.is_empty() {
            let current = entries
                .iter()
                .find(|e| e.path == GITATTRIBUTES && e.stage == 0);
            let existing = match current {
                Some(e) => String::from_utf8_lossy(&self.backend.read_blob(&e.id)?).into_owned(),
                None => String::new(),
            };
            let merged = merge_attributes(&existing, &managed);
            if merged != existing {
                let id = self.backend.write_blob(merged.as_bytes())?;
                updates.push(IndexEntry {
                    mode: current
                        .map(|e| e.mode.clone())
                        .unwrap_or_else(|| IndexEntry::FILE_MODE.to_string()),
                    id,
                    stage: 0,
                    path: GITATTRIBUTES.to_string(),
                });
                report.attributes_updated = true;
            }
        }

        self.backend.update_index(&updates)?;
        info!(
            "Index filter rewrote {} entries ({} symlinks skipped)",
            report.rewritten, report.skipped_symlinks
        );
        Ok(report)
    }

    fn clean_blob(&self, id: &str) -> FatResult<String> {
        let driver = self.driver.clone();
        self.backend.transform_blob(
            id,
            Box::new(move |input: &mut dyn Read, output: &mut dyn Write| {
                Ok(match driver.clean(input, output)? {
                    CleanOutcome::Stored { size, .. } => size,
                    CleanOutcome::Hanging { .. } => 0,
                })
            }),
        )
    }
}

/// Reads a FILELIST: one path per line, either bare or in `git fat find`
/// output form, where the path is everything before ` filter=`.
pub fn parse_file_list(text: &str) -> HashSet<String> {
    text.lines()
        .map(|line| line.split_once(" filter=").map_or(line, |(path, _)| path).trim())
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keeps `existing` as is and appends a `PATH filter=fat -text` line for every
/// path that does not already have exactly that line.
pub fn merge_attributes(existing: &str, paths: &[String]) -> String {
    let mut present: HashSet<String> = existing.lines().map(|l| l.trim().to_string()).collect();
    let mut merged = existing.to_string();
    for path in paths {
        let line = format!("{} filter={} -text", path, FILTER_DRIVER_NAME);
        if present.contains(&line) {
            continue;
        }
        if !merged.is_empty() && !merged.ends_with('\n') {
            merged.push('\n');
        }
        merged.push_str(&line);
        merged.push('\n');
        present.insert(line);
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::digest::Digest;
    use crate::pointer::PlaceholderCodec;
    use crate::store::ObjectStore;
    use std::cell::Cell;
    use tempfile::TempDir;

    const BLOB: &str = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";

    #[test]
    fn test_memo_survives_failing_clean() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RewriteCache::new(temp_dir.path().join("fat").join("index-filter"));
        let calls = Cell::new(0);

        let first = cache
            .replacement(BLOB, || {
                calls.set(calls.get() + 1);
                Ok("f00d".repeat(10))
            })
            .unwrap();
        let second = cache
            .replacement(BLOB, || {
                calls.set(calls.get() + 1);
                Err(FatError::InvalidRepositoryState("clean must not run".into()))
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(
            fs::read_to_string(cache.memo_dir().join(BLOB)).unwrap(),
            format!("{}\n", "f00d".repeat(10))
        );
    }

    #[test]
    fn test_memo_rejects_path_like_ids() {
        let cache = RewriteCache::new("/nonexistent");
        assert!(cache.lookup("../../etc/passwd").is_err());
    }

    #[test]
    fn test_parse_file_list_accepts_find_output() {
        let list = "big.bin filter=fat -text #     100000 2\nimages/a b.png\n\n  \nplain.iso\n";
        let paths = parse_file_list(list);
        assert_eq!(paths.len(), 3);
        assert!(paths.contains("big.bin"));
        assert!(paths.contains("images/a b.png"));
        assert!(paths.contains("plain.iso"));
    }

    #[test]
    fn test_merge_attributes_appends_missing_only() {
        let existing = "*.txt text\nbig.bin filter=fat -text";
        let merged = merge_attributes(
            existing,
            &["big.bin".to_string(), "new.iso".to_string(), "new.iso".to_string()],
        );
        assert_eq!(merged, "*.txt text\nbig.bin filter=fat -text\nnew.iso filter=fat -text\n");
        assert_eq!(merge_attributes(&merged, &["new.iso".to_string()]), merged);
    }

    fn setup() -> (TempDir, FilterDriver, RewriteCache) {
        let temp_dir = TempDir::new().unwrap();
        let driver = FilterDriver::new(
            PlaceholderCodec::default(),
            ObjectStore::new(temp_dir.path().join("objects")),
            4096,
        );
        let cache = RewriteCache::new(temp_dir.path().join("memo"));
        (temp_dir, driver, cache)
    }

    fn entry(mode: &str, id: &str, path: &str) -> IndexEntry {
        IndexEntry {
            mode: mode.to_string(),
            id: id.to_string(),
            stage: 0,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_index_filter_rewrites_listed_blobs() {
        let (_dir, driver, cache) = setup();
        let backend = MemoryBackend::default();
        let big = backend.add_blob(b"large payload");
        let small = backend.add_blob(b"keep me");
        let link = backend.add_blob(b"big.bin");
        let attrs = backend.add_blob(b"*.c diff=cpp\n");
        *backend.index.lock().unwrap() = vec![
            entry("100644", &attrs, GITATTRIBUTES),
            entry("100644", &big, "big.bin"),
            entry("120000", &link, "alias.bin"),
            entry("100755", &small, "tool.sh"),
        ];

        let filelist: HashSet<String> = ["big.bin", "alias.bin"].iter().map(|s| s.to_string()).collect();
        let report = IndexFilter::new(&backend, &driver, &cache)
            .with_manage_gitattributes(true)
            .run(&filelist)
            .unwrap();

        assert_eq!(
            report,
            IndexFilterReport {
                rewritten: 1,
                skipped_symlinks: 1,
                attributes_updated: true
            }
        );

        let index = backend.list_index().unwrap();
        let find = |path: &str| index.iter().find(|e| e.path == path).unwrap().clone();

        let placeholder = backend.read_blob(&find("big.bin").id).unwrap();
        let decoded = driver.codec().decode(&placeholder).unwrap();
        assert_eq!(decoded.digest, Digest::of(b"large payload"));
        assert!(driver.store().contains(&decoded.digest));

        assert_eq!(find("alias.bin").id, link);
        assert_eq!(find("tool.sh").id, small);

        let attributes = backend.read_blob(&find(GITATTRIBUTES).id).unwrap();
        assert_eq!(attributes, b"*.c diff=cpp\nbig.bin filter=fat -text\n");
        assert_eq!(cache.lookup(&big).unwrap(), Some(find("big.bin").id));
    }

    #[test]
    fn test_index_filter_rerun_uses_memo() {
        let (_dir, driver, cache) = setup();
        let backend = MemoryBackend::default();
        let big = backend.add_blob(b"payload");
        *backend.index.lock().unwrap() = vec![entry("100644", &big, "big.bin")];
        let filelist = parse_file_list("big.bin\n");

        IndexFilter::new(&backend, &driver, &cache).run(&filelist).unwrap();
        let rewritten = backend.list_index().unwrap()[0].id.clone();

        // Simulate the next commit, which still carries the original blob.
        *backend.index.lock().unwrap() = vec![entry("100644", &big, "big.bin")];
        fs::remove_dir_all(driver.store().root()).unwrap();
        IndexFilter::new(&backend, &driver, &cache).run(&filelist).unwrap();

        assert_eq!(backend.list_index().unwrap()[0].id, rewritten);
        // Clean did not run again, so the cache was not recreated.
        assert!(!driver.store().root().exists());
    }
}
