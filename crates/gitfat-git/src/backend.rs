// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! The version-control backend seen as a service
//!
//! Everything git-fat needs from git goes through [`Backend`]. The production
//! implementation is [`crate::git::GitBackend`], which drives `git`
//! subprocesses; tests substitute an in-memory repository.

use crate::error::FatResult;
use crate::pipeline::DiffTreeEntry;
use serde::Serialize;
use std::fmt;
use std::io::{Read, Write};

/// Which part of history a reachability query covers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RevScope {
    /// Everything reachable from `HEAD`
    Head,
    /// Everything reachable from any ref
    All,
    /// Everything reachable from one revision
    Revision(String),
}

impl RevScope {
    /// Revision to resolve before querying, or `None` for [`RevScope::All`]
    pub fn revision(&self) -> Option<&str> {
        match self {
            RevScope::Head => Some("HEAD"),
            RevScope::All => None,
            RevScope::Revision(rev) => Some(rev),
        }
    }

    /// `rev-list` arguments selecting the scope
    pub fn rev_list_args(&self) -> Vec<String> {
        match self {
            RevScope::All => vec!["--all".to_string()],
            other => other.revision().map(str::to_string).into_iter().collect(),
        }
    }
}

impl fmt::Display for RevScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevScope::Head => f.write_str("HEAD"),
            RevScope::All => f.write_str("--all"),
            RevScope::Revision(rev) => f.write_str(rev),
        }
    }
}

/// An object listed by `cat-file --batch-check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Object id
    pub id: String,
    /// `blob`, `tree`, `commit` or `tag`
    pub kind: String,
    /// Size in bytes
    pub size: u64,
}

impl ObjectInfo {
    /// Parses `<id> <type> <size>`; `None` for `missing` lines and noise.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let id = fields.next()?;
        let kind = fields.next()?;
        let size = fields.next()?.parse().ok()?;
        Some(Self {
            id: id.to_string(),
            kind: kind.to_string(),
            size,
        })
    }

    /// Whether the object is a blob
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// One staged index entry, as `ls-files -s` prints and `update-index
/// --index-info` reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Octal mode, e.g. `100644`
    pub mode: String,
    /// Blob id
    pub id: String,
    /// Merge stage, 0 outside conflicts
    pub stage: u8,
    /// Repository-relative path
    pub path: String,
}

impl IndexEntry {
    /// Mode git uses for symbolic links
    pub const SYMLINK_MODE: &'static str = "120000";

    /// Mode for a regular, non-executable file
    pub const FILE_MODE: &'static str = "100644";

    /// Parses `<mode> <id> <stage>\t<path>`.
    pub fn parse(record: &str) -> Option<Self> {
        let (meta, path) = record.split_once('\t')?;
        let mut fields = meta.split(' ');
        let mode = fields.next()?.to_string();
        let id = fields.next()?.to_string();
        let stage = fields.next()?.parse().ok()?;
        Some(Self {
            mode,
            id,
            stage,
            path: path.to_string(),
        })
    }

    /// Renders the record without a terminator
    pub fn to_record(&self) -> String {
        format!("{} {} {}\t{}", self.mode, self.id, self.stage, self.path)
    }

    /// Whether the entry is a symbolic link
    pub fn is_symlink(&self) -> bool {
        self.mode == Self::SYMLINK_MODE
    }
}

/// Transformation applied to a blob's content on its way back into the
/// object database. Returns bytes written.
pub type BlobTransform = Box<dyn FnOnce(&mut dyn Read, &mut dyn Write) -> FatResult<u64> + Send>;

/// Operations git-fat needs from the version-control system.
pub trait Backend {
    /// Resolves a revision name; `None` when it names nothing (e.g. `HEAD`
    /// in a repository without commits).
    fn resolve_revision(&self, name: &str) -> FatResult<Option<String>>;

    /// Calls `visit` for every object reachable from `scope`.
    fn list_reachable_objects(
        &self,
        scope: &RevScope,
        visit: &mut dyn FnMut(ObjectInfo) -> FatResult<()>,
    ) -> FatResult<()>;

    /// Calls `visit` with the content of every reachable blob whose size is
    /// one of `sizes`.
    fn read_reachable_blobs(
        &self,
        scope: &RevScope,
        sizes: &[u64],
        visit: &mut dyn FnMut(&ObjectInfo, &[u8]) -> FatResult<()>,
    ) -> FatResult<()>;

    /// Content of one blob
    fn read_blob(&self, id: &str) -> FatResult<Vec<u8>>;

    /// Stores a blob and returns its id
    fn write_blob(&self, data: &[u8]) -> FatResult<String>;

    /// Streams blob `id` through `transform` into a new blob; returns its id.
    fn transform_blob(&self, id: &str, transform: BlobTransform) -> FatResult<String>;

    /// Tracked paths matching `patterns` (all when empty)
    fn list_tracked_paths(&self, patterns: &[String]) -> FatResult<Vec<String>>;

    /// Every entry of the current index
    fn list_index(&self) -> FatResult<Vec<IndexEntry>>;

    /// Adds or replaces index entries
    fn update_index(&self, entries: &[IndexEntry]) -> FatResult<()>;

    /// Calls `visit` for every added or modified file in the history of every ref
    fn diff_tree_all(&self, visit: &mut dyn FnMut(DiffTreeEntry) -> FatResult<()>) -> FatResult<()>;

    /// Rewrites one working-tree file from the index, running the smudge filter
    fn checkout_index(&self, path: &str) -> FatResult<()>;
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rev_scope_args() {
        assert_eq!(RevScope::Head.rev_list_args(), vec!["HEAD"]);
        assert_eq!(RevScope::All.rev_list_args(), vec!["--all"]);
        assert_eq!(RevScope::Revision("v1.0".into()).rev_list_args(), vec!["v1.0"]);
        assert_eq!(RevScope::All.revision(), None);
    }

    #[test]
    fn test_object_info_parse() {
        let info = ObjectInfo::parse("abc123 blob 74").unwrap();
        assert_eq!(info.size, 74);
        assert!(info.is_blob());
        assert!(ObjectInfo::parse("abc123 missing").is_none());
    }

    #[test]
    fn test_index_entry_record() {
        let record = "120000 0123456789abcdef0123456789abcdef01234567 0\tlinks/with space";
        let entry = IndexEntry::parse(record).unwrap();
        assert!(entry.is_symlink());
        assert_eq!(entry.path, "links/with space");
        assert_eq!(entry.to_record(), record);
        assert!(IndexEntry::parse("no tab here").is_none());
    }
}
