// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Locating large blobs in history
//!
//! Used to build the FILELIST for a history rewrite: every path that ever held
//! a blob above a size threshold, with the largest such blob and how many
//! distinct large blobs it held.

use crate::backend::{Backend, RevScope};
use crate::error::FatResult;
use crate::filter::FILTER_DRIVER_NAME;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A path that held at least one large blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LargeFile {
    /// Path in the tree
    pub path: String,
    /// Largest blob seen at the path
    pub max_size: u64,
    /// Distinct large blobs seen at the path
    pub count: usize,
}

/// Paths in any reachable history that held a blob larger than `threshold`,
/// largest first.
pub fn find_large_files<B: Backend + ?Sized>(backend: &B, threshold: u64) -> FatResult<Vec<LargeFile>> {
    let mut large: HashMap<String, u64> = HashMap::new();
    backend.list_reachable_objects(&RevScope::All, &mut |info| {
        if info.is_blob() && info.size > threshold {
            large.insert(info.id, info.size);
        }
        Ok(())
    })?;
    debug!("{} blobs above {} bytes", large.len(), threshold);

    let mut by_path: HashMap<String, HashSet<String>> = HashMap::new();
    if !large.is_empty() {
        backend.diff_tree_all(&mut |entry| {
            if large.contains_key(&entry.new_blob) {
                by_path.entry(entry.path).or_default().insert(entry.new_blob);
            }
            Ok(())
        })?;
    }

    let mut files: Vec<LargeFile> = by_path
        .into_iter()
        .map(|(path, blobs)| LargeFile {
            max_size: blobs.iter().filter_map(|id| large.get(id)).copied().max().unwrap_or(0),
            count: blobs.len(),
            path,
        })
        .collect();
    files.sort_by(|a, b| b.max_size.cmp(&a.max_size).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

/// Renders `files` as attribute lines with a trailing size comment, paths
/// padded to a common width.
pub fn format_large_files(files: &[LargeFile]) -> Vec<String> {
    let width = files.iter().map(|f| f.path.len()).max().unwrap_or(0);
    files
        .iter()
        .map(|f| {
            format!(
                "{:<width$} filter={} -text # {:>10} {}",
                f.path,
                FILTER_DRIVER_NAME,
                f.max_size,
                f.count,
                width = width
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::pipeline::DiffTreeEntry;
    use crate::rewrite::parse_file_list;

    fn change(blob: &str, path: &str) -> DiffTreeEntry {
        DiffTreeEntry {
            new_mode: "100644".to_string(),
            new_blob: blob.to_string(),
            status: "M".to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_find_large_files() {
        let backend = MemoryBackend::default();
        let v1 = backend.add_blob(&[1u8; 300]);
        let v2 = backend.add_blob(&[2u8; 500]);
        let other = backend.add_blob(&[3u8; 200]);
        let small = backend.add_blob(b"tiny");
        let backend = MemoryBackend {
            history: vec![
                change(&v1, "media/video.bin"),
                change(&v2, "media/video.bin"),
                change(&v2, "copy.bin"),
                change(&other, "image.bin"),
                change(&small, "notes.txt"),
            ],
            ..backend
        };

        let files = find_large_files(&backend, 100).unwrap();
        assert_eq!(
            files,
            vec![
                LargeFile { path: "copy.bin".into(), max_size: 500, count: 1 },
                LargeFile { path: "media/video.bin".into(), max_size: 500, count: 2 },
                LargeFile { path: "image.bin".into(), max_size: 200, count: 1 },
            ]
        );
    }

    #[test]
    fn test_format_round_trips_through_file_list() {
        let files = vec![
            LargeFile { path: "media/video.bin".into(), max_size: 500, count: 2 },
            LargeFile { path: "a.bin".into(), max_size: 20, count: 1 },
        ];
        let lines = format_large_files(&files);
        assert_eq!(lines[0], "media/video.bin filter=fat -text #        500 2");
        assert_eq!(lines[1], "a.bin           filter=fat -text #         20 1");

        let paths = parse_file_list(&lines.join("\n"));
        assert!(paths.contains("media/video.bin") && paths.contains("a.bin"));
    }
}
