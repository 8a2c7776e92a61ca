// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Custom test assertions for git-fat tests.

use std::fs;
use std::path::Path;

/// Assert that the filter driver is configured in the repository.
pub fn assert_fat_initialized(repo_path: &Path) {
    let output = std::process::Command::new("git")
        .args(["config", "--get", "filter.fat.clean"])
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git config");
    assert!(
        output.status.success(),
        "filter.fat.clean should be configured in {:?}",
        repo_path
    );
}

/// Assert that `content` looks like a placeholder record.
pub fn assert_placeholder(content: &[u8]) {
    assert!(
        content.starts_with(b"#$# git-fat "),
        "expected a placeholder, got {:?}",
        String::from_utf8_lossy(content)
    );
    assert!(
        content.len() == 53 || content.len() == 74,
        "placeholder has unexpected length {}",
        content.len()
    );
}

/// Sorted names of the entries in an object directory (empty if missing).
pub fn object_names(object_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(object_dir) {
        Ok(entries) => entries
            .map(|e| e.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// Assert that an object directory holds exactly the named objects.
pub fn assert_objects(object_dir: &Path, expected: &[&str]) {
    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(object_names(object_dir), expected, "objects in {:?}", object_dir);
}

/// Digest named by a placeholder record.
pub fn placeholder_digest(content: &[u8]) -> String {
    assert_placeholder(content);
    String::from_utf8_lossy(&content[12..52]).into_owned()
}

/// Whether `rsync` can be run; transfer tests are skipped without it.
pub fn rsync_available() -> bool {
    std::process::Command::new("rsync")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
