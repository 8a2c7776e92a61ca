// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Test repository helper for integration tests.
//!
//! Provides a TestRepo struct that owns a temporary git repository and wraps
//! the plain `git` commands tests need to build history.

use crate::cli::GitFatCommand;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

#[cfg(unix)]
const FAKE_RSYNC: &str = r#"#!/bin/sh
for arg do src=$dst; dst=$arg; done
mkdir -p "$dst" || exit 11
tr '\0' '\n' | while IFS= read -r name || [ -n "$name" ]; do
    [ -e "$dst$name" ] || cp "$src$name" "$dst$name" || exit 23
done
"#;

/// A test repository with automatic cleanup.
///
/// # Example
/// ```ignore
/// use gitfat_test_utils::TestRepo;
///
/// let repo = TestRepo::initialized();
/// repo.write_file("file.txt", b"content");
/// repo.add(&["file.txt"]);
/// repo.commit("Add file");
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
    work_tree: PathBuf,
}

impl TestRepo {
    /// Create a new empty test directory (not initialized as a repo).
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let work_tree = temp_dir.path().join("repo");
        fs::create_dir_all(&work_tree).expect("Failed to create work tree");
        Self { temp_dir, work_tree }
    }

    /// Create a new test directory and `git init` it with a committer identity.
    pub fn initialized() -> Self {
        let repo = Self::new();
        repo.git(&["init", "-q"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    /// Create a git repository and run `git-fat init` in it.
    pub fn fat_initialized() -> Self {
        let repo = Self::initialized();
        GitFatCommand::init_quiet(repo.path());
        repo
    }

    /// Like [`TestRepo::fat_initialized`], with `*.bin` tracked by git-fat and
    /// a local directory remote configured in `.gitfat`.
    pub fn with_fat_remote() -> Self {
        let repo = Self::fat_initialized();
        fs::create_dir_all(repo.remote_dir()).expect("Failed to create remote directory");
        repo.write_text_file(
            ".gitfat",
            &format!("[rsync]\n\tremote = {}\n", repo.remote_dir().display()),
        );
        repo.write_text_file(".gitattributes", "*.bin filter=fat -text\n");
        repo.add(&[".gitfat", ".gitattributes"]);
        repo.commit("Configure git-fat");
        repo
    }

    /// Get the path to the work tree.
    pub fn path(&self) -> &Path {
        &self.work_tree
    }

    /// Directory used as the transfer remote, outside the work tree.
    pub fn remote_dir(&self) -> PathBuf {
        self.temp_dir.path().join("remote")
    }

    /// Write an executable stand-in for rsync and return its path.
    ///
    /// It copies the NUL-separated names on stdin from its second-to-last
    /// argument to its last, leaving existing files alone. Point
    /// `GIT_FAT_RSYNC` at it to drive push and pull without rsync installed.
    #[cfg(unix)]
    pub fn fake_rsync(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.temp_dir.path().join("fake-rsync");
        fs::write(&path, FAKE_RSYNC).expect("Failed to write fake rsync");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake rsync executable");
        path
    }

    /// Get the path to the git-fat object cache.
    pub fn object_dir(&self) -> PathBuf {
        self.work_tree.join(".git").join("fat").join("objects")
    }

    /// Run git in the work tree, assert success and return stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_tree)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Store `content` as a blob without running any filter; returns its id.
    pub fn hash_object(&self, content: &[u8]) -> String {
        let path = self.temp_dir.path().join("hash-object-input");
        fs::write(&path, content).expect("Failed to write blob input");
        let path = path.to_str().expect("Temp path is not UTF-8");
        self.git(&["hash-object", "-w", "--no-filters", path]).trim().to_string()
    }

    /// Content of a blob, tree entry or other object expression.
    pub fn show(&self, object: &str) -> Vec<u8> {
        let output = Command::new("git")
            .args(["cat-file", "-p", object])
            .current_dir(&self.work_tree)
            .output()
            .expect("Failed to run git cat-file");
        assert!(output.status.success(), "git cat-file -p {} failed", object);
        output.stdout
    }

    /// Write a file to the repository.
    pub fn write_file(&self, name: &str, content: &[u8]) {
        let path = self.work_tree.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    /// Write a text file to the repository.
    pub fn write_text_file(&self, name: &str, content: &str) {
        self.write_file(name, content.as_bytes());
    }

    /// Read a file from the repository.
    pub fn read_file(&self, name: &str) -> Vec<u8> {
        fs::read(self.work_tree.join(name)).expect("Failed to read file")
    }

    /// Delete a file from the repository.
    pub fn delete_file(&self, name: &str) {
        let path = self.work_tree.join(name);
        if path.exists() {
            fs::remove_file(&path).expect("Failed to delete file");
        }
    }

    /// Add files to the staging area.
    pub fn add(&self, paths: &[&str]) {
        let mut args = vec!["add", "--"];
        args.extend_from_slice(paths);
        self.git(&args);
    }

    /// Create a commit with the given message.
    pub fn commit(&self, message: &str) {
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Add a file and commit it in one operation.
    pub fn add_and_commit(&self, name: &str, content: &[u8], message: &str) {
        self.write_file(name, content);
        self.add(&[name]);
        self.commit(message);
    }

    /// Get the path to a file in the repository.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.work_tree.join(name)
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
