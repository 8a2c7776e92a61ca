// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Tests for the clean/smudge filters, standalone and driven by git.

use gitfat_test_utils::{assert_objects, assert_placeholder, gitfat, placeholder_digest, TestRepo};
use predicates::prelude::*;

fn payload() -> Vec<u8> {
    (0..50_000u32).map(|i| (i % 253) as u8).collect()
}

fn clean(repo: &TestRepo, input: &[u8]) -> Vec<u8> {
    gitfat()
        .arg("filter-clean")
        .current_dir(repo.path())
        .write_stdin(input.to_vec())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone()
}

fn smudge(repo: &TestRepo, input: &[u8]) -> Vec<u8> {
    gitfat()
        .arg("filter-smudge")
        .current_dir(repo.path())
        .write_stdin(input.to_vec())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone()
}

#[test]
fn test_clean_then_smudge_on_stdin() {
    let repo = TestRepo::fat_initialized();

    let record = clean(&repo, b"hello");
    assert_eq!(record.len(), 74);
    assert_placeholder(&record);

    let digest = placeholder_digest(&record);
    assert_eq!(digest, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    assert_objects(&repo.object_dir(), &[&digest]);
    assert_eq!(repo.read_file(&format!(".git/fat/objects/{}", digest)), b"hello");

    assert_eq!(smudge(&repo, &record), b"hello");
}

#[test]
fn test_version_one_records() {
    let repo = TestRepo::fat_initialized();

    let record = gitfat()
        .arg("filter-clean")
        .env("GIT_FAT_VERSION", "1")
        .current_dir(repo.path())
        .write_stdin("hello")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(record.len(), 53);

    // Records of either version decode regardless of the configured one.
    assert_eq!(smudge(&repo, &record), b"hello");
}

#[test]
fn test_cleaning_a_placeholder_is_identity() {
    let repo = TestRepo::fat_initialized();
    let record = clean(&repo, &payload());
    assert_eq!(clean(&repo, &record), record);
}

#[test]
fn test_smudge_of_uncached_object_keeps_placeholder() {
    let repo = TestRepo::fat_initialized();
    let record = clean(&repo, b"soon gone");
    let digest = placeholder_digest(&record);
    std::fs::remove_file(repo.object_dir().join(&digest)).unwrap();

    gitfat()
        .arg("filter-smudge")
        .current_dir(repo.path())
        .write_stdin(record.clone())
        .assert()
        .success()
        .stdout(predicate::eq(record))
        .stderr(predicate::str::contains(digest));
}

#[test]
fn test_invalid_version_is_rejected() {
    let repo = TestRepo::fat_initialized();
    gitfat()
        .arg("filter-clean")
        .env("GIT_FAT_VERSION", "two")
        .current_dir(repo.path())
        .write_stdin("data")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GIT_FAT_VERSION"));
}

#[test]
fn test_git_add_stores_placeholder() {
    let repo = TestRepo::with_fat_remote();
    let data = payload();
    repo.add_and_commit("video.bin", &data, "Add video");

    let committed = repo.show("HEAD:video.bin");
    let digest = placeholder_digest(&committed);
    assert_objects(&repo.object_dir(), &[&digest]);
    assert_eq!(repo.read_file("video.bin"), data);

    // Files not matching the attribute are stored by git as usual.
    repo.add_and_commit("notes.txt", b"plain\n", "Add notes");
    assert_eq!(repo.show("HEAD:notes.txt"), b"plain\n");
}

#[test]
fn test_checkout_restores_once_data_is_back() {
    let repo = TestRepo::with_fat_remote();
    let data = payload();
    repo.add_and_commit("video.bin", &data, "Add video");
    let digest = placeholder_digest(&repo.show("HEAD:video.bin"));

    std::fs::remove_file(repo.object_dir().join(&digest)).unwrap();
    repo.delete_file("video.bin");
    repo.git(&["checkout", "--", "video.bin"]);
    assert_placeholder(&repo.read_file("video.bin"));

    gitfat()
        .arg("checkout")
        .current_dir(repo.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Data unavailable").and(predicate::str::contains(digest.as_str())));

    clean(&repo, &data);
    gitfat()
        .arg("checkout")
        .current_dir(repo.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Restored"));

    assert_eq!(repo.read_file("video.bin"), data);
    assert!(repo.git(&["status", "--porcelain"]).is_empty());
}
