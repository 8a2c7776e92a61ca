// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Tests for `git-fat init` and the initialization guard.

use gitfat_test_utils::{assert_fat_initialized, gitfat, TestRepo};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_init_installs_filter() {
    let repo = TestRepo::initialized();

    gitfat()
        .arg("init")
        .current_dir(repo.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("installed"));

    assert_fat_initialized(repo.path());
    let clean = repo.git(&["config", "--get", "filter.fat.clean"]);
    assert!(clean.trim_end().ends_with("filter-clean %f"), "got {:?}", clean);
    let smudge = repo.git(&["config", "--get", "filter.fat.smudge"]);
    assert!(smudge.trim_end().ends_with("filter-smudge %f"), "got {:?}", smudge);
    assert!(repo.object_dir().is_dir());
}

#[test]
fn test_init_twice_keeps_existing_configuration() {
    let repo = TestRepo::initialized();
    repo.git(&["config", "filter.fat.clean", "custom-clean"]);

    gitfat()
        .arg("init")
        .current_dir(repo.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("already configured"));

    assert_eq!(repo.git(&["config", "--get", "filter.fat.clean"]).trim(), "custom-clean");
}

#[test]
fn test_quiet_init_prints_nothing() {
    let repo = TestRepo::initialized();
    gitfat()
        .args(["-q", "init"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_commands_require_init() {
    let repo = TestRepo::initialized();

    for command in ["status", "checkout", "gc", "verify"] {
        gitfat()
            .arg(command)
            .current_dir(repo.path())
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("not initialized"));
    }
}

#[test]
fn test_filters_run_without_init() {
    let repo = TestRepo::initialized();
    gitfat()
        .arg("filter-smudge")
        .current_dir(repo.path())
        .write_stdin("ordinary text\n")
        .assert()
        .success()
        .stdout("ordinary text\n");
}

#[test]
fn test_outside_repository_fails() {
    let temp_dir = TempDir::new().unwrap();
    gitfat()
        .arg("status")
        .current_dir(temp_dir.path())
        .env("GIT_CEILING_DIRECTORIES", temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a git repository"));
}

#[test]
fn test_directory_flag() {
    let repo = TestRepo::initialized();
    let elsewhere = TempDir::new().unwrap();

    gitfat()
        .arg("-C")
        .arg(repo.path())
        .args(["-q", "init"])
        .current_dir(elsewhere.path())
        .assert()
        .success();

    assert_fat_initialized(repo.path());
}

#[test]
fn test_completions() {
    gitfat()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("git-fat"));
}
