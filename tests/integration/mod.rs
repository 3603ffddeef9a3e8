//! Integration tests for sprig
//!
//! Drives a real repository on disk through multi-step scenarios and checks
//! what survives reopening it from a fresh handle.

use ::sprig::*;
use chrono::{TimeZone, Utc};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness around a repository in a scratch directory
pub struct SprigTestHarness {
    pub temp_dir: TempDir,
    pub repo: Repository,
}

impl SprigTestHarness {
    /// Initialize a repository with a fixed clock
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let repo = RepositoryBuilder::new()
            .clock(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()))
            .init(temp_dir.path())
            .unwrap();
        Self { temp_dir, repo }
    }

    /// Write a file under the working tree, creating parent directories
    pub fn write(&self, path: &str, content: &str) {
        let full = self.path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    /// Absolute path of a working-tree file
    pub fn path(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Open a second handle on the same repository
    pub fn reopen(&self) -> Repository {
        Repository::open(self.temp_dir.path()).unwrap()
    }

    /// Write, stage and commit files in one step
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> Commit {
        for (path, content) in files {
            self.write(path, content);
            self.repo.add(path).unwrap();
        }
        self.repo.commit(message).unwrap()
    }
}

#[test]
fn test_init_then_status_shows_master_only() {
    let harness = SprigTestHarness::new();
    let status = harness.repo.status().unwrap();

    assert_eq!(status.branches, vec!["master".to_string()]);
    assert_eq!(status.current_branch, "master");
    assert!(status.staged.is_empty());
    assert!(status.removed.is_empty());

    let rendered = status.to_string();
    assert!(rendered.starts_with("=== Branches ===\n*master\n\n=== Staged Files ===\n\n"));
}

#[test]
fn test_second_init_fails_and_preserves_state() {
    let harness = SprigTestHarness::new();
    harness.commit_files(&[("a.txt", "a")], "first");
    let before = harness.repo.log().unwrap();

    let err = Repository::init(harness.temp_dir.path()).unwrap_err();
    assert!(matches!(err, SprigError::AlreadyInitialized(_)));
    assert!(err.is_recoverable());

    assert_eq!(harness.reopen().log().unwrap(), before);
}

#[test]
fn test_operations_require_initialized_repository() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("f.txt"), "x").unwrap();

    let err = Repository::open(temp_dir.path()).unwrap_err();
    assert!(matches!(err, SprigError::NotInitialized(_)));
    assert!(!temp_dir.path().join(".sprig").exists());
}

#[test]
fn test_add_missing_file_leaves_staging_unchanged() {
    let harness = SprigTestHarness::new();
    harness.write("present.txt", "here");
    harness.repo.add("present.txt").unwrap();

    let err = harness.repo.add("f.txt").unwrap_err();
    assert!(matches!(err, SprigError::FileNotFound(_)));
    assert_eq!(err.user_message(), "File does not exist.");

    let status = harness.reopen().status().unwrap();
    assert_eq!(status.staged, vec!["present.txt".to_string()]);
    assert!(status.removed.is_empty());
}

#[test]
fn test_staging_survives_reopen() {
    let harness = SprigTestHarness::new();
    harness.write("a", "1");
    harness.write("b", "2");
    harness.repo.add("a").unwrap();
    harness.repo.add("b").unwrap();

    let status = harness.reopen().status().unwrap();
    assert_eq!(status.staged, vec!["a".to_string(), "b".to_string()]);
    assert!(status.removed.is_empty());
}

#[test]
fn test_rm_never_added() {
    let harness = SprigTestHarness::new();
    let err = harness.repo.remove("never-added").unwrap_err();
    assert!(matches!(err, SprigError::NothingToRemove(_)));
    assert_eq!(err.user_message(), "No reason to remove the file.");
}

#[test]
fn test_rm_tracked_then_add_again() {
    let harness = SprigTestHarness::new();
    harness.commit_files(&[("f.txt", "v1")], "add f");

    harness.repo.remove("f.txt").unwrap();
    assert!(!harness.path("f.txt").exists());
    assert_eq!(harness.repo.status().unwrap().removed, vec!["f.txt".to_string()]);

    harness.write("f.txt", "v2");
    harness.repo.add("f.txt").unwrap();
    let status = harness.repo.status().unwrap();
    assert_eq!(status.staged, vec!["f.txt".to_string()]);
    assert!(status.removed.is_empty());

    let commit = harness.repo.commit("re-add f").unwrap();
    assert_eq!(commit.snapshot("f.txt").unwrap().content(), "v2");
}

#[test]
fn test_history_and_snapshots_carry_forward() {
    let harness = SprigTestHarness::new();
    let first = harness.commit_files(&[("a.txt", "a1"), ("b.txt", "b1")], "first");
    let second = harness.commit_files(&[("a.txt", "a2")], "second");

    assert_eq!(second.parent(), Some(&first.digest()));
    assert_eq!(second.snapshot("a.txt").unwrap().content(), "a2");
    assert_eq!(second.snapshot("b.txt").unwrap().content(), "b1");

    let messages: Vec<String> = harness
        .reopen()
        .log()
        .unwrap()
        .iter()
        .map(|commit| commit.message().to_string())
        .collect();
    assert_eq!(messages, vec!["second", "first", INITIAL_MESSAGE]);
}

#[test]
fn test_branch_keeps_its_tip_while_head_advances() {
    let harness = SprigTestHarness::new();
    let base = harness.commit_files(&[("a.txt", "a")], "base");
    let tip = harness.repo.create_branch("feature").unwrap();
    assert_eq!(tip, base.digest());

    let next = harness.commit_files(&[("b.txt", "b")], "next");

    let mut store = RepositoryStore::load(harness.repo.metadata_dir()).unwrap();
    assert_eq!(store.tip("feature"), Some(&base.digest()));
    assert_eq!(store.tip("master"), Some(&next.digest()));
    assert_eq!(store.head(), "master");
    assert_eq!(store.history(&next.digest()).unwrap().len(), 3);

    harness.repo.remove_branch("feature").unwrap();
    let report = harness.repo.verify().unwrap();
    assert!(report.is_valid());
    assert_eq!(report.total_commits, 3);
    assert_eq!(report.branches_checked, 1);
}

#[test]
fn test_corrupt_refs_fail_every_operation() {
    let harness = SprigTestHarness::new();
    harness.write("a.txt", "a");
    harness.repo.add("a.txt").unwrap();
    fs::write(harness.path(".sprig/refs.json"), "master=master").unwrap();

    let err = harness.repo.status().unwrap_err();
    assert!(err.is_corruption());
    assert!(harness.repo.commit("x").unwrap_err().is_corruption());
    assert!(harness.repo.verify().unwrap_err().is_corruption());

    // The staging file is untouched
    let staging = StagingArea::load(harness.path(".sprig/staging.json")).unwrap();
    assert_eq!(staging.pending_add().len(), 1);
}

#[test]
fn test_empty_refs_are_corrupt() {
    let harness = SprigTestHarness::new();
    fs::write(
        harness.path(".sprig/refs.json"),
        r#"{"format_version":1,"head":"","branches":{},"commits":[]}"#,
    )
    .unwrap();

    let err = harness.repo.status().unwrap_err();
    assert!(err.is_corruption(), "unexpected error: {:?}", err);
    assert!(harness.repo.log().unwrap_err().is_corruption());
    assert!(harness.repo.remove("a.txt").unwrap_err().is_corruption());
    assert!(harness.repo.create_branch("dev").unwrap_err().is_corruption());
}

#[test]
fn test_nested_metadata_name_is_tracked_content() {
    let harness = SprigTestHarness::new();
    harness.commit_files(&[("sub/.sprig/a.txt", "a")], "nested");
    harness.write("sub/.sprig/b.txt", "b");

    let status = harness.repo.status().unwrap();
    assert_eq!(status.untracked, vec!["sub/.sprig/b.txt".to_string()]);
    assert!(status.modified.is_empty());
}

#[test]
fn test_custom_default_branch_and_message() {
    let temp_dir = TempDir::new().unwrap();
    let repo = RepositoryBuilder::new()
        .default_branch("main")
        .initial_message("genesis")
        .clock(FixedClock::epoch())
        .init(temp_dir.path())
        .unwrap();

    assert_eq!(repo.current_branch().unwrap(), "main");
    assert_eq!(repo.head_commit().unwrap().message(), "genesis");

    let reopened = Repository::open(temp_dir.path()).unwrap();
    assert_eq!(reopened.config().default_branch, "main");
    assert_eq!(reopened.config().initial_message, "genesis");
}

#[test]
fn test_identical_inputs_produce_identical_digests() {
    let left = SprigTestHarness::new();
    let right = SprigTestHarness::new();

    // Staged in different orders
    let a = left.commit_files(&[("x.txt", "x"), ("y.txt", "y")], "same");
    let b = right.commit_files(&[("y.txt", "y"), ("x.txt", "x")], "same");
    assert_eq!(a.digest(), b.digest());
}
