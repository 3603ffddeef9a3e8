//! Common types used throughout sprig
//!
//! Persisted repository configuration and the report types returned by the
//! read-only façade operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default name of the first branch
pub const DEFAULT_BRANCH: &str = "master";
/// Default message of the root commit
pub const INITIAL_MESSAGE: &str = "initial commit";
/// Version of the metadata directory layout
pub const FORMAT_VERSION: u32 = 1;

/// Configuration persisted in `.sprig/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Version of the metadata directory layout
    pub format_version: u32,
    /// sprig version that created the repository
    pub sprig_version: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Branch created by `init`
    pub default_branch: String,
    /// Message of the root commit
    pub initial_message: String,
}

/// How a tracked file differs from the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modification {
    /// Content differs from the head commit
    Modified,
    /// File is missing from the working tree
    Deleted,
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modification::Modified => f.write_str("modified"),
            Modification::Deleted => f.write_str("deleted"),
        }
    }
}

/// Snapshot of repository state returned by `status`
///
/// Every list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Active branch
    pub current_branch: String,
    /// All branch names
    pub branches: Vec<String>,
    /// Paths staged for addition
    pub staged: Vec<String>,
    /// Paths staged for removal
    pub removed: Vec<String>,
    /// Tracked or staged paths whose working copy changed without being staged
    pub modified: Vec<(String, Modification)>,
    /// Working files neither tracked nor staged
    pub untracked: Vec<String>,
}

impl Status {
    /// Whether nothing is staged and the working tree matches the head commit
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.untracked.is_empty()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Branches ===")?;
        for branch in &self.branches {
            if *branch == self.current_branch {
                writeln!(f, "*{}", branch)?;
            } else {
                writeln!(f, "{}", branch)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "=== Staged Files ===")?;
        for path in &self.staged {
            writeln!(f, "{}", path)?;
        }
        writeln!(f)?;

        writeln!(f, "=== Removed Files ===")?;
        for path in &self.removed {
            writeln!(f, "{}", path)?;
        }
        writeln!(f)?;

        writeln!(f, "=== Modifications Not Staged For Commit ===")?;
        for (path, kind) in &self.modified {
            writeln!(f, "{} ({})", path, kind)?;
        }
        writeln!(f)?;

        writeln!(f, "=== Untracked Files ===")?;
        for path in &self.untracked {
            writeln!(f, "{}", path)?;
        }
        writeln!(f)
    }
}

/// Result of checking every commit object in the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Known commits
    pub total_commits: usize,
    /// Commits whose object loaded and recomputed to its address
    pub valid_commits: usize,
    /// Branch pointers checked
    pub branches_checked: usize,
    /// Problems found, one line each
    pub errors: Vec<String>,
    /// Time taken in milliseconds
    pub verification_time_ms: u64,
}

impl VerificationReport {
    /// Check if the store is fully valid
    pub fn is_valid(&self) -> bool {
        self.valid_commits == self.total_commits && self.errors.is_empty()
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "Repository is valid: {} commits, {} branches verified in {}ms",
                self.total_commits, self.branches_checked, self.verification_time_ms
            )
        } else {
            format!(
                "Repository has issues: {}/{} commits valid, {} errors in {}ms",
                self.valid_commits,
                self.total_commits,
                self.errors.len(),
                self.verification_time_ms
            )
        }
    }
}
