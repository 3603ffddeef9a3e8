//! Commit definitions
//!
//! This module defines the immutable commit value and the file snapshots it
//! carries.
//!
//! ## Overview
//!
//! A commit records the full contents of every tracked file at one moment,
//! together with a reference to its parent commit. Its address is a
//! [`Digest`] computed from, in this fixed order:
//!
//! 1. the parent digest (absent for the root commit)
//! 2. the timestamp, in canonical RFC 3339 form
//! 3. the message
//! 4. every snapshot's canonical form, in path order
//!
//! The digest is never stored inside the commit; [`Commit::digest`] always
//! recomputes it. Two commits with equal fields have equal digests.
//!
//! ## Examples
//!
//! ```rust
//! use sprig::commit::{Commit, FileSnapshot};
//! use chrono::{TimeZone, Utc};
//!
//! let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let root = Commit::root(at, "initial commit");
//!
//! let child = Commit::new(
//!     Some(root.digest()),
//!     at,
//!     "add readme",
//!     vec![FileSnapshot::new("README.md", "# hello")],
//! );
//!
//! assert_eq!(child.parent(), Some(&root.digest()));
//! assert!(child.tracks("README.md"));
//! ```

use crate::hash::{self, Digest, FieldHasher};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full contents of one file at commit time
///
/// Snapshots are whole-file copies; no delta encoding is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    path: String,
    content: String,
}

impl FileSnapshot {
    /// Snapshot `content` under the repository-relative `path`
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Path relative to the repository root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File contents
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Canonical byte form: framed path followed by framed content
    pub fn canonical_form(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.path.len() + self.content.len() + 18);
        hash::frame(self.path.as_bytes(), &mut out);
        hash::frame(self.content.as_bytes(), &mut out);
        out
    }
}

/// An immutable commit
///
/// Fields are private and there are no mutators; the only way to obtain a
/// different commit is to construct a new one.
///
/// Deserialization goes through [`Commit::new`], so a loaded commit is
/// always in canonical snapshot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CommitRecord")]
pub struct Commit {
    parent: Option<Digest>,
    timestamp: DateTime<Utc>,
    message: String,
    snapshots: Vec<FileSnapshot>,
}

/// Commit fields as they appear in an object file
#[derive(Deserialize)]
struct CommitRecord {
    parent: Option<Digest>,
    timestamp: DateTime<Utc>,
    message: String,
    snapshots: Vec<FileSnapshot>,
}

impl From<CommitRecord> for Commit {
    fn from(record: CommitRecord) -> Self {
        Commit::new(record.parent, record.timestamp, record.message, record.snapshots)
    }
}

impl Commit {
    /// Create a commit
    ///
    /// Snapshots are put into canonical (path-sorted) order so that the same
    /// logical content assembled in any order produces the same digest. If a
    /// path appears more than once, the last snapshot given for it is kept.
    ///
    /// # Arguments
    ///
    /// * `parent` - Digest of the parent commit (`None` only for the root)
    /// * `timestamp` - Creation time
    /// * `message` - Commit message; empty messages are accepted
    /// * `snapshots` - Files tracked by this commit
    pub fn new(
        parent: Option<Digest>,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
        snapshots: impl IntoIterator<Item = FileSnapshot>,
    ) -> Self {
        let snapshots = snapshots
            .into_iter()
            .map(|snapshot| (snapshot.path.clone(), snapshot))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect();

        Self {
            parent,
            timestamp,
            message: message.into(),
            snapshots,
        }
    }

    /// Create a root commit with no parent and no files
    pub fn root(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::new(None, timestamp, message, Vec::new())
    }

    /// Compute this commit's address
    pub fn digest(&self) -> Digest {
        self.snapshots
            .iter()
            .fold(
                FieldHasher::new()
                    .optional_field(self.parent.as_ref().map(Digest::as_str))
                    .field(self.canonical_timestamp())
                    .field(&self.message),
                |hasher, snapshot| hasher.field(snapshot.canonical_form()),
            )
            .finish()
    }

    /// Timestamp in the form that participates in the digest
    pub fn canonical_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Parent digest, `None` for the root commit
    pub fn parent(&self) -> Option<&Digest> {
        self.parent.as_ref()
    }

    /// Whether this is a root commit
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Creation time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Commit message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Tracked files in path order
    pub fn snapshots(&self) -> &[FileSnapshot] {
        &self.snapshots
    }

    /// Look up the snapshot for `path`
    pub fn snapshot(&self, path: &str) -> Option<&FileSnapshot> {
        self.snapshots
            .binary_search_by(|snapshot| snapshot.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.snapshots[idx])
    }

    /// Whether `path` is tracked by this commit
    pub fn tracks(&self, path: &str) -> bool {
        self.snapshot(path).is_some()
    }

    /// Format commit for display
    pub fn display_format(&self) -> String {
        format!(
            "[{}] {} - {} files - {}",
            self.digest().short(),
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.snapshots.len(),
            self.message
        )
    }
}
