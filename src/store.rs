//! Persisted branch and commit store
//!
//! The repository store owns two logical maps:
//!
//! - `branches`: branch name → digest of that branch's tip commit
//! - `commits`: every known digest → the commit, if it has been loaded
//!
//! plus the name of the active (head) branch.
//!
//! ## Layout
//!
//! ```text
//! .sprig/
//! ├── refs.json              # head, branches, known commit digests
//! └── commits/
//!     └── <prefix>/          # First 2 chars of the digest
//!         └── <suffix>.json  # One immutable commit object
//! ```
//!
//! `refs.json` holds the branches and the commit set as two explicit
//! collections. Commit objects are written once, when they are registered,
//! and never rewritten. Loading the store reads only `refs.json`; commit
//! objects are read lazily the first time [`RepositoryStore::commit`] asks
//! for them.
//!
//! ## Invariants
//!
//! - every branch tip is a key of `commits`
//! - the head branch exists whenever any branch exists
//! - a loaded commit recomputes to the digest it is stored under
//!
//! A persisted file that violates these is reported as
//! [`SprigError::CorruptStore`]; nothing is salvaged.

use crate::commit::Commit;
use crate::error::{Result, SprigError};
use crate::hash::Digest;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Name of the refs file inside the metadata directory
pub const REFS_FILE: &str = "refs.json";
/// Name of the commit object directory inside the metadata directory
pub const COMMITS_DIR: &str = "commits";

/// Version of the `refs.json` format
const REFS_FORMAT_VERSION: u32 = 1;

/// On-disk form of `refs.json`
#[derive(Debug, Serialize, Deserialize)]
struct RefsFile {
    format_version: u32,
    head: String,
    branches: BTreeMap<String, Digest>,
    commits: BTreeSet<Digest>,
}

/// Branch pointers and the index of every known commit
#[derive(Debug)]
pub struct RepositoryStore {
    /// Metadata directory the store lives in
    root: PathBuf,
    /// Active branch
    head: String,
    /// Branch name -> tip digest
    branches: BTreeMap<String, Digest>,
    /// Every known digest; `None` until the commit object is loaded
    commits: BTreeMap<Digest, Option<Commit>>,
}

impl RepositoryStore {
    /// Create an empty, unsaved store rooted at `root`
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            head: String::new(),
            branches: BTreeMap::new(),
            commits: BTreeMap::new(),
        }
    }

    /// Load the store from `root`
    ///
    /// A missing `refs.json` is the first-use case and yields an empty
    /// store. Commit objects are not read here.
    ///
    /// # Errors
    ///
    /// - [`SprigError::CorruptStore`] if `refs.json` does not decode, has an
    ///   unknown format version, or violates a store invariant
    /// - [`SprigError::Io`] if the file cannot be read
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let refs_path = root.join(REFS_FILE);

        let Some(refs) = utils::read_json::<RefsFile>(&refs_path)? else {
            debug!("No refs file at {:?}, starting empty", refs_path);
            return Ok(Self::empty(root));
        };

        if refs.format_version != REFS_FORMAT_VERSION {
            return Err(SprigError::corrupt(
                &refs_path,
                format!("unsupported format version {}", refs.format_version),
            ));
        }

        let store = Self {
            root,
            head: refs.head,
            branches: refs.branches,
            commits: refs.commits.into_iter().map(|digest| (digest, None)).collect(),
        };
        store
            .check_invariants()
            .map_err(|reason| SprigError::corrupt(&refs_path, reason))?;

        debug!(
            "Loaded {} branches and {} commits from {:?}",
            store.branches.len(),
            store.commits.len(),
            refs_path
        );
        Ok(store)
    }

    /// Write `refs.json` atomically
    ///
    /// # Errors
    ///
    /// - [`SprigError::Internal`] if the in-memory state violates a store
    ///   invariant (nothing is written)
    /// - [`SprigError::Io`] if the write fails
    pub fn save(&self) -> Result<()> {
        self.check_invariants().map_err(SprigError::Internal)?;

        let refs = RefsFile {
            format_version: REFS_FORMAT_VERSION,
            head: self.head.clone(),
            branches: self.branches.clone(),
            commits: self.commits.keys().cloned().collect(),
        };
        utils::write_json(&self.refs_path(), &refs)?;

        debug!(
            "Saved {} branches and {} commits",
            self.branches.len(),
            self.commits.len()
        );
        Ok(())
    }

    /// Register a new commit and persist its object
    ///
    /// The object file is written before the digest enters the index. An
    /// already-present object is left untouched since commits are immutable.
    pub fn register(&mut self, commit: Commit) -> Result<Digest> {
        let digest = commit.digest();
        let object_path = self.object_path(&digest);

        if !object_path.exists() {
            utils::write_json(&object_path, &commit)?;
            trace!("Stored commit object {}", digest.short());
        }

        self.commits.insert(digest.clone(), Some(commit));
        Ok(digest)
    }

    /// Get a commit, reading its object from disk on first access
    ///
    /// # Errors
    ///
    /// - [`SprigError::CommitNotFound`] if the digest is not known
    /// - [`SprigError::CorruptStore`] if the object is missing, does not
    ///   decode, or does not recompute to `digest`
    pub fn commit(&mut self, digest: &Digest) -> Result<&Commit> {
        let slot = self
            .commits
            .get_mut(digest)
            .ok_or_else(|| SprigError::CommitNotFound(digest.to_string()))?;

        if slot.is_none() {
            let object_path = Self::object_path_in(&self.root, digest);
            let commit: Commit = utils::read_json(&object_path)?
                .ok_or_else(|| SprigError::corrupt(&object_path, "commit object is missing"))?;

            let actual = commit.digest();
            if &actual != digest {
                return Err(SprigError::corrupt(
                    &object_path,
                    format!("content hashes to {}", actual),
                ));
            }

            trace!("Loaded commit object {}", digest.short());
            *slot = Some(commit);
        }

        slot.as_ref()
            .ok_or_else(|| SprigError::internal("commit slot empty after load"))
    }

    /// Whether `digest` is a known commit
    pub fn contains(&self, digest: &Digest) -> bool {
        self.commits.contains_key(digest)
    }

    /// Whether the commit for `digest` is resident in memory
    pub fn is_loaded(&self, digest: &Digest) -> bool {
        matches!(self.commits.get(digest), Some(Some(_)))
    }

    /// All known digests in order
    pub fn digests(&self) -> impl Iterator<Item = &Digest> {
        self.commits.keys()
    }

    /// Number of known commits
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// Branch pointers
    pub fn branches(&self) -> &BTreeMap<String, Digest> {
        &self.branches
    }

    /// Tip digest of `name`
    pub fn tip(&self, name: &str) -> Option<&Digest> {
        self.branches.get(name)
    }

    /// Name of the active branch (empty for an empty store)
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Tip digest of the active branch
    pub fn head_tip(&self) -> Result<Digest> {
        self.tip(&self.head)
            .cloned()
            .ok_or_else(|| SprigError::BranchNotFound(self.head.clone()))
    }

    /// Load and return the active branch's tip commit
    pub fn head_commit(&mut self) -> Result<&Commit> {
        let tip = self.head_tip()?;
        self.commit(&tip)
    }

    /// Make `name` the active branch
    pub fn set_head(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !self.branches.contains_key(&name) {
            return Err(SprigError::BranchNotFound(name));
        }
        self.head = name;
        Ok(())
    }

    /// Point `name` at `digest`, creating or moving the branch
    ///
    /// # Errors
    ///
    /// - [`SprigError::CommitNotFound`] if `digest` is not a known commit
    pub fn set_branch(&mut self, name: impl Into<String>, digest: Digest) -> Result<()> {
        if !self.contains(&digest) {
            return Err(SprigError::CommitNotFound(digest.to_string()));
        }
        let name = name.into();
        trace!("Branch {} -> {}", name, digest.short());
        self.branches.insert(name, digest);
        Ok(())
    }

    /// Delete a branch pointer; its commits stay in the store
    pub fn remove_branch(&mut self, name: &str) -> Result<Digest> {
        if name == self.head {
            return Err(SprigError::CannotRemoveCurrentBranch(name.to_string()));
        }
        self.branches
            .remove(name)
            .ok_or_else(|| SprigError::BranchNotFound(name.to_string()))
    }

    /// Commits reachable from `start` following parents, newest first
    pub fn history(&mut self, start: &Digest) -> Result<Vec<Commit>> {
        let mut history = Vec::new();
        let mut current = Some(start.clone());

        while let Some(digest) = current {
            let commit = self.commit(&digest)?;
            current = commit.parent().cloned();
            history.push(commit.clone());

            if history.len() > self.commits.len() {
                return Err(SprigError::corrupt(&self.root, "parent chain contains a cycle"));
            }
        }

        Ok(history)
    }

    /// Metadata directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn refs_path(&self) -> PathBuf {
        self.root.join(REFS_FILE)
    }

    fn object_path(&self, digest: &Digest) -> PathBuf {
        Self::object_path_in(&self.root, digest)
    }

    fn object_path_in(root: &Path, digest: &Digest) -> PathBuf {
        let (prefix, suffix) = digest.shard();
        root.join(COMMITS_DIR)
            .join(prefix)
            .join(format!("{}.json", suffix))
    }

    fn check_invariants(&self) -> std::result::Result<(), String> {
        if let Some((name, tip)) = self
            .branches
            .iter()
            .find(|(_, tip)| !self.commits.contains_key(*tip))
        {
            return Err(format!("branch {} points at unknown commit {}", name, tip));
        }

        if !self.branches.is_empty() && !self.branches.contains_key(&self.head) {
            return Err(format!("head branch {:?} does not exist", self.head));
        }

        Ok(())
    }
}
