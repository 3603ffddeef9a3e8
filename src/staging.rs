//! Staging area: pending additions and removals
//!
//! The staging area is the delta between the head commit and the next
//! commit. It holds two path sets that are always disjoint: staging a path
//! for addition takes it out of the removal set and vice versa, so the last
//! request for a path wins.
//!
//! The staging area is persisted on its own in `staging.json`, independent
//! of the branch/commit store, with both sets written out explicitly.

use crate::error::{Result, SprigError};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the staging file inside the metadata directory
pub const STAGING_FILE: &str = "staging.json";

/// What [`StagingArea::stage_remove`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// The path was staged for addition and has been unstaged
    pub unstaged: bool,
    /// The path is tracked by the head commit and is now staged for removal
    pub marked_for_removal: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StagingFile {
    pending_add: BTreeSet<String>,
    pending_remove: BTreeSet<String>,
}

/// Pending additions and removals for the next commit
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    pending_add: BTreeSet<String>,
    pending_remove: BTreeSet<String>,
}

impl StagingArea {
    /// Create an empty staging area persisted at `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending_add: BTreeSet::new(),
            pending_remove: BTreeSet::new(),
        }
    }

    /// Load the staging area from `path`
    ///
    /// A missing file yields an empty staging area. If the file lists a path
    /// in both sets, the removal wins.
    ///
    /// # Errors
    ///
    /// - [`SprigError::CorruptStore`] if the file does not decode
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file: StagingFile = utils::read_json(&path)?.unwrap_or_default();

        let mut pending_add = file.pending_add;
        let pending_remove = file.pending_remove;
        let overlap: Vec<String> = pending_add.intersection(&pending_remove).cloned().collect();
        if !overlap.is_empty() {
            warn!("Staging file lists {:?} as both added and removed; keeping removal", overlap);
            for entry in &overlap {
                pending_add.remove(entry);
            }
        }

        debug!(
            "Loaded staging area: {} added, {} removed",
            pending_add.len(),
            pending_remove.len()
        );
        Ok(Self {
            path,
            pending_add,
            pending_remove,
        })
    }

    /// Persist both sets atomically
    pub fn save(&self) -> Result<()> {
        let file = StagingFile {
            pending_add: self.pending_add.clone(),
            pending_remove: self.pending_remove.clone(),
        };
        utils::write_json(&self.path, &file)
    }

    /// Stage `path` for addition
    ///
    /// The caller has already checked that the file exists in the working
    /// tree. Cancels any pending removal of the same path.
    pub fn stage_add(&mut self, path: &str) {
        self.pending_remove.remove(path);
        self.pending_add.insert(path.to_string());
    }

    /// Stage `path` for removal
    ///
    /// `tracked` says whether the head commit tracks `path`. A path staged
    /// for addition is unstaged; a tracked path is added to the removal set.
    ///
    /// # Errors
    ///
    /// - [`SprigError::NothingToRemove`] if the path is neither staged for
    ///   addition nor tracked; the sets are left unchanged
    pub fn stage_remove(&mut self, path: &str, tracked: bool) -> Result<RemoveOutcome> {
        let staged = self.pending_add.contains(path);
        if !staged && !tracked {
            return Err(SprigError::NothingToRemove(path.to_string()));
        }

        self.pending_add.remove(path);
        if tracked {
            self.pending_remove.insert(path.to_string());
        }

        Ok(RemoveOutcome {
            unstaged: staged,
            marked_for_removal: tracked,
        })
    }

    /// Empty both sets
    pub fn clear(&mut self) {
        self.pending_add.clear();
        self.pending_remove.clear();
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.pending_add.is_empty() && self.pending_remove.is_empty()
    }

    /// Paths staged for addition, sorted
    pub fn pending_add(&self) -> &BTreeSet<String> {
        &self.pending_add
    }

    /// Paths staged for removal, sorted
    pub fn pending_remove(&self) -> &BTreeSet<String> {
        &self.pending_remove
    }

    /// File the staging area is persisted to
    pub fn path(&self) -> &Path {
        &self.path
    }
}
