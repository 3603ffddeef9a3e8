//! Repository façade
//!
//! [`Repository`] is the entry point for every operation. It is an explicit
//! handle on one working directory: it knows where the working tree and the
//! metadata directory live, which clock stamps new commits, and the persisted
//! [`RepositoryConfig`]. It caches no repository state. Each operation loads
//! the store and the staging area, mutates them in memory, and writes them
//! back only once everything has succeeded.
//!
//! ## Lifecycle
//!
//! A directory is either uninitialized (no `.sprig`) or initialized (a store
//! with at least the root commit and one branch). [`Repository::init`] is the
//! only transition between the two; [`Repository::open`] fails fast with
//! [`SprigError::NotInitialized`] everywhere else.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use sprig::Repository;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::init("./project")?;
//! std::fs::write("./project/notes.txt", "remember the milk")?;
//!
//! repo.add("notes.txt")?;
//! let commit = repo.commit("add notes")?;
//! println!("{}", commit.digest());
//!
//! print!("{}", repo.status()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! There is no cross-process lock. Two processes mutating the same
//! repository at once may lose one of the updates; each individual file is
//! still replaced atomically.

use crate::clock::{Clock, SystemClock};
use crate::commit::{Commit, FileSnapshot};
use crate::error::{Result, SprigError};
use crate::hash::Digest;
use crate::staging::{RemoveOutcome, StagingArea, STAGING_FILE};
use crate::store::{RepositoryStore, REFS_FILE};
use crate::types::*;
use crate::utils;
use crate::worktree::{WorkingTree, METADATA_DIR};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Name of the configuration file inside the metadata directory
pub const CONFIG_FILE: &str = "config.json";

/// Handle on an initialized repository
///
/// # Examples
///
/// ```rust,no_run
/// use sprig::{Repository, RepositoryBuilder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Defaults: branch "master", system clock
/// let repo = Repository::open(".")?;
///
/// // Custom first branch
/// let repo = RepositoryBuilder::new()
///     .default_branch("main")
///     .init("./elsewhere")?;
/// # Ok(())
/// # }
/// ```
pub struct Repository {
    /// Working directory being versioned
    tree: WorkingTree,
    /// `.sprig` directory
    metadata_dir: PathBuf,
    /// Persisted configuration
    config: RepositoryConfig,
    /// Source of commit timestamps
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.tree.root())
            .field("metadata_dir", &self.metadata_dir)
            .field("default_branch", &self.config.default_branch)
            .finish()
    }
}

impl Repository {
    /// Initialize a repository in `root` with default settings
    ///
    /// See [`RepositoryBuilder::init`].
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        RepositoryBuilder::new().init(root)
    }

    /// Open the repository in `root` with default settings
    ///
    /// See [`RepositoryBuilder::open`].
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        RepositoryBuilder::new().open(root)
    }

    /// Stage a working-tree file for addition
    ///
    /// Returns the normalised repository path that was staged. Any pending
    /// removal of the same path is cancelled.
    ///
    /// # Errors
    ///
    /// - [`SprigError::InvalidPath`] if the path is outside the working tree
    /// - [`SprigError::FileNotFound`] if no regular file exists at the path;
    ///   the staging area is left unchanged
    /// - [`SprigError::NotText`] if the file is not UTF-8 text
    #[instrument(skip(self))]
    pub fn add(&self, path: &str) -> Result<String> {
        let path = self.tree.normalize(path)?;
        if !self.tree.is_file(&path) {
            return Err(SprigError::FileNotFound(path));
        }
        self.tree.read(&path)?;

        let mut staging = self.load_staging()?;
        staging.stage_add(&path);
        staging.save()?;

        debug!("Staged {} for addition", path);
        Ok(path)
    }

    /// Unstage a path, or stage a tracked path for removal
    ///
    /// A path only staged for addition is unstaged and its working file is
    /// kept. A path tracked by the head commit is staged for removal and its
    /// working file is deleted. Failing to delete the file is logged and does
    /// not fail the call, since the removal has already been recorded.
    ///
    /// # Errors
    ///
    /// - [`SprigError::NothingToRemove`] if the path is neither staged for
    ///   addition nor tracked by the head commit
    #[instrument(skip(self))]
    pub fn remove(&self, path: &str) -> Result<RemoveOutcome> {
        let path = self.tree.normalize(path)?;
        let mut staging = self.load_staging()?;
        let mut store = self.load_store()?;

        let tracked = store.head_commit()?.tracks(&path);
        let outcome = staging.stage_remove(&path, tracked)?;
        staging.save()?;

        // The removal is recorded; a file that cannot be deleted stays behind
        // and shows up as untracked
        if outcome.marked_for_removal {
            match self.tree.remove(&path) {
                Ok(true) => debug!("Deleted tracked file {} from the working tree", path),
                Ok(false) => {}
                Err(e) => warn!("Staged {} for removal but could not delete it: {}", path, e),
            }
        }

        debug!("Removed {}: {:?}", path, outcome);
        Ok(outcome)
    }

    /// Describe branches, staged changes and working-tree drift
    #[instrument(skip(self))]
    pub fn status(&self) -> Result<Status> {
        let staging = self.load_staging()?;
        let mut store = self.load_store()?;
        let head = store.head_commit()?.clone();

        let mut modified = BTreeMap::new();
        for snapshot in head.snapshots() {
            let path = snapshot.path();
            if staging.pending_add().contains(path) || staging.pending_remove().contains(path) {
                continue;
            }
            if !self.tree.is_file(path) {
                modified.insert(path.to_string(), Modification::Deleted);
            } else if self.differs(path, snapshot.content())? {
                modified.insert(path.to_string(), Modification::Modified);
            }
        }
        for path in staging.pending_add() {
            if !self.tree.is_file(path) {
                modified.insert(path.clone(), Modification::Deleted);
            }
        }

        let untracked = self
            .tree
            .files()?
            .into_iter()
            .filter(|path| {
                staging.pending_remove().contains(path)
                    || (!staging.pending_add().contains(path) && !head.tracks(path))
            })
            .collect();

        Ok(Status {
            current_branch: store.head().to_string(),
            branches: store.branches().keys().cloned().collect(),
            staged: staging.pending_add().iter().cloned().collect(),
            removed: staging.pending_remove().iter().cloned().collect(),
            modified: modified.into_iter().collect(),
            untracked,
        })
    }

    /// Record the staged changes as a new commit on the head branch
    ///
    /// The new snapshot list is the head commit's, with every staged path
    /// replaced by its current working-tree content and every path staged
    /// for removal dropped. The staging area is cleared afterwards.
    ///
    /// # Errors
    ///
    /// - [`SprigError::NothingToCommit`] if nothing is staged
    /// - [`SprigError::FileNotFound`] if a staged file has since been deleted
    #[instrument(skip(self))]
    pub fn commit(&self, message: &str) -> Result<Commit> {
        let start = Instant::now();
        let mut staging = self.load_staging()?;
        if staging.is_empty() {
            return Err(SprigError::NothingToCommit);
        }

        let mut store = self.load_store()?;
        let parent = store.head_tip()?;
        let mut snapshots: BTreeMap<String, FileSnapshot> = store
            .commit(&parent)?
            .snapshots()
            .iter()
            .map(|snapshot| (snapshot.path().to_string(), snapshot.clone()))
            .collect();

        for path in staging.pending_add() {
            let content = self.tree.read(path)?;
            trace!("Snapshot {} ({} bytes)", path, content.len());
            snapshots.insert(path.clone(), FileSnapshot::new(path.clone(), content));
        }
        for path in staging.pending_remove() {
            snapshots.remove(path);
        }

        let commit = Commit::new(
            Some(parent),
            self.clock.now(),
            message,
            snapshots.into_values(),
        );
        let digest = store.register(commit.clone())?;
        let branch = store.head().to_string();
        store.set_branch(branch.clone(), digest.clone())?;
        store.save()?;

        staging.clear();
        staging.save()?;

        info!(
            "Committed {} on {} in {:?} ({} files)",
            digest.short(),
            branch,
            start.elapsed(),
            commit.snapshots().len()
        );
        Ok(commit)
    }

    /// Commits from the head tip back to the root, newest first
    #[instrument(skip(self))]
    pub fn log(&self) -> Result<Vec<Commit>> {
        let mut store = self.load_store()?;
        let tip = store.head_tip()?;
        store.history(&tip)
    }

    /// The head branch's tip commit
    pub fn head_commit(&self) -> Result<Commit> {
        let mut store = self.load_store()?;
        store.head_commit().cloned()
    }

    /// Name of the active branch
    pub fn current_branch(&self) -> Result<String> {
        Ok(self.load_store()?.head().to_string())
    }

    /// Create a branch pointing at the head tip
    ///
    /// # Errors
    ///
    /// - [`SprigError::InvalidBranchName`] if the name is empty, contains
    ///   whitespace or a path separator, or starts with `-`
    /// - [`SprigError::BranchExists`] if the branch already exists
    #[instrument(skip(self))]
    pub fn create_branch(&self, name: &str) -> Result<Digest> {
        validate_branch_name(name)?;
        let mut store = self.load_store()?;
        if store.tip(name).is_some() {
            return Err(SprigError::BranchExists(name.to_string()));
        }

        let tip = store.head_tip()?;
        store.set_branch(name, tip.clone())?;
        store.save()?;

        info!("Created branch {} at {}", name, tip.short());
        Ok(tip)
    }

    /// Delete a branch pointer; its commits are kept
    ///
    /// # Errors
    ///
    /// - [`SprigError::BranchNotFound`] if no such branch exists
    /// - [`SprigError::CannotRemoveCurrentBranch`] for the head branch
    #[instrument(skip(self))]
    pub fn remove_branch(&self, name: &str) -> Result<()> {
        let mut store = self.load_store()?;
        let tip = store.remove_branch(name)?;
        store.save()?;

        info!("Removed branch {} (was {})", name, tip.short());
        Ok(())
    }

    /// Check every commit object, parent link and branch pointer
    ///
    /// Problems are collected into the report instead of failing the call,
    /// except when `refs.json` itself cannot be loaded.
    #[instrument(skip(self))]
    pub fn verify(&self) -> Result<VerificationReport> {
        let start = Instant::now();
        let mut store = self.load_store()?;
        let digests: Vec<Digest> = store.digests().cloned().collect();

        let mut report = VerificationReport {
            total_commits: digests.len(),
            ..Default::default()
        };

        for digest in &digests {
            let parent = match store.commit(digest) {
                Ok(commit) => commit.parent().cloned(),
                Err(e) => {
                    report.errors.push(format!("commit {}: {}", digest.short(), e));
                    continue;
                }
            };

            match parent {
                Some(parent) if !store.contains(&parent) => report.errors.push(format!(
                    "commit {}: unknown parent {}",
                    digest.short(),
                    parent.short()
                )),
                _ => report.valid_commits += 1,
            }
        }

        for (name, tip) in store.branches() {
            report.branches_checked += 1;
            if !store.contains(tip) {
                report
                    .errors
                    .push(format!("branch {}: unknown tip {}", name, tip.short()));
            }
        }

        if let Err(e) = self.load_staging() {
            report.errors.push(format!("staging area: {}", e));
        }

        report.verification_time_ms = start.elapsed().as_millis() as u64;
        if report.is_valid() {
            debug!("{}", report.summary());
        } else {
            warn!("{}", report.summary());
        }
        Ok(report)
    }

    /// Working-tree root
    pub fn root(&self) -> &Path {
        self.tree.root()
    }

    /// `.sprig` directory
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Persisted configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Load the store; an initialized repository always has `refs.json`
    fn load_store(&self) -> Result<RepositoryStore> {
        let refs_path = self.metadata_dir.join(REFS_FILE);
        if !refs_path.is_file() {
            return Err(SprigError::corrupt(refs_path, "refs file is missing"));
        }
        let store = RepositoryStore::load(&self.metadata_dir)?;
        if store.branches().is_empty() || store.head().is_empty() || store.commit_count() == 0 {
            return Err(SprigError::corrupt(refs_path, "store has no branches or commits"));
        }
        Ok(store)
    }

    fn load_staging(&self) -> Result<StagingArea> {
        StagingArea::load(self.metadata_dir.join(STAGING_FILE))
    }

    /// Whether the working copy of `path` differs from `content`
    fn differs(&self, path: &str, content: &str) -> Result<bool> {
        match self.tree.read(path) {
            Ok(current) => Ok(current != content),
            Err(SprigError::NotText(_)) | Err(SprigError::FileNotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }
}

/// Builder for opening or initializing a [`Repository`]
///
/// # Examples
///
/// ```rust
/// use sprig::RepositoryBuilder;
/// use sprig::clock::FixedClock;
///
/// let builder = RepositoryBuilder::new()
///     .default_branch("main")
///     .initial_message("start")
///     .clock(FixedClock::epoch());
/// ```
#[derive(Debug, Clone)]
pub struct RepositoryBuilder {
    default_branch: String,
    initial_message: String,
    clock: Arc<dyn Clock>,
}

impl RepositoryBuilder {
    /// Builder with the `master` branch, the stock initial message and the
    /// system clock
    pub fn new() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH.to_string(),
            initial_message: INITIAL_MESSAGE.to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Name of the branch created by `init`
    pub fn default_branch(mut self, name: impl Into<String>) -> Self {
        self.default_branch = name.into();
        self
    }

    /// Message of the root commit created by `init`
    pub fn initial_message(mut self, message: impl Into<String>) -> Self {
        self.initial_message = message.into();
        self
    }

    /// Clock used for commit timestamps
    ///
    /// Tests pass a [`FixedClock`](crate::clock::FixedClock) so digests are
    /// reproducible across runs.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Create the metadata directory, the root commit and the default branch
    ///
    /// If any step fails the partially written metadata directory is
    /// removed again.
    ///
    /// # Errors
    ///
    /// - [`SprigError::AlreadyInitialized`] if `.sprig` already exists; the
    ///   existing store is not touched
    /// - [`SprigError::InvalidBranchName`] if the default branch name is
    ///   rejected
    #[instrument(skip_all)]
    pub fn init(self, root: impl Into<PathBuf>) -> Result<Repository> {
        let root = root.into();
        let metadata_dir = root.join(METADATA_DIR);

        if metadata_dir.exists() {
            return Err(SprigError::AlreadyInitialized(root));
        }
        if !root.is_dir() {
            return Err(SprigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("root path {:?} is not a directory", root),
            )));
        }
        validate_branch_name(&self.default_branch)?;

        fs::create_dir(&metadata_dir)?;
        let config = match self.populate(&metadata_dir) {
            Ok(config) => config,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&metadata_dir) {
                    warn!("Failed to clean up {:?}: {}", metadata_dir, cleanup);
                }
                return Err(e);
            }
        };

        info!("Initialized repository at {:?}", root);
        Ok(Repository {
            tree: WorkingTree::new(root),
            metadata_dir,
            config,
            clock: self.clock,
        })
    }

    /// Open an existing repository
    ///
    /// The branch name and initial message set on the builder are ignored;
    /// the persisted configuration wins.
    ///
    /// # Errors
    ///
    /// - [`SprigError::NotInitialized`] if `root` has no `.sprig` directory
    /// - [`SprigError::CorruptStore`] if `config.json` is missing or broken
    #[instrument(skip_all)]
    pub fn open(self, root: impl Into<PathBuf>) -> Result<Repository> {
        let root = root.into();
        let metadata_dir = root.join(METADATA_DIR);

        if !metadata_dir.is_dir() {
            return Err(SprigError::NotInitialized(root));
        }

        let config_path = metadata_dir.join(CONFIG_FILE);
        let config: RepositoryConfig = utils::read_json(&config_path)?
            .ok_or_else(|| SprigError::corrupt(&config_path, "configuration file is missing"))?;
        if config.format_version != FORMAT_VERSION {
            return Err(SprigError::corrupt(
                &config_path,
                format!("unsupported format version {}", config.format_version),
            ));
        }

        debug!("Opened repository at {:?}", root);
        Ok(Repository {
            tree: WorkingTree::new(root),
            metadata_dir,
            config,
            clock: self.clock,
        })
    }

    /// Write config, root commit, default branch and an empty staging area
    fn populate(&self, metadata_dir: &Path) -> Result<RepositoryConfig> {
        let now = self.clock.now();
        let config = RepositoryConfig {
            format_version: FORMAT_VERSION,
            sprig_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: now,
            default_branch: self.default_branch.clone(),
            initial_message: self.initial_message.clone(),
        };
        utils::write_json(&metadata_dir.join(CONFIG_FILE), &config)?;

        let mut store = RepositoryStore::empty(metadata_dir);
        let root_digest = store.register(Commit::root(now, self.initial_message.as_str()))?;
        store.set_branch(self.default_branch.as_str(), root_digest.clone())?;
        store.set_head(self.default_branch.as_str())?;
        store.save()?;

        StagingArea::empty(metadata_dir.join(STAGING_FILE)).save()?;

        debug!("Root commit {}", root_digest.short());
        Ok(config)
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject names that would be ambiguous on the command line
fn validate_branch_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\');
    if valid {
        Ok(())
    } else {
        Err(SprigError::InvalidBranchName(name.to_string()))
    }
}
