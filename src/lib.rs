//! # Sprig - a small local version-control engine
//!
//! Sprig tracks snapshots of text files in one working directory as
//! immutable, content-addressed commits arranged in a graph of branch
//! pointers. Changes are collected in a staging area before they are
//! committed.
//!
//! ## Overview
//!
//! Sprig provides the core of a Git-like workflow for a single user:
//! - Initialize a repository with a root commit and a default branch
//! - Stage files for addition or removal
//! - Commit the staged changes as a new immutable snapshot
//! - Create and delete branch pointers
//! - Inspect status and history, and verify the store
//!
//! There is no networking, no remote sync and no cross-process locking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sprig::Repository;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::init("./my_project")?;
//!
//! std::fs::write("./my_project/readme.txt", "hello")?;
//! repo.add("readme.txt")?;
//! let commit = repo.commit("add readme")?;
//! println!("Created commit {}", commit.digest().short());
//!
//! for commit in repo.log()? {
//!     println!("{}", commit.display_format());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Reproducible digests
//!
//! Commit digests include the commit timestamp. Inject a fixed clock to make
//! them stable across runs:
//!
//! ```rust,no_run
//! use sprig::RepositoryBuilder;
//! use sprig::clock::FixedClock;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = RepositoryBuilder::new()
//!     .clock(FixedClock::epoch())
//!     .init("./fixture")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Commits
//!
//! A commit holds an optional parent digest, a timestamp, a message and a
//! path-sorted list of file snapshots. Its digest is the SHA-256 of those
//! fields in a fixed framed encoding, so the same logical content always
//! yields the same address.
//!
//! ### Repository store
//!
//! Branch pointers, the set of known commit digests and the active branch
//! are kept in `.sprig/refs.json`. Each commit object lives in its own file
//! under `.sprig/commits/`, written once and read lazily.
//!
//! ### Staging area
//!
//! Two disjoint path sets, pending additions and pending removals, kept in
//! `.sprig/staging.json`. The last request for a path wins.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, SprigError>`. Failures are detected
//! before anything is written, so a failed command leaves the persisted
//! state as it was. [`SprigError::user_message`] gives the wording shown by
//! the command-line tool.
//!
//! ## Module Organization
//!
//! - [`repository`]: The façade and its builder
//! - [`commit`]: Commit model and file snapshots
//! - [`hash`]: Digests and field framing
//! - [`store`]: Branch and commit persistence
//! - [`staging`]: Pending additions and removals
//! - [`worktree`]: Path normalisation and working-tree scans
//! - [`clock`]: Injectable time source
//! - [`types`]: Configuration and report types
//! - [`error`]: Error types and handling

// Public API modules
pub mod clock;
pub mod commit;
pub mod error;
pub mod hash;
pub mod repository;
pub mod staging;
pub mod store;
pub mod types;
pub mod worktree;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use commit::{Commit, FileSnapshot};
pub use error::{Result, SprigError};
pub use hash::{Digest, FieldHasher};
pub use repository::{Repository, RepositoryBuilder};
pub use staging::{RemoveOutcome, StagingArea};
pub use store::RepositoryStore;
pub use types::*;
pub use worktree::WorkingTree;
