//! Error types for the sprig library
//!
//! This module defines all error types that can occur during repository
//! operations. Every variant is recoverable at the façade boundary: the
//! operation aborts before writing and the repository stays usable. The one
//! exception in spirit is [`SprigError::CorruptStore`], which aborts the
//! current invocation without any attempt to salvage partial state.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the sprig library
pub type Result<T> = std::result::Result<T, SprigError>;

/// Main error type for all sprig operations
#[derive(Debug, Error)]
pub enum SprigError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors while walking the working tree
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// `init` was run where a repository already exists
    #[error("Repository already exists at path: {0:?}")]
    AlreadyInitialized(PathBuf),

    /// Any operation other than `init` was run outside a repository
    #[error("Repository not initialized at path: {0:?}")]
    NotInitialized(PathBuf),

    /// The file named by `add` (or staged for a commit) does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// `rm` target is neither staged nor tracked by the head commit
    #[error("Nothing to remove: {0}")]
    NothingToRemove(String),

    /// A persisted file could not be decoded or violates a store invariant
    #[error("Corrupt store file {path:?}: {reason}")]
    CorruptStore {
        /// File that failed to load
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Command accepted by the dispatcher but not provided by this engine
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    /// `commit` with an empty staging area
    #[error("Nothing to commit")]
    NothingToCommit,

    /// Path escapes the repository root or points into the metadata directory
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File content is not valid UTF-8 text
    #[error("Not a text file: {0}")]
    NotText(String),

    /// String is not a well-formed digest
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// Branch name rejected by validation
    #[error("Invalid branch name: {0:?}")]
    InvalidBranchName(String),

    /// A branch with that name already exists
    #[error("Branch already exists: {0}")]
    BranchExists(String),

    /// No branch with that name exists
    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    /// The head branch cannot be deleted
    #[error("Cannot remove the current branch: {0}")]
    CannotRemoveCurrentBranch(String),

    /// Digest is not known to the store
    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SprigError {
    /// Create a corrupt-store error for the given file
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SprigError::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        SprigError::Internal(msg.into())
    }

    /// Check if this error leaves the repository usable for the next command
    pub fn is_recoverable(&self) -> bool {
        !self.is_corruption() && !matches!(self, SprigError::Internal(_))
    }

    /// Check if this error indicates corruption
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            SprigError::CorruptStore { .. } | SprigError::InvalidDigest(_)
        )
    }

    /// Get the message shown to a user at the command line
    pub fn user_message(&self) -> String {
        match self {
            SprigError::AlreadyInitialized(_) => {
                "A sprig version-control system already exists in the current directory.".to_string()
            }
            SprigError::NotInitialized(_) => {
                "Not in an initialized sprig directory. Run 'sprig init' first.".to_string()
            }
            SprigError::FileNotFound(_) => "File does not exist.".to_string(),
            SprigError::NothingToRemove(_) => "No reason to remove the file.".to_string(),
            SprigError::NothingToCommit => "No changes added to the commit.".to_string(),
            SprigError::UnsupportedCommand(name) => {
                format!("Command '{}' is not supported by this version of sprig.", name)
            }
            SprigError::BranchExists(_) => "A branch with that name already exists.".to_string(),
            SprigError::BranchNotFound(_) => "A branch with that name does not exist.".to_string(),
            SprigError::CannotRemoveCurrentBranch(_) => "Cannot remove the current branch.".to_string(),
            SprigError::CorruptStore { path, reason } => {
                format!("Repository data in {:?} is corrupt ({}). Nothing was changed.", path, reason)
            }
            _ => self.to_string(),
        }
    }
}
