//! Working-tree access
//!
//! The working tree is the user's directory. This module turns user-supplied
//! paths into normalised repository-relative paths, reads and deletes plain
//! files, and scans the tree for `status`.
//!
//! ## Path form
//!
//! Repository paths are `/`-separated and relative to the root: `src/main.rs`,
//! never `./src/main.rs` or `src\main.rs`. [`WorkingTree::normalize`] is the
//! only way user input becomes a repository path.
//!
//! ## Scanning
//!
//! [`WorkingTree::files`] walks the tree with the `ignore` crate. Hidden files
//! are included, `.gitignore` and `.sprigignore` files are honoured, and the
//! metadata directory at the root is always skipped. A nested directory that
//! happens to be named `.sprig` is ordinary content.

use crate::error::{Result, SprigError};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// Name of the repository metadata directory
pub const METADATA_DIR: &str = ".sprig";
/// Per-repository ignore file, same syntax as `.gitignore`
pub const IGNORE_FILE: &str = ".sprigignore";

/// Handle on the directory being versioned
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    /// Working tree rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalise a user-supplied path into repository form
    ///
    /// `.` components are dropped and `..` is resolved lexically. Absolute
    /// paths are accepted when they lie under the root.
    ///
    /// # Errors
    ///
    /// - [`SprigError::InvalidPath`] if the path is empty, escapes the root,
    ///   or points into the metadata directory
    pub fn normalize(&self, path: &str) -> Result<String> {
        let invalid = || SprigError::InvalidPath(path.to_string());

        let candidate = Path::new(path);
        let relative = if candidate.is_absolute() {
            self.strip_root(candidate).ok_or_else(invalid)?
        } else {
            candidate.to_path_buf()
        };

        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop().ok_or_else(invalid)?;
                }
                Component::Normal(part) => {
                    parts.push(part.to_str().ok_or_else(invalid)?.to_string());
                }
                Component::RootDir | Component::Prefix(_) => return Err(invalid()),
            }
        }

        if parts.is_empty() || parts[0] == METADATA_DIR {
            return Err(invalid());
        }

        Ok(parts.join("/"))
    }

    /// Strip the root from an absolute path, lexically first and then with
    /// both sides canonicalised
    fn strip_root(&self, path: &Path) -> Option<PathBuf> {
        if let Ok(relative) = path.strip_prefix(&self.root) {
            return Some(relative.to_path_buf());
        }
        let root = self.root.canonicalize().ok()?;
        path.strip_prefix(&root).ok().map(Path::to_path_buf)
    }

    /// Absolute location of a repository path
    pub fn absolute(&self, path: &str) -> PathBuf {
        path.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Whether a repository path names an existing regular file
    pub fn is_file(&self, path: &str) -> bool {
        self.absolute(path).is_file()
    }

    /// Read a file as UTF-8 text
    ///
    /// # Errors
    ///
    /// - [`SprigError::FileNotFound`] if the file does not exist
    /// - [`SprigError::NotText`] if the content is not valid UTF-8
    pub fn read(&self, path: &str) -> Result<String> {
        let bytes = match fs::read(self.absolute(path)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SprigError::FileNotFound(path.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes).map_err(|_| SprigError::NotText(path.to_string()))
    }

    /// Delete a file if it exists; returns whether anything was deleted
    pub fn remove(&self, path: &str) -> Result<bool> {
        let absolute = self.absolute(path);
        if !absolute.is_file() {
            return Ok(false);
        }
        fs::remove_file(&absolute)?;
        trace!("Deleted working file {}", path);
        Ok(true)
    }

    /// Every regular file in the working tree, in repository form
    pub fn files(&self) -> Result<BTreeSet<String>> {
        let mut files = BTreeSet::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .parents(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(false)
            .require_git(false)
            .add_custom_ignore_filename(IGNORE_FILE)
            .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == METADATA_DIR))
            .build();

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let parts: Option<Vec<&str>> = relative
                .components()
                .map(|component| component.as_os_str().to_str())
                .collect();
            if let Some(parts) = parts {
                files.insert(parts.join("/"));
            }
        }

        trace!("Scanned {} working files", files.len());
        Ok(files)
    }
}
