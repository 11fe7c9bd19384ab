//! Artifact discovery
//!
//! Walks a root directory for files with a given extension. Results are
//! sorted so that everything generated from them (notebook cell order,
//! batch reports) is reproducible across runs.
//!
//! # Examples
//!
//! ```no_run
//! use snowball::adapters::walker::ArtifactWalker;
//!
//! let walker = ArtifactWalker::new("target/compiled", "sql").unwrap();
//! for group in walker.grouped() {
//!     println!("{}: {} files", group.name, group.files.len());
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur while walking
#[derive(Debug, Error)]
pub enum WalkError {
    /// Root path does not exist
    #[error("root path does not exist: {0}")]
    RootNotFound(PathBuf),

    /// Path is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// An entry below the root that could not be visited
///
/// Dangling symlinks and unreadable directories end up here instead of
/// aborting the walk.
#[derive(Debug)]
pub struct UnreadableEntry {
    /// Path of the entry, or the root when walkdir reports none
    pub path: PathBuf,
    /// What went wrong
    pub error: walkdir::Error,
}

/// Result of one walk: matching files plus the entries that failed
#[derive(Debug, Default)]
pub struct WalkListing {
    /// Matching files, sorted by path
    pub files: Vec<PathBuf>,
    /// Entries that could not be visited and may have been artifacts
    pub unreadable: Vec<UnreadableEntry>,
}

impl WalkListing {
    /// Matching files grouped by immediate parent directory name
    ///
    /// Groups are ordered by name and members by file name. Directories
    /// that share a name in different places of the tree form one group.
    #[must_use]
    pub fn groups(&self) -> Vec<ArtifactGroup> {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for path in &self.files {
            let name = path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            groups.entry(name).or_default().push(path.clone());
        }

        groups
            .into_iter()
            .map(|(name, mut files)| {
                files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
                ArtifactGroup { name, files }
            })
            .collect()
    }
}

/// Files sharing one parent directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactGroup {
    /// Parent directory name, as found on disk
    pub name: String,
    /// Absolute file paths, sorted by file name
    pub files: Vec<PathBuf>,
}

/// Enumerates artifact files under a root
#[derive(Debug, Clone)]
pub struct ArtifactWalker {
    root: PathBuf,
    extension: String,
}

impl ArtifactWalker {
    /// Create a walker for files ending in `.extension` under `root`
    pub fn new(root: impl AsRef<Path>, extension: &str) -> Result<Self, WalkError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            return Err(WalkError::RootNotFound(root));
        }
        if !root.is_dir() {
            return Err(WalkError::NotADirectory(root));
        }
        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    /// Walk the tree once
    ///
    /// Only a missing or non-directory root is fatal, and that is checked in
    /// [`ArtifactWalker::new`]. Entries that fail to load are collected in
    /// [`WalkListing::unreadable`] when they could be matching files or
    /// directories holding them.
    #[must_use]
    pub fn scan(&self) -> WalkListing {
        let root = &self.root;
        let mut listing = WalkListing::default();

        for entry in WalkDir::new(root).follow_links(true).into_iter().filter_entry(|e| {
            // Don't filter the root directory itself
            if e.path() == root {
                return true;
            }
            !Self::is_hidden(e)
        }) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.has_extension(entry.path()) {
                        listing.files.push(entry.into_path());
                    }
                },
                Err(error) => {
                    let path = error.path().map_or_else(|| root.clone(), Path::to_path_buf);
                    if path.extension().is_none() || self.has_extension(&path) {
                        log::warn!("Cannot visit {}: {error}", path.display());
                        listing.unreadable.push(UnreadableEntry { path, error });
                    } else {
                        log::debug!("Ignoring unreadable {}: {error}", path.display());
                    }
                },
            }
        }

        listing.files.sort();
        listing
    }

    /// Every matching file that could be visited, sorted by path
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.scan().files
    }

    /// Visitable matching files grouped by immediate parent directory name
    #[must_use]
    pub fn grouped(&self) -> Vec<ArtifactGroup> {
        self.scan().groups()
    }

    /// Path relative to the root (the path itself if outside it)
    #[must_use]
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Check if an entry is hidden (starts with .)
    fn is_hidden(entry: &walkdir::DirEntry) -> bool {
        entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
    }
}
