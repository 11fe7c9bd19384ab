//! Batch file operations over compiled artifacts
//!
//! Each batch is best-effort: a failure on one item is recorded in the
//! [`BatchReport`] and the batch moves on. Paths outside the artifact layout
//! are counted as skipped, not failed. Nothing is rolled back.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::adapters::walker::{ArtifactGroup, ArtifactWalker, UnreadableEntry, WalkError};
use crate::core::models::{Artifact, FormatError, MODELS_ANCHOR};
use crate::core::services::{NotebookAssembler, SqlRewriter, TableRetarget};

/// Extension of compiled query files
pub const SQL_EXTENSION: &str = "sql";

/// Suffix and extension of generated notebook files
pub const NOTEBOOK_SUFFIX: &str = "_nb.ipynb";

/// Reading or writing a single artifact failed
#[derive(Debug, Error)]
pub enum ArtifactIoError {
    /// The artifact could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The output could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The document could not be serialized
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        /// Destination path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The artifact could not be reached while walking the tree
    #[error("cannot visit {path}: {source}")]
    Visit {
        /// Entry path
        path: PathBuf,
        /// Underlying walk error
        #[source]
        source: walkdir::Error,
    },

    /// The artifact path is outside the expected layout
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl From<UnreadableEntry> for ArtifactIoError {
    fn from(entry: UnreadableEntry) -> Self {
        Self::Visit {
            path: entry.path,
            source: entry.error,
        }
    }
}

/// Errors that stop a batch before any item is processed
#[derive(Debug, Error)]
pub enum BatchError {
    /// The input tree could not be walked
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The output directory could not be created
    #[error("failed to create {path}: {source}")]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

/// One failed item
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Item that failed
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Aggregate result of a batch operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Items considered
    pub total: usize,
    /// Items processed successfully
    pub succeeded: usize,
    /// Items left untouched (outside the layout or nothing to change)
    pub skipped: usize,
    /// Items that failed
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Whether no item failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// "K of N succeeded"
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} of {} succeeded", self.succeeded, self.total)
    }

    fn fail(&mut self, path: &Path, error: &ArtifactIoError) {
        log::warn!("{error}");
        self.failures.push(BatchFailure {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    /// Count every unreadable entry as a failed item
    fn fail_unreadable(&mut self, unreadable: Vec<UnreadableEntry>) {
        self.total += unreadable.len();
        for entry in unreadable {
            let path = entry.path.clone();
            self.fail(&path, &ArtifactIoError::from(entry));
        }
    }
}

/// Rewrite every compiled query under `root` into procedure form, in place
pub fn rewrite_all(root: &Path, rewriter: &SqlRewriter) -> Result<BatchReport, BatchError> {
    let walker = ArtifactWalker::new(root, SQL_EXTENSION)?;
    let listing = walker.scan();
    let mut report = BatchReport {
        total: listing.files.len(),
        ..BatchReport::default()
    };
    report.fail_unreadable(listing.unreadable);

    for path in &listing.files {
        match rewrite_one(path, walker.relative(path), rewriter) {
            Ok(()) => report.succeeded += 1,
            Err(ArtifactIoError::Format(e)) => {
                log::debug!("Skipping: {e}");
                report.skipped += 1;
            },
            Err(e) => report.fail(path, &e),
        }
    }

    log::info!("Rewrote {} procedure(s) under {}", report.succeeded, root.display());
    Ok(report)
}

fn rewrite_one(path: &Path, relative: &Path, rewriter: &SqlRewriter) -> Result<(), ArtifactIoError> {
    let text = read(path)?;
    let wrapped = rewriter.rewrite(&text, relative)?;
    write(path, &wrapped)
}

/// Replace the placeholder table in every matching model under `root`
///
/// Only files whose base name the retarget applies to are considered;
/// files without a placeholder reference are skipped and left untouched.
pub fn retarget_all(root: &Path, retarget: &TableRetarget) -> Result<BatchReport, BatchError> {
    let walker = ArtifactWalker::new(root, SQL_EXTENSION)?;
    let listing = walker.scan();
    let mut report = BatchReport::default();

    let applies = |path: &Path| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|name| retarget.applies_to(name))
    };
    report.fail_unreadable(listing.unreadable.into_iter().filter(|e| applies(e.path.as_path())).collect());

    for path in listing.files {
        if !applies(path.as_path()) {
            continue;
        }
        report.total += 1;

        let result = read(&path).and_then(|text| match retarget.apply(&text) {
            Cow::Borrowed(_) => Ok(false),
            Cow::Owned(updated) => write(&path, &updated).map(|()| true),
        });
        match result {
            Ok(true) => report.succeeded += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => report.fail(&path, &e),
        }
    }

    Ok(report)
}

/// Assemble one notebook per group under `root` into `out_dir`
///
/// Files sitting directly in a `models` directory have no category and are
/// skipped. A group whose files cannot all be read produces no document.
/// Entries the walk could not visit are reported as failures of their own;
/// the notebook of their group is still written from the readable files.
pub fn assemble_all(root: &Path, out_dir: &Path, assembler: &NotebookAssembler) -> Result<BatchReport, BatchError> {
    let walker = ArtifactWalker::new(root, SQL_EXTENSION)?;
    let listing = walker.scan();
    let groups = listing.groups();

    fs::create_dir_all(out_dir).map_err(|source| BatchError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut report = BatchReport {
        total: groups.len(),
        ..BatchReport::default()
    };
    report.fail_unreadable(listing.unreadable);

    for group in &groups {
        if group.name == MODELS_ANCHOR {
            log::debug!("Skipping {} file(s) without a category", group.files.len());
            report.skipped += 1;
            continue;
        }

        let target = notebook_path(out_dir, &group.name);
        match assemble_one(group, &target, assembler) {
            Ok(()) => {
                log::debug!("Wrote {}", target.display());
                report.succeeded += 1;
            },
            Err(ArtifactIoError::Format(e)) => {
                log::debug!("Skipping group {}: {e}", group.name);
                report.skipped += 1;
            },
            Err(e) => report.fail(&target, &e),
        }
    }

    log::info!("Generated {} notebook(s) in {}", report.succeeded, out_dir.display());
    Ok(report)
}

fn assemble_one(group: &ArtifactGroup, target: &Path, assembler: &NotebookAssembler) -> Result<(), ArtifactIoError> {
    let artifacts = group
        .files
        .iter()
        .map(|path| -> Result<Artifact, ArtifactIoError> {
            let text = read(path)?;
            Ok(Artifact::in_group(path.clone(), &group.name, text)?)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let doc = assembler.assemble(&group.name, &artifacts);
    let json = doc.to_json().map_err(|source| ArtifactIoError::Serialize {
        path: target.to_path_buf(),
        source,
    })?;
    write(target, &json)
}

/// Destination of the notebook for a group
#[must_use]
pub fn notebook_path(out_dir: &Path, group: &str) -> PathBuf {
    out_dir.join(format!("{group}{NOTEBOOK_SUFFIX}"))
}

fn read(path: &Path) -> Result<String, ArtifactIoError> {
    fs::read_to_string(path).map_err(|source| ArtifactIoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), ArtifactIoError> {
    fs::write(path, contents).map_err(|source| ArtifactIoError::Write {
        path: path.to_path_buf(),
        source,
    })
}
