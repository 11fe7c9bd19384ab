//! Compiled query artifacts
//!
//! Artifacts are generated `.sql` files laid out as
//! `.../models/<category>/<name>.sql`, where `<category>` carries a leading
//! ordering token (`10_core`) that is stripped before it is used in names.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Path segment that anchors the category lookup
pub const MODELS_ANCHOR: &str = "models";

/// A path that does not follow the artifact layout
///
/// These are treated as out-of-scope content and skipped, not reported as
/// failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// No `models` segment in the path
    #[error("no `{MODELS_ANCHOR}` segment in {0}")]
    MissingAnchor(PathBuf),

    /// Nothing but the file name follows the anchor
    #[error("no category directory after `{MODELS_ANCHOR}` in {0}")]
    MissingCategory(PathBuf),

    /// Category is empty once the ordering prefix is removed
    #[error("empty category in {0}")]
    EmptyCategory(PathBuf),

    /// Path has no file name
    #[error("no file name in {0}")]
    MissingName(PathBuf),

    /// A path segment is not valid UTF-8
    #[error("non UTF-8 segment in {0}")]
    NonUtf8(PathBuf),
}

/// Naming derived from an artifact path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    /// Category (schema) name, ordering prefix removed
    pub category: String,
    /// File name without extension
    pub name: String,
}

impl ArtifactLocation {
    /// Derive category and base name from a path relative to the compiled root
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use snowball::core::models::ArtifactLocation;
    ///
    /// let loc = ArtifactLocation::parse(Path::new("proj/models/10_core/revenue.sql")).unwrap();
    /// assert_eq!(loc.category, "core");
    /// assert_eq!(loc.name, "revenue");
    /// ```
    pub fn parse(relative: &Path) -> Result<Self, FormatError> {
        let segments = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s),
                _ => None,
            })
            .map(|s| s.to_str().ok_or_else(|| FormatError::NonUtf8(relative.to_path_buf())))
            .collect::<Result<Vec<&str>, _>>()?;

        let anchor = segments
            .iter()
            .position(|s| *s == MODELS_ANCHOR)
            .ok_or_else(|| FormatError::MissingAnchor(relative.to_path_buf()))?;

        // The segment after the anchor must be a directory, not the file itself
        if anchor + 2 >= segments.len() {
            return Err(FormatError::MissingCategory(relative.to_path_buf()));
        }

        let category = strip_ordering_prefix(segments[anchor + 1]);
        if category.is_empty() {
            return Err(FormatError::EmptyCategory(relative.to_path_buf()));
        }

        let name = base_name(relative).ok_or_else(|| FormatError::MissingName(relative.to_path_buf()))?;

        Ok(Self {
            category: category.to_string(),
            name,
        })
    }

    /// Fully qualified table name: `category.name`
    #[must_use]
    pub fn table(&self) -> String {
        format!("{}.{}", self.category, self.name)
    }

    /// Fully qualified procedure name: `category.sp_name`
    #[must_use]
    pub fn procedure(&self) -> String {
        format!("{}.sp_{}", self.category, self.name)
    }
}

/// Remove the ordering token before the first underscore (`10_core` -> `core`)
///
/// Names without an underscore are returned unchanged.
#[must_use]
pub fn strip_ordering_prefix(dir: &str) -> &str {
    dir.split_once('_').map_or(dir, |(_, rest)| rest)
}

/// File name without its extension
#[must_use]
pub fn base_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// A discovered artifact with its raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Location on disk
    pub path: PathBuf,
    /// Naming used in generated statements
    pub location: ArtifactLocation,
    /// Raw query text
    pub text: String,
}

impl Artifact {
    /// Build an artifact that belongs to the given group directory
    ///
    /// The category comes from the group directory name rather than from the
    /// `models` anchor, so notebook groups such as `tests` are accepted too.
    pub fn in_group(path: PathBuf, group: &str, text: String) -> Result<Self, FormatError> {
        let category = strip_ordering_prefix(group);
        if category.is_empty() {
            return Err(FormatError::EmptyCategory(path));
        }
        let name = base_name(&path).ok_or_else(|| FormatError::MissingName(path.clone()))?;
        Ok(Self {
            location: ArtifactLocation {
                category: category.to_string(),
                name,
            },
            path,
            text,
        })
    }
}
