//! Centralized path definitions for snowball
//!
//! This module provides a single source of truth for all filesystem paths
//! used by snowball. Nothing here touches the disk.
//!
//! ## Layout
//!
//! ```text
//! <project_dir>/                      # dbt project
//! ├── models/                         # Model sources (progress target count)
//! │   └── 10_core/revenue.sql
//! └── target/compiled/                # Compiled artifacts
//!     └── <project>/models/10_core/revenue.sql
//!
//! <profiles_dir>/profiles.yml         # dbt connection profiles
//!
//! <output_dir>/notebooks/             # Generated notebooks
//!     └── 10_core_nb.ipynb
//!
//! ~/.snowball/config.toml             # User configuration
//! ```

use std::path::{Path, PathBuf};

// =============================================================================
// Project-level paths
// =============================================================================

/// Model sources inside a dbt project
const MODELS_DIR: &str = "models";

/// Compiled artifacts inside a dbt project
const COMPILED_DIR: &str = "target/compiled";

/// dbt profiles filename
const PROFILES_FILE: &str = "profiles.yml";

/// Generated notebooks inside the output directory
const NOTEBOOKS_DIR: &str = "notebooks";

/// Directories a pipeline reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// dbt project root
    pub project_dir: PathBuf,
    /// Directory holding `profiles.yml`
    pub profiles_dir: PathBuf,
    /// Where generated output goes
    pub output_dir: PathBuf,
}

impl ProjectPaths {
    /// Bundle the three configured roots
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>, profiles_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            profiles_dir: profiles_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Get path to `<project>/models/`.
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.project_dir.join(MODELS_DIR)
    }

    /// Get path to `<project>/target/compiled/`.
    #[must_use]
    pub fn compiled_dir(&self) -> PathBuf {
        self.project_dir.join(COMPILED_DIR)
    }

    /// Get path to `<profiles>/profiles.yml`.
    #[must_use]
    pub fn profiles_file(&self) -> PathBuf {
        profiles_file(&self.profiles_dir)
    }

    /// Get path to `<output>/notebooks/`.
    #[must_use]
    pub fn notebooks_dir(&self) -> PathBuf {
        self.output_dir.join(NOTEBOOKS_DIR)
    }
}

/// Get path to `profiles.yml` inside a profiles directory.
#[must_use]
pub fn profiles_file(profiles_dir: &Path) -> PathBuf {
    profiles_dir.join(PROFILES_FILE)
}

// =============================================================================
// Global paths (user-level)
// =============================================================================

/// Global config directory name
const GLOBAL_DIR: &str = ".snowball";

/// Global config filename
const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Directory the default project locations live under
const DEFAULT_BASE_DIR: &str = "Downloads";

/// Default dbt project directory name
const DEFAULT_PROJECT_NAME: &str = "snowball_dbt";

/// Get the user's home directory, `.` when unknown.
#[must_use]
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Get the global snowball directory.
///
/// Returns `~/.snowball/`.
#[must_use]
pub fn global_config_dir() -> PathBuf {
    home_dir().join(GLOBAL_DIR)
}

/// Get the global config file path.
///
/// Returns `~/.snowball/config.toml`.
#[must_use]
pub fn global_config() -> PathBuf {
    global_config_dir().join(GLOBAL_CONFIG_FILE)
}

/// Default project directory: `~/Downloads/snowball_dbt`.
#[must_use]
pub fn default_project_dir() -> PathBuf {
    default_output_dir().join(DEFAULT_PROJECT_NAME)
}

/// Default output directory: `~/Downloads`.
#[must_use]
pub fn default_output_dir() -> PathBuf {
    home_dir().join(DEFAULT_BASE_DIR)
}
