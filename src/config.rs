//! Configuration management
//!
//! User configuration lives at `~/.snowball/config.toml` (or wherever
//! `--config` points). Every field is optional; missing values fall back to
//! defaults, and a missing database or schema is read from the dbt
//! `profiles.yml`.
//!
//! ```toml
//! [project]
//! project_dir = "/home/me/Downloads/snowball_dbt"
//! profiles_dir = "/home/me/Downloads/snowball_dbt"
//! output_dir = "/home/me/Downloads"
//!
//! [build]
//! executable = "dbt"
//! poll_interval_ms = 500
//!
//! [vars]
//! table = "arr_2024"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::BuildVars;
use crate::core::services::TableRetarget;
use crate::paths::{self, ProjectPaths};

/// Configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
}

/// A dbt profile could not be resolved
#[derive(Debug, Error)]
pub enum ProfileError {
    /// `profiles.yml` does not exist
    #[error("profiles.yml not found at: {0}")]
    NotFound(PathBuf),

    /// `profiles.yml` could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Profiles path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// `profiles.yml` is not valid YAML or has an unexpected shape
    #[error("invalid profiles file {path}: {source}")]
    Parse {
        /// Profiles path
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The named profile is absent
    #[error("profile '{0}' not found in profiles.yml")]
    MissingProfile(String),

    /// The named target is absent from the profile
    #[error("target '{target}' not found under profile '{profile}'")]
    MissingTarget {
        /// Profile name
        profile: String,
        /// Target name
        target: String,
    },
}

// =============================================================================
// Config file schema
// =============================================================================

/// Top-level snowball configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowballConfig {
    /// Project locations
    #[serde(default)]
    pub project: ProjectConfig,
    /// Build tool settings
    #[serde(default)]
    pub build: BuildConfig,
    /// Variables forwarded to every build
    #[serde(default)]
    pub vars: VarsConfig,
    /// Placeholder table replacement
    #[serde(default)]
    pub retarget: RetargetConfig,
}

/// Project locations; unset entries use the defaults under `~/Downloads`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// dbt project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<PathBuf>,
    /// Directory holding `profiles.yml` (defaults to the project root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,
    /// Where generated output goes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Build tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Executable to launch
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// Progress polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Profile name in `profiles.yml`
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Target name under the profile
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_executable() -> PathBuf {
    PathBuf::from("dbt")
}

const fn default_poll_interval_ms() -> u64 {
    500
}

fn default_profile() -> String {
    "Snowball_dbt".to_string()
}

fn default_target() -> String {
    "dev".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            poll_interval_ms: default_poll_interval_ms(),
            profile: default_profile(),
            target: default_target(),
        }
    }
}

impl BuildConfig {
    /// Polling interval, never zero
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Variables forwarded to every build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarsConfig {
    /// Target database; read from the profile when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Target schema; read from the profile when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Revenue table name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// Placeholder table replacement in the revenue model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetargetConfig {
    /// Base name of the model to patch
    #[serde(default = "default_retarget_model")]
    pub model: String,
    /// Table name shipped with the project
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_retarget_model() -> String {
    "revenue".to_string()
}

fn default_placeholder() -> String {
    "snowball_revenue".to_string()
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            model: default_retarget_model(),
            placeholder: default_placeholder(),
        }
    }
}

impl SnowballConfig {
    /// Get the default config file path
    #[must_use]
    pub fn config_path() -> PathBuf {
        paths::global_config()
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults; an unreadable or malformed one
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(Self::config_path, Path::to_path_buf);
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolved project locations
    #[must_use]
    pub fn paths(&self) -> ProjectPaths {
        let project_dir = self.project.project_dir.clone().unwrap_or_else(paths::default_project_dir);
        let profiles_dir = self.project.profiles_dir.clone().unwrap_or_else(|| project_dir.clone());
        let output_dir = self.project.output_dir.clone().unwrap_or_else(paths::default_output_dir);
        ProjectPaths::new(project_dir, profiles_dir, output_dir)
    }

    /// Build variables, filling a missing database or schema from the profile
    pub fn resolve_vars(&self) -> Result<BuildVars, ProfileError> {
        let table = self.vars.table.clone().unwrap_or_default();
        if let (Some(database), Some(schema)) = (&self.vars.database, &self.vars.schema) {
            return Ok(BuildVars {
                database: database.clone(),
                schema: schema.clone(),
                table,
            });
        }

        let profile = DbProfile::load(&self.paths().profiles_file(), &self.build.profile, &self.build.target)?;
        Ok(BuildVars {
            database: self.vars.database.clone().unwrap_or(profile.database),
            schema: self.vars.schema.clone().unwrap_or(profile.schema),
            table,
        })
    }

    /// Retarget for the configured table, if one is set
    #[must_use]
    pub fn retarget(&self) -> Option<TableRetarget> {
        self.vars
            .table
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|table| TableRetarget::new(&self.retarget.model, &self.retarget.placeholder, table))
    }
}

// =============================================================================
// dbt profiles
// =============================================================================

/// Connection details read from one profile target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbProfile {
    /// Adapter type, lowercased
    pub platform: String,
    /// Database (catalog on Databricks)
    pub database: String,
    /// Default schema
    pub schema: String,
    /// Worker threads
    pub threads: u32,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    #[serde(default)]
    outputs: HashMap<String, TargetOutput>,
}

#[derive(Debug, Default, Deserialize)]
struct TargetOutput {
    #[serde(rename = "type", default)]
    kind: String,
    database: Option<String>,
    catalog: Option<String>,
    dbname: Option<String>,
    schema: Option<String>,
    threads: Option<u32>,
}

impl DbProfile {
    /// Read `profile`/`target` from a `profiles.yml` file
    pub fn load(path: &Path, profile: &str, target: &str) -> Result<Self, ProfileError> {
        if !path.exists() {
            return Err(ProfileError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, profile, target).map_err(|e| match e {
            ProfileError::Parse { source, .. } => ProfileError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Read `profile`/`target` from `profiles.yml` text
    pub fn parse(content: &str, profile: &str, target: &str) -> Result<Self, ProfileError> {
        let parse_err = |source| ProfileError::Parse {
            path: PathBuf::new(),
            source,
        };

        // Top-level keys other than profiles (e.g. `config:`) have other shapes
        let profiles: HashMap<String, serde_yaml::Value> =
            serde_yaml::from_str::<Option<_>>(content).map_err(parse_err)?.unwrap_or_default();
        let entry = profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| ProfileError::MissingProfile(profile.to_string()))?;
        let mut entry: ProfileEntry = serde_yaml::from_value(entry).map_err(parse_err)?;

        let output = entry.outputs.remove(target).ok_or_else(|| ProfileError::MissingTarget {
            profile: profile.to_string(),
            target: target.to_string(),
        })?;

        let platform = output.kind.to_lowercase();
        let database = match platform.as_str() {
            "sqlserver" => output.database,
            "databricks" => output.catalog,
            _ => output.database.or(output.dbname),
        }
        .unwrap_or_default();

        Ok(Self {
            platform,
            database,
            schema: output.schema.unwrap_or_default(),
            threads: output.threads.unwrap_or(1),
        })
    }
}
