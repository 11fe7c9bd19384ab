//! Build operations and the command line they expand to
//!
//! A [`BuildRequest`] describes one invocation of the external build tool:
//! which operation to run, where the project and its profiles live, and the
//! variables payload handed over as a single JSON-encoded argument.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ProgressLabels;

/// Name of the setup macro executed before a full run
pub const PRE_RUN_SETUP_MACRO: &str = "pre_run_setup";

/// An operation understood by the external build tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildOperation {
    /// Install package dependencies
    Deps,
    /// Load seed files (the column mapping)
    Seed,
    /// Check the connection and profile
    Debug,
    /// Build every model
    Run,
    /// Compile every model without executing it
    Compile,
    /// Execute a named macro
    RunOperation {
        /// Macro name
        name: String,
    },
}

impl BuildOperation {
    /// The operation keyword passed as the first argument
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Deps => "deps",
            Self::Seed => "seed",
            Self::Debug => "debug",
            Self::Run => "run",
            Self::Compile => "compile",
            Self::RunOperation { .. } => "run-operation",
        }
    }

    /// Whether progress is measured in individual build units
    ///
    /// Only model runs and compilations report per-model completion lines;
    /// everything else is tracked as a single unit.
    #[must_use]
    pub const fn tracks_units(&self) -> bool {
        matches!(self, Self::Run | Self::Compile)
    }

    /// Gauge labels for this operation
    #[must_use]
    pub fn labels(&self) -> ProgressLabels {
        match self {
            Self::Run => ProgressLabels::units("Running dbt models", "Running", "executed", "Execution", "completed"),
            Self::Compile => ProgressLabels::units(
                "Compiling dbt models",
                "Compiling",
                "compiled",
                "Compilation",
                "compiled",
            ),
            Self::Deps => ProgressLabels::fixed(
                "Installing dependencies",
                "Dependencies installed",
                "Dependencies failed",
            ),
            Self::Seed => ProgressLabels::fixed(
                "Updating mapping file",
                "Updated mapping file",
                "Failed to update mapping file",
            ),
            Self::Debug => ProgressLabels::fixed(
                "Establishing connection",
                "Connection established",
                "Connection failed",
            ),
            Self::RunOperation { name } => ProgressLabels::fixed(
                &format!("Running {name} macro"),
                &format!("Macro {name} completed"),
                &format!("Macro {name} failed"),
            ),
        }
    }
}

impl std::fmt::Display for BuildOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunOperation { name } => write!(f, "run-operation {name}"),
            other => write!(f, "{}", other.keyword()),
        }
    }
}

impl std::str::FromStr for BuildOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deps" => Ok(Self::Deps),
            "seed" => Ok(Self::Seed),
            "debug" => Ok(Self::Debug),
            "run" => Ok(Self::Run),
            "compile" => Ok(Self::Compile),
            other => other
                .strip_prefix("run-operation:")
                .filter(|name| !name.is_empty())
                .map(|name| Self::RunOperation {
                    name: name.to_string(),
                })
                .ok_or_else(|| {
                    format!(
                        "Invalid operation: {s}. Use: deps, seed, debug, run, compile, run-operation:<macro>"
                    )
                }),
        }
    }
}

/// Database coordinates forwarded to the build as variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVars {
    /// Target database (catalog on Databricks)
    pub database: String,
    /// Target schema
    pub schema: String,
    /// Revenue table name
    pub table: String,
}

impl BuildVars {
    /// The `--vars` payload
    #[must_use]
    pub fn vars_payload(&self) -> BTreeMap<&'static str, &str> {
        BTreeMap::from([
            ("my_database", self.database.as_str()),
            ("my_schema", self.schema.as_str()),
            ("my_table", self.table.as_str()),
        ])
    }

    /// The `--args` payload for the setup macro
    #[must_use]
    pub fn macro_args_payload(&self) -> BTreeMap<&'static str, &str> {
        BTreeMap::from([
            ("db_name", self.database.as_str()),
            ("schema_name", self.schema.as_str()),
            ("table_name", self.table.as_str()),
        ])
    }
}

/// Everything needed to start one build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Operation to run
    pub operation: BuildOperation,
    /// Project directory (also the working directory of the child)
    pub project_dir: PathBuf,
    /// Directory containing `profiles.yml`
    pub profiles_dir: PathBuf,
    /// Variables payload
    pub vars: BuildVars,
}

impl BuildRequest {
    /// Create a new request
    #[must_use]
    pub const fn new(
        operation: BuildOperation,
        project_dir: PathBuf,
        profiles_dir: PathBuf,
        vars: BuildVars,
    ) -> Self {
        Self {
            operation,
            project_dir,
            profiles_dir,
            vars,
        }
    }

    /// Expand the request into the argument list for the build tool
    pub fn to_args(&self) -> Result<Vec<String>, serde_json::Error> {
        let mut args = vec![self.operation.keyword().to_string()];
        if let BuildOperation::RunOperation { name } = &self.operation {
            args.push(name.clone());
        }

        args.push("--project-dir".to_string());
        args.push(self.project_dir.to_string_lossy().into_owned());
        args.push("--profiles-dir".to_string());
        args.push(self.profiles_dir.to_string_lossy().into_owned());
        args.push("--vars".to_string());
        args.push(serde_json::to_string(&self.vars.vars_payload())?);

        if matches!(self.operation, BuildOperation::RunOperation { .. }) {
            args.push("--args".to_string());
            args.push(serde_json::to_string(&self.vars.macro_args_payload())?);
        }

        Ok(args)
    }
}
