//! Build unit model
//!
//! A build unit is a named item (a model) the external build tool reports on.
//! Units are created the first time a recognition rule matches them and are
//! never removed within a run.

use serde::{Deserialize, Serialize};

/// Status of a build unit
///
/// Ordered: a unit may move from `Pending` to `Complete`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Reported as started
    #[default]
    Pending,
    /// Reported as finished
    Complete,
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// A unit discovered in the build output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildUnit {
    /// Qualified name as printed by the build tool (e.g. `project.core.revenue`)
    pub id: String,
    /// Current status
    pub status: UnitStatus,
}

impl BuildUnit {
    /// Create a unit with the given status
    #[must_use]
    pub fn new(id: impl Into<String>, status: UnitStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }

    /// Create a completed unit
    #[must_use]
    pub fn complete(id: impl Into<String>) -> Self {
        Self::new(id, UnitStatus::Complete)
    }

    /// Last dotted segment of the id, used for display
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.id.rsplit('.').next().unwrap_or(&self.id)
    }

    /// Whether the unit has finished
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == UnitStatus::Complete
    }
}
