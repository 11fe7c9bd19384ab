//! Progress tracking
//!
//! [`ProgressTracker`] is a bounded, monotonic counter with a display label.
//! It never exceeds its target and never goes backwards; a successful finish
//! always leaves it at the target.
//!
//! # Examples
//!
//! ```
//! use snowball::core::models::{BuildOperation, ProgressTracker};
//!
//! let mut tracker = ProgressTracker::new(3, BuildOperation::Run.labels());
//! tracker.advance(5);
//! assert_eq!(tracker.completed(), 3);
//!
//! tracker.finish(true);
//! assert_eq!(tracker.label(), "All 3 models executed successfully");
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use super::{BuildUnit, UnitStatus};

/// Label templates for one kind of operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLabels {
    /// Operations measured in build units
    Units {
        /// Label before any unit is seen
        initial: String,
        /// Verb shown with the most recent unit (`Running: revenue`)
        active: String,
        /// Past participle used in the terminal labels
        past: String,
        /// Noun used in the failure label
        failure: String,
        /// Participle counting finished units in the failure label
        tally: String,
    },
    /// Single-step operations
    Fixed {
        /// Label while running
        initial: String,
        /// Terminal success label
        success: String,
        /// Terminal failure label
        failure: String,
    },
}

impl ProgressLabels {
    /// Labels for a unit-tracking operation
    #[must_use]
    pub fn units(initial: &str, active: &str, past: &str, failure: &str, tally: &str) -> Self {
        Self::Units {
            initial: initial.to_string(),
            active: active.to_string(),
            past: past.to_string(),
            failure: failure.to_string(),
            tally: tally.to_string(),
        }
    }

    /// Labels for a single-step operation
    #[must_use]
    pub fn fixed(initial: &str, success: &str, failure: &str) -> Self {
        Self::Fixed {
            initial: initial.to_string(),
            success: success.to_string(),
            failure: failure.to_string(),
        }
    }

    /// Label shown before anything happened
    #[must_use]
    pub fn initial(&self) -> &str {
        match self {
            Self::Units { initial, .. } | Self::Fixed { initial, .. } => initial,
        }
    }

    /// Label for the most recently reported unit
    #[must_use]
    pub fn active(&self, unit: &str) -> String {
        match self {
            Self::Units { active, .. } => format!("{active}: {unit}"),
            Self::Fixed { initial, .. } => initial.clone(),
        }
    }

    /// Terminal label after success
    #[must_use]
    pub fn success(&self, target: usize) -> String {
        match self {
            Self::Units { past, .. } => format!("All {target} models {past} successfully"),
            Self::Fixed { success, .. } => success.clone(),
        }
    }

    /// Terminal label after failure
    #[must_use]
    pub fn failure(&self, completed: usize, target: usize) -> String {
        match self {
            Self::Units { failure, tally, .. } => {
                format!("{failure} failed ({completed}/{target} models {tally})")
            },
            Self::Fixed { failure, .. } => failure.clone(),
        }
    }
}

/// Lifecycle of a tracked run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Still in progress
    #[default]
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with a failure
    Failed,
}

/// Bounded monotonic progress counter
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    target: usize,
    completed: usize,
    /// Units in first-seen order
    units: IndexMap<String, UnitStatus>,
    label: String,
    labels: ProgressLabels,
    state: RunState,
}

impl ProgressTracker {
    /// Create a tracker; a target of zero is raised to one
    #[must_use]
    pub fn new(target: usize, labels: ProgressLabels) -> Self {
        Self {
            target: target.max(1),
            completed: 0,
            units: IndexMap::new(),
            label: labels.initial().to_string(),
            labels,
            state: RunState::Running,
        }
    }

    /// Fixed target count
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Completed count, always `<= target`
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Current display label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Units seen so far, keyed by id in first-seen order
    #[must_use]
    pub const fn known(&self) -> &IndexMap<String, UnitStatus> {
        &self.units
    }

    /// Completion percentage (0-100)
    #[must_use]
    pub const fn percent(&self) -> usize {
        self.completed * 100 / self.target
    }

    /// Increase the completed count by `n`, clamped to the target
    pub fn advance(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.completed = self.completed.saturating_add(n).min(self.target);
    }

    /// Replace the display label
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Apply newly discovered units, returning how many became complete
    ///
    /// Units already complete are ignored, as are repeated pending reports.
    /// The label follows the last unit applied.
    pub fn record(&mut self, discovered: &[BuildUnit]) -> usize {
        let mut newly_complete = 0;
        let mut last = None;

        for unit in discovered {
            let previous = self.units.get(&unit.id).copied();
            if previous.is_some_and(|status| status >= unit.status) {
                continue;
            }
            self.units.insert(unit.id.clone(), unit.status);
            if unit.is_complete() {
                newly_complete += 1;
            }
            last = Some(unit);
        }

        if let Some(unit) = last {
            self.label = self.labels.active(unit.short_name());
        }
        self.advance(newly_complete);
        newly_complete
    }

    /// Mark the run as finished
    ///
    /// On success the counter is forced to the target. On failure the
    /// counter is left where it is so the partial progress stays visible.
    pub fn finish(&mut self, success: bool) {
        if success {
            if self.completed < self.target {
                self.completed = self.target;
            }
            self.label = self.labels.success(self.target);
            self.state = RunState::Succeeded;
        } else {
            self.label = self.labels.failure(self.completed, self.target);
            self.state = RunState::Failed;
        }
    }

    /// Capture the current state for display or reporting
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            target: self.target,
            completed: self.completed,
            percent: self.percent(),
            label: self.label.clone(),
            state: self.state,
            units: self
                .units
                .iter()
                .map(|(id, status)| BuildUnit::new(id.clone(), *status))
                .collect(),
        }
    }
}

/// Point-in-time copy of a tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Target count
    pub target: usize,
    /// Completed count
    pub completed: usize,
    /// Completion percentage
    pub percent: usize,
    /// Display label
    pub label: String,
    /// Lifecycle state
    pub state: RunState,
    /// Units seen, in first-seen order
    pub units: Vec<BuildUnit>,
}
