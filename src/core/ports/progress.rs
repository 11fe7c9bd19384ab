//! Progress display port
//!
//! The runner pushes snapshots here; how they are drawn is up to the
//! implementation. Rendering is cosmetic and carries no contract.

use crate::core::models::ProgressSnapshot;

/// Receives progress snapshots during a run
pub trait ProgressReporter {
    /// A run is starting
    fn start(&mut self, snapshot: &ProgressSnapshot) {
        self.update(snapshot);
    }

    /// Progress or label changed
    fn update(&mut self, snapshot: &ProgressSnapshot);

    /// The run reached a terminal state
    fn finish(&mut self, snapshot: &ProgressSnapshot) {
        self.update(snapshot);
    }
}

/// Discards all progress (JSON output, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn update(&mut self, _snapshot: &ProgressSnapshot) {}
}
