//! Terminal progress gauge
//!
//! Implements `ProgressReporter` with an `indicatif` bar. The bar is
//! created on the first snapshot and sized to its target.

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::models::{ProgressSnapshot, RunState};
use crate::core::ports::ProgressReporter;

/// Width of the drawn bar in columns
const BAR_WIDTH: usize = 40;

/// Draws progress snapshots as a console bar
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    /// Create a reporter; nothing is drawn until the first snapshot
    #[must_use]
    pub const fn new() -> Self {
        Self { bar: None }
    }

    fn bar(&mut self, target: u64) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(target);
            bar.set_style(bar_style());
            bar
        })
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!("{{msg}}  {{percent:>3}}%|{{bar:{BAR_WIDTH}.green}}|"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉ ")
}

fn as_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl ProgressReporter for ConsoleReporter {
    fn update(&mut self, snapshot: &ProgressSnapshot) {
        let bar = self.bar(as_u64(snapshot.target));
        bar.set_length(as_u64(snapshot.target));
        bar.set_position(as_u64(snapshot.completed));
        bar.set_message(snapshot.label.clone());
    }

    fn finish(&mut self, snapshot: &ProgressSnapshot) {
        self.update(snapshot);
        if let Some(bar) = self.bar.take() {
            match snapshot.state {
                RunState::Succeeded => bar.finish_with_message(snapshot.label.clone()),
                RunState::Failed | RunState::Running => bar.abandon_with_message(snapshot.label.clone()),
            }
        }
    }
}
