//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use colored::Colorize;
use serde::Serialize;

use crate::adapters::BatchReport;
use crate::config::DbProfile;
use crate::core::models::RunState;
use crate::runner::{PipelineReport, RunOutcome};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn finished_at() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn status_mark(state: RunState) -> String {
    match state {
        RunState::Succeeded => "✓".green().to_string(),
        RunState::Failed => "✗".red().to_string(),
        RunState::Running => "…".yellow().to_string(),
    }
}

/// Result of a single build operation
#[derive(Debug, Serialize)]
pub struct BuildResult {
    /// When the operation finished (RFC3339)
    pub finished_at: String,
    /// The outcome, including final progress
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl BuildResult {
    /// Wrap a finished outcome
    #[must_use]
    pub fn new(outcome: RunOutcome) -> Self {
        Self {
            finished_at: finished_at(),
            outcome,
        }
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => render_step(&self.outcome),
            OutputMode::Json => print_json(self),
        }
    }
}

fn render_step(outcome: &RunOutcome) {
    let progress = &outcome.progress;
    println!(
        "{} {:<28} {}",
        status_mark(progress.state),
        outcome.operation.to_string().bold(),
        progress.label
    );
}

/// Result of a batch file operation
#[derive(Debug, Serialize)]
pub struct BatchResult {
    /// What was done (`rewrite`, `assemble`)
    pub action: String,
    /// When the batch finished (RFC3339)
    pub finished_at: String,
    /// Aggregate counts
    #[serde(flatten)]
    pub report: BatchReport,
}

impl BatchResult {
    /// Wrap a batch report
    #[must_use]
    pub fn new(action: &str, report: BatchReport) -> Self {
        Self {
            action: action.to_string(),
            finished_at: finished_at(),
            report,
        }
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => render_batch(&self.action, &self.report),
            OutputMode::Json => print_json(self),
        }
    }
}

fn render_batch(action: &str, report: &BatchReport) {
    let summary = report.summary();
    let summary = if report.is_clean() {
        summary.green()
    } else {
        summary.red()
    };
    print!("{}: {summary}", action.bold());
    if report.skipped > 0 {
        print!(" ({} skipped)", report.skipped);
    }
    println!();
    for failure in &report.failures {
        println!("  {} {}: {}", "✗".red(), failure.path.display(), failure.error);
    }
}

/// Result of a full pipeline
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    /// Pipeline name (`sql`, `notebooks`)
    pub pipeline: String,
    /// Whether every step and item succeeded
    pub success: bool,
    /// When the pipeline finished (RFC3339)
    pub finished_at: String,
    /// Step and batch details
    #[serde(flatten)]
    pub report: PipelineReport,
}

impl PipelineResult {
    /// Wrap a pipeline report
    #[must_use]
    pub fn new(pipeline: &str, report: PipelineReport) -> Self {
        let batches_clean = [&report.rewrite, &report.retarget, &report.notebooks]
            .into_iter()
            .flatten()
            .all(BatchReport::is_clean);
        Self {
            pipeline: pipeline.to_string(),
            success: batches_clean && report.steps.iter().all(|s| s.success),
            finished_at: finished_at(),
            report,
        }
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => {
                for step in &self.report.steps {
                    render_step(step);
                }
                if let Some(rewrite) = &self.report.rewrite {
                    render_batch("procedures", rewrite);
                }
                if let Some(retarget) = &self.report.retarget {
                    render_batch("retarget", retarget);
                }
                if let Some(notebooks) = &self.report.notebooks {
                    render_batch("notebooks", notebooks);
                }
            },
            OutputMode::Json => print_json(self),
        }
    }
}

/// Connection details from `profiles.yml`
#[derive(Debug, Serialize)]
pub struct ProfileResult {
    /// Profile name
    pub profile: String,
    /// Target name
    pub target: String,
    /// Resolved details
    #[serde(flatten)]
    pub details: DbProfile,
}

impl ProfileResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => {
                println!("{} ({})", self.profile.bold(), self.target);
                println!("  platform: {}", self.details.platform);
                println!("  database: {}", self.details.database);
                println!("  schema:   {}", self.details.schema);
                println!("  threads:  {}", self.details.threads);
            },
            OutputMode::Json => print_json(self),
        }
    }
}
