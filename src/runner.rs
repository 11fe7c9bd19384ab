//! Build orchestration
//!
//! The [`Runner`] starts one build invocation, watches its output while it
//! runs, and feeds what it finds into a [`ProgressTracker`]. It then drives
//! the post-processing pipelines over the compiled artifacts.
//!
//! Progress is polled on a fixed interval. Each tick re-scans the whole
//! buffer, but only when it grew since the last scan, so a quiet build costs
//! nothing. One last scan runs after the exit event so units that finished
//! inside the final interval are still counted.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};

use crate::adapters::file::{self, BatchError, BatchReport, SQL_EXTENSION};
use crate::adapters::walker::ArtifactWalker;
use crate::core::models::{
    BuildOperation, BuildRequest, BuildVars, PRE_RUN_SETUP_MACRO, ProgressSnapshot, ProgressTracker,
};
use crate::core::ports::{BuildEvent, BuildInvoker, InvocationError, ProgressReporter};
use crate::core::services::{NotebookAssembler, ProgressExtractor, SqlRewriter, TableRetarget};
use crate::paths::ProjectPaths;

/// The build tool ran but reported failure
#[derive(Debug, Clone, Error)]
#[error("{operation} failed: {}", .progress.label)]
pub struct InvocationFailure {
    /// Operation that failed
    pub operation: BuildOperation,
    /// Progress at the time of failure
    pub progress: ProgressSnapshot,
}

/// Anything that stops a pipeline
#[derive(Debug, Error)]
pub enum RunError {
    /// The build tool could not be started
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// A build step reported failure
    #[error(transparent)]
    Failed(#[from] InvocationFailure),

    /// Post-processing could not start
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Result of one tracked invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Operation that ran
    pub operation: BuildOperation,
    /// Whether the tool reported success
    pub success: bool,
    /// Full captured output
    #[serde(skip)]
    pub log: String,
    /// Final progress
    pub progress: ProgressSnapshot,
}

impl RunOutcome {
    /// Turn a non-success outcome into an [`InvocationFailure`]
    pub fn ensure_success(&self) -> Result<(), InvocationFailure> {
        if self.success {
            Ok(())
        } else {
            Err(InvocationFailure {
                operation: self.operation.clone(),
                progress: self.progress.clone(),
            })
        }
    }
}

/// What the runner observed between two loop iterations
enum Step {
    Event(Option<BuildEvent>),
    Tick,
}

/// Runs build invocations with live progress
#[derive(Debug, Clone)]
pub struct Runner<I> {
    invoker: I,
    poll_interval: Duration,
}

impl<I: BuildInvoker> Runner<I> {
    /// Create a runner polling every `poll_interval`
    #[must_use]
    pub fn new(invoker: I, poll_interval: Duration) -> Self {
        Self {
            invoker,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// The underlying invoker
    #[must_use]
    pub const fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Run one invocation to completion
    ///
    /// `target` is the expected number of build units; it only applies to
    /// operations that report units and is raised to at least one. Fails
    /// only when the tool cannot be started; a tool that runs and fails
    /// yields an outcome with `success == false`.
    pub async fn run(
        &self,
        request: &BuildRequest,
        target: usize,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<RunOutcome, InvocationError> {
        let operation = &request.operation;
        let target = if operation.tracks_units() { target } else { 1 };
        let extractor = ProgressExtractor::for_operation(operation);
        let mut tracker = ProgressTracker::new(target, operation.labels());

        let mut handle = self.invoker.start(request)?;
        log::debug!("Started {operation} (target {})", tracker.target());
        reporter.start(&tracker.snapshot());

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut scanned = 0;

        while handle.is_running() {
            let step = tokio::select! {
                event = handle.next_event() => Step::Event(event),
                _ = ticker.tick() => Step::Tick,
            };

            match step {
                Step::Event(event) => handle.apply(event),
                Step::Tick => {
                    let buffer = handle.snapshot();
                    if buffer.len() > scanned {
                        scanned = buffer.len();
                        scan(&extractor, buffer, &mut tracker, reporter);
                    }
                },
            }
        }

        scan(&extractor, handle.snapshot(), &mut tracker, reporter);
        let outcome = handle.into_outcome();
        tracker.finish(outcome.success);

        let progress = tracker.snapshot();
        reporter.finish(&progress);
        if outcome.success {
            log::info!("{}", progress.label);
        } else {
            log::warn!("{}", progress.label);
        }

        Ok(RunOutcome {
            operation: operation.clone(),
            success: outcome.success,
            log: outcome.log,
            progress,
        })
    }

    /// Run one invocation and fail on a non-success outcome
    pub async fn run_checked(
        &self,
        request: &BuildRequest,
        target: usize,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<RunOutcome, RunError> {
        let outcome = self.run(request, target, reporter).await?;
        if !outcome.success {
            log::debug!("Output of failed {}:\n{}", outcome.operation, outcome.log);
        }
        outcome.ensure_success()?;
        Ok(outcome)
    }
}

/// Apply whatever the buffer reveals that the tracker does not know yet
fn scan(
    extractor: &ProgressExtractor,
    buffer: &str,
    tracker: &mut ProgressTracker,
    reporter: &mut dyn ProgressReporter,
) {
    if extractor.is_empty() {
        return;
    }
    let discovered = extractor.extract(buffer, tracker.known());
    if discovered.is_empty() {
        return;
    }
    let completed = tracker.record(&discovered);
    log::trace!("{} unit(s) discovered, {completed} newly complete", discovered.len());
    reporter.update(&tracker.snapshot());
}

/// Number of model sources in a project, used as the progress target
///
/// A project without a `models/` directory counts as zero.
#[must_use]
pub fn count_models(paths: &ProjectPaths) -> usize {
    ArtifactWalker::new(paths.models_dir(), SQL_EXTENSION)
        .map_or(0, |walker| walker.files().len())
}

// =============================================================================
// Pipelines
// =============================================================================

/// Inputs shared by every step of a pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Project locations
    pub paths: ProjectPaths,
    /// Variables forwarded to every build
    pub vars: BuildVars,
    /// Placeholder table replacement, if a table is configured
    pub retarget: Option<TableRetarget>,
}

impl PipelineSettings {
    /// Request for one operation with these settings
    #[must_use]
    pub fn request(&self, operation: BuildOperation) -> BuildRequest {
        BuildRequest::new(
            operation,
            self.paths.project_dir.clone(),
            self.paths.profiles_dir.clone(),
            self.vars.clone(),
        )
    }
}

/// Everything a pipeline did
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Build steps in the order they ran
    pub steps: Vec<RunOutcome>,
    /// Procedure rewrite results (sql pipeline)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<BatchReport>,
    /// Placeholder table replacement results (sql pipeline)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retarget: Option<BatchReport>,
    /// Notebook generation results (notebooks pipeline)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebooks: Option<BatchReport>,
}

impl<I: BuildInvoker> Runner<I> {
    /// Setup macro, then run and compile every model
    async fn build_steps(
        &self,
        settings: &PipelineSettings,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<Vec<RunOutcome>, RunError> {
        let target = count_models(&settings.paths);
        let operations = [
            BuildOperation::RunOperation {
                name: PRE_RUN_SETUP_MACRO.to_string(),
            },
            BuildOperation::Run,
            BuildOperation::Compile,
        ];

        let mut steps = Vec::with_capacity(operations.len());
        for operation in operations {
            let request = settings.request(operation);
            steps.push(self.run_checked(&request, target, reporter).await?);
        }
        Ok(steps)
    }

    /// Build, then rewrite compiled models into stored procedures
    pub async fn sql_pipeline(
        &self,
        settings: &PipelineSettings,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PipelineReport, RunError> {
        let steps = self.build_steps(settings, reporter).await?;
        let compiled = settings.paths.compiled_dir();

        let rewrite = file::rewrite_all(&compiled, &SqlRewriter::new())?;
        log::info!("Procedures: {}", rewrite.summary());

        let retarget = match &settings.retarget {
            Some(r) => Some(file::retarget_all(&compiled, r)?),
            None => None,
        };

        Ok(PipelineReport {
            steps,
            rewrite: Some(rewrite),
            retarget,
            notebooks: None,
        })
    }

    /// Build, then assemble compiled models into notebooks
    pub async fn notebook_pipeline(
        &self,
        settings: &PipelineSettings,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PipelineReport, RunError> {
        let steps = self.build_steps(settings, reporter).await?;

        let assembler = NotebookAssembler::new().with_retarget(settings.retarget.clone());
        let notebooks = file::assemble_all(
            &settings.paths.compiled_dir(),
            &settings.paths.notebooks_dir(),
            &assembler,
        )?;
        log::info!("Notebooks: {}", notebooks.summary());

        Ok(PipelineReport {
            steps,
            rewrite: None,
            retarget: None,
            notebooks: Some(notebooks),
        })
    }
}
