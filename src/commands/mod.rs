//! Command implementations

mod build;
mod files;
mod pipeline;
mod profile;

pub use build::{build, setup};
pub use files::{assemble, rewrite};
pub use pipeline::{notebooks, sql};
pub use profile::profile;

use snowball::adapters::{ConsoleReporter, ProcessInvoker};
use snowball::config::SnowballConfig;
use snowball::core::ports::{ProgressReporter, SilentReporter};
use snowball::output::OutputMode;
use snowball::paths::ProjectPaths;
use snowball::runner::{PipelineSettings, Runner};

/// State shared by every command
#[derive(Debug)]
pub struct Context {
    /// Loaded configuration
    pub config: SnowballConfig,
    /// How results are printed
    pub output_mode: OutputMode,
}

impl Context {
    /// Bundle configuration and output mode
    pub const fn new(config: SnowballConfig, output_mode: OutputMode) -> Self {
        Self { config, output_mode }
    }

    /// Resolved project locations
    pub fn paths(&self) -> ProjectPaths {
        self.config.paths()
    }

    /// A runner for the configured build executable
    pub fn runner(&self) -> Runner<ProcessInvoker> {
        Runner::new(
            ProcessInvoker::new(&self.config.build.executable),
            self.config.build.poll_interval(),
        )
    }

    /// Progress display for the current output mode
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self.output_mode {
            OutputMode::Human => Box::new(ConsoleReporter::new()),
            OutputMode::Json => Box::new(SilentReporter),
        }
    }

    /// Settings for a build, with variables resolved from the profile
    pub fn settings(&self) -> anyhow::Result<PipelineSettings> {
        Ok(PipelineSettings {
            paths: self.paths(),
            vars: self.config.resolve_vars()?,
            retarget: self.config.retarget(),
        })
    }
}
