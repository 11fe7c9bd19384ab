//! Port traits (interfaces)
//!
//! These traits define the boundaries between core logic and external systems.
//! Implementations are provided in the `adapters` module.

mod build;
mod progress;

pub use build::{BuildEvent, BuildHandle, BuildInvoker, BuildOutcome, InvocationError};
pub use progress::{ProgressReporter, SilentReporter};
