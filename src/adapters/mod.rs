//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `process/` - Build tool invocation as a tokio child process
//! - `walker/` - Artifact discovery on disk
//! - `file/` - Batch rewrite, retarget and notebook writing
//! - `console/` - Terminal progress gauge

pub mod console;
pub mod file;
pub mod process;
pub mod walker;

pub use console::ConsoleReporter;
pub use file::{ArtifactIoError, BatchError, BatchReport};
pub use process::ProcessInvoker;
pub use walker::{ArtifactGroup, ArtifactWalker, UnreadableEntry, WalkError, WalkListing};
