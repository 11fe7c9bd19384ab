//! Core domain logic for snowball
//!
//! This module contains pure logic with no I/O dependencies.
//! Process spawning and filesystem access are abstracted through port traits
//! or performed by the callers in `adapters`.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (`BuildOperation`, `ProgressTracker`, `Artifact`, `NotebookDocument`)
//! - `services/` - Text processing (progress extraction, SQL rewriting, notebook assembly)
//! - `ports/` - Trait definitions for external dependencies (build invocation, progress display)

pub mod models;
pub mod ports;
pub mod services;
