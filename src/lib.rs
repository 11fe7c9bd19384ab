//! snowball - build-progress monitor and SQL post-processor for dbt projects
//!
//! This library watches an external build tool's output to derive a monotonic
//! progress signal, and rewrites the compiled query artifacts it leaves behind
//! into stored procedures or Spark SQL notebooks.

// Deny all clippy warnings in this crate
#![deny(clippy::all, clippy::pedantic, clippy::nursery, unsafe_code, unused_import_braces)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod config;
pub mod core;
pub mod output;
pub mod paths;
pub mod runner;
