//! Domain models
//!
//! Pure data types with no I/O dependencies.

mod artifact;
mod build_unit;
mod notebook;
mod operation;
mod progress;

pub use artifact::{
    Artifact, ArtifactLocation, FormatError, MODELS_ANCHOR, base_name, strip_ordering_prefix,
};
pub use build_unit::{BuildUnit, UnitStatus};
pub use notebook::{Cell, CellKind, NotebookDocument};
pub use operation::{BuildOperation, BuildRequest, BuildVars, PRE_RUN_SETUP_MACRO};
pub use progress::{ProgressLabels, ProgressSnapshot, ProgressTracker, RunState};
