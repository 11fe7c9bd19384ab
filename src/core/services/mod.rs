//! Text-processing services
//!
//! Pure functions over strings: nothing here touches the filesystem or
//! spawns processes.

pub mod assembler;
pub mod extractor;
pub mod retarget;
pub mod rewriter;
pub mod sql_lexer;

pub use assembler::NotebookAssembler;
pub use extractor::{ProgressExtractor, RecognitionRule};
pub use retarget::TableRetarget;
pub use rewriter::SqlRewriter;
