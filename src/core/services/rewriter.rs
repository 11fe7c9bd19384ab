//! Stored-procedure rewriting of compiled queries
//!
//! A compiled `SELECT` is wrapped into a procedure that drops and
//! re-materializes its table:
//!
//! ```text
//! CREATE OR ALTER PROCEDURE core.sp_revenue
//! AS
//! BEGIN
//!     SET NOCOUNT ON;
//!
//!     BEGIN
//!         DROP TABLE IF EXISTS core.revenue;
//!     END;
//!
//! SELECT a
//! INTO core.revenue
//! FROM t
//! END;
//! ```
//!
//! `INTO` goes before the last bare `FROM`: the outermost query is assumed
//! to be the final one, with subqueries appearing earlier. Rewriting a file
//! twice wraps it twice.

use std::path::Path;

use crate::core::models::{ArtifactLocation, FormatError};
use crate::core::services::sql_lexer;

/// Keyword `INTO` is inserted before
const INSERT_BEFORE: &str = "FROM";

/// Statement terminator closing the procedure
const TERMINATOR: &str = "\nEND;";

/// Rewrites compiled query text into procedure form
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRewriter;

impl SqlRewriter {
    /// Create a rewriter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Rewrite `text` found at `relative` (relative to the compiled root)
    ///
    /// Fails with [`FormatError`] when the path is outside the
    /// `models/<category>/` layout; callers treat that as a skip.
    pub fn rewrite(&self, text: &str, relative: &Path) -> Result<String, FormatError> {
        let location = ArtifactLocation::parse(relative)?;
        Ok(self.wrap(text, &location))
    }

    /// Like [`Self::rewrite`], returning the input unchanged when skipped
    #[must_use]
    pub fn rewrite_or_keep(&self, text: &str, relative: &Path) -> String {
        self.rewrite(text, relative).unwrap_or_else(|_| text.to_string())
    }

    /// Wrap `text` for an already resolved location
    #[must_use]
    pub fn wrap(&self, text: &str, location: &ArtifactLocation) -> String {
        let table = location.table();
        let header = format!(
            "CREATE OR ALTER PROCEDURE {procedure}\n\
             AS\n\
             BEGIN\n    \
             SET NOCOUNT ON;\n\n    \
             BEGIN\n        \
             DROP TABLE IF EXISTS {table};\n    \
             END;\n\n",
            procedure = location.procedure(),
        );

        let body = match sql_lexer::last_keyword(text, INSERT_BEFORE) {
            Some(pos) => format!("{}INTO {table}\n{}", &text[..pos], &text[pos..]),
            None => text.to_string(),
        };

        format!("{header}{}{TERMINATOR}", body.trim())
    }
}
