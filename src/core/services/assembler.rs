//! Notebook assembly
//!
//! One notebook per category: a banner and schema cell, then a markdown
//! heading and a `CREATE TABLE ... AS` cell per artifact, sorted by name.

use crate::core::models::{Artifact, NotebookDocument, strip_ordering_prefix};
use crate::core::services::TableRetarget;

/// Builds notebook documents from grouped artifacts
#[derive(Debug, Clone, Default)]
pub struct NotebookAssembler {
    retarget: Option<TableRetarget>,
}

impl NotebookAssembler {
    /// Create an assembler
    #[must_use]
    pub const fn new() -> Self {
        Self { retarget: None }
    }

    /// Apply a table retarget to matching artifacts while assembling
    #[must_use]
    pub fn with_retarget(mut self, retarget: Option<TableRetarget>) -> Self {
        self.retarget = retarget;
        self
    }

    /// Assemble the document for one group directory
    #[must_use]
    pub fn assemble(&self, group: &str, artifacts: &[Artifact]) -> NotebookDocument {
        let category = strip_ordering_prefix(group);
        let layer = category.to_uppercase();

        let mut doc = NotebookDocument::new(group);
        doc.push_markdown(format!(
            "## SNOWBALL Spark SQL version\n\
             #### **Notebook to create {layer} layer**\n\
             ##### **Creating {layer} schema to create required {layer} tables**\n"
        ));
        doc.push_code(format!("%%sql\nCREATE SCHEMA IF NOT EXISTS {category};"));

        let mut sorted: Vec<&Artifact> = artifacts.iter().collect();
        sorted.sort_by(|a, b| a.location.name.cmp(&b.location.name).then_with(|| a.path.cmp(&b.path)));

        for artifact in sorted {
            let table = artifact.location.table();
            let text = match &self.retarget {
                Some(r) if r.applies_to(&artifact.location.name) => r.apply(&artifact.text),
                _ => artifact.text.as_str().into(),
            };

            doc.push_markdown(format!("##### **{}**", artifact.location.name));
            doc.push_code(format!(
                "%%sql\nDROP TABLE IF EXISTS {table};\nCREATE TABLE {table} AS\n{text}"
            ));
        }

        doc
    }
}
