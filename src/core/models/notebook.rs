//! Notebook documents
//!
//! A minimal nbformat 4.5 model: an ordered sequence of markdown and code
//! cells. Documents are only assembled here; they run elsewhere.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Major nbformat version written
const NBFORMAT: u32 = 4;

/// Minor nbformat version written (cell ids are required from 4.5)
const NBFORMAT_MINOR: u32 = 5;

/// Longest id prefix kept (nbformat caps ids at 64 characters)
const MAX_ID_PREFIX: usize = 48;

/// Cell type and its type-specific fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum CellKind {
    /// Markdown text
    Markdown,
    /// Executable code
    Code {
        /// Always empty for generated notebooks
        execution_count: Option<u32>,
        /// Always empty for generated notebooks
        outputs: Vec<Value>,
    },
}

/// One notebook cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Stable cell id
    pub id: String,
    /// Cell type
    #[serde(flatten)]
    pub kind: CellKind,
    /// Cell metadata (empty)
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Cell text
    pub source: String,
}

impl Cell {
    /// Whether this is a code cell
    #[must_use]
    pub const fn is_code(&self) -> bool {
        matches!(self.kind, CellKind::Code { .. })
    }
}

/// An ordered sequence of cells persisted as `.ipynb` JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookDocument {
    /// Cells in display order
    pub cells: Vec<Cell>,
    /// Notebook metadata (empty)
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Major format version
    pub nbformat: u32,
    /// Minor format version
    pub nbformat_minor: u32,
    #[serde(skip)]
    id_prefix: String,
}

impl NotebookDocument {
    /// Create an empty document whose cell ids start with `id_prefix`
    #[must_use]
    pub fn new(id_prefix: &str) -> Self {
        let mut prefix: String = id_prefix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .take(MAX_ID_PREFIX)
            .collect();
        if prefix.is_empty() {
            prefix.push_str("cell");
        }

        Self {
            cells: Vec::new(),
            metadata: Map::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
            id_prefix: prefix,
        }
    }

    fn next_id(&self) -> String {
        format!("{}-{}", self.id_prefix, self.cells.len())
    }

    /// Append a markdown cell
    pub fn push_markdown(&mut self, source: impl Into<String>) {
        self.cells.push(Cell {
            id: self.next_id(),
            kind: CellKind::Markdown,
            metadata: Map::new(),
            source: source.into(),
        });
    }

    /// Append a code cell
    pub fn push_code(&mut self, source: impl Into<String>) {
        self.cells.push(Cell {
            id: self.next_id(),
            kind: CellKind::Code {
                execution_count: None,
                outputs: Vec::new(),
            },
            metadata: Map::new(),
            source: source.into(),
        });
    }

    /// Serialize to `.ipynb` JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
