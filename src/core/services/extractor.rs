//! Progress extraction from build output
//!
//! The build tool's console format is not a stable contract, so several
//! overlapping recognition rules are applied to the whole accumulated buffer
//! on every call. Completion lines may appear out of order or twice; the
//! caller passes what it already knows and only new information comes back.
//!
//! # Examples
//!
//! ```
//! use indexmap::IndexMap;
//! use snowball::core::services::ProgressExtractor;
//!
//! let extractor = ProgressExtractor::for_compile();
//! let buffer = "Found 2 models\nCompiling model proj.core.a\nCompiled model proj.core.a\n";
//! let found = extractor.extract(buffer, &IndexMap::new());
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].id, "proj.core.a");
//! ```

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::Regex;

use crate::core::models::{BuildOperation, BuildUnit, UnitStatus};

/// A pattern whose first capture group is a unit id
#[derive(Debug, Clone)]
pub struct RecognitionRule {
    pattern: Regex,
    status: UnitStatus,
}

impl RecognitionRule {
    /// Compile a rule reporting the given status
    pub fn new(pattern: &str, status: UnitStatus) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            status,
        })
    }

    /// Status a match of this rule reports
    #[must_use]
    pub const fn status(&self) -> UnitStatus {
        self.status
    }
}

/// Model-run completion and start lines
const RUN_RULES: &[(&str, UnitStatus)] = &[
    (r"\d+\s+of\s+\d+\s+OK\s+created.*model\s+([^\s]+)", UnitStatus::Complete),
    (r"OK\s+created.*model\s+([^\s]+).*\[OK", UnitStatus::Complete),
    (r"Completed\s+model\s+([^\s]+).*SUCCESS", UnitStatus::Complete),
    (r"\d+\s+of\s+\d+\s+START\s+.*model\s+([^\s]+)", UnitStatus::Pending),
];

/// Compilation lines; the summary count is caught and rejected as numeric
const COMPILE_RULES: &[(&str, UnitStatus)] = &[
    (r"Compiling\s+model\s+([^\s]+)", UnitStatus::Complete),
    (r"Compiled\s+model\s+([^\s]+)", UnitStatus::Complete),
    (r"Processing\s+model\s+([^\s]+)", UnitStatus::Complete),
    (r"Found\s+(\d+)\s+models", UnitStatus::Complete),
];

/// Scans a build output buffer for unit status lines
#[derive(Debug, Clone, Default)]
pub struct ProgressExtractor {
    rules: Vec<RecognitionRule>,
}

impl ProgressExtractor {
    /// Create an extractor from an ordered list of rules
    #[must_use]
    pub const fn new(rules: Vec<RecognitionRule>) -> Self {
        Self { rules }
    }

    fn from_table(table: &[(&str, UnitStatus)]) -> Self {
        let rules = table
            .iter()
            .filter_map(|(pattern, status)| match RecognitionRule::new(pattern, *status) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    log::error!("Invalid recognition rule {pattern}: {e}");
                    None
                },
            })
            .collect();
        Self { rules }
    }

    /// Rules for `run`
    #[must_use]
    pub fn for_run() -> Self {
        Self::from_table(RUN_RULES)
    }

    /// Rules for `compile`
    #[must_use]
    pub fn for_compile() -> Self {
        Self::from_table(COMPILE_RULES)
    }

    /// Rules for an operation; operations without unit output get none
    #[must_use]
    pub fn for_operation(operation: &BuildOperation) -> Self {
        match operation {
            BuildOperation::Run => Self::for_run(),
            BuildOperation::Compile => Self::for_compile(),
            _ => Self::default(),
        }
    }

    /// Whether any rule is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Scan the whole buffer and return what is new relative to `known`
    ///
    /// Each id is reported at most once per call, with the highest status any
    /// rule gave it, ordered by where it first appears in the buffer. An id
    /// whose known status is already at least that high is omitted. Purely
    /// numeric captures are never ids.
    #[must_use]
    pub fn extract(&self, buffer: &str, known: &IndexMap<String, UnitStatus>) -> Vec<BuildUnit> {
        let mut hits: Vec<(usize, &str, UnitStatus)> = Vec::new();

        for rule in &self.rules {
            for caps in rule.pattern.captures_iter(buffer) {
                let Some(capture) = caps.get(1) else { continue };
                let id = capture.as_str();
                if id.is_empty() || is_numeric(id) {
                    continue;
                }
                hits.push((capture.start(), id, rule.status));
            }
        }

        // Stable sort keeps rule order for captures at the same offset
        hits.sort_by_key(|(pos, _, _)| *pos);

        let mut best: HashMap<&str, UnitStatus> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for (_, id, status) in hits {
            match best.get_mut(id) {
                Some(current) => *current = (*current).max(status),
                None => {
                    best.insert(id, status);
                    order.push(id);
                },
            }
        }

        order
            .into_iter()
            .filter_map(|id| {
                let status = best[id];
                let already = known.get(id).is_some_and(|k| *k >= status);
                (!already).then(|| BuildUnit::new(id, status))
            })
            .collect()
    }
}

fn is_numeric(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}
