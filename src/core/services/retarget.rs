//! Revenue table retargeting
//!
//! The project ships with a placeholder table reference inside one model.
//! Generated output points it at the user's table instead.

use std::borrow::Cow;

/// Replaces a placeholder table reference in one named model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRetarget {
    model: String,
    placeholder: String,
    table: String,
}

impl TableRetarget {
    /// Retarget `.placeholder` to `.table` in the model called `model`
    #[must_use]
    pub fn new(model: &str, placeholder: &str, table: &str) -> Self {
        Self {
            model: model.to_string(),
            placeholder: format!(".{}", placeholder.trim_start_matches('.')),
            table: format!(".{}", table.trim_start_matches('.')),
        }
    }

    /// Whether a model with this base name is affected (case-insensitive)
    #[must_use]
    pub fn applies_to(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.model)
    }

    /// Replace every placeholder reference; borrowed when nothing changed
    #[must_use]
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.placeholder == self.table || !text.contains(&self.placeholder) {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.replace(&self.placeholder, &self.table))
        }
    }
}
