//! Naming session behind the rename prompt
//!
//! Tracks what the operator has typed so far and renders the live preview
//! `<typed>-<timestamp>-<category>`. While the input is blank the preview
//! shows the placeholder `name`; confirming a blank input is refused.

use crate::category::Category;
use crate::error::{Error, Result};

/// Stand-in shown in the preview until something is typed
pub const PLACEHOLDER_NAME: &str = "name";

/// Join the parts of a generated file stem
pub fn compose_name(name: &str, timestamp: &str, category: Category) -> String {
    format!("{}-{}-{}", name, timestamp, category.as_str())
}

/// Input state of one open prompt
#[derive(Debug, Clone)]
pub struct NamingSession {
    timestamp: String,
    category: Category,
    input: String,
}

impl NamingSession {
    pub fn new(timestamp: impl Into<String>, category: Category) -> Self {
        Self {
            timestamp: timestamp.into(),
            category,
            input: String::new(),
        }
    }

    /// Replace the typed text
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Stem the file would get right now
    pub fn preview(&self) -> String {
        if self.input.trim().is_empty() {
            compose_name(PLACEHOLDER_NAME, &self.timestamp, self.category)
        } else {
            compose_name(&self.input, &self.timestamp, self.category)
        }
    }

    /// Final stem, or `Error::EmptyName` when nothing but whitespace was typed
    ///
    /// The typed text is used as entered; only the emptiness check trims.
    pub fn confirm(&self) -> Result<String> {
        if self.input.trim().is_empty() {
            return Err(Error::EmptyName);
        }
        Ok(compose_name(&self.input, &self.timestamp, self.category))
    }
}
