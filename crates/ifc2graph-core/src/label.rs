//! Model label derived from the document time stamp.

use std::fmt;

use serde::Serialize;

/// Token grouping all nodes and edges of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelLabel(String);

impl ModelLabel {
    /// `ts` followed by the time stamp with all punctuation removed.
    pub fn from_time_stamp(time_stamp: &str) -> Self {
        let digits: String = time_stamp
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        Self(format!("ts{digits}"))
    }

    /// Use an already normalized label as-is (e.g. from the command line).
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
