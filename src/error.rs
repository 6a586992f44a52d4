//! Error types for the report pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort a report run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Data file '{}' could not be read: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Data file '{}' is missing required column(s): {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("No valid data found in '{}' to generate a report", path.display())]
    NoValidData { path: PathBuf },

    #[error("Failed to build the report: {0}")]
    RenderFailure(String),
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::RenderFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// A data row that was dropped during loading.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the source file.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
