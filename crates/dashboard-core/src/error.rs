use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the anomaly dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A required input table is missing, unreadable, or lacks a required
    /// column. Callers recover by rendering an empty dataset with a warning.
    #[error("Data unavailable from {path}: {reason}")]
    DataUnavailable { path: PathBuf, reason: String },

    /// A key (symbol, company name, feature) has no match in its lookup table.
    #[error("No {what} matching '{key}'")]
    LookupMiss { what: &'static str, key: String },

    /// A CSV document could not be parsed or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The export destination could not be written.
    #[error("Failed to export to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Build a [`DashboardError::DataUnavailable`] for `path`.
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DashboardError::DataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// `true` for the recoverable "render an empty state" condition.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, DashboardError::DataUnavailable { .. })
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
