//! Error types for the reconciliation library.

use crate::reconcile::ValidationReport;
use thiserror::Error;

/// Main error type for reconciliation runs.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Configuration error (invalid YAML, missing fields, bad date range, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source query executor failed (catalog lookup, count, aggregate query)
    #[error("Source warehouse error: {0}")]
    Source(String),

    /// Target payload provider failed (procedure call, fetch)
    #[error("Target warehouse error: {0}")]
    Target(String),

    /// Target payload does not have the expected shape
    #[error("Malformed target payload: {0}")]
    MalformedPayload(String),

    /// Row counts differ; the column comparison never ran
    #[error("Row count mismatch: source={source_count} target={target_count}")]
    CountMismatch {
        source_count: i64,
        target_count: i64,
    },

    /// One or more metric discrepancies
    #[error("Data validation failed: {} discrepancies", .0.discrepancies.len())]
    DataValidation(Box<ValidationReport>),

    /// Columns present on one side only
    #[error("Column set mismatch: {}", missing_column_names(.0))]
    MissingColumns(Box<ValidationReport>),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run was interrupted (SIGINT)
    #[error("Reconciliation cancelled")]
    Cancelled,
}

fn missing_column_names(report: &ValidationReport) -> String {
    report
        .missing_columns
        .iter()
        .map(|m| format!("{} (missing from {})", m.column, m.missing_from))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ReconError {
    /// Create a Source error
    pub fn source(message: impl Into<String>) -> Self {
        ReconError::Source(message.into())
    }

    /// Create a Target error
    pub fn target(message: impl Into<String>) -> Self {
        ReconError::Target(message.into())
    }

    /// Create a MalformedPayload error
    pub fn payload(message: impl Into<String>) -> Self {
        ReconError::MalformedPayload(message.into())
    }

    /// The report attached to a validation failure, if any.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ReconError::DataValidation(report) | ReconError::MissingColumns(report) => {
                Some(report)
            }
            _ => None,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReconError::Config(_) | ReconError::Yaml(_) => 2,
            ReconError::CountMismatch { .. } => 3,
            ReconError::DataValidation(_) => 4,
            ReconError::MissingColumns(_) => 5,
            ReconError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconError>;
