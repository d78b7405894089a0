//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Procedure that computes the target validation payload.
pub const DEFAULT_VALIDATION_PROCEDURE: &str = "COMMON.ADMIN.GENERIC_VALIDATION_SP";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source warehouse (Netezza) access.
    #[serde(default)]
    pub source: SourceConfig,

    /// Target warehouse (Snowflake) access.
    #[serde(default)]
    pub target: TargetConfig,

    /// Comparison behavior.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// How the source profile is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON snapshot of catalog, row count and aggregates.
    #[default]
    Snapshot,
    /// Live queries over ODBC.
    Odbc,
}

/// How the target payload is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Payload JSON read from a file.
    #[default]
    File,
    /// Validation procedure called over ODBC.
    Odbc,
}

/// Source warehouse configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Snapshot file (kind: snapshot).
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// ODBC connection string (kind: odbc).
    #[serde(default)]
    pub connection_string: Option<String>,
}

// Custom Debug implementation to redact the connection string (may carry PWD=).
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("kind", &self.kind)
            .field("snapshot_path", &self.snapshot_path)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Target warehouse configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub kind: TargetKind,

    /// Payload file (kind: file).
    #[serde(default)]
    pub payload_path: Option<PathBuf>,

    /// ODBC connection string (kind: odbc).
    #[serde(default)]
    pub connection_string: Option<String>,

    /// Fully qualified validation procedure.
    #[serde(default = "default_procedure")]
    pub procedure: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            kind: TargetKind::default(),
            payload_path: None,
            connection_string: None,
            procedure: default_procedure(),
        }
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("kind", &self.kind)
            .field("payload_path", &self.payload_path)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("procedure", &self.procedure)
            .finish()
    }
}

/// Comparison behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Column aggregate queries in flight at once (default: 4).
    #[serde(default = "default_profile_concurrency")]
    pub profile_concurrency: usize,

    /// Reject target metrics that do not apply to the column's category
    /// instead of dropping them with a warning (default: false).
    #[serde(default)]
    pub strict_payload: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            profile_concurrency: default_profile_concurrency(),
            strict_payload: false,
        }
    }
}

fn default_procedure() -> String {
    DEFAULT_VALIDATION_PROCEDURE.to_string()
}

fn default_profile_concurrency() -> usize {
    4
}
