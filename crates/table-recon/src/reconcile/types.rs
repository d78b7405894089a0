//! Report model for a reconciliation run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::TypeCategory;
use crate::core::{Metric, MetricValue};
use crate::error::{ReconError, Result};

/// A metric present on both sides whose values differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub column: String,
    pub category: TypeCategory,
    pub metric: Metric,
    pub source_value: MetricValue,
    pub target_value: MetricValue,
}

/// Side of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

/// A column that exists on one side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingColumn {
    pub column: String,
    pub missing_from: Side,
}

/// Structured result of the column comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub count_match: bool,
    pub source_count: i64,
    pub target_count: i64,
    pub discrepancies: Vec<Discrepancy>,
    pub missing_columns: Vec<MissingColumn>,
}

impl ValidationReport {
    /// True when every compared metric matched and no column is missing.
    pub fn passed(&self) -> bool {
        self.count_match && self.discrepancies.is_empty() && self.missing_columns.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Row count: source={} target={} ({})",
            self.source_count,
            self.target_count,
            if self.count_match { "match" } else { "MISMATCH" }
        )?;

        if !self.missing_columns.is_empty() {
            writeln!(f, "Missing columns:")?;
            for m in &self.missing_columns {
                writeln!(f, "  {} (missing from {})", m.column, m.missing_from)?;
            }
        }

        if !self.discrepancies.is_empty() {
            writeln!(f, "Discrepancies:")?;
            writeln!(
                f,
                "  {:<30} {:<10} {:<25} {:<25}",
                "COLUMN", "METRIC", "SOURCE", "TARGET"
            )?;
            for d in &self.discrepancies {
                writeln!(
                    f,
                    "  {:<30} {:<10} {:<25} {:<25}",
                    d.column,
                    d.metric.as_str(),
                    d.source_value.to_string(),
                    d.target_value.to_string()
                )?;
            }
        }

        if self.passed() {
            writeln!(f, "All compared metrics match")?;
        }
        Ok(())
    }
}

/// Why a run stopped before comparing columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    CountMismatch,
}

/// Engine lifecycle. `Failed` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileState {
    Init,
    CountChecked,
    Compared,
    Done,
    Failed(FailureKind),
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileState::Init => f.write_str("init"),
            ReconcileState::CountChecked => f.write_str("count_checked"),
            ReconcileState::Compared => f.write_str("compared"),
            ReconcileState::Done => f.write_str("done"),
            ReconcileState::Failed(FailureKind::CountMismatch) => {
                f.write_str("failed(count_mismatch)")
            }
        }
    }
}

/// Terminal outcome of the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Passed { report: ValidationReport },
    DataMismatch { report: ValidationReport },
    CountMismatch { source_count: i64, target_count: i64 },
}

impl ReconcileOutcome {
    /// Engine state the outcome was reached in.
    pub fn state(&self) -> ReconcileState {
        match self {
            ReconcileOutcome::CountMismatch { .. } => {
                ReconcileState::Failed(FailureKind::CountMismatch)
            }
            _ => ReconcileState::Done,
        }
    }

    /// Column report; `None` when the count gate failed.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ReconcileOutcome::Passed { report } | ReconcileOutcome::DataMismatch { report } => {
                Some(report)
            }
            ReconcileOutcome::CountMismatch { .. } => None,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, ReconcileOutcome::Passed { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            ReconcileOutcome::Passed { .. } => "passed",
            ReconcileOutcome::DataMismatch { .. } => "data_mismatch",
            ReconcileOutcome::CountMismatch { .. } => "count_mismatch",
        }
    }

    /// Map a non-passing outcome to its error. Missing columns take
    /// precedence over metric discrepancies; the error carries the full
    /// report either way.
    pub fn into_result(self) -> Result<ValidationReport> {
        match self {
            ReconcileOutcome::Passed { report } => Ok(report),
            ReconcileOutcome::CountMismatch {
                source_count,
                target_count,
            } => Err(ReconError::CountMismatch {
                source_count,
                target_count,
            }),
            ReconcileOutcome::DataMismatch { report } if !report.missing_columns.is_empty() => {
                Err(ReconError::MissingColumns(Box::new(report)))
            }
            ReconcileOutcome::DataMismatch { report } => {
                Err(ReconError::DataValidation(Box::new(report)))
            }
        }
    }
}
