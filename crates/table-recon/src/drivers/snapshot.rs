//! File-backed collaborators for dry runs and fixtures.
//!
//! A source snapshot captures what the Netezza queries returned:
//!
//! ```json
//! {
//!   "table": "EDW.SALES.ORDERS",
//!   "filter": "\"LOAD_DT\" > '2023-01-01'",
//!   "row_count": 27,
//!   "columns": [{"name": "ID", "declared_type": "INTEGER"}],
//!   "aggregates": {"ID": {"AVG": 14, "MIN": 1, "MAX": 27, "SUM": 378, "NULL_COUNT": 0, "COUNT": 27}}
//! }
//! ```
//!
//! `table` and `filter` are optional; when present they must match the run.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::{
    ColumnDescriptor, Metric, MetricSet, MetricValue, NumericAggregates, Predicate,
    SourceQueryExecutor, TableRef, TargetPayloadProvider, TemporalAggregates, TextAggregates,
};
use crate::error::{ReconError, Result};

use super::netezza::iso_datetime;

#[derive(Debug, Clone, Deserialize)]
struct Snapshot {
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    filter: Option<String>,
    row_count: i64,
    columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    aggregates: HashMap<String, MetricSet>,
}

/// Source executor answering from a JSON snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    /// Read a snapshot file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReconError::source(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| ReconError::source(format!("invalid source snapshot: {}", e)))?;
        Ok(Self { snapshot })
    }

    fn check_table(&self, table: &TableRef) -> Result<()> {
        match &self.snapshot.table {
            Some(t) if !t.eq_ignore_ascii_case(&table.full_name()) => {
                Err(ReconError::source(format!(
                    "snapshot was taken for {}, not {}",
                    t, table
                )))
            }
            _ => Ok(()),
        }
    }

    fn check_filter(&self, predicate: Option<&Predicate>) -> Result<()> {
        let requested = predicate.map(Predicate::to_sql);
        if requested == self.snapshot.filter {
            return Ok(());
        }
        Err(ReconError::source(format!(
            "snapshot filter {} does not match requested filter {}",
            self.snapshot.filter.as_deref().unwrap_or("(none)"),
            requested.as_deref().unwrap_or("(none)")
        )))
    }

    fn metric(&self, table: &TableRef, column: &str, metric: Metric) -> Result<MetricValue> {
        self.snapshot
            .aggregates
            .get(column)
            .and_then(|set| set.get(metric))
            .cloned()
            .ok_or_else(|| {
                ReconError::source(format!(
                    "snapshot has no {} for {}.{}",
                    metric, table, column
                ))
            })
    }

    fn date(&self, table: &TableRef, column: &str, metric: Metric) -> Result<MetricValue> {
        Ok(match self.metric(table, column, metric)? {
            MetricValue::Text(s) => MetricValue::Text(iso_datetime(&s)),
            other => other,
        })
    }
}

#[async_trait]
impl SourceQueryExecutor for SnapshotSource {
    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnDescriptor>> {
        self.check_table(table)?;
        Ok(self.snapshot.columns.clone())
    }

    async fn count_rows(&self, table: &TableRef, predicate: Option<&Predicate>) -> Result<i64> {
        self.check_table(table)?;
        self.check_filter(predicate)?;
        Ok(self.snapshot.row_count)
    }

    async fn aggregate_numeric(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<NumericAggregates> {
        self.check_filter(predicate)?;
        Ok(NumericAggregates {
            avg: self.metric(table, column, Metric::Avg)?,
            min: self.metric(table, column, Metric::Min)?,
            max: self.metric(table, column, Metric::Max)?,
            sum: self.metric(table, column, Metric::Sum)?,
            null_count: self.metric(table, column, Metric::NullCount)?,
            count: self.metric(table, column, Metric::Count)?,
        })
    }

    async fn aggregate_text(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TextAggregates> {
        self.check_filter(predicate)?;
        Ok(TextAggregates {
            max_length: self.metric(table, column, Metric::MaxLength)?,
        })
    }

    async fn aggregate_temporal(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TemporalAggregates> {
        self.check_filter(predicate)?;
        Ok(TemporalAggregates {
            min_date: self.date(table, column, Metric::MinDate)?,
            max_date: self.date(table, column, Metric::MaxDate)?,
        })
    }

    fn db_type(&self) -> &str {
        "snapshot"
    }
}

/// Target payload read from a JSON file.
#[derive(Debug, Clone)]
pub struct FilePayloadProvider {
    path: PathBuf,
}

impl FilePayloadProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TargetPayloadProvider for FilePayloadProvider {
    async fn fetch_validation_payload(&self, table: &TableRef) -> Result<Value> {
        debug!("Reading payload for {} from {}", table, self.path.display());
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ReconError::target(format!("cannot read payload {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ReconError::payload(format!("{} is not valid JSON: {}", self.path.display(), e))
        })
    }

    fn db_type(&self) -> &str {
        "file"
    }
}
