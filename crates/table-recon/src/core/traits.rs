//! Collaborator traits consumed by the reconciliation core.
//!
//! - [`SourceQueryExecutor`]: catalog, row count and per-column aggregates
//!   from the source warehouse
//! - [`TargetPayloadProvider`]: the precomputed validation payload from the
//!   target warehouse
//!
//! Implementations live in [`crate::drivers`]. The core never sees
//! connections or credentials, only materialized values.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

use super::predicate::Predicate;
use super::schema::{ColumnDescriptor, TableRef};
use super::value::{Metric, MetricSet, MetricValue};

/// Aggregates for a NUMERIC column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericAggregates {
    pub avg: MetricValue,
    pub min: MetricValue,
    pub max: MetricValue,
    pub sum: MetricValue,
    pub null_count: MetricValue,
    pub count: MetricValue,
}

impl NumericAggregates {
    pub fn into_metrics(self) -> MetricSet {
        [
            (Metric::Avg, self.avg),
            (Metric::Min, self.min),
            (Metric::Max, self.max),
            (Metric::Sum, self.sum),
            (Metric::NullCount, self.null_count),
            (Metric::Count, self.count),
        ]
        .into_iter()
        .collect()
    }
}

/// Aggregates for a TEXT column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAggregates {
    pub max_length: MetricValue,
}

impl TextAggregates {
    pub fn into_metrics(self) -> MetricSet {
        [(Metric::MaxLength, self.max_length)].into_iter().collect()
    }
}

/// Aggregates for a TEMPORAL column, rendered `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalAggregates {
    pub min_date: MetricValue,
    pub max_date: MetricValue,
}

impl TemporalAggregates {
    pub fn into_metrics(self) -> MetricSet {
        [(Metric::MinDate, self.min_date), (Metric::MaxDate, self.max_date)]
            .into_iter()
            .collect()
    }
}

/// Issue aggregate queries against the source warehouse.
///
/// Every call is one query; the profiler never batches columns.
#[async_trait]
pub trait SourceQueryExecutor: Send + Sync {
    /// Columns of the table in catalog ordinal order.
    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnDescriptor>>;

    /// Row count, optionally filtered.
    async fn count_rows(&self, table: &TableRef, predicate: Option<&Predicate>) -> Result<i64>;

    /// `AVG, MIN, MAX, SUM, NULL_COUNT, COUNT` over one column.
    async fn aggregate_numeric(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<NumericAggregates>;

    /// Maximum string length over one column.
    async fn aggregate_text(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TextAggregates>;

    /// Minimum and maximum date over one column.
    async fn aggregate_temporal(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TemporalAggregates>;

    /// Get the database type identifier (e.g., "netezza", "snapshot").
    fn db_type(&self) -> &str;
}

/// Fetch the target warehouse's validation payload.
///
/// Shape: `{ <COLUMN>: { DATA_TYPE: string, <METRIC>: value, ... }, COUNT: integer }`.
#[async_trait]
pub trait TargetPayloadProvider: Send + Sync {
    async fn fetch_validation_payload(&self, table: &TableRef) -> Result<Value>;

    /// Get the database type identifier (e.g., "snowflake", "file").
    fn db_type(&self) -> &str;
}
