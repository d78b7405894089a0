//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use crate::core::{
    ColumnDescriptor, MetricValue, NumericAggregates, Predicate, SourceQueryExecutor,
    TableRef, TargetPayloadProvider, TemporalAggregates, TextAggregates,
};
use crate::error::{ReconError, Result};

/// Source executor that returns fixed aggregates and records every call.
pub struct RecordingSource {
    columns: Vec<ColumnDescriptor>,
    row_count: i64,
    failing_column: Option<String>,
    calls: Mutex<Vec<String>>,
    predicates: Mutex<Vec<Option<String>>>,
}

impl RecordingSource {
    pub fn new(columns: Vec<ColumnDescriptor>, row_count: i64) -> Self {
        Self {
            columns,
            row_count,
            failing_column: None,
            calls: Mutex::new(Vec::new()),
            predicates: Mutex::new(Vec::new()),
        }
    }

    /// Make aggregate queries on `column` fail.
    pub fn failing_on(mut self, column: &str) -> Self {
        self.failing_column = Some(column.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered predicate of every count/aggregate call.
    pub fn predicates(&self) -> Vec<Option<String>> {
        self.predicates.lock().unwrap().clone()
    }

    fn record(&self, call: String, predicate: Option<&Predicate>) {
        self.calls.lock().unwrap().push(call);
        self.predicates
            .lock()
            .unwrap()
            .push(predicate.map(Predicate::to_sql));
    }

    fn check(&self, column: &str) -> Result<()> {
        match &self.failing_column {
            Some(f) if f == column => Err(ReconError::source(format!(
                "aggregate query on {} failed",
                column
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SourceQueryExecutor for RecordingSource {
    async fn list_columns(&self, _table: &TableRef) -> Result<Vec<ColumnDescriptor>> {
        self.calls.lock().unwrap().push("list_columns".to_string());
        Ok(self.columns.clone())
    }

    async fn count_rows(&self, _table: &TableRef, predicate: Option<&Predicate>) -> Result<i64> {
        self.record("count_rows".to_string(), predicate);
        Ok(self.row_count)
    }

    async fn aggregate_numeric(
        &self,
        _table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<NumericAggregates> {
        self.record(format!("numeric:{}", column), predicate);
        self.check(column)?;
        Ok(NumericAggregates {
            avg: MetricValue::integer(14),
            min: MetricValue::integer(1),
            max: MetricValue::integer(27),
            sum: MetricValue::integer(378),
            null_count: MetricValue::integer(0),
            count: MetricValue::integer(self.row_count),
        })
    }

    async fn aggregate_text(
        &self,
        _table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TextAggregates> {
        self.record(format!("text:{}", column), predicate);
        self.check(column)?;
        Ok(TextAggregates {
            max_length: MetricValue::integer(20),
        })
    }

    async fn aggregate_temporal(
        &self,
        _table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TemporalAggregates> {
        self.record(format!("temporal:{}", column), predicate);
        self.check(column)?;
        Ok(TemporalAggregates {
            min_date: MetricValue::text("2015-05-28T15:53:00"),
            max_date: MetricValue::text("2023-06-01T00:00:00"),
        })
    }

    fn db_type(&self) -> &str {
        "recording"
    }
}

/// Payload provider that hands back a fixed value.
pub struct StaticPayload {
    payload: Option<Value>,
}

impl StaticPayload {
    pub fn new(payload: Value) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    /// Provider whose fetch always fails.
    pub fn unavailable() -> Self {
        Self { payload: None }
    }
}

#[async_trait]
impl TargetPayloadProvider for StaticPayload {
    async fn fetch_validation_payload(&self, table: &TableRef) -> Result<Value> {
        self.payload
            .clone()
            .ok_or_else(|| ReconError::target(format!("procedure failed for {}", table)))
    }

    fn db_type(&self) -> &str {
        "static"
    }
}
