use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::core::{ColumnDescriptor, Predicate, SourceQueryExecutor, TableRef};
use crate::error::{ReconError, Result};

use super::{ColumnProfiler, TableProfile};

/// Builds the source-side [`TableProfile`] by querying every column.
pub struct SourceProfileBuilder {
    executor: Arc<dyn SourceQueryExecutor>,
    concurrency: usize,
}

impl SourceProfileBuilder {
    /// Create a builder that profiles one column at a time.
    pub fn new(executor: Arc<dyn SourceQueryExecutor>) -> Self {
        Self {
            executor,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` column queries in flight. Results are still
    /// assembled in catalog order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Column list, row count, then one aggregate query per column, all
    /// under the same predicate.
    pub async fn build(&self, table: &TableRef, predicate: Option<&Predicate>) -> Result<TableProfile> {
        let start = Instant::now();

        let columns = self.executor.list_columns(table).await?;
        if columns.is_empty() {
            return Err(ReconError::source(format!(
                "table {} has no columns (does it exist?)",
                table
            )));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.name.as_str())) {
            return Err(ReconError::source(format!(
                "table {} reports column {} more than once",
                table, dup.name
            )));
        }

        let predicate = predicate
            .map(|p| resolve_date_column(p, &columns, table))
            .transpose()?;
        let predicate = predicate.as_ref();

        let row_count = self.executor.count_rows(table, predicate).await?;
        match predicate {
            Some(p) => info!("{}: {} rows where {}", table, row_count, p),
            None => info!("{}: {} rows", table, row_count),
        }

        let profiler = ColumnProfiler::new(self.executor.as_ref(), table, predicate);
        let profiles: Vec<_> = stream::iter(columns.iter())
            .map(|descriptor| profiler.profile_column(descriptor))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut profile = TableProfile::new(row_count);
        for column in profiles {
            profile.insert(column);
        }

        debug!(
            "{}: profiled {} columns in {:?}",
            table,
            profile.len(),
            start.elapsed()
        );
        Ok(profile)
    }
}

/// Match the filter column against the catalog, ignoring case, and use the
/// catalog spelling since quoted identifiers are case-sensitive.
fn resolve_date_column(
    predicate: &Predicate,
    columns: &[ColumnDescriptor],
    table: &TableRef,
) -> Result<Predicate> {
    let wanted = predicate.column();
    let found = columns
        .iter()
        .find(|c| c.name == wanted)
        .or_else(|| columns.iter().find(|c| c.name.eq_ignore_ascii_case(wanted)));
    match found {
        Some(column) if column.name == wanted => Ok(predicate.clone()),
        Some(column) => {
            debug!("date column {} resolved to {}", wanted, column.name);
            Ok(predicate.with_column(column.name.as_str()))
        }
        None => Err(ReconError::Config(format!(
            "--date_column {} is not a column of {}",
            wanted, table
        ))),
    }
}
