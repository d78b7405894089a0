use tracing::debug;

use crate::classify::{classify, TypeCategory};
use crate::core::{ColumnDescriptor, MetricSet, Predicate, SourceQueryExecutor, TableRef};
use crate::error::Result;

use super::ColumnProfile;

/// Dispatches one aggregate query per column based on its category.
pub struct ColumnProfiler<'a> {
    executor: &'a dyn SourceQueryExecutor,
    table: &'a TableRef,
    predicate: Option<&'a Predicate>,
}

impl<'a> ColumnProfiler<'a> {
    pub fn new(
        executor: &'a dyn SourceQueryExecutor,
        table: &'a TableRef,
        predicate: Option<&'a Predicate>,
    ) -> Self {
        Self {
            executor,
            table,
            predicate,
        }
    }

    /// Metrics for one column. OTHER columns get an empty set and no query.
    pub async fn profile(
        &self,
        descriptor: &ColumnDescriptor,
        category: TypeCategory,
    ) -> Result<MetricSet> {
        let column = descriptor.name.as_str();
        let metrics = match category {
            TypeCategory::Numeric => self
                .executor
                .aggregate_numeric(self.table, column, self.predicate)
                .await?
                .into_metrics(),
            TypeCategory::Text => self
                .executor
                .aggregate_text(self.table, column, self.predicate)
                .await?
                .into_metrics(),
            TypeCategory::Temporal => self
                .executor
                .aggregate_temporal(self.table, column, self.predicate)
                .await?
                .into_metrics(),
            TypeCategory::Other => {
                debug!(
                    "{}.{}: type {} is not profiled",
                    self.table, column, descriptor.declared_type
                );
                MetricSet::new()
            }
        };
        Ok(metrics)
    }

    /// Classify then profile.
    pub async fn profile_column(&self, descriptor: &ColumnDescriptor) -> Result<ColumnProfile> {
        let category = classify(&descriptor.declared_type);
        let metrics = self.profile(descriptor, category).await?;
        debug!(
            "{}.{} ({}): {} metrics",
            self.table,
            descriptor.name,
            category,
            metrics.len()
        );
        Ok(ColumnProfile::new(descriptor.clone(), category, metrics))
    }
}
