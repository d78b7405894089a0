//! Core abstractions for table reconciliation.
//!
//! - [`schema`]: table references and column descriptors
//! - [`value`]: metric names, metric values and metric sets
//! - [`predicate`]: the exclusive date-range filter
//! - [`traits`]: the source executor and target payload collaborators
//!
//! Drivers implement the traits; the profilers and the engine only depend on
//! this module, so every part of a run can be exercised with in-memory mocks.

pub mod predicate;
pub mod schema;
pub mod traits;
pub mod value;

pub use predicate::{DateBound, Predicate};
pub use schema::{ColumnDescriptor, TableRef};
pub use traits::{
    NumericAggregates, SourceQueryExecutor, TargetPayloadProvider, TemporalAggregates,
    TextAggregates,
};
pub use value::{Metric, MetricSet, MetricValue};
