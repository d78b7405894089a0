//! Column and table profiles for both sides of a reconciliation run.
//!
//! The source side is built by querying ([`SourceProfileBuilder`]); the target
//! side is adapted from a precomputed payload ([`TargetProfileAdapter`]). Both
//! produce the same [`TableProfile`] shape so the engine can compare them.

mod column;
mod source;
mod target;

pub use column::ColumnProfiler;
pub use source::SourceProfileBuilder;
pub use target::TargetProfileAdapter;

use serde::Serialize;
use std::collections::HashMap;

use crate::classify::TypeCategory;
use crate::core::{ColumnDescriptor, MetricSet};

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub descriptor: ColumnDescriptor,
    pub category: TypeCategory,
    pub metrics: MetricSet,
}

impl ColumnProfile {
    pub fn new(descriptor: ColumnDescriptor, category: TypeCategory, metrics: MetricSet) -> Self {
        Self {
            descriptor,
            category,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Payload entry dropped by the adapter because it does not belong to the
/// column's category (or is not a metric at all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadWarning {
    pub column: String,
    pub key: String,
    pub reason: String,
}

/// Row count plus per-column profiles.
///
/// Columns keep insertion order (catalog order on the source side) and are
/// indexed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableProfile {
    pub row_count: i64,
    columns: Vec<ColumnProfile>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PayloadWarning>,
}

impl TableProfile {
    pub fn new(row_count: i64) -> Self {
        Self {
            row_count,
            ..Self::default()
        }
    }

    /// Add a column. Returns `false` (and leaves the profile unchanged) if a
    /// column with the same name already exists.
    pub fn insert(&mut self, column: ColumnProfile) -> bool {
        if self.index.contains_key(column.name()) {
            return false;
        }
        self.index
            .insert(column.name().to_string(), self.columns.len());
        self.columns.push(column);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ColumnProfile> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
