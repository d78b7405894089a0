//! # table-recon
//!
//! Post-migration reconciliation of a Netezza table against its Snowflake copy.
//!
//! Instead of diffing rows, both sides are reduced to per-column statistical
//! fingerprints and compared:
//!
//! - **Type classification** of declared column types into NUMERIC, TEXT,
//!   TEMPORAL and OTHER
//! - **Source profiling** with one aggregate query per column
//! - **Target adaptation** of the payload returned by the validation procedure
//! - **Row-count gate** that fails fast before any column is compared
//! - **Exact comparison** of every metric present on both sides
//!
//! ## Example
//!
//! ```rust,no_run
//! use table_recon::{Config, Reconciler, ReconcileRequest, TableRef};
//!
//! #[tokio::main]
//! async fn main() -> table_recon::Result<()> {
//!     let config = Config::load("recon.yaml")?;
//!     let reconciler = Reconciler::from_config(&config)?;
//!     let request = ReconcileRequest {
//!         source_table: "EDW.SALES.ORDERS".parse::<TableRef>()?,
//!         target_table: "PROD.SALES.ORDERS".parse::<TableRef>()?,
//!         predicate: None,
//!     };
//!     let result = reconciler.run(&request).await?;
//!     println!("{}", result.to_json()?);
//!     result.check()
//! }
//! ```

pub mod classify;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod profile;
pub mod reconcile;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use classify::{classify, TypeCategory};
pub use config::{Config, ReconcileConfig, SourceConfig, TargetConfig};
pub use crate::core::{
    ColumnDescriptor, Metric, MetricSet, MetricValue, Predicate, SourceQueryExecutor, TableRef,
    TargetPayloadProvider,
};
pub use error::{ReconError, Result};
pub use orchestrator::{ReconcileRequest, ReconcileResult, Reconciler};
pub use profile::{ColumnProfile, TableProfile};
pub use reconcile::{Discrepancy, ReconcileEngine, ReconcileOutcome, ValidationReport};
