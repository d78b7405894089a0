//! Collaborator implementations.
//!
//! - [`snapshot`]: JSON snapshot source and payload file target
//! - [`netezza`]: Netezza catalog and aggregate SQL
//! - [`snowflake`]: Snowflake validation procedure call
//! - `odbc`: live Netezza/Snowflake access (feature `odbc`)
//!
//! [`source_from_config`] and [`target_from_config`] pick the implementation
//! named by the configuration.

pub mod netezza;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod snapshot;
pub mod snowflake;

pub use snapshot::{FilePayloadProvider, SnapshotSource};

#[cfg(feature = "odbc")]
pub use odbc::{NetezzaOdbcExecutor, SnowflakeOdbcProvider};

use std::sync::Arc;

use crate::config::{SourceConfig, SourceKind, TargetConfig, TargetKind};
use crate::core::{SourceQueryExecutor, TargetPayloadProvider};
use crate::error::{ReconError, Result};

/// Build the source executor named by the configuration.
pub fn source_from_config(config: &SourceConfig) -> Result<Arc<dyn SourceQueryExecutor>> {
    match config.kind {
        SourceKind::Snapshot => {
            let path = config.snapshot_path.as_ref().ok_or_else(|| {
                ReconError::Config("source.snapshot_path is required".into())
            })?;
            Ok(Arc::new(SnapshotSource::load(path)?))
        }
        #[cfg(feature = "odbc")]
        SourceKind::Odbc => {
            let conn = required(&config.connection_string, "source.connection_string")?;
            Ok(Arc::new(NetezzaOdbcExecutor::connect(conn)?))
        }
        #[cfg(not(feature = "odbc"))]
        SourceKind::Odbc => Err(ReconError::Config(
            "source.kind 'odbc' requires building with the 'odbc' feature".into(),
        )),
    }
}

/// Build the target payload provider named by the configuration.
pub fn target_from_config(config: &TargetConfig) -> Result<Arc<dyn TargetPayloadProvider>> {
    match config.kind {
        TargetKind::File => {
            let path = config.payload_path.as_ref().ok_or_else(|| {
                ReconError::Config("target.payload_path is required".into())
            })?;
            Ok(Arc::new(FilePayloadProvider::new(path)))
        }
        #[cfg(feature = "odbc")]
        TargetKind::Odbc => {
            let conn = required(&config.connection_string, "target.connection_string")?;
            Ok(Arc::new(SnowflakeOdbcProvider::connect(
                conn,
                config.procedure.clone(),
            )?))
        }
        #[cfg(not(feature = "odbc"))]
        TargetKind::Odbc => Err(ReconError::Config(
            "target.kind 'odbc' requires building with the 'odbc' feature".into(),
        )),
    }
}

#[cfg(feature = "odbc")]
fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ReconError::Config(format!("{} is required", name)))
}
