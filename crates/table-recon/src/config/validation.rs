//! Configuration validation.

use super::{Config, SourceKind, TargetKind};
use crate::error::{ReconError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    match config.source.kind {
        SourceKind::Snapshot => {
            if config.source.snapshot_path.is_none() {
                return Err(ReconError::Config(
                    "source.snapshot_path is required for kind 'snapshot'".into(),
                ));
            }
        }
        SourceKind::Odbc => {
            require_odbc_feature("source")?;
            if is_blank(&config.source.connection_string) {
                return Err(ReconError::Config(
                    "source.connection_string is required for kind 'odbc'".into(),
                ));
            }
        }
    }

    // Target validation
    match config.target.kind {
        TargetKind::File => {
            if config.target.payload_path.is_none() {
                return Err(ReconError::Config(
                    "target.payload_path is required for kind 'file'".into(),
                ));
            }
        }
        TargetKind::Odbc => {
            require_odbc_feature("target")?;
            if is_blank(&config.target.connection_string) {
                return Err(ReconError::Config(
                    "target.connection_string is required for kind 'odbc'".into(),
                ));
            }
        }
    }
    if !is_dotted_identifier(&config.target.procedure) {
        return Err(ReconError::Config(format!(
            "target.procedure must be a dotted identifier, got '{}'",
            config.target.procedure
        )));
    }

    if config.reconcile.profile_concurrency == 0 {
        return Err(ReconError::Config(
            "reconcile.profile_concurrency must be at least 1".into(),
        ));
    }

    Ok(())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// `NAME` or `DB.SCHEMA.NAME`: letters, digits, `_` and `$` in non-empty parts.
pub(crate) fn is_dotted_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

#[cfg(feature = "odbc")]
fn require_odbc_feature(_side: &str) -> Result<()> {
    Ok(())
}

#[cfg(not(feature = "odbc"))]
fn require_odbc_feature(side: &str) -> Result<()> {
    Err(ReconError::Config(format!(
        "{}.kind 'odbc' requires building with the 'odbc' feature",
        side
    )))
}
