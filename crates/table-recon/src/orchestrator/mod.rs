//! Reconciliation orchestrator - wires collaborators, profilers and engine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{Config, ReconcileConfig};
use crate::core::{Predicate, SourceQueryExecutor, TableRef, TargetPayloadProvider};
use crate::drivers::{source_from_config, target_from_config};
use crate::error::Result;
use crate::profile::{PayloadWarning, SourceProfileBuilder, TargetProfileAdapter};
use crate::reconcile::{ReconcileEngine, ReconcileOutcome};

/// What to reconcile.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// Netezza table, profiled by query.
    pub source_table: TableRef,

    /// Snowflake table, profiled by the validation procedure.
    pub target_table: TableRef,

    /// Date-range filter applied to every source query.
    pub predicate: Option<Predicate>,
}

/// Runs one reconciliation per call.
pub struct Reconciler {
    source: Arc<dyn SourceQueryExecutor>,
    target: Arc<dyn TargetPayloadProvider>,
    config: ReconcileConfig,
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    pub source_table: String,
    pub target_table: String,

    /// Rendered source filter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,

    /// `status` plus either the report or the mismatched counts.
    #[serde(flatten)]
    pub outcome: ReconcileOutcome,

    /// Target payload entries that were ignored.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payload_warnings: Vec<PayloadWarning>,
}

impl ReconcileResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `Ok(())` on pass, otherwise the error matching the outcome.
    pub fn check(&self) -> Result<()> {
        self.outcome.clone().into_result().map(|_| ())
    }
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn SourceQueryExecutor>,
        target: Arc<dyn TargetPayloadProvider>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            source,
            target,
            config,
        }
    }

    /// Build the collaborators named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = source_from_config(&config.source)?;
        let target = target_from_config(&config.target)?;
        info!(
            "Source: {}, target: {}",
            source.db_type(),
            target.db_type()
        );
        Ok(Self::new(source, target, config.reconcile.clone()))
    }

    /// Profile both sides concurrently, then compare.
    ///
    /// Collaborator and payload errors abort the run. Count and data
    /// mismatches are not errors here; they are reported in the outcome.
    pub async fn run(&self, request: &ReconcileRequest) -> Result<ReconcileResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!(
            "Starting reconciliation run {}: {} (source) vs {} (target)",
            run_id, request.source_table, request.target_table
        );
        if let Some(p) = &request.predicate {
            info!("Source filter: {}", p);
        }

        let builder = SourceProfileBuilder::new(self.source.clone())
            .with_concurrency(self.config.profile_concurrency);
        let (source_profile, payload) = tokio::try_join!(
            builder.build(&request.source_table, request.predicate.as_ref()),
            self.target.fetch_validation_payload(&request.target_table),
        )?;

        let target_profile = TargetProfileAdapter::new(self.config.strict_payload).adapt(&payload)?;
        let outcome = ReconcileEngine::new().run(&source_profile, &target_profile);

        let completed_at = Utc::now();
        let duration_seconds = start.elapsed().as_secs_f64();

        if outcome.is_pass() {
            info!("Reconciliation passed in {:.2}s", duration_seconds);
        } else {
            warn!(
                "Reconciliation failed ({}) in {:.2}s",
                outcome.status(),
                duration_seconds
            );
        }

        Ok(ReconcileResult {
            run_id,
            duration_seconds,
            started_at,
            completed_at,
            source_table: request.source_table.to_string(),
            target_table: request.target_table.to_string(),
            predicate: request.predicate.as_ref().map(Predicate::to_sql),
            outcome,
            payload_warnings: target_profile.warnings,
        })
    }
}
