//! Reconciliation engine: row-count gate, then per-column metric comparison.

mod types;

pub use types::{
    Discrepancy, FailureKind, MissingColumn, ReconcileOutcome, ReconcileState, Side,
    ValidationReport,
};

use tracing::{debug, info, warn};

use crate::profile::{ColumnProfile, TableProfile};

/// Compares a source and a target [`TableProfile`].
///
/// `Init -> CountChecked -> Compared -> Done`, or `Failed(CountMismatch)`
/// straight after the count check. [`state`](Self::state) reports where the
/// last run ended; each run starts again from `Init`.
#[derive(Debug)]
pub struct ReconcileEngine {
    state: ReconcileState,
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileEngine {
    pub fn new() -> Self {
        Self {
            state: ReconcileState::Init,
        }
    }

    /// Current state. `Init` before the first run.
    pub fn state(&self) -> ReconcileState {
        self.state
    }

    fn transition(&mut self, next: ReconcileState) {
        debug!("reconcile state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run the comparison. Row counts are checked first; on mismatch no
    /// column is compared.
    pub fn run(&mut self, source: &TableProfile, target: &TableProfile) -> ReconcileOutcome {
        if self.state != ReconcileState::Init {
            self.transition(ReconcileState::Init);
        }
        if source.row_count != target.row_count {
            self.transition(ReconcileState::Failed(FailureKind::CountMismatch));
            warn!(
                "Row count mismatch: source={} target={}",
                source.row_count, target.row_count
            );
            return ReconcileOutcome::CountMismatch {
                source_count: source.row_count,
                target_count: target.row_count,
            };
        }
        self.transition(ReconcileState::CountChecked);

        let mut report = ValidationReport {
            count_match: true,
            source_count: source.row_count,
            target_count: target.row_count,
            ..Default::default()
        };

        for src in source.columns() {
            match target.get(src.name()) {
                Some(tgt) => compare_column(src, tgt, &mut report),
                None => report.missing_columns.push(MissingColumn {
                    column: src.name().to_string(),
                    missing_from: Side::Target,
                }),
            }
        }
        for tgt in target.columns() {
            if !source.contains(tgt.name()) {
                report.missing_columns.push(MissingColumn {
                    column: tgt.name().to_string(),
                    missing_from: Side::Source,
                });
            }
        }
        self.transition(ReconcileState::Compared);

        info!(
            "Compared {} columns: {} discrepancies, {} missing",
            source.len(),
            report.discrepancies.len(),
            report.missing_columns.len()
        );
        self.transition(ReconcileState::Done);

        if report.passed() {
            ReconcileOutcome::Passed { report }
        } else {
            ReconcileOutcome::DataMismatch { report }
        }
    }
}

/// Compare the metrics present on both sides that apply to the source
/// column's category.
fn compare_column(src: &ColumnProfile, tgt: &ColumnProfile, report: &mut ValidationReport) {
    if src.category != tgt.category {
        warn!(
            "{}: source type {} ({}) but target reports {}",
            src.name(),
            src.descriptor.declared_type,
            src.category,
            tgt.category
        );
    }

    for (metric, source_value) in &src.metrics {
        if !src.category.is_applicable(*metric) {
            continue;
        }
        let Some(target_value) = tgt.metrics.get(*metric) else {
            continue;
        };
        if !source_value.matches(target_value) {
            debug!(
                "{}.{}: source={} target={}",
                src.name(),
                metric,
                source_value,
                target_value
            );
            report.discrepancies.push(Discrepancy {
                column: src.name().to_string(),
                category: src.category,
                metric: *metric,
                source_value: source_value.clone(),
                target_value: target_value.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TypeCategory;
    use crate::core::{ColumnDescriptor, Metric, MetricSet, MetricValue};
    use crate::profile::TargetProfileAdapter;
    use serde_json::json;

    fn column(name: &str, declared: &str, category: TypeCategory, metrics: MetricSet) -> ColumnProfile {
        ColumnProfile::new(ColumnDescriptor::new(name, declared), category, metrics)
    }

    fn numeric(name: &str, count: i64, sum: i64) -> ColumnProfile {
        column(
            name,
            "INTEGER",
            TypeCategory::Numeric,
            [
                (Metric::Count, MetricValue::integer(count)),
                (Metric::Sum, MetricValue::integer(sum)),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn text(name: &str, max_length: i64) -> ColumnProfile {
        column(
            name,
            "VARCHAR(50)",
            TypeCategory::Text,
            [(Metric::MaxLength, MetricValue::integer(max_length))]
                .into_iter()
                .collect(),
        )
    }

    fn table(row_count: i64, columns: Vec<ColumnProfile>) -> TableProfile {
        let mut t = TableProfile::new(row_count);
        for c in columns {
            t.insert(c);
        }
        t
    }

    #[test]
    fn test_identical_profiles_pass() {
        let source = table(27, vec![numeric("ID", 27, 378)]);
        let target = table(27, vec![numeric("ID", 27, 378)]);
        let outcome = ReconcileEngine::new().run(&source, &target);
        assert!(outcome.is_pass());
        assert_eq!(outcome.state(), ReconcileState::Done);
        let report = outcome.report().unwrap();
        assert!(report.count_match);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn test_count_mismatch_skips_columns() {
        let source = table(27, vec![text("NAME", 20)]);
        let target = table(25, vec![text("NAME", 22)]);
        let outcome = ReconcileEngine::new().run(&source, &target);
        assert_eq!(
            outcome,
            ReconcileOutcome::CountMismatch {
                source_count: 27,
                target_count: 25
            }
        );
        assert!(outcome.report().is_none());
    }

    #[test]
    fn test_single_text_discrepancy() {
        let source = table(27, vec![numeric("ID", 27, 378), text("NAME", 20)]);
        let target = table(27, vec![numeric("ID", 27, 378), text("NAME", 22)]);
        let outcome = ReconcileEngine::new().run(&source, &target);
        let report = outcome.report().unwrap();
        assert_eq!(report.discrepancies.len(), 1);
        let d = &report.discrepancies[0];
        assert_eq!(d.column, "NAME");
        assert_eq!(d.metric, Metric::MaxLength);
        assert_eq!(d.source_value, MetricValue::integer(20));
        assert_eq!(d.target_value, MetricValue::integer(22));
        assert_eq!(outcome.status(), "data_mismatch");
    }

    #[test]
    fn test_utc_marker_difference_is_not_a_discrepancy() {
        let source = table(
            5,
            vec![column(
                "CREATED_AT",
                "TIMESTAMP",
                TypeCategory::Temporal,
                [(Metric::MinDate, MetricValue::text("2015-05-28T15:53:00"))]
                    .into_iter()
                    .collect(),
            )],
        );
        let target = TargetProfileAdapter::default()
            .adapt(&json!({
                "CREATED_AT": {"DATA_TYPE": "TEMPORAL", "MIN_DATE": "2015-05-28T15:53:00Z"},
                "COUNT": 5
            }))
            .unwrap();
        assert!(ReconcileEngine::new().run(&source, &target).is_pass());
    }

    #[test]
    fn test_equality_is_exact() {
        let avg = |v: MetricValue| {
            column(
                "PRICE",
                "NUMERIC(18,8)",
                TypeCategory::Numeric,
                [(Metric::Avg, v)].into_iter().collect(),
            )
        };
        let source = table(1, vec![avg(MetricValue::from_sql_text(Some("10.00000001")))]);
        let target = TargetProfileAdapter::default()
            .adapt(&json!({"PRICE": {"DATA_TYPE": "NUMERIC", "AVG": 10.0}, "COUNT": 1}))
            .unwrap();
        let outcome = ReconcileEngine::new().run(&source, &target);
        assert_eq!(outcome.report().unwrap().discrepancies.len(), 1);

        let target = table(1, vec![avg(MetricValue::from_sql_text(Some("10.000000010")))]);
        assert!(ReconcileEngine::new().run(&source, &target).is_pass());
    }

    #[test]
    fn test_inapplicable_metrics_never_reported() {
        // A text column carrying a stray SUM on both sides.
        let stray = |sum: i64| {
            column(
                "NAME",
                "VARCHAR(10)",
                TypeCategory::Text,
                [
                    (Metric::MaxLength, MetricValue::integer(10)),
                    (Metric::Sum, MetricValue::integer(sum)),
                ]
                .into_iter()
                .collect(),
            )
        };
        let source = table(3, vec![stray(1)]);
        let target = table(3, vec![stray(2)]);
        assert!(ReconcileEngine::new().run(&source, &target).is_pass());
    }

    #[test]
    fn test_one_sided_metrics_are_skipped() {
        let source = table(27, vec![numeric("ID", 27, 378)]);
        let target = table(
            27,
            vec![column(
                "ID",
                "NUMERIC",
                TypeCategory::Numeric,
                [(Metric::Count, MetricValue::integer(27))].into_iter().collect(),
            )],
        );
        assert!(ReconcileEngine::new().run(&source, &target).is_pass());
    }

    #[test]
    fn test_null_against_value_is_a_discrepancy() {
        let avg = |v: MetricValue| {
            column(
                "AMT",
                "INTEGER",
                TypeCategory::Numeric,
                [(Metric::Avg, v)].into_iter().collect(),
            )
        };
        let source = table(0, vec![avg(MetricValue::Null)]);
        let target = table(0, vec![avg(MetricValue::integer(0))]);
        let outcome = ReconcileEngine::new().run(&source, &target);
        assert_eq!(outcome.report().unwrap().discrepancies.len(), 1);

        let target = table(0, vec![avg(MetricValue::Null)]);
        assert!(ReconcileEngine::new().run(&source, &target).is_pass());
    }

    #[test]
    fn test_missing_columns_reported_both_ways() {
        let source = table(27, vec![numeric("ID", 27, 378), text("NAME", 20)]);
        let target = table(27, vec![numeric("ID", 27, 378), text("EXTRA", 3)]);
        let outcome = ReconcileEngine::new().run(&source, &target);
        assert!(!outcome.is_pass());
        let report = outcome.report().unwrap();
        assert!(report.discrepancies.is_empty());
        assert_eq!(
            report.missing_columns,
            vec![
                MissingColumn {
                    column: "NAME".into(),
                    missing_from: Side::Target
                },
                MissingColumn {
                    column: "EXTRA".into(),
                    missing_from: Side::Source
                },
            ]
        );
    }

    #[test]
    fn test_discrepancies_follow_source_column_order() {
        let source = table(1, vec![text("B", 1), text("A", 1)]);
        let target = table(1, vec![text("A", 2), text("B", 2)]);
        let outcome = ReconcileEngine::new().run(&source, &target);
        let columns: Vec<&str> = outcome
            .report()
            .unwrap()
            .discrepancies
            .iter()
            .map(|d| d.column.as_str())
            .collect();
        assert_eq!(columns, vec!["B", "A"]);
    }

    #[test]
    fn test_engine_starts_in_init() {
        assert_eq!(ReconcileEngine::new().state(), ReconcileState::Init);
    }

    #[test]
    fn test_engine_state_follows_last_run() {
        let mut engine = ReconcileEngine::new();

        let outcome = engine.run(
            &table(27, vec![text("NAME", 20)]),
            &table(25, vec![text("NAME", 20)]),
        );
        assert_eq!(
            engine.state(),
            ReconcileState::Failed(FailureKind::CountMismatch)
        );
        assert_eq!(engine.state(), outcome.state());

        let outcome = engine.run(
            &table(27, vec![text("NAME", 20)]),
            &table(27, vec![text("NAME", 22)]),
        );
        assert_eq!(engine.state(), ReconcileState::Done);
        assert_eq!(engine.state(), outcome.state());
        assert!(!outcome.is_pass());
    }
}
