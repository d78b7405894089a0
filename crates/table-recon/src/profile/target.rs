use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::classify::TypeCategory;
use crate::core::{ColumnDescriptor, Metric, MetricSet, MetricValue};
use crate::error::{ReconError, Result};

use super::{ColumnProfile, PayloadWarning, TableProfile};

/// Reserved top-level key holding the table row count.
const COUNT_KEY: &str = "COUNT";

/// Column entry key holding the target type tag. `DATATYPE` is the legacy
/// spelling.
const DATA_TYPE_KEYS: [&str; 2] = ["DATA_TYPE", "DATATYPE"];

/// UTC marker appended by the target to temporal metrics.
const UTC_MARKER: char = 'Z';

/// Normalizes the target validation payload into a [`TableProfile`].
///
/// Payload shape:
///
/// ```json
/// {
///   "ID":   { "DATA_TYPE": "NUMERIC", "COUNT": 27, "SUM": 378 },
///   "NAME": { "DATA_TYPE": "TEXT", "MAX_LENGTH": 20 },
///   "COUNT": 27
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetProfileAdapter {
    strict: bool,
}

impl TargetProfileAdapter {
    /// With `strict`, metrics that do not apply to a column's category (and
    /// unknown keys) are errors instead of warnings.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Parse a payload delivered as JSON text, then adapt it.
    pub fn adapt_str(&self, text: &str) -> Result<TableProfile> {
        let payload: Value = serde_json::from_str(text)
            .map_err(|e| ReconError::payload(format!("payload is not valid JSON: {}", e)))?;
        self.adapt(&payload)
    }

    /// Adapt a payload. A JSON string value is parsed first.
    pub fn adapt(&self, payload: &Value) -> Result<TableProfile> {
        let entries = match payload {
            Value::Object(map) => map,
            Value::String(text) => return self.adapt_str(text),
            other => {
                return Err(ReconError::payload(format!(
                    "expected a JSON object, got {}",
                    json_kind(other)
                )))
            }
        };

        let mut profile = TableProfile::new(row_count(entries)?);

        for (name, entry) in entries {
            if is_count_entry(name, entry) {
                continue;
            }
            let fields = entry.as_object().ok_or_else(|| {
                ReconError::payload(format!(
                    "column {} must be an object, got {}",
                    name,
                    json_kind(entry)
                ))
            })?;
            let column = self.adapt_column(name, fields, &mut profile.warnings)?;
            if !profile.insert(column) {
                return Err(ReconError::payload(format!("column {} appears twice", name)));
            }
        }

        debug!(
            "adapted target payload: {} rows, {} columns, {} warnings",
            profile.row_count,
            profile.len(),
            profile.warnings.len()
        );
        Ok(profile)
    }

    fn adapt_column(
        &self,
        name: &str,
        fields: &Map<String, Value>,
        warnings: &mut Vec<PayloadWarning>,
    ) -> Result<ColumnProfile> {
        let (type_key, tag) = fields
            .iter()
            .find(|(k, _)| DATA_TYPE_KEYS.iter().any(|d| k.eq_ignore_ascii_case(d)))
            .ok_or_else(|| ReconError::payload(format!("column {} has no DATA_TYPE", name)))?;
        let tag = tag.as_str().ok_or_else(|| {
            ReconError::payload(format!("column {}: DATA_TYPE must be a string", name))
        })?;
        let category = TypeCategory::from_target_tag(tag);

        let mut metrics = MetricSet::new();
        for (key, raw) in fields {
            if key == type_key {
                continue;
            }

            let metric = match key.parse::<Metric>() {
                Ok(metric) => metric,
                Err(_) => {
                    self.reject(name, key, "unknown metric".to_string(), warnings)?;
                    continue;
                }
            };
            if !category.is_applicable(metric) {
                self.reject(
                    name,
                    key,
                    format!("{} does not apply to {} columns", metric, category),
                    warnings,
                )?;
                continue;
            }

            let value = MetricValue::from_json(raw).ok_or_else(|| {
                ReconError::payload(format!(
                    "column {}: {} has unsupported value {}",
                    name, key, raw
                ))
            })?;
            let value = if metric.is_temporal() {
                strip_utc_marker(value)
            } else {
                value
            };

            if metrics.insert(metric, value).is_some() {
                return Err(ReconError::payload(format!(
                    "column {}: {} given more than once",
                    name, metric
                )));
            }
        }

        Ok(ColumnProfile::new(
            ColumnDescriptor::new(name, tag),
            category,
            metrics,
        ))
    }

    fn reject(
        &self,
        column: &str,
        key: &str,
        reason: String,
        warnings: &mut Vec<PayloadWarning>,
    ) -> Result<()> {
        if self.strict {
            return Err(ReconError::payload(format!(
                "column {}: {}: {}",
                column, key, reason
            )));
        }
        warn!("Ignoring target metric {}.{}: {}", column, key, reason);
        warnings.push(PayloadWarning {
            column: column.to_string(),
            key: key.to_string(),
            reason,
        });
        Ok(())
    }
}

/// The reserved count entry is the top-level `COUNT` whose value is a number;
/// a column that happens to be named `COUNT` is an object.
fn is_count_entry(key: &str, value: &Value) -> bool {
    key.eq_ignore_ascii_case(COUNT_KEY) && value.is_number()
}

fn row_count(entries: &Map<String, Value>) -> Result<i64> {
    let (_, value) = entries
        .iter()
        .find(|(k, v)| is_count_entry(k, v))
        .ok_or_else(|| ReconError::payload("missing numeric top-level COUNT"))?;

    let count = match MetricValue::from_json(value) {
        Some(MetricValue::Number(d)) if d.fract().is_zero() => d.to_i64(),
        _ => None,
    };
    match count {
        Some(n) if n >= 0 => Ok(n),
        _ => Err(ReconError::payload(format!(
            "COUNT must be a non-negative integer, got {}",
            value
        ))),
    }
}

/// Remove exactly one trailing UTC marker from a date string.
fn strip_utc_marker(value: MetricValue) -> MetricValue {
    match value {
        MetricValue::Text(s) => match s.strip_suffix(UTC_MARKER) {
            Some(stripped) => MetricValue::Text(stripped.to_string()),
            None => MetricValue::Text(s),
        },
        other => other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
