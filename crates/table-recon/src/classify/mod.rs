//! Type classification: declared warehouse types to profiling categories.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::Metric;

/// Semantic category that decides which metrics apply to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeCategory {
    Numeric,
    Text,
    Temporal,
    /// Boolean, binary, JSON and anything else. Never profiled.
    Other,
}

const NUMERIC_TYPES: [&str; 7] = [
    "NUMERIC",
    "REAL",
    "DOUBLE PRECISION",
    "INTEGER",
    "BYTEINT",
    "SMALLINT",
    "BIGINT",
];

const NUMERIC_METRICS: [Metric; 6] = [
    Metric::Avg,
    Metric::Min,
    Metric::Max,
    Metric::Sum,
    Metric::NullCount,
    Metric::Count,
];
const TEXT_METRICS: [Metric; 1] = [Metric::MaxLength];
const TEMPORAL_METRICS: [Metric; 2] = [Metric::MinDate, Metric::MaxDate];

impl TypeCategory {
    /// Metrics that are meaningful for this category.
    pub fn applicable_metrics(&self) -> &'static [Metric] {
        match self {
            TypeCategory::Numeric => &NUMERIC_METRICS,
            TypeCategory::Text => &TEXT_METRICS,
            TypeCategory::Temporal => &TEMPORAL_METRICS,
            TypeCategory::Other => &[],
        }
    }

    pub fn is_applicable(&self, metric: Metric) -> bool {
        self.applicable_metrics().contains(&metric)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCategory::Numeric => "NUMERIC",
            TypeCategory::Text => "TEXT",
            TypeCategory::Temporal => "TEMPORAL",
            TypeCategory::Other => "OTHER",
        }
    }

    /// Category of a target payload `DATA_TYPE` tag.
    ///
    /// Category names are taken as-is; otherwise the tag is a Snowflake type
    /// name. The source's declared type is never consulted.
    pub fn from_target_tag(tag: &str) -> Self {
        let normalized = normalize(tag);
        match normalized.as_str() {
            "NUMERIC" => return TypeCategory::Numeric,
            "TEXT" => return TypeCategory::Text,
            "TEMPORAL" => return TypeCategory::Temporal,
            "OTHER" => return TypeCategory::Other,
            _ => {}
        }

        match normalized.as_str() {
            "NUMBER" | "DECIMAL" | "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT"
            | "BYTEINT" | "REAL" | "DOUBLE PRECISION" => TypeCategory::Numeric,
            t if t.starts_with("FLOAT") || t.starts_with("DOUBLE") => TypeCategory::Numeric,
            "STRING" => TypeCategory::Text,
            t if t.contains("CHAR") => TypeCategory::Text,
            "DATE" => TypeCategory::Temporal,
            t if t.contains("TIME") => TypeCategory::Temporal,
            _ => TypeCategory::Other,
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip any parenthesized suffix and uppercase.
fn normalize(declared_type: &str) -> String {
    declared_type
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase()
}

/// Classify a source declared type.
///
/// NUMERIC is an exact match against a fixed set and is checked first; TEXT
/// (`CHAR`) and TEMPORAL (`TIME`) use substring matches. Total over all input.
pub fn classify(declared_type: &str) -> TypeCategory {
    let normalized = normalize(declared_type);

    if NUMERIC_TYPES.contains(&normalized.as_str()) {
        TypeCategory::Numeric
    } else if normalized.contains("CHAR") {
        TypeCategory::Text
    } else if normalized == "DATE" || normalized == "INTERVAL" || normalized.contains("TIME") {
        TypeCategory::Temporal
    } else {
        TypeCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_types() {
        for t in NUMERIC_TYPES {
            assert_eq!(classify(t), TypeCategory::Numeric, "{}", t);
        }
        assert_eq!(classify("NUMERIC(18,2)"), TypeCategory::Numeric);
        assert_eq!(classify("integer"), TypeCategory::Numeric);
        assert_eq!(classify("double precision"), TypeCategory::Numeric);
    }

    #[test]
    fn test_numeric_is_exact_match() {
        // Not in the set, even though they look numeric.
        assert_eq!(classify("BIGINTEGER"), TypeCategory::Other);
        assert_eq!(classify("FLOAT"), TypeCategory::Other);
        assert_eq!(classify("DOUBLE"), TypeCategory::Other);
    }

    #[test]
    fn test_text_types() {
        assert_eq!(classify("VARCHAR(50)"), TypeCategory::Text);
        assert_eq!(classify("CHARACTER VARYING(20)"), TypeCategory::Text);
        assert_eq!(classify("NCHAR(10)"), TypeCategory::Text);
        assert_eq!(classify("nvarchar"), TypeCategory::Text);
    }

    #[test]
    fn test_temporal_types() {
        assert_eq!(classify("DATE"), TypeCategory::Temporal);
        assert_eq!(classify("INTERVAL"), TypeCategory::Temporal);
        assert_eq!(classify("TIMESTAMP"), TypeCategory::Temporal);
        assert_eq!(classify("TIME WITH TIME ZONE"), TypeCategory::Temporal);
        assert_eq!(classify("timestamp(6)"), TypeCategory::Temporal);
        assert_eq!(classify("DATETIME"), TypeCategory::Temporal);
    }

    #[test]
    fn test_date_is_exact_match() {
        assert_eq!(classify("DATERANGE"), TypeCategory::Other);
    }

    #[test]
    fn test_other_types() {
        assert_eq!(classify("BOOLEAN"), TypeCategory::Other);
        assert_eq!(classify("VARBINARY(100)"), TypeCategory::Other);
        assert_eq!(classify("JSON"), TypeCategory::Other);
        assert_eq!(classify(""), TypeCategory::Other);
        assert_eq!(classify("(((("), TypeCategory::Other);
    }

    #[test]
    fn test_applicable_metrics() {
        assert_eq!(TypeCategory::Numeric.applicable_metrics().len(), 6);
        assert_eq!(TypeCategory::Text.applicable_metrics(), &[Metric::MaxLength]);
        assert!(TypeCategory::Temporal.is_applicable(Metric::MaxDate));
        assert!(!TypeCategory::Temporal.is_applicable(Metric::Max));
        assert!(TypeCategory::Other.applicable_metrics().is_empty());
    }

    #[test]
    fn test_target_tags() {
        assert_eq!(TypeCategory::from_target_tag("numeric"), TypeCategory::Numeric);
        assert_eq!(TypeCategory::from_target_tag("NUMBER(38,0)"), TypeCategory::Numeric);
        assert_eq!(TypeCategory::from_target_tag("FLOAT"), TypeCategory::Numeric);
        assert_eq!(TypeCategory::from_target_tag("TEXT"), TypeCategory::Text);
        assert_eq!(TypeCategory::from_target_tag("VARCHAR(16777216)"), TypeCategory::Text);
        assert_eq!(TypeCategory::from_target_tag("TIMESTAMP_NTZ"), TypeCategory::Temporal);
        assert_eq!(TypeCategory::from_target_tag("date"), TypeCategory::Temporal);
        assert_eq!(TypeCategory::from_target_tag("VARIANT"), TypeCategory::Other);
        assert_eq!(TypeCategory::from_target_tag("BOOLEAN"), TypeCategory::Other);
    }

    #[test]
    fn test_category_serializes_upper_case() {
        assert_eq!(
            serde_json::to_string(&TypeCategory::Temporal).unwrap(),
            "\"TEMPORAL\""
        );
    }
}
