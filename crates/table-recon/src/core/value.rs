//! Metric names, metric values and metric sets.
//!
//! A [`MetricSet`] only ever holds the metrics that apply to a column's
//! category. An absent metric means "not applicable" and is never compared;
//! a present [`MetricValue::Null`] means the aggregate itself was NULL.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single per-column statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Avg,
    Min,
    Max,
    Sum,
    NullCount,
    Count,
    MaxLength,
    MinDate,
    MaxDate,
}

impl Metric {
    /// Every metric, in report order.
    pub const ALL: [Metric; 9] = [
        Metric::Avg,
        Metric::Min,
        Metric::Max,
        Metric::Sum,
        Metric::NullCount,
        Metric::Count,
        Metric::MaxLength,
        Metric::MinDate,
        Metric::MaxDate,
    ];

    /// Payload/report name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Avg => "AVG",
            Metric::Min => "MIN",
            Metric::Max => "MAX",
            Metric::Sum => "SUM",
            Metric::NullCount => "NULL_COUNT",
            Metric::Count => "COUNT",
            Metric::MaxLength => "MAX_LENGTH",
            Metric::MinDate => "MIN_DATE",
            Metric::MaxDate => "MAX_DATE",
        }
    }

    /// Whether values of this metric are dates rendered as strings.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Metric::MinDate | Metric::MaxDate)
    }
}

impl FromStr for Metric {
    type Err = String;

    /// Case-insensitive. `NULL_SUM` is the legacy export name of `NULL_COUNT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AVG" => Ok(Metric::Avg),
            "MIN" => Ok(Metric::Min),
            "MAX" => Ok(Metric::Max),
            "SUM" => Ok(Metric::Sum),
            "NULL_COUNT" | "NULL_SUM" => Ok(Metric::NullCount),
            "COUNT" => Ok(Metric::Count),
            "MAX_LENGTH" => Ok(Metric::MaxLength),
            "MIN_DATE" => Ok(Metric::MinDate),
            "MAX_DATE" => Ok(Metric::MaxDate),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Value of a single metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Exact decimal (integers and fixed-point aggregates).
    Number(Decimal),

    /// Floating point value that does not fit a decimal.
    Float(f64),

    /// String value (dates, text aggregates).
    Text(String),

    /// The aggregate evaluated to NULL.
    Null,
}

impl MetricValue {
    /// Convert a JSON value. Returns `None` for booleans, arrays and objects.
    ///
    /// Numbers go through their textual form so `10.00000001` stays exact.
    /// `serde_json` keeps that text verbatim (`arbitrary_precision`), so
    /// values wider than `u64` or `f64` survive parsing. Only numbers a
    /// decimal cannot hold become [`MetricValue::Float`].
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(MetricValue::Null),
            Value::String(s) => Some(MetricValue::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(MetricValue::Number(Decimal::from(i)));
                }
                if let Some(u) = n.as_u64() {
                    return Some(MetricValue::Number(Decimal::from(u)));
                }
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(MetricValue::Number)
                    .ok()
                    .or_else(|| n.as_f64().map(MetricValue::Float))
            }
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Parse the text form of an aggregate as returned by a SQL driver.
    ///
    /// `None` (SQL NULL) becomes [`MetricValue::Null`]; anything that is not a
    /// number is kept as text.
    pub fn from_sql_text(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            None => MetricValue::Null,
            Some(t) => Decimal::from_str(t)
                .or_else(|_| Decimal::from_scientific(t))
                .map(MetricValue::Number)
                .unwrap_or_else(|_| match t.parse::<f64>() {
                    Ok(f) if f.is_finite() => MetricValue::Float(f),
                    _ => MetricValue::Text(t.to_string()),
                }),
        }
    }

    pub fn integer(value: i64) -> Self {
        MetricValue::Number(Decimal::from(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        MetricValue::Text(value.into())
    }

    /// Exact equality used by the reconciliation engine.
    ///
    /// Decimals compare by value (`378 == 378.0`), floats compare bit-exact
    /// as `f64`, text compares byte-for-byte, `Null` only equals `Null`.
    /// Text is never coerced to a number.
    pub fn matches(&self, other: &MetricValue) -> bool {
        match (self, other) {
            (MetricValue::Number(a), MetricValue::Number(b)) => a == b,
            (MetricValue::Float(a), MetricValue::Float(b)) => a.to_bits() == b.to_bits(),
            (MetricValue::Number(d), MetricValue::Float(f))
            | (MetricValue::Float(f), MetricValue::Number(d)) => {
                d.to_f64().map(|x| x.to_bits() == f.to_bits()).unwrap_or(false)
            }
            (MetricValue::Text(a), MetricValue::Text(b)) => a == b,
            (MetricValue::Null, MetricValue::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(d) => write!(f, "{}", d),
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Null => f.write_str("NULL"),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Number(d) if d.fract().is_zero() => match d.to_i64() {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_str(&d.to_string()),
            },
            MetricValue::Number(d) => match Number::from_str(&d.normalize().to_string()) {
                Ok(n) => n.serialize(serializer),
                Err(_) => serializer.serialize_str(&d.to_string()),
            },
            MetricValue::Float(f) => serializer.serialize_f64(*f),
            MetricValue::Text(s) => serializer.serialize_str(s),
            MetricValue::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MetricValue::from_json(&value)
            .ok_or_else(|| D::Error::custom(format!("unsupported metric value: {}", value)))
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::integer(v)
    }
}

impl From<Decimal> for MetricValue {
    fn from(v: Decimal) -> Self {
        MetricValue::Number(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

/// Metrics computed for one column, ordered by [`Metric`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<Metric, MetricValue>);

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: Metric, value: MetricValue) -> Option<MetricValue> {
        self.0.insert(metric, value)
    }

    pub fn get(&self, metric: Metric) -> Option<&MetricValue> {
        self.0.get(&metric)
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.0.contains_key(&metric)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Metric, MetricValue> {
        self.0.iter()
    }

    /// Metric names present in this set.
    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(Metric, MetricValue)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (Metric, MetricValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MetricSet {
    type Item = (&'a Metric, &'a MetricValue);
    type IntoIter = btree_map::Iter<'a, Metric, MetricValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
