//! Date-range filter shared by the row count and every column aggregate.
//!
//! Bounds are exclusive on both ends:
//!
//! | start | end | predicate                              |
//! |-------|-----|----------------------------------------|
//! | yes   | yes | `col > start AND col < end`            |
//! | yes   | no  | `col > start`                          |
//! | no    | yes | `col < end`                            |
//! | no    | no  | none (full table)                      |

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{ReconError, Result};

/// A validated date or datetime bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateBound {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl DateBound {
    /// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[.fff]` or the `T`-separated form.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(DateBound::Date(date));
        }
        for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(DateBound::DateTime(dt));
            }
        }
        Err(ReconError::Config(format!(
            "invalid date bound '{}': expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
            text
        )))
    }

    fn as_datetime(&self) -> NaiveDateTime {
        match self {
            DateBound::Date(d) => d.and_hms_opt(0, 0, 0).unwrap_or_default(),
            DateBound::DateTime(dt) => *dt,
        }
    }

    /// Quoted SQL literal.
    pub fn sql_literal(&self) -> String {
        format!("'{}'", self)
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBound::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateBound::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl PartialOrd for DateBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.as_datetime().cmp(&other.as_datetime()))
    }
}

/// Exclusive date-range predicate on one column. At least one bound is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    column: String,
    start: Option<DateBound>,
    end: Option<DateBound>,
}

impl Predicate {
    /// Build the active predicate from the optional CLI inputs.
    ///
    /// Returns `Ok(None)` when no bound is given, even if a date column is.
    /// A bound without a date column, or `start >= end`, is a configuration
    /// error.
    pub fn from_parts(
        date_column: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Option<Self>> {
        let start = start_date.map(DateBound::parse).transpose()?;
        let end = end_date.map(DateBound::parse).transpose()?;

        if start.is_none() && end.is_none() {
            return Ok(None);
        }

        let column = match date_column.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                return Err(ReconError::Config(
                    "--start_date/--end_date require --date_column".into(),
                ))
            }
        };

        if let (Some(s), Some(e)) = (&start, &end) {
            if s >= e {
                return Err(ReconError::Config(format!(
                    "empty date range: start {} is not before end {}",
                    s, e
                )));
            }
        }

        Ok(Some(Self { column, start, end }))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// The same bounds on another column spelling.
    pub fn with_column(&self, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ..self.clone()
        }
    }

    pub fn start(&self) -> Option<&DateBound> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&DateBound> {
        self.end.as_ref()
    }

    /// Render the condition (without `WHERE`) with a double-quoted column.
    pub fn to_sql(&self) -> String {
        let column = format!("\"{}\"", self.column.replace('"', "\"\""));
        let mut terms = Vec::with_capacity(2);
        if let Some(start) = &self.start {
            terms.push(format!("{} > {}", column, start.sql_literal()));
        }
        if let Some(end) = &self.end {
            terms.push(format!("{} < {}", column, end.sql_literal()));
        }
        terms.join(" AND ")
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
