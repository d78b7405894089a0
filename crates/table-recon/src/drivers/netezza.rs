//! Netezza SQL for catalog lookup, row count and per-column aggregates.
//!
//! Every builder returns a complete statement. The date-range predicate, when
//! present, is appended as a `WHERE` clause so the count and all aggregates
//! see the same row set.

use crate::core::{Predicate, TableRef};

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal with single quotes, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Fully qualified, quoted table name.
pub fn qualify_table(table: &TableRef) -> String {
    format!(
        "{}.{}.{}",
        quote_ident(&table.database),
        quote_ident(&table.schema),
        quote_ident(&table.table)
    )
}

fn where_clause(predicate: Option<&Predicate>) -> String {
    match predicate {
        Some(p) => format!(" WHERE {}", p.to_sql()),
        None => String::new(),
    }
}

/// Column names and declared types in ordinal order.
pub fn columns_query(table: &TableRef) -> String {
    format!(
        "SELECT ATTNAME, FORMAT_TYPE FROM {}.{}._V_RELATION_COLUMN \
         WHERE NAME = {} AND DATABASE = {} AND OWNER = {} ORDER BY ATTNUM",
        quote_ident(&table.database),
        quote_ident(&table.schema),
        quote_literal(&table.table),
        quote_literal(&table.database),
        quote_literal(&table.schema)
    )
}

pub fn count_query(table: &TableRef, predicate: Option<&Predicate>) -> String {
    format!(
        "SELECT COUNT(*) FROM {}{}",
        qualify_table(table),
        where_clause(predicate)
    )
}

/// `AVG, MIN, MAX, SUM, NULL_COUNT, COUNT`, in that column order.
pub fn numeric_aggregate_query(
    table: &TableRef,
    column: &str,
    predicate: Option<&Predicate>,
) -> String {
    let col = quote_ident(column);
    format!(
        "SELECT AVG({c}) AS AVG, MIN({c}) AS MIN, MAX({c}) AS MAX, SUM({c}) AS SUM, \
         SUM(CASE WHEN {c} IS NULL THEN 1 ELSE 0 END) AS NULL_COUNT, COUNT({c}) AS COUNT \
         FROM {t}{w}",
        c = col,
        t = qualify_table(table),
        w = where_clause(predicate)
    )
}

pub fn text_aggregate_query(
    table: &TableRef,
    column: &str,
    predicate: Option<&Predicate>,
) -> String {
    format!(
        "SELECT MAX(LENGTH({})) AS MAX_LENGTH FROM {}{}",
        quote_ident(column),
        qualify_table(table),
        where_clause(predicate)
    )
}

/// `MIN_DATE, MAX_DATE`, rendered `YYYY-MM-DDTHH:MM:SS`.
pub fn temporal_aggregate_query(
    table: &TableRef,
    column: &str,
    predicate: Option<&Predicate>,
) -> String {
    let col = quote_ident(column);
    format!(
        "SELECT TO_CHAR(MIN({c}), 'YYYY-MM-DD\"T\"HH24:MI:SS') AS MIN_DATE, \
         TO_CHAR(MAX({c}), 'YYYY-MM-DD\"T\"HH24:MI:SS') AS MAX_DATE FROM {t}{w}",
        c = col,
        t = qualify_table(table),
        w = where_clause(predicate)
    )
}

/// Normalize a temporal aggregate to `YYYY-MM-DDTHH:MM:SS`.
///
/// Drivers that ignore the `TO_CHAR` format hand back `YYYY-MM-DD HH:MM:SS`;
/// a bare date gets midnight.
pub fn iso_datetime(text: &str) -> String {
    let text = text.trim();
    let bytes = text.as_bytes();
    if text.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-' {
        return format!("{}T00:00:00", text);
    }
    if text.len() >= 19 && bytes[10] == b' ' {
        return format!("{}T{}", &text[..10], &text[11..]);
    }
    text.to_string()
}
