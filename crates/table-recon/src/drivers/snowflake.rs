//! Snowflake validation procedure call.

use serde_json::Value;

use crate::config::is_dotted_identifier;
use crate::core::TableRef;
use crate::error::{ReconError, Result};

use super::netezza::quote_literal;

pub use crate::config::DEFAULT_VALIDATION_PROCEDURE;

/// `CALL <procedure>('<db>', '<schema>', '<table>')`.
pub fn call_statement(procedure: &str, table: &TableRef) -> Result<String> {
    if !is_dotted_identifier(procedure) {
        return Err(ReconError::Config(format!(
            "invalid validation procedure name '{}'",
            procedure
        )));
    }
    Ok(format!(
        "CALL {}({}, {}, {})",
        procedure,
        quote_literal(&table.database),
        quote_literal(&table.schema),
        quote_literal(&table.table)
    ))
}

/// Decode the single result cell of the procedure call.
///
/// The procedure returns a VARIANT that drivers hand back as JSON text.
pub fn decode_payload_cell(cell: Option<&str>, table: &TableRef) -> Result<Value> {
    let text = cell
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ReconError::target(format!("validation procedure returned no payload for {}", table)))?;
    serde_json::from_str(text)
        .map_err(|e| ReconError::payload(format!("payload for {} is not valid JSON: {}", table, e)))
}
