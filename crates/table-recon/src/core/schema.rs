//! Table references and column metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReconError, Result};

/// Fully qualified `DB.SCHEMA.TABLE` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Database name.
    pub database: String,

    /// Schema (owner) name.
    pub schema: String,

    /// Table name.
    pub table: String,
}

impl TableRef {
    /// Create a table reference from its parts.
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.table)
    }
}

impl FromStr for TableRef {
    type Err = ReconError;

    /// Parse `DB.SCHEMA.TABLE`. All three parts are required.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').map(str::trim).collect();
        match parts.as_slice() {
            [db, schema, table] if !db.is_empty() && !schema.is_empty() && !table.is_empty() => {
                Ok(Self::new(*db, *schema, *table))
            }
            _ => Err(ReconError::Config(format!(
                "table name '{}' must have the form DB.SCHEMA.TABLE",
                s
            ))),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}

/// Column name plus the raw declared type reported by the source catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    #[serde(alias = "ATTNAME")]
    pub name: String,

    /// Raw warehouse type, e.g. `"VARCHAR(50)"`, `"NUMERIC(18,2)"`.
    #[serde(alias = "FORMAT_TYPE")]
    pub declared_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}
