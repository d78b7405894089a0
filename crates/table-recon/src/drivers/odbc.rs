//! ODBC collaborators for live Netezza and Snowflake access.
//!
//! **Requirements:**
//! - The `odbc` feature must be enabled
//! - The Netezza (`NetezzaSQL`) and Snowflake (`SnowflakeDSIIDriver`) ODBC
//!   drivers must be installed and referenced by the connection strings

use async_trait::async_trait;
use odbc_api::{buffers::TextRowSet, ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::{
    ColumnDescriptor, MetricValue, NumericAggregates, Predicate, SourceQueryExecutor,
    TableRef, TargetPayloadProvider, TemporalAggregates, TextAggregates,
};
use crate::error::{ReconError, Result};

use super::{netezza, snowflake};

/// Rows fetched per batch. Aggregate results are a single row.
const BATCH_SIZE: usize = 256;

/// Longest text value fetched. Validation payloads can be large.
const MAX_STR_LEN: usize = 16 * 1024 * 1024;

type Rows = Vec<Vec<Option<String>>>;

/// One ODBC environment plus the connection string to open connections with.
pub struct OdbcSession {
    env: Arc<Environment>,
    connection_string: String,
    /// Serializes ODBC operations
    lock: Arc<Mutex<()>>,
}

impl OdbcSession {
    /// Create the environment and verify the connection string works.
    pub fn connect(connection_string: &str) -> std::result::Result<Self, String> {
        let env = Environment::new()
            .map_err(|e| format!("Failed to create ODBC environment: {}", e))?;
        {
            let conn = env
                .connect_with_connection_string(connection_string, ConnectionOptions::default())
                .map_err(|e| format!("Failed to connect via ODBC: {}", e))?;
            let _ = conn.execute("SELECT 1", ());
        }
        Ok(Self {
            env: Arc::new(env),
            connection_string: connection_string.to_string(),
            lock: Arc::new(Mutex::new(())),
        })
    }

    /// Run a statement and return every row as text.
    ///
    /// Driver calls block, so they run on the blocking pool and the caller's
    /// task keeps yielding.
    async fn query(&self, sql: &str) -> std::result::Result<Rows, String> {
        let env = Arc::clone(&self.env);
        let connection_string = self.connection_string.clone();
        let sql = sql.to_string();
        serialized_blocking(&self.lock, move || fetch_rows(&env, &connection_string, &sql)).await
    }
}

/// Run `f` on the blocking pool while holding `lock`.
async fn serialized_blocking<T, F>(lock: &Arc<Mutex<()>>, f: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> std::result::Result<T, String> + Send + 'static,
    T: Send + 'static,
{
    let guard = Arc::clone(lock).lock_owned().await;
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        f()
    })
    .await
    .map_err(|e| format!("ODBC task failed: {}", e))?
}

fn fetch_rows(
    env: &Environment,
    connection_string: &str,
    sql: &str,
) -> std::result::Result<Rows, String> {
    debug!("ODBC: {}", sql);

    let conn = env
        .connect_with_connection_string(connection_string, ConnectionOptions::default())
        .map_err(|e| format!("ODBC connection failed: {}", e))?;

    let mut rows = Vec::new();
    if let Some(mut cursor) = conn
        .execute(sql, ())
        .map_err(|e| format!("ODBC query failed: {} - SQL: {}", e, sql))?
    {
        let num_cols = cursor
            .num_result_cols()
            .map_err(|e| format!("Failed to get column count: {}", e))?
            as usize;
        let mut buffers = TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_STR_LEN))
            .map_err(|e| format!("Failed to create row buffer: {}", e))?;
        let mut row_cursor = cursor
            .bind_buffer(&mut buffers)
            .map_err(|e| format!("Failed to bind buffer: {}", e))?;

        while let Some(batch) = row_cursor
            .fetch()
            .map_err(|e| format!("Failed to fetch rows: {}", e))?
        {
            for row_idx in 0..batch.num_rows() {
                let row = (0..num_cols)
                    .map(|col_idx| {
                        batch
                            .at(col_idx, row_idx)
                            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                    })
                    .collect();
                rows.push(row);
            }
        }
    }
    Ok(rows)
}

/// First row of an aggregate query, which must have `width` columns.
fn single_row(rows: Rows, width: usize, sql: &str) -> Result<Vec<Option<String>>> {
    match rows.into_iter().next() {
        Some(row) if row.len() == width => Ok(row),
        Some(row) => Err(ReconError::source(format!(
            "expected {} columns, got {} - SQL: {}",
            width,
            row.len(),
            sql
        ))),
        None => Err(ReconError::source(format!("query returned no rows - SQL: {}", sql))),
    }
}

fn metric(cell: &Option<String>) -> MetricValue {
    MetricValue::from_sql_text(cell.as_deref())
}

fn date(cell: &Option<String>) -> MetricValue {
    match cell {
        Some(text) => MetricValue::Text(netezza::iso_datetime(text)),
        None => MetricValue::Null,
    }
}

/// Netezza source executor over ODBC.
pub struct NetezzaOdbcExecutor {
    session: OdbcSession,
}

impl NetezzaOdbcExecutor {
    pub fn connect(connection_string: &str) -> Result<Self> {
        let session = OdbcSession::connect(connection_string).map_err(ReconError::source)?;
        info!("Connected to Netezza via ODBC");
        Ok(Self { session })
    }

    async fn run(&self, sql: &str) -> Result<Rows> {
        self.session.query(sql).await.map_err(ReconError::source)
    }
}

#[async_trait]
impl SourceQueryExecutor for NetezzaOdbcExecutor {
    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnDescriptor>> {
        let sql = netezza::columns_query(table);
        self.run(&sql)
            .await?
            .into_iter()
            .map(|row| match row.as_slice() {
                [Some(name), Some(declared_type)] => {
                    Ok(ColumnDescriptor::new(name.trim(), declared_type.trim()))
                }
                _ => Err(ReconError::source(format!(
                    "unexpected catalog row for {}: {:?}",
                    table, row
                ))),
            })
            .collect()
    }

    async fn count_rows(&self, table: &TableRef, predicate: Option<&Predicate>) -> Result<i64> {
        let sql = netezza::count_query(table, predicate);
        let row = single_row(self.run(&sql).await?, 1, &sql)?;
        row[0]
            .as_deref()
            .and_then(|c| c.trim().parse::<i64>().ok())
            .ok_or_else(|| ReconError::source(format!("invalid row count {:?} for {}", row[0], table)))
    }

    async fn aggregate_numeric(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<NumericAggregates> {
        let sql = netezza::numeric_aggregate_query(table, column, predicate);
        let row = single_row(self.run(&sql).await?, 6, &sql)?;
        Ok(NumericAggregates {
            avg: metric(&row[0]),
            min: metric(&row[1]),
            max: metric(&row[2]),
            sum: metric(&row[3]),
            null_count: metric(&row[4]),
            count: metric(&row[5]),
        })
    }

    async fn aggregate_text(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TextAggregates> {
        let sql = netezza::text_aggregate_query(table, column, predicate);
        let row = single_row(self.run(&sql).await?, 1, &sql)?;
        Ok(TextAggregates {
            max_length: metric(&row[0]),
        })
    }

    async fn aggregate_temporal(
        &self,
        table: &TableRef,
        column: &str,
        predicate: Option<&Predicate>,
    ) -> Result<TemporalAggregates> {
        let sql = netezza::temporal_aggregate_query(table, column, predicate);
        let row = single_row(self.run(&sql).await?, 2, &sql)?;
        Ok(TemporalAggregates {
            min_date: date(&row[0]),
            max_date: date(&row[1]),
        })
    }

    fn db_type(&self) -> &str {
        "netezza"
    }
}

/// Snowflake payload provider calling the validation procedure over ODBC.
pub struct SnowflakeOdbcProvider {
    session: OdbcSession,
    procedure: String,
}

impl SnowflakeOdbcProvider {
    pub fn connect(connection_string: &str, procedure: impl Into<String>) -> Result<Self> {
        let session = OdbcSession::connect(connection_string).map_err(ReconError::target)?;
        info!("Connected to Snowflake via ODBC");
        Ok(Self {
            session,
            procedure: procedure.into(),
        })
    }
}

#[async_trait]
impl TargetPayloadProvider for SnowflakeOdbcProvider {
    async fn fetch_validation_payload(&self, table: &TableRef) -> Result<Value> {
        let sql = snowflake::call_statement(&self.procedure, table)?;
        let rows = self.session.query(&sql).await.map_err(ReconError::target)?;
        let cell = rows.first().and_then(|row| row.first()).and_then(|c| c.as_deref());
        snowflake::decode_payload_cell(cell, table)
    }

    fn db_type(&self) -> &str {
        "snowflake"
    }
}
