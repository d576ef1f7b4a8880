//! Postgres backend (sqlx)
//!
//! Row-returning calls are sent as `SELECT * FROM schema.proc($1, ...)` and
//! no-result calls as `CALL schema.proc($1, ...)`. Registered output slots
//! are passed as `NULL` and read back from the row a `CALL` returns for its
//! INOUT arguments.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow, PgSslMode};
use sqlx::query::Query;
use sqlx::{
    Column, ConnectOptions, Connection as _, Executor, Postgres, Row, Statement, TypeInfo,
};

use super::{Connection, ConnectionProvider, PreparedCall, Slot};
use crate::config::DatabaseConfig;
use crate::error::{ConfigError, ExecutionFailure};
use crate::invoke::ResultTable;
use crate::value::SqlValue;

/// Text shown for SQL NULL cells
pub const NULL_CELL: &str = "NULL";

/// Opens one `PgConnection` per `connect`
pub struct PgConnectionProvider {
    options: PgConnectOptions,
    address: String,
    timeout: Duration,
}

impl PgConnectionProvider {
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let ssl_mode = PgSslMode::from_str(&config.ssl).map_err(|e| ConfigError::Invalid {
            field: "database.ssl",
            reason: e.to_string(),
        })?;

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.username)
            .password(&config.password)
            .ssl_mode(ssl_mode)
            .application_name("vapor");

        Ok(PgConnectionProvider {
            options,
            address: config.address(),
            timeout: Duration::from_secs(config.connect_timeout_secs),
        })
    }
}

#[async_trait]
impl ConnectionProvider for PgConnectionProvider {
    async fn connect(&self) -> Result<Box<dyn Connection>, ConfigError> {
        let connect_error = |reason: String| ConfigError::Connect {
            address: self.address.clone(),
            reason,
        };

        let conn = tokio::time::timeout(self.timeout, self.options.connect())
            .await
            .map_err(|_| connect_error(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| connect_error(e.to_string()))?;

        tracing::info!(address = %self.address, "database_connected");
        Ok(Box::new(PgSession {
            conn: Some(conn),
            lost: false,
        }))
    }
}

/// One live Postgres session
pub struct PgSession {
    conn: Option<PgConnection>,
    lost: bool,
}

impl PgSession {
    fn conn(&mut self) -> Result<&mut PgConnection, ExecutionFailure> {
        if self.lost {
            return Err(ExecutionFailure::connection_lost("connection was lost"));
        }
        self.conn
            .as_mut()
            .ok_or_else(|| ExecutionFailure::connection_lost("connection is closed"))
    }

    fn failure(&mut self, err: sqlx::Error) -> ExecutionFailure {
        let failure = execution_failure(err);
        if failure.connection_lost {
            self.lost = true;
        }
        failure
    }
}

#[async_trait]
impl Connection for PgSession {
    async fn execute_query(&mut self, call: &PreparedCall) -> Result<ResultTable, ExecutionFailure> {
        let sql = render_select(call);
        tracing::debug!(sql = %sql, "query_sent");

        let result = fetch_table(self.conn()?, &sql, call).await;
        result.map_err(|e| self.failure(e))
    }

    async fn execute_update(&mut self, call: &mut PreparedCall) -> Result<(), ExecutionFailure> {
        let sql = render_call(call);
        tracing::debug!(sql = %sql, "call_sent");

        let query = bind_slots(sqlx::query(&sql), call);
        let result = query.fetch_optional(&mut *self.conn()?).await;
        let row = result.map_err(|e| self.failure(e))?;

        let outputs: Vec<usize> = call.output_slots().collect();
        if outputs.is_empty() {
            return Ok(());
        }
        let row = row.ok_or_else(|| {
            ExecutionFailure::new(format!(
                "{} returned no output row",
                call.procedure().qualified_name()
            ))
        })?;
        for (column, slot) in outputs.into_iter().enumerate() {
            let value = read_out_integer(&row, column)?;
            call.store_out_integer(slot, value);
        }
        Ok(())
    }

    fn is_usable(&self) -> bool {
        self.conn.is_some() && !self.lost
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                tracing::debug!(error = %e, "database_close_failed");
            }
        }
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `SELECT * FROM schema.proc($1, ...)`
pub fn render_select(call: &PreparedCall) -> String {
    format!(
        "SELECT * FROM {}({})",
        call.procedure().qualified_name(),
        placeholders(call.slots().len())
    )
}

/// `CALL schema.proc($1, ...)`
pub fn render_call(call: &PreparedCall) -> String {
    format!(
        "CALL {}({})",
        call.procedure().qualified_name(),
        placeholders(call.slots().len())
    )
}

fn bind_slots<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    call: &PreparedCall,
) -> Query<'q, Postgres, PgArguments> {
    for slot in call.slots() {
        query = match slot {
            Slot::In(value) => bind_sql_value(query, value),
            Slot::OutInteger(_) => query.bind(Option::<i32>::None),
            Slot::Unset => query.bind(Option::<String>::None),
        };
    }
    query
}

fn bind_sql_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Integer(n) => query.bind(*n),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::DateTime(t) => query.bind(*t),
        SqlValue::Money(m) => query.bind(*m),
    }
}

fn read_out_integer(row: &PgRow, column: usize) -> Result<Option<i32>, ExecutionFailure> {
    let type_name = row
        .columns()
        .get(column)
        .map(|c| c.type_info().name().to_string())
        .ok_or_else(|| ExecutionFailure::new(format!("output column {column} is missing")))?;

    let value = match type_name.as_str() {
        "INT2" => row.try_get::<Option<i16>, _>(column).map(|v| v.map(i32::from)),
        "INT8" => {
            let wide = row
                .try_get::<Option<i64>, _>(column)
                .map_err(|e| ExecutionFailure::new(e.to_string()))?;
            return wide
                .map(i32::try_from)
                .transpose()
                .map_err(|e| ExecutionFailure::new(format!("generated id out of range: {e}")));
        }
        _ => row.try_get::<Option<i32>, _>(column),
    };
    value.map_err(|e| ExecutionFailure::new(e.to_string()))
}

/// Prepare `sql` first so the column labels are known even when no row
/// comes back, then run it with the call's slots bound.
async fn fetch_table(
    conn: &mut PgConnection,
    sql: &str,
    call: &PreparedCall,
) -> Result<ResultTable, sqlx::Error> {
    let statement = (&mut *conn).prepare(sql).await?;
    let columns = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let rows = bind_slots(statement.query(), call).fetch_all(&mut *conn).await?;
    Ok(build_table(columns, rows.iter().map(row_cells)))
}

fn row_cells(row: &PgRow) -> Vec<String> {
    (0..row.columns().len())
        .map(|i| cell_to_string(row, i))
        .collect()
}

fn build_table<I>(columns: Vec<String>, rows: I) -> ResultTable
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut table = ResultTable::new(columns);
    for cells in rows {
        table.push_row(cells);
    }
    table
}

/// Render one cell as text, decoding by the column's Postgres type
fn cell_to_string(row: &PgRow, index: usize) -> String {
    let type_name = row.columns()[index].type_info().name();

    let text: Option<String> = match type_name {
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index).ok().flatten()
        }
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|i| i.to_string()),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|i| i.to_string()),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(|i| i.to_string()),
        "FLOAT4" | "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(|f| f.to_string()),
        "NUMERIC" | "MONEY" => row
            .try_get::<Option<rust_decimal::Decimal>, _>(index)
            .ok()
            .flatten()
            .map(|d| d.to_string()),
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(|b| b.to_string()),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|d| d.format("%Y-%m-%d").to_string()),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(format_timestamp),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|dt| format_timestamp(dt.naive_utc())),
        _ => row.try_get::<Option<String>, _>(index).ok().flatten(),
    };

    text.unwrap_or_else(|| NULL_CELL.to_string())
}

/// Timestamps read back look the same as the ones bound, in UTC for `TIMESTAMPTZ`
fn format_timestamp(dt: chrono::NaiveDateTime) -> String {
    SqlValue::DateTime(dt).to_string()
}

fn execution_failure(err: sqlx::Error) -> ExecutionFailure {
    match err {
        sqlx::Error::Database(db) => ExecutionFailure::new(db.message().to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ExecutionFailure::connection_lost(err.to_string()),
        other => ExecutionFailure::new(other.to_string()),
    }
}
