//! Statement execution.
//!
//! The migrator never owns a connection. It talks to an [`Executor`] that
//! runs one statement at a time, and to an optional [`StatementCache`] it
//! clears after structural changes. [`DuckDbConnection`] implements both
//! on top of a single DuckDB connection.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use duckdb::types::Value;
use duckdb::Connection;
use tracing::{debug, warn};

use crate::error::{MigrateError, Result};
use crate::statement::{SqlValue, Statement};

/// One result row.
pub type Row = Vec<SqlValue>;

/// Runs statements for the migrator.
pub trait Executor {
    /// Executes a statement that returns no rows.
    fn execute(&self, statement: &Statement) -> Result<()>;

    /// Executes a query and collects every row.
    fn query(&self, statement: &Statement) -> Result<Vec<Row>>;

    /// Returns the first column of the first row, if any.
    fn query_scalar(&self, statement: &Statement) -> Result<Option<SqlValue>> {
        Ok(self
            .query(statement)?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next()))
    }

    /// Returns the first column of the first row as a count.
    fn query_count(&self, statement: &Statement) -> Result<i64> {
        Ok(self
            .query_scalar(statement)?
            .and_then(|value| value.as_int())
            .unwrap_or(0))
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, statement: &Statement) -> Result<()> {
        (**self).execute(statement)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query(statement)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, statement: &Statement) -> Result<()> {
        (**self).execute(statement)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query(statement)
    }
}

/// A shared cache of prepared statements that must be dropped after a
/// table's structure changes.
///
/// Clearing is the only mutation, so concurrent clears are harmless.
pub trait StatementCache: Send + Sync {
    /// Whether statements are currently being prepared and cached.
    fn is_enabled(&self) -> bool;

    /// Drops every cached prepared statement.
    fn clear(&self);
}

const POISONED_CONNECTION_MESSAGE: &str = "duckdb connection lock was poisoned";

/// A DuckDB connection usable as both executor and statement cache.
pub struct DuckDbConnection {
    conn: Mutex<Connection>,
    prepare: AtomicBool,
}

impl DuckDbConnection {
    /// Opens an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Opens a database file, treating `:memory:` as in-memory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(":memory:") {
            return Self::open_in_memory();
        }
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Wraps an existing connection. Statement preparation starts enabled.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            prepare: AtomicBool::new(true),
        }
    }

    /// Enables or disables caching of prepared query statements.
    #[must_use]
    pub fn with_prepared_statements(self, enabled: bool) -> Self {
        self.prepare.store(enabled, Ordering::Relaxed);
        self
    }

    fn lock(&self, sql: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| MigrateError::Execution {
            sql: sql.to_string(),
            message: POISONED_CONNECTION_MESSAGE.to_string(),
        })
    }
}

impl Executor for DuckDbConnection {
    fn execute(&self, statement: &Statement) -> Result<()> {
        debug!(sql = %statement, "Executing SQL");
        let conn = self.lock(statement.sql())?;
        if statement.params().is_empty() {
            conn.execute_batch(statement.sql())?;
        } else {
            let params = statement.params().iter().map(to_duckdb_value);
            conn.execute(statement.sql(), duckdb::params_from_iter(params))?;
        }
        Ok(())
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        debug!(sql = %statement, "Executing query");
        let conn = self.lock(statement.sql())?;

        let mut cached;
        let mut fresh;
        let stmt: &mut duckdb::Statement<'_> = if self.is_enabled() {
            cached = conn.prepare_cached(statement.sql())?;
            &mut cached
        } else {
            fresh = conn.prepare(statement.sql())?;
            &mut fresh
        };

        let params = statement.params().iter().map(to_duckdb_value);
        let mut rows = stmt.query(duckdb::params_from_iter(params))?;
        let width = rows.as_ref().map_or(0, |stmt| stmt.column_count());

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_duckdb_value(row.get::<_, Value>(i)?));
            }
            out.push(values);
        }
        Ok(out)
    }
}

impl StatementCache for DuckDbConnection {
    fn is_enabled(&self) -> bool {
        self.prepare.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        match self.conn.lock() {
            Ok(conn) => conn.flush_prepared_statement_cache(),
            Err(_) => warn!("{POISONED_CONNECTION_MESSAGE}; prepared statements not flushed"),
        }
    }
}

fn to_duckdb_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Boolean(*b),
        SqlValue::Int(n) => Value::BigInt(*n),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_duckdb_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Bool(b),
        Value::TinyInt(n) => SqlValue::Int(i64::from(n)),
        Value::SmallInt(n) => SqlValue::Int(i64::from(n)),
        Value::Int(n) => SqlValue::Int(i64::from(n)),
        Value::BigInt(n) => SqlValue::Int(n),
        Value::UTinyInt(n) => SqlValue::Int(i64::from(n)),
        Value::USmallInt(n) => SqlValue::Int(i64::from(n)),
        Value::UInt(n) => SqlValue::Int(i64::from(n)),
        Value::Float(f) => SqlValue::Float(f64::from(f)),
        Value::Double(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        other => SqlValue::Text(format!("{other:?}")),
    }
}
