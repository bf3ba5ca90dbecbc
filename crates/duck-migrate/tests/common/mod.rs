#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use duck_migrate::executor::Row;
use duck_migrate::prelude::*;

/// Runs statements on a real connection and records what was executed.
pub struct RecordingConnection {
    conn: Arc<DuckDbConnection>,
    executed: Mutex<Vec<String>>,
}

impl RecordingConnection {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.executed()
            .iter()
            .filter(|sql| sql.starts_with(prefix))
            .count()
    }

    pub fn reset(&self) {
        self.executed.lock().unwrap().clear();
    }
}

impl Executor for RecordingConnection {
    fn execute(&self, statement: &Statement) -> Result<()> {
        self.conn.execute(statement)?;
        self.executed
            .lock()
            .unwrap()
            .push(statement.sql().to_string());
        Ok(())
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.conn.query(statement)
    }
}

/// Flushes the real statement cache and counts how often it was asked to.
pub struct CountingCache {
    conn: Arc<DuckDbConnection>,
    clears: AtomicUsize,
}

impl CountingCache {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl StatementCache for CountingCache {
    fn is_enabled(&self) -> bool {
        self.conn.is_enabled()
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.conn.clear();
    }
}

pub struct Harness {
    pub conn: Arc<DuckDbConnection>,
    pub recorder: Arc<RecordingConnection>,
    pub cache: Arc<CountingCache>,
    pub migrator: DuckDbMigrator<Arc<RecordingConnection>>,
}

pub fn harness() -> Harness {
    let conn = Arc::new(DuckDbConnection::open_in_memory().expect("Failed to open DuckDB"));
    wrap(conn)
}

pub fn wrap(conn: Arc<DuckDbConnection>) -> Harness {
    let recorder = Arc::new(RecordingConnection {
        conn: Arc::clone(&conn),
        executed: Mutex::new(Vec::new()),
    });
    let cache = Arc::new(CountingCache {
        conn: Arc::clone(&conn),
        clears: AtomicUsize::new(0),
    });
    let migrator = DuckDbMigrator::new(Arc::clone(&recorder)).with_statement_cache(cache.clone());
    Harness {
        conn,
        recorder,
        cache,
        migrator,
    }
}

/// `{id PK, name, email unique}`.
pub fn users() -> ResolvedSchema {
    ResolvedSchema::new("users")
        .field(
            FieldSpec::new("ID", SqlType::BigInt)
                .primary_key()
                .auto_increment(),
        )
        .field(FieldSpec::new("Name", SqlType::Text))
        .field(FieldSpec::new("Email", SqlType::Varchar(255)).unique())
}

/// A table without keys or constraints.
pub fn notes() -> ResolvedSchema {
    ResolvedSchema::new("notes")
        .field(FieldSpec::new("Title", SqlType::Text))
        .field(FieldSpec::new("Body", SqlType::Text))
}

pub fn profiles(comment: &str) -> ResolvedSchema {
    ResolvedSchema::new("profiles")
        .field(FieldSpec::new("Handle", SqlType::Varchar(64)))
        .field(FieldSpec::new("Bio", SqlType::Text).comment(comment))
}

pub fn existing_column(migrator: &impl Migrator, model: &ResolvedSchema, column: &str) -> ColumnType {
    migrator
        .column_types(model)
        .expect("Failed to read column types")
        .into_iter()
        .find(|c| c.name == column)
        .unwrap_or_else(|| panic!("Column {column} not found on {}", model.table))
}
