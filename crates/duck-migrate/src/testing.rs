//! In-crate test doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{MigrateError, Result};
use crate::executor::{Executor, Row, StatementCache};
use crate::statement::Statement;

/// Records every statement and answers queries from a script.
///
/// Queries are answered by the first scripted entry whose pattern occurs in
/// the SQL text; unmatched queries return no rows.
#[derive(Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<Statement>>,
    queries: Mutex<Vec<Statement>>,
    answers: Vec<(String, Vec<Row>)>,
    failures: Vec<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, pattern: &str, rows: Vec<Row>) -> Self {
        self.answers.push((pattern.to_string(), rows));
        self
    }

    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.failures.push(pattern.to_string());
        self
    }

    /// Statements run through [`Executor::execute`].
    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }

    /// SQL text of the executed statements.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed().iter().map(|s| s.sql().to_string()).collect()
    }

    /// Statements run through [`Executor::query`].
    pub fn queries(&self) -> Vec<Statement> {
        self.queries.lock().unwrap().clone()
    }

    fn check(&self, statement: &Statement) -> Result<()> {
        match self.failures.iter().find(|p| statement.sql().contains(p.as_str())) {
            Some(pattern) => Err(MigrateError::Execution {
                sql: statement.sql().to_string(),
                message: format!("scripted failure on '{pattern}'"),
            }),
            None => Ok(()),
        }
    }
}

impl Executor for RecordingExecutor {
    fn execute(&self, statement: &Statement) -> Result<()> {
        self.check(statement)?;
        self.executed.lock().unwrap().push(statement.clone());
        Ok(())
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.queries.lock().unwrap().push(statement.clone());
        self.check(statement)?;
        Ok(self
            .answers
            .iter()
            .find(|(pattern, _)| statement.sql().contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}

/// Counts clears.
pub struct CountingCache {
    enabled: AtomicBool,
    clears: AtomicUsize,
}

impl CountingCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            clears: AtomicUsize::new(0),
        }
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl StatementCache for CountingCache {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
