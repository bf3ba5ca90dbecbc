//! Catalog inspection.
//!
//! Answers existence questions by querying the engine's
//! `information_schema` views. Nothing is cached: every check issues a
//! fresh query, so one orchestrated operation always sees the catalog as it
//! is at that moment. Failed existence checks read as "absent".

use tracing::warn;

use crate::error::Result;
use crate::executor::Executor;
use crate::schema::{ColumnType, ResolvedSchema, TableRef};
use crate::statement::{QualifiedTable, SchemaRef, SqlValue, Statement};

const BASE_TABLE: &str = "BASE TABLE";

/// Resolves the `(schema, table)` pair for an operation.
///
/// Precedence: an explicit `schema.table` reference that splits into exactly
/// two segments, then a parsed `"schema"."table"` expression that splits
/// into exactly two segments (paired with `fallback_table`), then the
/// current schema with `fallback_table`.
#[must_use]
pub fn resolve_schema(
    explicit_table_ref: Option<&str>,
    parsed_table_expr: Option<&str>,
    fallback_table: &str,
) -> QualifiedTable {
    if let Some(explicit) = explicit_table_ref.filter(|t| t.contains('.')) {
        if let [schema, table] = explicit.split('.').collect::<Vec<_>>()[..] {
            return QualifiedTable::named(schema, table);
        }
    }

    if let Some(expr) = parsed_table_expr {
        if let [schema, _] = expr.split("\".\"").collect::<Vec<_>>()[..] {
            return QualifiedTable::named(schema.trim_start_matches('"'), fallback_table);
        }
    }

    QualifiedTable::current(fallback_table)
}

/// Resolves the qualified table a reference points at.
pub fn qualify(table: TableRef<'_>) -> Result<QualifiedTable> {
    let name = table.name()?;
    let expr = table.model().and_then(ResolvedSchema::table_expr);
    Ok(resolve_schema(Some(name), expr.as_deref(), name))
}

/// Read-only view of the engine catalog.
pub struct CatalogInspector<'a, E: Executor> {
    executor: &'a E,
}

impl<'a, E: Executor> CatalogInspector<'a, E> {
    /// Creates an inspector over `executor`.
    pub const fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Returns the current database name, or an empty string if it cannot be read.
    pub fn current_database_name(&self) -> String {
        let statement = Statement::new("SELECT CURRENT_DATABASE()");
        match self.executor.query_scalar(&statement) {
            Ok(value) => value.and_then(|v| v.as_text()).unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "Failed to read current database");
                String::new()
            }
        }
    }

    /// Whether a base table (not a view or temporary table) exists.
    pub fn table_exists(&self, table: &QualifiedTable) -> bool {
        let statement = Statement::new(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_catalog = CURRENT_DATABASE() AND table_schema = ",
        )
        .bind_schema(&table.schema)
        .push(" AND table_name = ")
        .bind(table.table.as_str())
        .push(" AND table_type = ")
        .bind(BASE_TABLE);

        self.count_positive(&statement, table, None)
    }

    /// Whether `column` exists on `table`.
    pub fn column_exists(&self, table: &QualifiedTable, column: &str) -> bool {
        let statement = Statement::new(
            "SELECT count(*) FROM information_schema.columns \
             WHERE table_catalog = CURRENT_DATABASE() AND table_schema = ",
        )
        .bind_schema(&table.schema)
        .push(" AND table_name = ")
        .bind(table.table.as_str())
        .push(" AND column_name = ")
        .bind(column);

        self.count_positive(&statement, table, Some(column))
    }

    /// Lists the base tables of the current schema, by name.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let statement = Statement::new(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_catalog = CURRENT_DATABASE() AND table_schema = ",
        )
        .bind_schema(&SchemaRef::Current)
        .push(" AND table_type = ")
        .bind(BASE_TABLE)
        .push(" ORDER BY table_name");

        Ok(self
            .executor
            .query(&statement)?
            .into_iter()
            .filter_map(|row| row.into_iter().next().and_then(|v| v.as_text()))
            .collect())
    }

    /// Returns the comment recorded for a column, or an empty string.
    pub fn column_comment(&self, table: &QualifiedTable, column: &str) -> String {
        let statement = Statement::new(
            "SELECT comment FROM duckdb_columns() \
             WHERE database_name = CURRENT_DATABASE() AND schema_name = ",
        )
        .bind_schema(&table.schema)
        .push(" AND table_name = ")
        .bind(table.table.as_str())
        .push(" AND column_name = ")
        .bind(column);

        match self.executor.query_scalar(&statement) {
            Ok(value) => value.and_then(|v| v.as_text()).unwrap_or_default(),
            Err(err) => {
                warn!(table = %table, column, error = %err, "Failed to read column comment");
                String::new()
            }
        }
    }

    /// Lists the columns of `table` in ordinal order.
    pub fn column_types(&self, table: &QualifiedTable) -> Result<Vec<ColumnType>> {
        let statement = Statement::new(
            "SELECT column_name, data_type, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_catalog = CURRENT_DATABASE() AND table_schema = ",
        )
        .bind_schema(&table.schema)
        .push(" AND table_name = ")
        .bind(table.table.as_str())
        .push(" ORDER BY ordinal_position");

        Ok(self
            .executor
            .query(&statement)?
            .into_iter()
            .map(|row| {
                let text = |i: usize| row.get(i).and_then(SqlValue::as_text);
                ColumnType {
                    name: text(0).unwrap_or_default(),
                    data_type: text(1).unwrap_or_default(),
                    nullable: text(2).map_or(true, |v| v.eq_ignore_ascii_case("YES")),
                    default: text(3),
                }
            })
            .collect())
    }

    fn count_positive(
        &self,
        statement: &Statement,
        table: &QualifiedTable,
        column: Option<&str>,
    ) -> bool {
        match self.executor.query_count(statement) {
            Ok(count) => count > 0,
            Err(err) => {
                warn!(table = %table, column, error = %err, "Catalog lookup failed");
                false
            }
        }
    }
}
