//! DuckDB migrator.
//!
//! Wraps a [`GenericMigrator`] over [`DuckDbDialect`] and intercepts the
//! operations where DuckDB needs more than portable DDL:
//!
//! - column comments are attached with `COMMENT ON COLUMN` after a table or
//!   column is created, and reconciled against `duckdb_columns()` when a
//!   column is migrated;
//! - renames are skipped when the source does not exist;
//! - prepared statements are flushed after a column is dropped or renamed,
//!   or a table is renamed, since DuckDB rejects statements prepared
//!   against the old shape;
//! - views, constraints, indexes and column type changes are refused by the
//!   [capability gate](crate::capability) before any SQL is built.
//!
//! Everything else is delegated unchanged.

use std::sync::Arc;

use tracing::{debug, info};

use super::generic::qualify_model;
use super::{GenericMigrator, Migrator};
use crate::capability::{self, Operation};
use crate::catalog::qualify;
use crate::dialect::{DuckDbDialect, MigrationDialect};
use crate::error::Result;
use crate::executor::{Executor, StatementCache};
use crate::schema::{ColumnType, FieldSpec, ResolvedSchema, TableRef, ViewOption};
use crate::statement::QualifiedTable;

/// Migrator for DuckDB.
pub struct DuckDbMigrator<E> {
    inner: GenericMigrator<E, DuckDbDialect>,
    statement_cache: Option<Arc<dyn StatementCache>>,
}

impl<E: Executor> DuckDbMigrator<E> {
    /// Creates a migrator running statements on `executor`.
    pub const fn new(executor: E) -> Self {
        Self {
            inner: GenericMigrator::new(executor, DuckDbDialect::new()),
            statement_cache: None,
        }
    }

    /// Sets the prepared-statement cache to flush after structural changes.
    #[must_use]
    pub fn with_statement_cache(mut self, cache: Arc<dyn StatementCache>) -> Self {
        self.statement_cache = Some(cache);
        self
    }

    /// Returns the wrapped portable migrator.
    pub const fn generic(&self) -> &GenericMigrator<E, DuckDbDialect> {
        &self.inner
    }

    fn invalidate_statements(&self) {
        if let Some(cache) = self.statement_cache.as_ref().filter(|c| c.is_enabled()) {
            debug!("Flushing prepared statements");
            cache.clear();
        }
    }

    fn comment_column(&self, table: &QualifiedTable, field: &FieldSpec) -> Result<()> {
        let comment = field.comment_text();
        if comment.is_empty() {
            return Ok(());
        }
        debug!(table = %table, column = field.column_name(), comment, "Setting column comment");
        let statement = self
            .inner
            .dialect()
            .comment_on_column(table, field.column_name(), comment);
        self.inner.run(&statement)
    }
}

impl<E: Executor> Migrator for DuckDbMigrator<E> {
    fn current_database(&self) -> String {
        self.inner.current_database()
    }

    fn create_table(&self, models: &[&ResolvedSchema]) -> Result<()> {
        capability::check(Operation::CreateTable)?;
        self.inner.create_table(models)?;

        for model in models {
            let table = qualify_model(model)?;
            for field in model.migrated_fields() {
                self.comment_column(&table, field)?;
            }
        }
        Ok(())
    }

    fn drop_table(&self, tables: &[TableRef<'_>]) -> Result<()> {
        capability::check(Operation::DropTable)?;
        self.inner.drop_table(tables)
    }

    fn has_table(&self, table: TableRef<'_>) -> bool {
        self.inner.has_table(table)
    }

    fn rename_table(&self, old: TableRef<'_>, new: TableRef<'_>) -> Result<()> {
        capability::check(Operation::RenameTable)?;
        let from = qualify(old)?;
        if !self.inner.catalog().table_exists(&from) {
            debug!(table = %from, "Table to rename does not exist");
            return Ok(());
        }

        self.inner.rename_table(old, new)?;
        self.invalidate_statements();
        Ok(())
    }

    fn get_tables(&self) -> Result<Vec<String>> {
        self.inner.get_tables()
    }

    fn add_column(&self, model: &ResolvedSchema, field: &str) -> Result<()> {
        capability::check(Operation::AddColumn)?;
        let declared = model.require_field(field)?;
        self.inner.add_column(model, field)?;
        self.comment_column(&qualify_model(model)?, declared)
    }

    fn drop_column(&self, model: &ResolvedSchema, field: &str) -> Result<()> {
        capability::check(Operation::DropColumn)?;
        self.inner.drop_column(model, field)?;
        self.invalidate_statements();
        Ok(())
    }

    fn migrate_column(
        &self,
        model: &ResolvedSchema,
        field: &FieldSpec,
        existing: &ColumnType,
    ) -> Result<()> {
        capability::check(Operation::MigrateColumn)?;

        // Primary key columns cannot be altered in place.
        if !field.primary_key && self.inner.needs_alter(field, existing) {
            self.alter_column(model, &field.name)?;
        }

        let declared = field.comment_text();
        if declared.is_empty() {
            return Ok(());
        }
        let table = qualify_model(model)?;
        let recorded = self
            .inner
            .catalog()
            .column_comment(&table, field.column_name());
        if declared == recorded {
            debug!(table = %table, column = field.column_name(), "Column comment unchanged");
            return Ok(());
        }

        info!(table = %table, column = field.column_name(), "Updating column comment");
        self.comment_column(&table, field)
    }

    fn has_column(&self, model: &ResolvedSchema, field: &str) -> bool {
        self.inner.has_column(model, field)
    }

    fn rename_column(&self, model: &ResolvedSchema, old: &str, field: &str) -> Result<()> {
        capability::check(Operation::RenameColumn)?;
        let table = qualify_model(model)?;
        let from = model.column_name_of(old);
        if !self.inner.catalog().column_exists(&table, from) {
            debug!(table = %table, column = from, "Column to rename does not exist");
            return Ok(());
        }

        self.inner.rename_column(model, old, field)?;
        self.invalidate_statements();
        Ok(())
    }

    fn alter_column(&self, model: &ResolvedSchema, field: &str) -> Result<()> {
        capability::check(Operation::AlterColumn)?;
        self.inner.alter_column(model, field)
    }

    fn column_types(&self, model: &ResolvedSchema) -> Result<Vec<ColumnType>> {
        self.inner.column_types(model)
    }

    fn create_view(&self, name: &str, option: &ViewOption) -> Result<()> {
        capability::check(Operation::CreateView)?;
        self.inner.create_view(name, option)
    }

    fn drop_view(&self, name: &str) -> Result<()> {
        capability::check(Operation::DropView)?;
        self.inner.drop_view(name)
    }

    fn create_constraint(&self, model: &ResolvedSchema, name: &str) -> Result<()> {
        capability::check(Operation::CreateConstraint)?;
        self.inner.create_constraint(model, name)
    }

    fn drop_constraint(&self, model: &ResolvedSchema, name: &str) -> Result<()> {
        capability::check(Operation::DropConstraint)?;
        self.inner.drop_constraint(model, name)
    }

    fn has_constraint(&self, model: &ResolvedSchema, name: &str) -> Result<bool> {
        capability::check(Operation::HasConstraint)?;
        self.inner.has_constraint(model, name)
    }

    fn create_index(&self, model: &ResolvedSchema, name: &str) -> Result<()> {
        capability::check(Operation::CreateIndex)?;
        self.inner.create_index(model, name)
    }

    fn drop_index(&self, model: &ResolvedSchema, name: &str) -> Result<()> {
        capability::check(Operation::DropIndex)?;
        self.inner.drop_index(model, name)
    }

    fn has_index(&self, model: &ResolvedSchema, name: &str) -> Result<bool> {
        capability::check(Operation::HasIndex)?;
        self.inner.has_index(model, name)
    }

    fn rename_index(&self, model: &ResolvedSchema, old: &str, new: &str) -> Result<()> {
        capability::check(Operation::RenameIndex)?;
        self.inner.rename_index(model, old, new)
    }
}
