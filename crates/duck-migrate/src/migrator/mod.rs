//! The migrator capability surface.
//!
//! [`Migrator`] is the interface an ORM drives to converge a database with
//! its models. [`GenericMigrator`] implements it with portable DDL from any
//! [`MigrationDialect`](crate::dialect::MigrationDialect);
//! [`DuckDbMigrator`] wraps a generic migrator and overrides only the
//! operations DuckDB needs handled differently.

mod duckdb;
mod generic;

pub use self::duckdb::DuckDbMigrator;
pub use self::generic::GenericMigrator;

use crate::capability::Operation;
use crate::error::{MigrateError, Result};
use crate::schema::{reorder_tables, ColumnType, FieldSpec, ResolvedSchema, TableRef, ViewOption};

/// Schema migration operations.
///
/// Field arguments are model field names; names that match no field are
/// taken as literal column names where the operation allows it.
pub trait Migrator {
    /// Returns the name of the connected database, or an empty string.
    fn current_database(&self) -> String;

    /// Creates the tables of `models`, referenced tables first.
    fn create_table(&self, models: &[&ResolvedSchema]) -> Result<()>;

    /// Drops `tables` in reverse dependency order. Missing tables are skipped.
    fn drop_table(&self, tables: &[TableRef<'_>]) -> Result<()>;

    /// Whether `table` exists as a base table.
    fn has_table(&self, table: TableRef<'_>) -> bool;

    /// Renames table `old` to `new`.
    fn rename_table(&self, old: TableRef<'_>, new: TableRef<'_>) -> Result<()>;

    /// Lists the base tables of the current schema.
    fn get_tables(&self) -> Result<Vec<String>>;

    /// Adds the column of `field` to the model's table.
    fn add_column(&self, model: &ResolvedSchema, field: &str) -> Result<()>;

    /// Drops the column of `field`.
    fn drop_column(&self, model: &ResolvedSchema, field: &str) -> Result<()>;

    /// Converges an existing column with its declared field.
    fn migrate_column(
        &self,
        model: &ResolvedSchema,
        field: &FieldSpec,
        existing: &ColumnType,
    ) -> Result<()>;

    /// Whether the column of `field` exists on the model's table.
    fn has_column(&self, model: &ResolvedSchema, field: &str) -> bool;

    /// Renames column `old` to the column of `field`.
    fn rename_column(&self, model: &ResolvedSchema, old: &str, field: &str) -> Result<()>;

    /// Changes the column of `field` to its declared type.
    fn alter_column(&self, model: &ResolvedSchema, field: &str) -> Result<()>;

    /// Describes the existing columns of the model's table.
    fn column_types(&self, model: &ResolvedSchema) -> Result<Vec<ColumnType>>;

    /// Creates a view from `option`'s query.
    fn create_view(&self, name: &str, option: &ViewOption) -> Result<()>;

    /// Drops a view if it exists.
    fn drop_view(&self, name: &str) -> Result<()>;

    /// Creates the named constraint declared on the model.
    fn create_constraint(&self, _model: &ResolvedSchema, _name: &str) -> Result<()> {
        Err(MigrateError::NotImplemented(Operation::CreateConstraint))
    }

    /// Drops the named constraint.
    fn drop_constraint(&self, _model: &ResolvedSchema, _name: &str) -> Result<()> {
        Err(MigrateError::NotImplemented(Operation::DropConstraint))
    }

    /// Whether the named constraint exists.
    fn has_constraint(&self, _model: &ResolvedSchema, _name: &str) -> Result<bool> {
        Err(MigrateError::NotImplemented(Operation::HasConstraint))
    }

    /// Creates the named index declared on the model.
    fn create_index(&self, _model: &ResolvedSchema, _name: &str) -> Result<()> {
        Err(MigrateError::NotImplemented(Operation::CreateIndex))
    }

    /// Drops the named index.
    fn drop_index(&self, _model: &ResolvedSchema, _name: &str) -> Result<()> {
        Err(MigrateError::NotImplemented(Operation::DropIndex))
    }

    /// Whether the named index exists.
    fn has_index(&self, _model: &ResolvedSchema, _name: &str) -> Result<bool> {
        Err(MigrateError::NotImplemented(Operation::HasIndex))
    }

    /// Renames index `old` to `new`.
    fn rename_index(&self, _model: &ResolvedSchema, _old: &str, _new: &str) -> Result<()> {
        Err(MigrateError::NotImplemented(Operation::RenameIndex))
    }

    /// Creates missing tables, adds missing columns and migrates existing ones.
    ///
    /// Fields excluded from migration are left alone.
    fn auto_migrate(&self, models: &[&ResolvedSchema]) -> Result<()> {
        let tables: Vec<TableRef<'_>> = models.iter().map(|m| TableRef::Model(*m)).collect();

        for table in reorder_tables(&tables) {
            let Some(model) = table.model() else {
                continue;
            };

            if !self.has_table(table) {
                self.create_table(&[model])?;
                continue;
            }

            let existing = self.column_types(model)?;
            for field in model.migrated_fields() {
                let column = existing
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(field.column_name()));
                match column {
                    Some(column) => self.migrate_column(model, field, column)?,
                    None => self.add_column(model, &field.name)?,
                }
            }
        }

        Ok(())
    }
}
