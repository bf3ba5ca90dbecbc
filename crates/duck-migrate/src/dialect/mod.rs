//! Database dialect implementations.
//!
//! A dialect turns one structural change into statement text. The trait's
//! provided methods produce portable DDL; dialects override what their
//! engine spells differently.

mod duckdb;

pub use self::duckdb::DuckDbDialect;

use crate::schema::{FieldSpec, ResolvedSchema, SqlType, ViewOption};
use crate::statement::{quote_identifier, QualifiedTable, Statement};

/// Trait for database-specific DDL generation.
pub trait MigrationDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the SQL type name for the given type.
    fn type_name(&self, sql_type: &SqlType) -> String;

    /// Brings a type name into the form the catalog reports, for comparison.
    fn normalize_type(&self, type_name: &str) -> String {
        type_name.trim().to_ascii_uppercase()
    }

    /// Returns the clause that makes `field` auto-increment.
    fn auto_increment_clause(&self, _table: &QualifiedTable, _field: &FieldSpec) -> String {
        "GENERATED BY DEFAULT AS IDENTITY".to_string()
    }

    /// Generates a column definition.
    ///
    /// `inline_primary_key` is false when the key is declared at table level.
    fn column_definition(
        &self,
        table: &QualifiedTable,
        field: &FieldSpec,
        inline_primary_key: bool,
    ) -> String {
        let mut parts = vec![
            quote_identifier(field.column_name()),
            self.type_name(&field.sql_type),
        ];

        if field.primary_key && inline_primary_key {
            parts.push("PRIMARY KEY".to_string());
        } else {
            if !field.nullable || field.primary_key {
                parts.push("NOT NULL".to_string());
            }
            if field.unique {
                parts.push("UNIQUE".to_string());
            }
        }

        if let Some(default_sql) = field.default.to_sql() {
            parts.push(format!("DEFAULT {default_sql}"));
        } else if field.auto_increment {
            parts.push(self.auto_increment_clause(table, field));
        }

        if let Some(fk) = &field.references {
            parts.push(format!(
                "REFERENCES {} ({})",
                quote_identifier(&fk.table),
                quote_identifier(&fk.column)
            ));
            if let Some(action) = fk.on_delete {
                parts.push(format!("ON DELETE {}", action.to_sql()));
            }
        }

        parts.join(" ")
    }

    /// Generates the statements that create `model`'s table.
    fn create_table(&self, table: &QualifiedTable, model: &ResolvedSchema) -> Vec<Statement> {
        vec![portable_create_table(self, table, model)]
    }

    /// Generates SQL for DROP TABLE.
    fn drop_table(&self, table: &QualifiedTable) -> Statement {
        Statement::new("DROP TABLE IF EXISTS ").table(table)
    }

    /// Generates SQL for renaming a table. The new name is never qualified.
    fn rename_table(&self, from: &QualifiedTable, to: &str) -> Statement {
        Statement::new("ALTER TABLE ")
            .table(from)
            .push(" RENAME TO ")
            .ident(to)
    }

    /// Generates the statements that add `field` to an existing table.
    fn add_column(&self, table: &QualifiedTable, field: &FieldSpec) -> Vec<Statement> {
        vec![portable_add_column(self, table, field)]
    }

    /// Generates SQL for DROP COLUMN.
    fn drop_column(&self, table: &QualifiedTable, column: &str) -> Statement {
        Statement::new("ALTER TABLE ")
            .table(table)
            .push(" DROP COLUMN ")
            .ident(column)
    }

    /// Generates SQL for RENAME COLUMN.
    fn rename_column(&self, table: &QualifiedTable, from: &str, to: &str) -> Statement {
        Statement::new("ALTER TABLE ")
            .table(table)
            .push(" RENAME COLUMN ")
            .ident(from)
            .push(" TO ")
            .ident(to)
    }

    /// Generates SQL changing a column's type to the declared one.
    fn alter_column_type(&self, table: &QualifiedTable, field: &FieldSpec) -> Statement {
        Statement::new("ALTER TABLE ")
            .table(table)
            .push(" ALTER COLUMN ")
            .ident(field.column_name())
            .push(" TYPE ")
            .push(&self.type_name(&field.sql_type))
    }

    /// Generates SQL attaching a comment to a column.
    ///
    /// The comment is rendered as an escaped literal since `COMMENT ON`
    /// takes a constant.
    fn comment_on_column(&self, table: &QualifiedTable, column: &str, comment: &str) -> Statement {
        Statement::new("COMMENT ON COLUMN ")
            .column(table, column)
            .push(" IS ")
            .literal(comment)
    }

    /// Generates SQL for CREATE VIEW.
    fn create_view(&self, name: &str, option: &ViewOption) -> Statement {
        let verb = if option.replace {
            "CREATE OR REPLACE VIEW "
        } else {
            "CREATE VIEW "
        };
        Statement::new(verb)
            .ident(name)
            .push(" AS ")
            .push(&option.query)
    }

    /// Generates SQL for DROP VIEW.
    fn drop_view(&self, name: &str) -> Statement {
        Statement::new("DROP VIEW IF EXISTS ").ident(name)
    }
}

/// Builds a single `CREATE TABLE` from `dialect`'s column definitions.
///
/// A composite primary key is declared at table level.
pub(crate) fn portable_create_table<D: MigrationDialect + ?Sized>(
    dialect: &D,
    table: &QualifiedTable,
    model: &ResolvedSchema,
) -> Statement {
    let primary_keys: Vec<&str> = model
        .primary_keys()
        .filter(|f| !f.skip_migration)
        .map(FieldSpec::column_name)
        .collect();
    let inline_primary_key = primary_keys.len() == 1;

    let mut definitions: Vec<String> = model
        .migrated_fields()
        .map(|f| dialect.column_definition(table, f, inline_primary_key))
        .collect();

    if primary_keys.len() > 1 {
        let quoted: Vec<String> = primary_keys.iter().map(|k| quote_identifier(k)).collect();
        definitions.push(format!("PRIMARY KEY ({})", quoted.join(", ")));
    }

    Statement::new("CREATE TABLE ")
        .table(table)
        .push(" (\n    ")
        .push(&definitions.join(",\n    "))
        .push("\n)")
}

/// Builds a single `ALTER TABLE ... ADD COLUMN` for `field`.
pub(crate) fn portable_add_column<D: MigrationDialect + ?Sized>(
    dialect: &D,
    table: &QualifiedTable,
    field: &FieldSpec,
) -> Statement {
    Statement::new("ALTER TABLE ")
        .table(table)
        .push(" ADD COLUMN ")
        .push(&dialect.column_definition(table, field, true))
}
