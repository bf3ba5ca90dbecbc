//! DuckDB dialect for migrations.

use super::MigrationDialect;
use crate::schema::{FieldSpec, ResolvedSchema, SqlType};
use crate::statement::{QualifiedTable, SchemaRef, Statement};

/// DuckDB dialect for migration SQL generation.
///
/// DuckDB does not support `AUTOINCREMENT` or `SERIAL`/`BIGSERIAL`.
/// Instead, auto-increment is implemented via `CREATE SEQUENCE` +
/// `DEFAULT nextval('seq_<table>_<column>')`. The [`create_table`]
/// override emits the sequence DDL for every auto-increment field.
///
/// [`create_table`]: MigrationDialect::create_table
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbDialect;

impl DuckDbDialect {
    /// Creates a new DuckDB dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn sequence(table: &QualifiedTable, field: &FieldSpec) -> QualifiedTable {
        QualifiedTable {
            schema: table.schema.clone(),
            table: format!("seq_{}_{}", table.table, field.column_name()),
        }
    }

    /// `CREATE SEQUENCE` backing `field`, if it draws from one.
    fn create_sequence(table: &QualifiedTable, field: &FieldSpec) -> Option<Statement> {
        if !field.auto_increment || field.default.to_sql().is_some() {
            return None;
        }
        Some(
            Statement::new("CREATE SEQUENCE IF NOT EXISTS ")
                .table(&Self::sequence(table, field))
                .push(" START 1"),
        )
    }
}

impl MigrationDialect for DuckDbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE".to_string(),
            SqlType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            SqlType::Char(n) => format!("CHAR({n})"),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Text => "VARCHAR".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Timestamp | SqlType::DateTime => "TIMESTAMP".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Custom(name) => name.clone(),
        }
    }

    /// Maps aliases onto the names `information_schema.columns` reports.
    ///
    /// Character lengths are dropped since DuckDB does not enforce them,
    /// and a bare DECIMAL gets the engine's default width.
    fn normalize_type(&self, type_name: &str) -> String {
        let upper = type_name.trim().to_ascii_uppercase();
        let (base, args) = match upper.find('(') {
            Some(i) => (upper[..i].trim(), Some(upper[i..].replace(' ', ""))),
            None => (upper.as_str(), None),
        };

        let base = match base {
            "VARCHAR" | "CHAR" | "BPCHAR" | "TEXT" | "STRING" | "NVARCHAR" => {
                return "VARCHAR".to_string()
            }
            "BLOB" | "BYTEA" | "BINARY" | "VARBINARY" => return "BLOB".to_string(),
            "INT" | "INT4" | "SIGNED" => "INTEGER",
            "INT8" | "LONG" => "BIGINT",
            "INT2" | "SHORT" => "SMALLINT",
            "REAL" | "FLOAT4" => "FLOAT",
            "FLOAT8" | "DOUBLE PRECISION" => "DOUBLE",
            "DATETIME" => "TIMESTAMP",
            "BOOL" | "LOGICAL" => "BOOLEAN",
            "NUMERIC" => "DECIMAL",
            other => other,
        };

        match args {
            Some(args) => format!("{base}{args}"),
            None if base == "DECIMAL" => "DECIMAL(18,3)".to_string(),
            None => base.to_string(),
        }
    }

    fn auto_increment_clause(&self, table: &QualifiedTable, field: &FieldSpec) -> String {
        let sequence = Self::sequence(table, field);
        let qualified = match &table.schema {
            SchemaRef::Named(schema) => format!("{schema}.{}", sequence.table),
            SchemaRef::Current => sequence.table,
        };
        Statement::new("DEFAULT nextval(")
            .literal(qualified)
            .push(")")
            .sql()
            .to_string()
    }

    fn create_table(&self, table: &QualifiedTable, model: &ResolvedSchema) -> Vec<Statement> {
        let mut statements: Vec<Statement> = model
            .migrated_fields()
            .filter_map(|f| Self::create_sequence(table, f))
            .collect();

        statements.push(super::portable_create_table(self, table, model));
        statements
    }

    fn add_column(&self, table: &QualifiedTable, field: &FieldSpec) -> Vec<Statement> {
        let mut statements: Vec<Statement> =
            Self::create_sequence(table, field).into_iter().collect();
        statements.push(super::portable_add_column(self, table, field));
        statements
    }

    fn drop_table(&self, table: &QualifiedTable) -> Statement {
        Statement::new("DROP TABLE IF EXISTS ")
            .table(table)
            .push(" CASCADE")
    }
}
