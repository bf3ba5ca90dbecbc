//! Statement building.
//!
//! All SQL the migrator emits goes through [`Statement`], which keeps
//! identifier quoting and parameter binding in one place: identifiers are
//! always quoted, values are either bound as `?` parameters or rendered as
//! escaped literals for statements that only accept constants.

use std::fmt;

/// A SQL value that can be bound or inlined.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: Prefer binding parameters; this exists for statements such
    /// as `COMMENT ON` that take a constant.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
        }
    }

    /// Returns the value as text, if it is text or a number.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Returns the value as an integer, parsing text if needed.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) => Some(*f as i64),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Null => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The schema half of a qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaRef {
    /// An explicitly named schema.
    Named(String),
    /// Whatever `CURRENT_SCHEMA()` evaluates to at execution time.
    Current,
}

impl SchemaRef {
    /// SQL expression that evaluates to the current schema.
    pub const CURRENT_SCHEMA_SQL: &'static str = "CURRENT_SCHEMA()";
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Current => f.write_str(Self::CURRENT_SCHEMA_SQL),
        }
    }
}

/// A `(schema, table)` pair, recomputed for every operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedTable {
    pub schema: SchemaRef,
    pub table: String,
}

impl QualifiedTable {
    /// A table in an explicitly named schema.
    #[must_use]
    pub fn named(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: SchemaRef::Named(schema.into()),
            table: table.into(),
        }
    }

    /// A table in the current schema.
    #[must_use]
    pub fn current(table: impl Into<String>) -> Self {
        Self {
            schema: SchemaRef::Current,
            table: table.into(),
        }
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Quotes an identifier, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A SQL statement with its bound parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    /// Starts a statement with a verb or any leading raw text.
    #[must_use]
    pub fn new(verb: &str) -> Self {
        Self {
            sql: verb.to_string(),
            params: Vec::new(),
        }
    }

    /// Appends raw SQL text.
    #[must_use]
    pub fn push(mut self, raw: &str) -> Self {
        self.sql.push_str(raw);
        self
    }

    /// Appends a quoted identifier.
    #[must_use]
    pub fn ident(mut self, name: &str) -> Self {
        self.sql.push_str(&quote_identifier(name));
        self
    }

    /// Appends a table as a DDL target.
    ///
    /// The current schema is left implicit; a named schema qualifies the table.
    #[must_use]
    pub fn table(mut self, table: &QualifiedTable) -> Self {
        if let SchemaRef::Named(schema) = &table.schema {
            self.sql.push_str(&quote_identifier(schema));
            self.sql.push('.');
        }
        self.sql.push_str(&quote_identifier(&table.table));
        self
    }

    /// Appends `table.column`.
    #[must_use]
    pub fn column(self, table: &QualifiedTable, column: &str) -> Self {
        self.table(table).push(".").ident(column)
    }

    /// Appends a `?` placeholder and binds `value` to it.
    #[must_use]
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    /// Appends a schema as a catalog filter value.
    ///
    /// A named schema is bound as a parameter, the current schema is
    /// evaluated by the engine.
    #[must_use]
    pub fn bind_schema(self, schema: &SchemaRef) -> Self {
        match schema {
            SchemaRef::Named(name) => self.bind(name.as_str()),
            SchemaRef::Current => self.push(SchemaRef::CURRENT_SCHEMA_SQL),
        }
    }

    /// Appends an escaped literal.
    #[must_use]
    pub fn literal(mut self, value: impl Into<SqlValue>) -> Self {
        self.sql.push_str(&value.into().to_sql_inline());
        self
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bound parameters in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
