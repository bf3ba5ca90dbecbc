//! Resolved model shapes.
//!
//! These types describe what the ORM's model layer hands the migrator: an
//! ordered list of fields with their column names, types and constraint
//! flags, plus the table the model maps to. The migrator only reads them.

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// SQL data types a field can declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    BigInt,
    /// Small integer (16-bit).
    SmallInt,
    /// Unbounded text.
    Text,
    /// Variable-length character string.
    Varchar(usize),
    /// Fixed-length character string.
    Char(usize),
    /// Boolean.
    Boolean,
    /// Date and time.
    DateTime,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Timestamp (alias for DateTime in most databases).
    Timestamp,
    /// Floating point (single precision).
    Real,
    /// Floating point (double precision).
    Double,
    /// Decimal with precision and scale.
    Decimal(u8, u8),
    /// Binary large object.
    Blob,
    /// JSON data.
    Json,
    /// UUID.
    Uuid,
    /// A type name passed through verbatim.
    Custom(String),
}

/// Default value for a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// No default value.
    #[default]
    None,
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Null => Some("NULL".to_string()),
            Self::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(expr.clone()),
        }
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub const fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
        }
    }
}

/// A field-level reference to another table's column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table name.
    pub table: String,
    /// Referenced column name.
    pub column: String,
    /// Action on delete.
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
}

/// One resolved model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name on the model (e.g. `CreatedAt`).
    pub name: String,
    /// Column name in the database (e.g. `created_at`).
    #[serde(default)]
    pub db_name: String,
    /// Declared SQL type.
    pub sql_type: SqlType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: DefaultValue,
    /// Column comment, possibly still wrapped in quote characters.
    #[serde(default)]
    pub comment: String,
    /// The field exists on the model but its column is not managed by migrations.
    #[serde(default)]
    pub skip_migration: bool,
    #[serde(default)]
    pub references: Option<ForeignKeyRef>,
}

const fn default_nullable() -> bool {
    true
}

impl FieldSpec {
    /// Creates a field whose column name is the snake_case form of `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        let name = name.into();
        Self {
            db_name: to_snake_case(&name),
            name,
            sql_type,
            primary_key: false,
            auto_increment: false,
            nullable: true,
            unique: false,
            default: DefaultValue::None,
            comment: String::new(),
            skip_migration: false,
            references: None,
        }
    }

    /// Overrides the column name.
    #[must_use]
    pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Sets the field as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = value;
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Excludes the column from structural migration.
    #[must_use]
    pub fn skip_migration(mut self) -> Self {
        self.skip_migration = true;
        self
    }

    /// Adds a reference to `table.column`.
    #[must_use]
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKeyRef {
            table: table.into(),
            column: column.into(),
            on_delete: None,
        });
        self
    }

    /// Returns the database column name, falling back to the field name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        if self.db_name.is_empty() {
            &self.name
        } else {
            &self.db_name
        }
    }

    /// Returns the comment with one pass of `'` and then `"` trimmed from both ends.
    #[must_use]
    pub fn comment_text(&self) -> &str {
        self.comment.trim_matches('\'').trim_matches('"')
    }
}

/// The resolved shape of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSchema {
    /// Table name, optionally written as `schema.table`.
    pub table: String,
    /// Explicit schema the table lives in.
    #[serde(default)]
    pub schema: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl ResolvedSchema {
    /// Creates an empty model for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            fields: Vec::new(),
        }
    }

    /// Places the table in an explicit schema.
    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Finds a field by model name or by column name.
    #[must_use]
    pub fn lookup_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.column_name() == name))
    }

    /// Finds a field or fails with [`MigrateError::FieldNotFound`].
    pub fn require_field(&self, name: &str) -> Result<&FieldSpec> {
        self.lookup_field(name)
            .ok_or_else(|| MigrateError::FieldNotFound {
                table: self.table.clone(),
                field: name.to_string(),
            })
    }

    /// Maps a field name to its column name, or returns `name` unchanged.
    #[must_use]
    pub fn column_name_of<'a>(&'a self, name: &'a str) -> &'a str {
        self.lookup_field(name).map_or(name, FieldSpec::column_name)
    }

    /// Returns the quoted `"schema"."table"` expression when a schema is set.
    #[must_use]
    pub fn table_expr(&self) -> Option<String> {
        self.schema
            .as_ref()
            .map(|schema| format!("\"{}\".\"{}\"", schema, self.table))
    }

    /// Returns the fields that make up the primary key.
    pub fn primary_keys(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.primary_key)
    }

    /// Returns the fields whose columns are created by migrations.
    pub fn migrated_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.skip_migration)
    }
}

/// An existing column as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// Options for creating a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOption {
    /// Use `CREATE OR REPLACE VIEW`.
    pub replace: bool,
    /// The SELECT the view is defined by.
    pub query: String,
}

/// A table named either directly or through a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableRef<'a> {
    Name(&'a str),
    Model(&'a ResolvedSchema),
}

impl<'a> TableRef<'a> {
    /// Returns the table name, failing for an empty name or a model without one.
    pub fn name(&self) -> Result<&'a str> {
        let name = match self {
            Self::Name(name) => name,
            Self::Model(model) => model.table.as_str(),
        };
        if name.trim().is_empty() {
            return Err(MigrateError::InvalidTable(format!("{self:?}")));
        }
        Ok(name)
    }

    /// Returns the model behind this reference, if any.
    #[must_use]
    pub const fn model(&self) -> Option<&'a ResolvedSchema> {
        match self {
            Self::Name(_) => None,
            Self::Model(model) => Some(model),
        }
    }

    /// Returns the tables this table references through foreign keys.
    #[must_use]
    pub fn references(&self) -> Vec<&'a str> {
        self.model()
            .map(|model| {
                model
                    .fields
                    .iter()
                    .filter_map(|f| f.references.as_ref())
                    .map(|r| r.table.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<'a> From<&'a str> for TableRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for TableRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}

impl<'a> From<&'a ResolvedSchema> for TableRef<'a> {
    fn from(model: &'a ResolvedSchema) -> Self {
        Self::Model(model)
    }
}

/// Orders tables so that referenced tables come before the tables referencing them.
///
/// Ties keep declaration order. Tables caught in a reference cycle are
/// appended in declaration order once nothing else can be placed.
#[must_use]
pub fn reorder_tables<'a>(tables: &[TableRef<'a>]) -> Vec<TableRef<'a>> {
    let names: Vec<Option<&str>> = tables.iter().map(|t| t.name().ok()).collect();
    let mut in_degree = vec![0_usize; tables.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];

    for (i, table) in tables.iter().enumerate() {
        for parent in table.references() {
            let Some(j) = names.iter().position(|n| *n == Some(parent)) else {
                continue;
            };
            if j != i && !dependents[j].contains(&i) {
                dependents[j].push(i);
                in_degree[i] += 1;
            }
        }
    }

    // Kahn's algorithm, always taking the earliest declared ready table
    let mut placed = vec![false; tables.len()];
    let mut result = Vec::with_capacity(tables.len());
    while let Some(i) = (0..tables.len()).find(|&i| !placed[i] && in_degree[i] == 0) {
        placed[i] = true;
        result.push(tables[i]);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
        }
    }

    result.extend((0..tables.len()).filter(|&i| !placed[i]).map(|i| tables[i]));
    result
}

/// Converts a model field name such as `CreatedAt` or `UserID` to `created_at` / `user_id`.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> ResolvedSchema {
        ResolvedSchema::new("users")
            .field(FieldSpec::new("ID", SqlType::BigInt).primary_key())
            .field(FieldSpec::new("Name", SqlType::Varchar(255)))
            .field(FieldSpec::new("Email", SqlType::Varchar(255)).unique())
    }

    #[test]
    fn test_field_builder() {
        let field = FieldSpec::new("ID", SqlType::BigInt)
            .primary_key()
            .auto_increment();

        assert_eq!(field.db_name, "id");
        assert!(field.primary_key);
        assert!(field.auto_increment);
        assert!(!field.nullable);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("Price"), "price");
        assert_eq!(to_snake_case("CreatedAt"), "created_at");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_lookup_by_name_or_column() {
        let model = user();
        assert_eq!(model.lookup_field("Email").unwrap().db_name, "email");
        assert_eq!(model.lookup_field("email").unwrap().name, "Email");
        assert!(model.lookup_field("Missing").is_none());
        assert_eq!(model.column_name_of("Name"), "name");
        assert_eq!(model.column_name_of("legacy_col"), "legacy_col");
    }

    #[test]
    fn test_require_field_reports_table() {
        let err = user().require_field("Age").unwrap_err();
        assert!(matches!(
            err,
            MigrateError::FieldNotFound { ref table, ref field } if table == "users" && field == "Age"
        ));
    }

    #[test]
    fn test_comment_text_trims_quotes() {
        let field = FieldSpec::new("Name", SqlType::Text).comment("'hello'");
        assert_eq!(field.comment_text(), "hello");
        let field = FieldSpec::new("Name", SqlType::Text).comment("\"world\"");
        assert_eq!(field.comment_text(), "world");
        let field = FieldSpec::new("Name", SqlType::Text).comment("it's");
        assert_eq!(field.comment_text(), "it's");
    }

    #[test]
    fn test_default_value_to_sql() {
        assert_eq!(DefaultValue::None.to_sql(), None);
        assert_eq!(DefaultValue::Bool(true).to_sql(), Some("TRUE".to_string()));
        assert_eq!(
            DefaultValue::String("o'neil".to_string()).to_sql(),
            Some("'o''neil'".to_string())
        );
        assert_eq!(
            DefaultValue::Expression("CURRENT_TIMESTAMP".to_string()).to_sql(),
            Some("CURRENT_TIMESTAMP".to_string())
        );
    }

    #[test]
    fn test_table_ref_name() {
        let model = user();
        assert_eq!(TableRef::from(&model).name().unwrap(), "users");
        assert_eq!(TableRef::from("sales.orders").name().unwrap(), "sales.orders");
        assert!(matches!(
            TableRef::Model(&ResolvedSchema::new("")).name(),
            Err(MigrateError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_reorder_places_parents_first() {
        let posts = ResolvedSchema::new("posts")
            .field(FieldSpec::new("ID", SqlType::BigInt).primary_key())
            .field(FieldSpec::new("UserID", SqlType::BigInt).references("users", "id"));
        let users = user();
        let tags = ResolvedSchema::new("tags");

        let tables = [
            TableRef::from(&posts),
            TableRef::from(&tags),
            TableRef::from(&users),
        ];
        let ordered: Vec<&str> = reorder_tables(&tables)
            .iter()
            .map(|t| t.name().unwrap())
            .collect();
        assert_eq!(ordered, vec!["tags", "users", "posts"]);
    }

    #[test]
    fn test_reorder_keeps_cycles_in_declaration_order() {
        let a = ResolvedSchema::new("a").field(FieldSpec::new("B", SqlType::BigInt).references("b", "id"));
        let b = ResolvedSchema::new("b").field(FieldSpec::new("A", SqlType::BigInt).references("a", "id"));
        let c = ResolvedSchema::new("c");

        let tables = [TableRef::from(&a), TableRef::from(&b), TableRef::from(&c)];
        let ordered: Vec<&str> = reorder_tables(&tables)
            .iter()
            .map(|t| t.name().unwrap())
            .collect();
        assert_eq!(ordered, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_deserialize_model_defaults() {
        let json = r#"{
            "table": "products",
            "fields": [
                {"name": "ID", "db_name": "id", "sql_type": "BigInt", "primary_key": true},
                {"name": "Price", "sql_type": {"Decimal": [10, 2]}, "comment": "unit price"}
            ]
        }"#;
        let model: ResolvedSchema = serde_json::from_str(json).unwrap();
        assert_eq!(model.fields.len(), 2);
        assert!(model.fields[1].nullable);
        assert_eq!(model.fields[1].column_name(), "Price");
        assert_eq!(model.fields[1].sql_type, SqlType::Decimal(10, 2));
    }
}
