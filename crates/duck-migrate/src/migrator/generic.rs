//! Portable migrator behavior.

use tracing::{debug, info, warn};

use super::Migrator;
use crate::catalog::{qualify, CatalogInspector};
use crate::dialect::MigrationDialect;
use crate::error::Result;
use crate::executor::Executor;
use crate::schema::{reorder_tables, ColumnType, FieldSpec, ResolvedSchema, TableRef, ViewOption};
use crate::statement::{QualifiedTable, Statement};

/// Migrator built only from a dialect's DDL and the `information_schema` catalog.
pub struct GenericMigrator<E, D> {
    executor: E,
    dialect: D,
}

impl<E: Executor, D: MigrationDialect> GenericMigrator<E, D> {
    /// Creates a migrator running `dialect`'s statements on `executor`.
    pub const fn new(executor: E, dialect: D) -> Self {
        Self { executor, dialect }
    }

    pub const fn executor(&self) -> &E {
        &self.executor
    }

    pub const fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Returns an inspector over this migrator's executor.
    pub const fn catalog(&self) -> CatalogInspector<'_, E> {
        CatalogInspector::new(&self.executor)
    }

    /// Whether the declared type of `field` differs from the catalog's.
    pub fn needs_alter(&self, field: &FieldSpec, existing: &ColumnType) -> bool {
        let declared = self
            .dialect
            .normalize_type(&self.dialect.type_name(&field.sql_type));
        declared != self.dialect.normalize_type(&existing.data_type)
    }

    pub(crate) fn run(&self, statement: &Statement) -> Result<()> {
        self.executor.execute(statement)
    }
}

/// Resolves the qualified table of `model`.
pub(crate) fn qualify_model(model: &ResolvedSchema) -> Result<QualifiedTable> {
    qualify(TableRef::Model(model))
}

impl<E: Executor, D: MigrationDialect> Migrator for GenericMigrator<E, D> {
    fn current_database(&self) -> String {
        self.catalog().current_database_name()
    }

    fn create_table(&self, models: &[&ResolvedSchema]) -> Result<()> {
        let tables: Vec<TableRef<'_>> = models.iter().map(|m| TableRef::Model(*m)).collect();

        for table in reorder_tables(&tables) {
            let Some(model) = table.model() else {
                continue;
            };
            let qualified = qualify(table)?;
            info!(table = %qualified, dialect = self.dialect.name(), "Creating table");
            for statement in self.dialect.create_table(&qualified, model) {
                self.run(&statement)?;
            }
        }
        Ok(())
    }

    fn drop_table(&self, tables: &[TableRef<'_>]) -> Result<()> {
        let mut ordered = reorder_tables(tables);
        ordered.reverse();

        for table in ordered {
            let qualified = qualify(table)?;
            info!(table = %qualified, "Dropping table");
            self.run(&self.dialect.drop_table(&qualified))?;
        }
        Ok(())
    }

    fn has_table(&self, table: TableRef<'_>) -> bool {
        match qualify(table) {
            Ok(qualified) => self.catalog().table_exists(&qualified),
            Err(err) => {
                warn!(error = %err, "Cannot check table existence");
                false
            }
        }
    }

    fn rename_table(&self, old: TableRef<'_>, new: TableRef<'_>) -> Result<()> {
        let from = qualify(old)?;
        let to = qualify(new)?;
        info!(from = %from, to = %to.table, "Renaming table");
        self.run(&self.dialect.rename_table(&from, &to.table))
    }

    fn get_tables(&self) -> Result<Vec<String>> {
        self.catalog().list_tables()
    }

    fn add_column(&self, model: &ResolvedSchema, field: &str) -> Result<()> {
        let field = model.require_field(field)?;
        let table = qualify_model(model)?;
        if field.skip_migration {
            debug!(table = %table, column = field.column_name(), "Column excluded from migration");
            return Ok(());
        }

        info!(table = %table, column = field.column_name(), "Adding column");
        for statement in self.dialect.add_column(&table, field) {
            self.run(&statement)?;
        }
        Ok(())
    }

    fn drop_column(&self, model: &ResolvedSchema, field: &str) -> Result<()> {
        let table = qualify_model(model)?;
        let column = model.column_name_of(field);
        info!(table = %table, column, "Dropping column");
        self.run(&self.dialect.drop_column(&table, column))
    }

    fn migrate_column(
        &self,
        model: &ResolvedSchema,
        field: &FieldSpec,
        existing: &ColumnType,
    ) -> Result<()> {
        if !self.needs_alter(field, existing) {
            return Ok(());
        }
        debug!(
            column = field.column_name(),
            from = %existing.data_type,
            to = %self.dialect.type_name(&field.sql_type),
            "Column type drifted"
        );
        self.alter_column(model, &field.name)
    }

    fn has_column(&self, model: &ResolvedSchema, field: &str) -> bool {
        match qualify_model(model) {
            Ok(table) => self
                .catalog()
                .column_exists(&table, model.column_name_of(field)),
            Err(err) => {
                warn!(error = %err, "Cannot check column existence");
                false
            }
        }
    }

    fn rename_column(&self, model: &ResolvedSchema, old: &str, field: &str) -> Result<()> {
        let table = qualify_model(model)?;
        let from = model.column_name_of(old);
        let to = model.column_name_of(field);
        info!(table = %table, from, to, "Renaming column");
        self.run(&self.dialect.rename_column(&table, from, to))
    }

    fn alter_column(&self, model: &ResolvedSchema, field: &str) -> Result<()> {
        let field = model.require_field(field)?;
        let table = qualify_model(model)?;
        info!(table = %table, column = field.column_name(), "Altering column type");
        self.run(&self.dialect.alter_column_type(&table, field))
    }

    fn column_types(&self, model: &ResolvedSchema) -> Result<Vec<ColumnType>> {
        self.catalog().column_types(&qualify_model(model)?)
    }

    fn create_view(&self, name: &str, option: &ViewOption) -> Result<()> {
        info!(view = name, "Creating view");
        self.run(&self.dialect.create_view(name, option))
    }

    fn drop_view(&self, name: &str) -> Result<()> {
        info!(view = name, "Dropping view");
        self.run(&self.dialect.drop_view(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DuckDbDialect;
    use crate::error::MigrateError;
    use crate::schema::SqlType;
    use crate::statement::SqlValue;
    use crate::testing::RecordingExecutor;

    fn users() -> ResolvedSchema {
        ResolvedSchema::new("users")
            .field(FieldSpec::new("ID", SqlType::BigInt).primary_key())
            .field(FieldSpec::new("Name", SqlType::Text))
            .field(FieldSpec::new("Email", SqlType::Varchar(255)).unique())
    }

    fn posts() -> ResolvedSchema {
        ResolvedSchema::new("posts")
            .field(FieldSpec::new("ID", SqlType::BigInt).primary_key())
            .field(FieldSpec::new("UserID", SqlType::BigInt).references("users", "id"))
    }

    fn migrator(exec: RecordingExecutor) -> GenericMigrator<RecordingExecutor, DuckDbDialect> {
        GenericMigrator::new(exec, DuckDbDialect::new())
    }

    fn column(name: &str, data_type: &str) -> ColumnType {
        ColumnType {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            default: None,
        }
    }

    #[test]
    fn test_create_table_orders_referenced_tables_first() {
        let m = migrator(RecordingExecutor::new());
        m.create_table(&[&posts(), &users()]).unwrap();

        let sql = m.executor().executed_sql();
        assert_eq!(sql.len(), 2);
        assert!(sql[0].starts_with("CREATE TABLE \"users\""));
        assert!(sql[1].starts_with("CREATE TABLE \"posts\""));
    }

    #[test]
    fn test_drop_table_reverses_dependency_order() {
        let m = migrator(RecordingExecutor::new());
        let (users, posts) = (users(), posts());
        m.drop_table(&[TableRef::from(&users), TableRef::from(&posts)])
            .unwrap();

        assert_eq!(
            m.executor().executed_sql(),
            vec![
                "DROP TABLE IF EXISTS \"posts\" CASCADE",
                "DROP TABLE IF EXISTS \"users\" CASCADE",
            ]
        );
    }

    #[test]
    fn test_needs_alter_ignores_aliases() {
        let m = migrator(RecordingExecutor::new());
        let email = FieldSpec::new("Email", SqlType::Varchar(255));
        assert!(!m.needs_alter(&email, &column("email", "VARCHAR")));

        let id = FieldSpec::new("ID", SqlType::BigInt);
        assert!(!m.needs_alter(&id, &column("id", "bigint")));
        assert!(m.needs_alter(&id, &column("id", "INTEGER")));
    }

    #[test]
    fn test_migrate_column_alters_drifted_type() {
        let m = migrator(RecordingExecutor::new());
        let model = users();
        let field = model.require_field("ID").unwrap();
        m.migrate_column(&model, field, &column("id", "INTEGER"))
            .unwrap();

        assert_eq!(
            m.executor().executed_sql(),
            vec!["ALTER TABLE \"users\" ALTER COLUMN \"id\" TYPE BIGINT"]
        );
    }

    #[test]
    fn test_rename_column_maps_field_names() {
        let m = migrator(RecordingExecutor::new());
        let model = ResolvedSchema::new("users")
            .field(FieldSpec::new("FullName", SqlType::Text));
        m.rename_column(&model, "name", "FullName").unwrap();

        assert_eq!(
            m.executor().executed_sql(),
            vec!["ALTER TABLE \"users\" RENAME COLUMN \"name\" TO \"full_name\""]
        );
    }

    #[test]
    fn test_add_column_skips_excluded_field() {
        let m = migrator(RecordingExecutor::new());
        let model = users().field(FieldSpec::new("Score", SqlType::Integer).skip_migration());
        m.add_column(&model, "Score").unwrap();
        assert!(m.executor().executed().is_empty());

        assert!(matches!(
            m.add_column(&model, "Missing"),
            Err(MigrateError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_generic_views() {
        let m = migrator(RecordingExecutor::new());
        let option = ViewOption {
            replace: false,
            query: "SELECT * FROM users".to_string(),
        };
        m.create_view("active_users", &option).unwrap();
        m.drop_view("active_users").unwrap();

        assert_eq!(
            m.executor().executed_sql(),
            vec![
                "CREATE VIEW \"active_users\" AS SELECT * FROM users",
                "DROP VIEW IF EXISTS \"active_users\"",
            ]
        );
    }

    #[test]
    fn test_has_table_with_invalid_reference_is_false() {
        let m = migrator(RecordingExecutor::new());
        assert!(!m.has_table(TableRef::from("")));
        assert!(m.executor().queries().is_empty());
    }

    #[test]
    fn test_auto_migrate_adds_missing_columns() {
        let exec = RecordingExecutor::new()
            .answer("information_schema.tables", vec![vec![SqlValue::Int(1)]])
            .answer(
                "ordinal_position",
                vec![
                    vec![
                        SqlValue::from("id"),
                        SqlValue::from("BIGINT"),
                        SqlValue::from("NO"),
                        SqlValue::Null,
                    ],
                    vec![
                        SqlValue::from("name"),
                        SqlValue::from("VARCHAR"),
                        SqlValue::from("YES"),
                        SqlValue::Null,
                    ],
                ],
            );
        let m = migrator(exec);
        m.auto_migrate(&[&users()]).unwrap();

        assert_eq!(
            m.executor().executed_sql(),
            vec!["ALTER TABLE \"users\" ADD COLUMN \"email\" VARCHAR(255) UNIQUE"]
        );
    }

    #[test]
    fn test_auto_migrate_creates_missing_table() {
        let m = migrator(RecordingExecutor::new());
        m.auto_migrate(&[&users()]).unwrap();

        let sql = m.executor().executed_sql();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].starts_with("CREATE TABLE \"users\""));
    }
}
