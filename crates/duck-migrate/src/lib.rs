//! Schema migrations for DuckDB.
//!
//! `duck-migrate` converges a DuckDB database with the models an ORM
//! resolves. Given a model's table and its fields, it checks the live
//! catalog and issues only the DDL needed to close the gap, handling what
//! DuckDB does differently from other engines:
//! - no `ALTER COLUMN ... TYPE` or views through the migrator
//! - auto-increment through sequences
//! - column comments through `COMMENT ON COLUMN`
//! - prepared statements flushed after structural changes
//!
//! # Architecture
//!
//! - **Catalog** - Existence checks against `information_schema`
//! - **Dialect** - DDL text for one structural change
//! - **Migrator** - Sequences catalog checks and DDL per operation
//! - **Capability** - Operations DuckDB refuses before any SQL is built
//! - **Executor** - Runs statements; DuckDB connection included
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use duck_migrate::prelude::*;
//!
//! let conn = Arc::new(DuckDbConnection::open_in_memory()?);
//! let migrator = DuckDbMigrator::new(Arc::clone(&conn)).with_statement_cache(conn);
//!
//! let users = ResolvedSchema::new("users")
//!     .field(FieldSpec::new("ID", SqlType::BigInt).primary_key().auto_increment())
//!     .field(FieldSpec::new("Name", SqlType::Text).comment("display name"))
//!     .field(FieldSpec::new("Email", SqlType::Varchar(255)).unique());
//!
//! migrator.auto_migrate(&[&users])?;
//! assert!(migrator.has_column(&users, "Email"));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Create or update tables from a JSON model file
//! duck-migrate --database app.duckdb migrate --models models.json
//!
//! # Print the CREATE statements without running them
//! duck-migrate sql --models models.json
//!
//! # Inspect the catalog
//! duck-migrate --database app.duckdb tables
//! ```

pub mod capability;
pub mod catalog;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod migrator;
pub mod schema;
pub mod statement;

#[cfg(test)]
mod testing;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::capability::{CapabilityVerdict, Operation};
    pub use crate::catalog::{resolve_schema, CatalogInspector};
    pub use crate::dialect::{DuckDbDialect, MigrationDialect};
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{DuckDbConnection, Executor, StatementCache};
    pub use crate::migrator::{DuckDbMigrator, GenericMigrator, Migrator};
    pub use crate::schema::{
        ColumnType, DefaultValue, FieldSpec, ForeignKeyAction, ResolvedSchema, SqlType, TableRef,
        ViewOption,
    };
    pub use crate::statement::{QualifiedTable, SchemaRef, SqlValue, Statement};
}
