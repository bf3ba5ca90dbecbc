//! Error types for the migrator.

use crate::capability::Operation;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The engine cannot perform this operation at all.
    #[error("DuckDB does not support this operation: {0}")]
    Unsupported(Operation),

    /// The operation is declared but has no DuckDB implementation.
    #[error("Operation not implemented for DuckDB: {0}")]
    NotImplemented(Operation),

    /// A table reference could not be resolved to a table name.
    #[error("Cannot resolve table reference: {0}")]
    InvalidTable(String),

    /// A model has no field with the requested name.
    #[error("Failed to look up field '{field}' on table '{table}'")]
    FieldNotFound {
        /// Table the model maps to.
        table: String,
        /// Field name that was looked up.
        field: String,
    },

    /// Database error from DuckDB.
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// A statement failed in an executor that does not report DuckDB errors.
    #[error("Failed to execute '{sql}': {message}")]
    Execution {
        /// Statement text.
        sql: String,
        /// Error message reported by the executor.
        message: String,
    },

    /// IO error (reading model files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
