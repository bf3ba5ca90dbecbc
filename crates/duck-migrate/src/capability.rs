//! Static table of what the DuckDB migrator can do.
//!
//! Every orchestrated operation consults the gate before any SQL is built.
//! Views are rejected outright. Constraint and index management, and column
//! type alteration, are part of the migrator surface but have no DuckDB
//! implementation, so callers get an explicit error instead of a failure
//! deep inside the engine.

use std::fmt;

use crate::error::{MigrateError, Result};

/// A migration operation exposed by the [`Migrator`](crate::migrator::Migrator) surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTable,
    DropTable,
    RenameTable,
    AddColumn,
    DropColumn,
    MigrateColumn,
    RenameColumn,
    AlterColumn,
    CreateView,
    DropView,
    CreateConstraint,
    DropConstraint,
    HasConstraint,
    CreateIndex,
    DropIndex,
    HasIndex,
    RenameIndex,
}

impl Operation {
    /// Returns the SQL-ish name of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTable => "CREATE TABLE",
            Self::DropTable => "DROP TABLE",
            Self::RenameTable => "RENAME TABLE",
            Self::AddColumn => "ADD COLUMN",
            Self::DropColumn => "DROP COLUMN",
            Self::MigrateColumn => "MIGRATE COLUMN",
            Self::RenameColumn => "RENAME COLUMN",
            Self::AlterColumn => "ALTER COLUMN",
            Self::CreateView => "CREATE VIEW",
            Self::DropView => "DROP VIEW",
            Self::CreateConstraint => "CREATE CONSTRAINT",
            Self::DropConstraint => "DROP CONSTRAINT",
            Self::HasConstraint => "HAS CONSTRAINT",
            Self::CreateIndex => "CREATE INDEX",
            Self::DropIndex => "DROP INDEX",
            Self::HasIndex => "HAS INDEX",
            Self::RenameIndex => "RENAME INDEX",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of consulting the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityVerdict {
    /// Proceed to statement synthesis.
    Supported,
    /// The engine cannot do this; fail with [`MigrateError::Unsupported`].
    Unsupported(Operation),
    /// Declared in the surface only; fail with [`MigrateError::NotImplemented`].
    Unimplemented(Operation),
}

impl CapabilityVerdict {
    /// Converts the verdict into a result, short-circuiting unsupported operations.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Supported => Ok(()),
            Self::Unsupported(op) => Err(MigrateError::Unsupported(op)),
            Self::Unimplemented(op) => Err(MigrateError::NotImplemented(op)),
        }
    }
}

/// Looks up the verdict for an operation.
#[must_use]
pub const fn verdict(op: Operation) -> CapabilityVerdict {
    match op {
        Operation::CreateView | Operation::DropView => CapabilityVerdict::Unsupported(op),
        Operation::AlterColumn
        | Operation::CreateConstraint
        | Operation::DropConstraint
        | Operation::HasConstraint
        | Operation::CreateIndex
        | Operation::DropIndex
        | Operation::HasIndex
        | Operation::RenameIndex => CapabilityVerdict::Unimplemented(op),
        Operation::CreateTable
        | Operation::DropTable
        | Operation::RenameTable
        | Operation::AddColumn
        | Operation::DropColumn
        | Operation::MigrateColumn
        | Operation::RenameColumn => CapabilityVerdict::Supported,
    }
}

/// Fails unless `op` is supported.
pub fn check(op: Operation) -> Result<()> {
    verdict(op).into_result()
}
