//! Migrations against a database file that outlives its connection.

mod common;

use std::sync::Arc;

use common::{users, wrap};
use duck_migrate::prelude::*;

#[test]
fn test_schema_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.duckdb");

    {
        let h = wrap(Arc::new(DuckDbConnection::open(&path).unwrap()));
        h.migrator.create_table(&[&users()]).unwrap();
        assert_eq!(h.migrator.current_database(), "app");
    }

    let h = wrap(Arc::new(DuckDbConnection::open(&path).unwrap()));
    let users = users();
    assert!(h.migrator.has_table((&users).into()));
    assert!(h.migrator.has_column(&users, "Email"));

    h.migrator.auto_migrate(&[&users]).unwrap();
    assert!(h.recorder.executed().is_empty());
}
