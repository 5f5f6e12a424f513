#![forbid(unsafe_code)]

use rusqlite::Connection;
use sg_core::RelationState;
use sg_storage::{DB_FILE_NAME, ErrorKind, SqliteStore, StoreError};

#[test]
fn open_rejects_foreign_tables() {
    let dir = tempfile::tempdir().expect("temp dir");
    let conn = Connection::open(dir.path().join(DB_FILE_NAME)).expect("open db");
    conn.execute("CREATE TABLE legacy_users(id INTEGER PRIMARY KEY)", [])
        .expect("legacy table");
    drop(conn);

    let err = SqliteStore::open(dir.path()).expect_err("foreign schema must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(
        err,
        StoreError::InvalidInput(message) if message.starts_with("RESET_REQUIRED")
    ));
}

#[test]
fn open_rejects_schema_version_mismatch() {
    let dir = tempfile::tempdir().expect("temp dir");
    drop(SqliteStore::open(dir.path()).expect("fresh store"));

    let conn = Connection::open(dir.path().join(DB_FILE_NAME)).expect("open db");
    conn.execute("UPDATE store_state SET schema_version = 99", [])
        .expect("bump version");
    drop(conn);

    let err = SqliteStore::open(dir.path()).expect_err("version mismatch");
    assert!(matches!(
        err,
        StoreError::InvalidInput("RESET_REQUIRED: schema version mismatch")
    ));
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (alice, bob) = {
        let mut store = SqliteStore::open(dir.path()).expect("open store");
        let alice = store.register_identity(false).expect("identity").id;
        let bob = store.register_identity(true).expect("identity").id;
        store.follow(alice, bob).expect("request");
        (alice, bob)
    };

    let store = SqliteStore::open(dir.path()).expect("reopen store");
    assert_eq!(store.storage_dir(), dir.path());
    let relation = store
        .relation(alice, bob)
        .expect("relation")
        .expect("row persisted");
    assert_eq!(relation.state, RelationState::Requested);
    assert!(relation.is_active);
    assert!(store.identity(bob).expect("identity").expect("exists").is_private);
}

#[test]
fn open_rejects_a_partial_schema() {
    let dir = tempfile::tempdir().expect("temp dir");
    drop(SqliteStore::open(dir.path()).expect("fresh store"));

    let conn = Connection::open(dir.path().join(DB_FILE_NAME)).expect("open db");
    conn.execute("DROP TABLE pins", []).expect("drop pins");
    drop(conn);

    let err = SqliteStore::open(dir.path()).expect_err("missing table");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
