#![forbid(unsafe_code)]

mod content;
mod error;
mod guard_tx;
mod identities;
mod likes;
mod pins;
mod relations;
mod requests;
mod visibility;

pub use error::{ErrorKind, StoreError};
pub use requests::*;

use crate::config::StoreConfig;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use sg_core::PinLimits;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DB_FILE_NAME: &str = "socialgraph.db";
const SCHEMA_VERSION: i64 = 1;
const REQUIRED_TABLES: [&str; 7] = [
    "store_state",
    "identities",
    "relations",
    "posts",
    "comments",
    "likes",
    "pins",
];

/// Handle on the shared social-graph database.
///
/// Each worker opens its own handle on the same storage directory. Every
/// mutation runs in an IMMEDIATE transaction, so guard checks and writes of
/// concurrent handles are serialized by SQLite's write lock.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
    config: StoreConfig,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_config(storage_dir, StoreConfig::default())
    }

    pub fn open_with_config(
        storage_dir: impl AsRef<Path>,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(config.busy_timeout())?;
        conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;

        info!(
            path = %db_path.display(),
            pin_limit_post = config.pin_limits.post,
            pin_limit_comment = config.pin_limits.comment,
            "social graph store opened"
        );
        Ok(Self {
            conn,
            storage_dir,
            config,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn pin_limits(&self) -> PinLimits {
        self.config.pin_limits
    }

    /// Starts a transaction holding the database write lock from the first
    /// read, so check-then-act sequences cannot interleave across handles.
    fn write_tx(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

/// Refuses databases this crate did not create: the table set must be empty
/// or exactly [`REQUIRED_TABLES`], stamped with [`SCHEMA_VERSION`].
fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let tables = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")?
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    if tables.is_empty() {
        return Ok(());
    }

    let matches_schema = tables.len() == REQUIRED_TABLES.len()
        && REQUIRED_TABLES.iter().all(|table| tables.contains(*table));
    if !matches_schema {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: table set does not match the social graph schema",
        ));
    }

    let version = conn
        .query_row(
            "SELECT schema_version FROM store_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match version {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema state row is missing",
        )),
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    let now_ms = now_ms();

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS identities (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          is_private INTEGER NOT NULL DEFAULT 0 CHECK(is_private IN (0, 1)),
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS relations (
          actor INTEGER NOT NULL,
          target INTEGER NOT NULL,
          state TEXT NOT NULL CHECK(state IN ('FOLLOWS', 'BLOCKS', 'REQUESTED')),
          is_active INTEGER NOT NULL CHECK(is_active IN (0, 1)),
          modified_at_ms INTEGER NOT NULL,
          PRIMARY KEY(actor, target),
          FOREIGN KEY(actor) REFERENCES identities(id) ON DELETE CASCADE,
          FOREIGN KEY(target) REFERENCES identities(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_relations_target_state
          ON relations(target, state, is_active);

        CREATE TABLE IF NOT EXISTS posts (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          author INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          FOREIGN KEY(author) REFERENCES identities(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS comments (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          author INTEGER NOT NULL,
          post INTEGER NOT NULL,
          parent INTEGER,
          created_at_ms INTEGER NOT NULL,
          FOREIGN KEY(author) REFERENCES identities(id) ON DELETE CASCADE,
          FOREIGN KEY(post) REFERENCES posts(id) ON DELETE CASCADE,
          FOREIGN KEY(parent) REFERENCES comments(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent);

        CREATE TABLE IF NOT EXISTS likes (
          target_kind TEXT NOT NULL CHECK(target_kind IN ('post', 'comment')),
          target_id INTEGER NOT NULL,
          user_id INTEGER NOT NULL,
          is_liked INTEGER NOT NULL CHECK(is_liked IN (0, 1)),
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY(target_kind, target_id, user_id),
          FOREIGN KEY(user_id) REFERENCES identities(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS pins (
          target_kind TEXT NOT NULL CHECK(target_kind IN ('post', 'comment')),
          target_id INTEGER NOT NULL,
          user_id INTEGER NOT NULL,
          is_active INTEGER NOT NULL CHECK(is_active IN (0, 1)),
          modified_at_ms INTEGER NOT NULL,
          PRIMARY KEY(target_kind, target_id),
          FOREIGN KEY(user_id) REFERENCES identities(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_pins_user_kind_active
          ON pins(user_id, target_kind, is_active);
        "#,
    )?;

    conn.execute(
        "INSERT INTO store_state(singleton, schema_version, created_at_ms, updated_at_ms) \
         VALUES (1, ?1, ?2, ?2) \
         ON CONFLICT(singleton) DO UPDATE SET schema_version=excluded.schema_version, updated_at_ms=excluded.updated_at_ms",
        params![SCHEMA_VERSION, now_ms],
    )?;

    Ok(())
}

/// Wall clock in ms since the epoch; 0 if the clock is before it.
fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}
