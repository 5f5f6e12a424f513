#![forbid(unsafe_code)]

use super::guard_tx::identity_id;
use super::{SqliteStore, StoreError, now_ms};
use rusqlite::{Connection, OptionalExtension, params};
use sg_core::{Identity, IdentityId};
use tracing::debug;

impl SqliteStore {
    pub fn register_identity(&mut self, is_private: bool) -> Result<Identity, StoreError> {
        let created_at_ms = now_ms();
        let tx = self.write_tx()?;
        tx.execute(
            "INSERT INTO identities(is_private, created_at_ms) VALUES (?1, ?2)",
            params![is_private, created_at_ms],
        )?;
        let id = identity_id(tx.last_insert_rowid())?;
        tx.commit()?;

        debug!(identity = %id, is_private, "identity registered");
        Ok(Identity {
            id,
            is_private,
            created_at_ms,
        })
    }

    pub fn identity(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        identity_row_tx(&self.conn, id)
    }

    /// Changes profile privacy. Making a profile public promotes every pending
    /// incoming request to an active follow in the same transaction.
    pub fn set_private(
        &mut self,
        id: IdentityId,
        is_private: bool,
    ) -> Result<Identity, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        let mut identity = require_identity_tx(&tx, id)?;

        tx.execute(
            "UPDATE identities SET is_private=?2 WHERE id=?1",
            params![id.get(), is_private],
        )?;

        let promoted = if is_private {
            0
        } else {
            tx.execute(
                "UPDATE relations SET state='FOLLOWS', modified_at_ms=MAX(modified_at_ms, ?2) \
                 WHERE target=?1 AND state='REQUESTED' AND is_active=1",
                params![id.get(), now_ms],
            )?
        };

        tx.commit()?;
        identity.is_private = is_private;

        debug!(identity = %id, is_private, promoted, "profile privacy updated");
        Ok(identity)
    }
}

pub(super) fn identity_row_tx(
    conn: &Connection,
    id: IdentityId,
) -> Result<Option<Identity>, StoreError> {
    let row = conn
        .query_row(
            "SELECT is_private, created_at_ms FROM identities WHERE id=?1",
            params![id.get()],
            |row| Ok((row.get::<_, bool>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    Ok(row.map(|(is_private, created_at_ms)| Identity {
        id,
        is_private,
        created_at_ms,
    }))
}

pub(super) fn require_identity_tx(
    conn: &Connection,
    id: IdentityId,
) -> Result<Identity, StoreError> {
    identity_row_tx(conn, id)?.ok_or(StoreError::UnknownIdentity(id))
}
