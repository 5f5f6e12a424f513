#![forbid(unsafe_code)]

use super::content::require_target_tx;
use super::guard_tx::identity_id;
use super::identities::require_identity_tx;
use super::{SqliteStore, StoreError, now_ms};
use rusqlite::{Connection, OptionalExtension, params};
use sg_core::{IdentityId, Like, TargetRef};
use tracing::debug;

impl SqliteStore {
    /// Flips the `(target, user)` like, creating the row (unliked) first if
    /// this is the pair's first toggle.
    pub fn toggle_like(&mut self, target: TargetRef, user: IdentityId) -> Result<Like, StoreError> {
        let tx = self.write_tx()?;
        require_identity_tx(&tx, user)?;
        require_target_tx(&tx, target)?;

        tx.execute(
            "INSERT OR IGNORE INTO likes(target_kind, target_id, user_id, is_liked, created_at_ms) \
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![target.kind().as_str(), target.raw_id(), user.get(), now_ms()],
        )?;
        tx.execute(
            "UPDATE likes SET is_liked = 1 - is_liked \
             WHERE target_kind=?1 AND target_id=?2 AND user_id=?3",
            params![target.kind().as_str(), target.raw_id(), user.get()],
        )?;

        let like = like_row_tx(&tx, target, user)?
            .ok_or(StoreError::InvalidInput("like row missing after toggle"))?;
        tx.commit()?;

        debug!(%target, %user, is_liked = like.is_liked, "like toggled");
        Ok(like)
    }

    pub fn like(&self, target: TargetRef, user: IdentityId) -> Result<Option<Like>, StoreError> {
        like_row_tx(&self.conn, target, user)
    }

    pub fn list_active_likers(&self, target: TargetRef) -> Result<Vec<IdentityId>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id FROM likes \
             WHERE target_kind=?1 AND target_id=?2 AND is_liked=1 \
             ORDER BY created_at_ms ASC, user_id ASC",
        )?;
        let mut rows = stmt.query(params![target.kind().as_str(), target.raw_id()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(identity_id(row.get::<_, i64>(0)?)?);
        }
        Ok(out)
    }

    pub fn like_count(&self, target: TargetRef) -> Result<u64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(1) FROM likes WHERE target_kind=?1 AND target_id=?2 AND is_liked=1",
            params![target.kind().as_str(), target.raw_id()],
            |row| row.get::<_, i64>(0),
        )?;
        u64::try_from(count).map_err(|_| StoreError::InvalidInput("negative like count"))
    }
}

fn like_row_tx(
    conn: &Connection,
    target: TargetRef,
    user: IdentityId,
) -> Result<Option<Like>, StoreError> {
    let row = conn
        .query_row(
            "SELECT is_liked, created_at_ms FROM likes \
             WHERE target_kind=?1 AND target_id=?2 AND user_id=?3",
            params![target.kind().as_str(), target.raw_id(), user.get()],
            |row| Ok((row.get::<_, bool>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    Ok(row.map(|(is_liked, created_at_ms)| Like {
        target,
        user,
        is_liked,
        created_at_ms,
    }))
}
