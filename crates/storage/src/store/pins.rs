#![forbid(unsafe_code)]

use super::content::require_target_tx;
use super::error::map_write_conflict;
use super::guard_tx::identity_id;
use super::identities::require_identity_tx;
use super::{SqliteStore, StoreError, now_ms};
use rusqlite::{Connection, OptionalExtension, params};
use sg_core::{IdentityId, Pin, PinOutcome, PinToggle, TargetKind, TargetRef};
use tracing::debug;

impl SqliteStore {
    /// Pins or unpins `target` on behalf of its author.
    ///
    /// A target has at most one pin record in total. An existing record is
    /// flipped without a limit check and keeps its original `user`; a new
    /// record is only created while `owner` is under the limit for the kind.
    pub fn toggle_pin(
        &mut self,
        target: TargetRef,
        owner: IdentityId,
    ) -> Result<PinToggle, StoreError> {
        let kind = target.kind();
        let limits = self.config.pin_limits;
        let limit = limits.limit(kind);
        let now_ms = now_ms();

        let tx = self.write_tx()?;
        require_identity_tx(&tx, owner)?;
        let author = require_target_tx(&tx, target)?;
        if author != owner {
            debug!(%target, %owner, %author, "pin denied: not the author");
            return Err(StoreError::NotAuthor(target));
        }

        if let Some(pin) = pin_row_tx(&tx, target)? {
            let is_active = !pin.is_active;
            let modified_at_ms = now_ms.max(pin.modified_at_ms);
            tx.execute(
                "UPDATE pins SET is_active=?3, modified_at_ms=?4 WHERE target_kind=?1 AND target_id=?2",
                params![kind.as_str(), target.raw_id(), is_active, modified_at_ms],
            )?;
            tx.commit()?;

            let outcome = outcome_for(is_active);
            debug!(%target, %owner, outcome = outcome.as_str(), "pin toggled");
            return Ok(PinToggle {
                pin: Pin {
                    is_active,
                    modified_at_ms,
                    ..pin
                },
                outcome,
                created: false,
            });
        }

        let active = active_pin_count_tx(&tx, owner, kind)?;
        if !limits.admits(kind, active) {
            debug!(%owner, kind = kind.as_str(), active, limit, "pin limit reached");
            return Err(StoreError::PinLimitExceeded { kind, limit });
        }

        tx.execute(
            "INSERT INTO pins(target_kind, target_id, user_id, is_active, modified_at_ms) \
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![kind.as_str(), target.raw_id(), owner.get(), now_ms],
        )
        .map_err(map_write_conflict)?;
        tx.commit()?;

        debug!(%target, %owner, "pin created");
        Ok(PinToggle {
            pin: Pin {
                target,
                user: owner,
                is_active: true,
                modified_at_ms: now_ms,
            },
            outcome: PinOutcome::Pinned,
            created: true,
        })
    }

    /// Active pins of `kind` whose record belongs to `owner`.
    pub fn active_pin_count(&self, owner: IdentityId, kind: TargetKind) -> Result<u32, StoreError> {
        active_pin_count_tx(&self.conn, owner, kind)
    }

    pub fn is_pinned(&self, target: TargetRef) -> Result<bool, StoreError> {
        Ok(pin_row_tx(&self.conn, target)?.is_some_and(|pin| pin.is_active))
    }

    pub fn pin(&self, target: TargetRef) -> Result<Option<Pin>, StoreError> {
        pin_row_tx(&self.conn, target)
    }

    /// Newest first.
    pub fn active_pins(&self, owner: IdentityId, kind: TargetKind) -> Result<Vec<Pin>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT target_id, modified_at_ms FROM pins \
             WHERE user_id=?1 AND target_kind=?2 AND is_active=1 \
             ORDER BY modified_at_ms DESC, target_id DESC",
        )?;
        let mut rows = stmt.query(params![owner.get(), kind.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let target = TargetRef::from_parts(kind.as_str(), row.get::<_, i64>(0)?)
                .map_err(|_| StoreError::InvalidInput("invalid pin target row"))?;
            out.push(Pin {
                target,
                user: owner,
                is_active: true,
                modified_at_ms: row.get::<_, i64>(1)?,
            });
        }
        Ok(out)
    }
}

fn outcome_for(is_active: bool) -> PinOutcome {
    if is_active {
        PinOutcome::Pinned
    } else {
        PinOutcome::Unpinned
    }
}

fn pin_row_tx(conn: &Connection, target: TargetRef) -> Result<Option<Pin>, StoreError> {
    let row = conn
        .query_row(
            "SELECT user_id, is_active, modified_at_ms FROM pins WHERE target_kind=?1 AND target_id=?2",
            params![target.kind().as_str(), target.raw_id()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((user, is_active, modified_at_ms)) => Ok(Some(Pin {
            target,
            user: identity_id(user)?,
            is_active,
            modified_at_ms,
        })),
        None => Ok(None),
    }
}

fn active_pin_count_tx(
    conn: &Connection,
    owner: IdentityId,
    kind: TargetKind,
) -> Result<u32, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(1) FROM pins WHERE user_id=?1 AND target_kind=?2 AND is_active=1",
        params![owner.get(), kind.as_str()],
        |row| row.get::<_, i64>(0),
    )?;
    u32::try_from(count).map_err(|_| StoreError::InvalidInput("pin count out of range"))
}
