#![forbid(unsafe_code)]

use super::error::map_write_conflict;
use super::guard_tx::{
    ConnLookup, RELATION_COLUMNS, collect_relations, enforce_guards_tx, identity_id,
    relation_row_tx,
};
use super::identities::require_identity_tx;
use super::{SqliteStore, StoreError, now_ms};
use rusqlite::{Connection, params};
use sg_core::{IdentityId, Relation, RelationAction, RelationLookup, RelationState};
use tracing::debug;

impl SqliteStore {
    /// Creates or reactivates `actor -> target`. Lands in REQUESTED when the
    /// target profile is private, FOLLOWS otherwise.
    pub fn follow(&mut self, actor: IdentityId, target: IdentityId) -> Result<Relation, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        require_identity_tx(&tx, actor)?;
        let target_identity = require_identity_tx(&tx, target)?;
        enforce_guards_tx(&tx, RelationAction::Follow, actor, target)?;

        let existing = relation_row_tx(&tx, actor, target)?;
        if existing
            .as_ref()
            .is_some_and(|relation| relation.is_active_in(RelationState::Requested))
        {
            return Err(StoreError::AlreadyRequested);
        }

        let state = RelationState::for_follow(target_identity.is_private);
        let relation = upsert_active_tx(&tx, actor, target, state, existing.as_ref(), now_ms)?;
        tx.commit()?;

        debug!(%actor, %target, state = state.as_str(), "relation followed");
        Ok(relation)
    }

    /// Sets `actor -> target` to an active BLOCKS edge and severs any active
    /// follow or request running the other way. Both rows commit together.
    pub fn block(&mut self, actor: IdentityId, target: IdentityId) -> Result<Relation, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        require_identity_tx(&tx, actor)?;
        require_identity_tx(&tx, target)?;
        enforce_guards_tx(&tx, RelationAction::Block, actor, target)?;

        let existing = relation_row_tx(&tx, actor, target)?;
        let relation = upsert_active_tx(
            &tx,
            actor,
            target,
            RelationState::Blocks,
            existing.as_ref(),
            now_ms,
        )?;

        let mut severed = false;
        if let Some(reverse) = relation_row_tx(&tx, target, actor)?
            && reverse.is_active
            && reverse.state != RelationState::Blocks
        {
            deactivate_tx(&tx, reverse, now_ms)?;
            severed = true;
        }

        tx.commit()?;

        debug!(%actor, %target, severed, "relation blocked");
        Ok(relation)
    }

    pub fn unfollow(
        &mut self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Relation, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        require_identity_tx(&tx, actor)?;
        require_identity_tx(&tx, target)?;
        enforce_guards_tx(&tx, RelationAction::Unfollow, actor, target)?;

        let relation = match relation_row_tx(&tx, actor, target)? {
            Some(relation) if relation.is_active_in(RelationState::Follows) => relation,
            _ => return Err(StoreError::NotFollowing),
        };
        let relation = deactivate_tx(&tx, relation, now_ms)?;
        tx.commit()?;

        debug!(%actor, %target, "relation unfollowed");
        Ok(relation)
    }

    pub fn unblock(
        &mut self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Relation, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        require_identity_tx(&tx, actor)?;
        require_identity_tx(&tx, target)?;
        enforce_guards_tx(&tx, RelationAction::Unblock, actor, target)?;

        let relation = relation_row_tx(&tx, actor, target)?
            .ok_or(StoreError::UnknownRelation { actor, target })?;
        let relation = deactivate_tx(&tx, relation, now_ms)?;
        tx.commit()?;

        debug!(%actor, %target, "relation unblocked");
        Ok(relation)
    }

    /// Withdraws a pending request sent by `actor` to `target`.
    pub fn undo_request(
        &mut self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Relation, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        require_identity_tx(&tx, actor)?;
        require_identity_tx(&tx, target)?;
        enforce_guards_tx(&tx, RelationAction::UndoRequest, actor, target)?;

        let relation = match relation_row_tx(&tx, actor, target)? {
            Some(relation) if relation.is_active_in(RelationState::Requested) => relation,
            _ => return Err(StoreError::NoActiveRequest),
        };
        let relation = deactivate_tx(&tx, relation, now_ms)?;
        tx.commit()?;

        debug!(%actor, %target, "follow request withdrawn");
        Ok(relation)
    }

    /// `actor` accepts the pending request sent by `target`; the returned
    /// relation is the `target -> actor` edge.
    pub fn accept(&mut self, actor: IdentityId, target: IdentityId) -> Result<Relation, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        require_identity_tx(&tx, actor)?;
        require_identity_tx(&tx, target)?;
        enforce_guards_tx(&tx, RelationAction::Accept, actor, target)?;

        let request = relation_row_tx(&tx, target, actor)?.ok_or(StoreError::UnknownRelation {
            actor: target,
            target: actor,
        })?;
        let modified_at_ms = now_ms.max(request.modified_at_ms);
        tx.execute(
            "UPDATE relations SET state='FOLLOWS', modified_at_ms=?3 WHERE actor=?1 AND target=?2",
            params![target.get(), actor.get(), modified_at_ms],
        )?;
        tx.commit()?;

        debug!(%actor, requester = %target, "follow request accepted");
        Ok(Relation {
            state: RelationState::Follows,
            modified_at_ms,
            ..request
        })
    }

    /// `actor` declines the pending request sent by `target`.
    pub fn decline(
        &mut self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Relation, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        require_identity_tx(&tx, actor)?;
        require_identity_tx(&tx, target)?;
        enforce_guards_tx(&tx, RelationAction::Decline, actor, target)?;

        let request = relation_row_tx(&tx, target, actor)?.ok_or(StoreError::UnknownRelation {
            actor: target,
            target: actor,
        })?;
        let relation = deactivate_tx(&tx, request, now_ms)?;
        tx.commit()?;

        debug!(%actor, requester = %target, "follow request declined");
        Ok(relation)
    }

    /// Runs the guard list of `action` without touching any row.
    pub fn check_guards(
        &self,
        action: RelationAction,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<(), StoreError> {
        enforce_guards_tx(&self.conn, action, actor, target)
    }

    /// The `actor -> target` row whether or not it is active.
    pub fn relation(
        &self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Option<Relation>, StoreError> {
        relation_row_tx(&self.conn, actor, target)
    }

    pub fn followers(&self, identity: IdentityId) -> Result<Vec<Relation>, StoreError> {
        incoming_tx(&self.conn, identity, RelationState::Follows)
    }

    pub fn followings(&self, identity: IdentityId) -> Result<Vec<Relation>, StoreError> {
        outgoing_tx(&self.conn, identity, RelationState::Follows)
    }

    pub fn pending_requests(&self, identity: IdentityId) -> Result<Vec<Relation>, StoreError> {
        incoming_tx(&self.conn, identity, RelationState::Requested)
    }

    pub fn blocklist(&self, identity: IdentityId) -> Result<Vec<Relation>, StoreError> {
        outgoing_tx(&self.conn, identity, RelationState::Blocks)
    }

    /// Identities that actively follow both `a` and `b`.
    pub fn mutual_followers(
        &self,
        a: IdentityId,
        b: IdentityId,
    ) -> Result<Vec<IdentityId>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT fa.actor FROM relations fa \
             JOIN relations fb ON fb.actor = fa.actor \
             WHERE fa.target=?1 AND fa.state='FOLLOWS' AND fa.is_active=1 \
               AND fb.target=?2 AND fb.state='FOLLOWS' AND fb.is_active=1 \
             ORDER BY fa.actor ASC",
        )?;
        let mut rows = stmt.query(params![a.get(), b.get()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(identity_id(row.get::<_, i64>(0)?)?);
        }
        Ok(out)
    }

    pub fn is_following(&self, actor: IdentityId, target: IdentityId) -> Result<bool, StoreError> {
        Ok(ConnLookup(&self.conn).active_state(actor, target)? == Some(RelationState::Follows))
    }
}

/// Writes `state` onto the pair's single row, inserting it on first contact.
fn upsert_active_tx(
    conn: &Connection,
    actor: IdentityId,
    target: IdentityId,
    state: RelationState,
    existing: Option<&Relation>,
    now_ms: i64,
) -> Result<Relation, StoreError> {
    let modified_at_ms = existing.map_or(now_ms, |relation| now_ms.max(relation.modified_at_ms));
    conn.execute(
        "INSERT INTO relations(actor, target, state, is_active, modified_at_ms) \
         VALUES (?1, ?2, ?3, 1, ?4) \
         ON CONFLICT(actor, target) DO UPDATE SET state=excluded.state, is_active=1, modified_at_ms=excluded.modified_at_ms",
        params![actor.get(), target.get(), state.as_str(), modified_at_ms],
    )
    .map_err(map_write_conflict)?;

    Ok(Relation {
        actor,
        target,
        state,
        is_active: true,
        modified_at_ms,
    })
}

fn deactivate_tx(
    conn: &Connection,
    relation: Relation,
    now_ms: i64,
) -> Result<Relation, StoreError> {
    let modified_at_ms = now_ms.max(relation.modified_at_ms);
    conn.execute(
        "UPDATE relations SET is_active=0, modified_at_ms=?3 WHERE actor=?1 AND target=?2",
        params![relation.actor.get(), relation.target.get(), modified_at_ms],
    )?;
    Ok(Relation {
        is_active: false,
        modified_at_ms,
        ..relation
    })
}

fn incoming_tx(
    conn: &Connection,
    identity: IdentityId,
    state: RelationState,
) -> Result<Vec<Relation>, StoreError> {
    collect_relations(
        conn,
        &format!(
            "SELECT {RELATION_COLUMNS} FROM relations \
             WHERE target=?1 AND state=?2 AND is_active=1 \
             ORDER BY modified_at_ms ASC, actor ASC"
        ),
        params![identity.get(), state.as_str()],
    )
}

fn outgoing_tx(
    conn: &Connection,
    identity: IdentityId,
    state: RelationState,
) -> Result<Vec<Relation>, StoreError> {
    collect_relations(
        conn,
        &format!(
            "SELECT {RELATION_COLUMNS} FROM relations \
             WHERE actor=?1 AND state=?2 AND is_active=1 \
             ORDER BY modified_at_ms ASC, target ASC"
        ),
        params![identity.get(), state.as_str()],
    )
}
