#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::{Connection, OptionalExtension, Params, Row, params};
use sg_core::{IdentityId, Relation, RelationAction, RelationLookup, RelationState};
use tracing::debug;

pub(super) const RELATION_COLUMNS: &str = "actor, target, state, is_active, modified_at_ms";

/// Guard reads against a plain connection or an open transaction.
pub(super) struct ConnLookup<'c>(pub(super) &'c Connection);

impl RelationLookup for ConnLookup<'_> {
    type Error = StoreError;

    fn active_state(
        &self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Option<RelationState>, StoreError> {
        let raw = self
            .0
            .query_row(
                "SELECT state FROM relations WHERE actor=?1 AND target=?2 AND is_active=1",
                params![actor.get(), target.get()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        raw.as_deref().map(parse_state).transpose()
    }
}

pub(super) fn enforce_guards_tx(
    conn: &Connection,
    action: RelationAction,
    actor: IdentityId,
    target: IdentityId,
) -> Result<(), StoreError> {
    if let Some(guard) = action.first_denial(&ConnLookup(conn), actor, target)? {
        debug!(
            action = action.as_str(),
            %actor,
            %target,
            %guard,
            "relation action denied"
        );
        return Err(StoreError::PermissionDenied { action, guard });
    }
    Ok(())
}

pub(super) fn relation_row_tx(
    conn: &Connection,
    actor: IdentityId,
    target: IdentityId,
) -> Result<Option<Relation>, StoreError> {
    let raw = conn
        .query_row(
            &format!("SELECT {RELATION_COLUMNS} FROM relations WHERE actor=?1 AND target=?2"),
            params![actor.get(), target.get()],
            read_relation_row,
        )
        .optional()?;
    raw.map(RawRelation::into_relation).transpose()
}

pub(super) fn collect_relations<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Relation>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_relation_row(row)?.into_relation()?);
    }
    Ok(out)
}

pub(super) fn parse_state(raw: &str) -> Result<RelationState, StoreError> {
    RelationState::parse(raw).map_err(|_| StoreError::InvalidInput("invalid relation state row"))
}

pub(super) fn identity_id(raw: i64) -> Result<IdentityId, StoreError> {
    IdentityId::try_new(raw).map_err(|_| StoreError::InvalidInput("invalid identity id row"))
}

struct RawRelation {
    actor: i64,
    target: i64,
    state: String,
    is_active: bool,
    modified_at_ms: i64,
}

impl RawRelation {
    fn into_relation(self) -> Result<Relation, StoreError> {
        Ok(Relation {
            actor: identity_id(self.actor)?,
            target: identity_id(self.target)?,
            state: parse_state(&self.state)?,
            is_active: self.is_active,
            modified_at_ms: self.modified_at_ms,
        })
    }
}

fn read_relation_row(row: &Row<'_>) -> rusqlite::Result<RawRelation> {
    Ok(RawRelation {
        actor: row.get(0)?,
        target: row.get(1)?,
        state: row.get(2)?,
        is_active: row.get(3)?,
        modified_at_ms: row.get(4)?,
    })
}
