#![forbid(unsafe_code)]

//! Guard predicates evaluated before a relation mutation touches any row.
//!
//! Every predicate is a read of the active edge state between two identities.
//! Each [`RelationAction`] owns a fixed, ordered conjunction of guards; the
//! first one that does not hold denies the action.

use crate::ids::IdentityId;
use crate::relation::RelationState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// `actor != target`.
    NotIdentical,
    /// No active `target -> actor` BLOCKS edge.
    NotBlocked,
    /// No active `actor -> target` edge already in the given state.
    StateNotAlreadySet(RelationState),
    /// No active `actor -> target` BLOCKS edge.
    NotAlreadyBlocked,
    /// Negation of [`Guard::NotAlreadyBlocked`].
    AlreadyBlocked,
    /// An active `target -> actor` REQUESTED edge exists.
    IsRequested,
}

impl Guard {
    pub fn as_str(self) -> &'static str {
        match self {
            Guard::NotIdentical => "not_identical",
            Guard::NotBlocked => "not_blocked",
            Guard::StateNotAlreadySet(_) => "state_not_already_set",
            Guard::NotAlreadyBlocked => "not_already_blocked",
            Guard::AlreadyBlocked => "already_blocked",
            Guard::IsRequested => "is_requested",
        }
    }

    pub fn holds<L: RelationLookup>(
        self,
        lookup: &L,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<bool, L::Error> {
        match self {
            Guard::NotIdentical => Ok(actor != target),
            Guard::NotBlocked => {
                Ok(lookup.active_state(target, actor)? != Some(RelationState::Blocks))
            }
            Guard::StateNotAlreadySet(state) => {
                Ok(lookup.active_state(actor, target)? != Some(state))
            }
            Guard::NotAlreadyBlocked => {
                Ok(lookup.active_state(actor, target)? != Some(RelationState::Blocks))
            }
            Guard::AlreadyBlocked => Guard::NotAlreadyBlocked
                .holds(lookup, actor, target)
                .map(|value| !value),
            Guard::IsRequested => {
                Ok(lookup.active_state(target, actor)? == Some(RelationState::Requested))
            }
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::StateNotAlreadySet(state) => write!(f, "state_not_already_set({state})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Read access the guards need. Implementations return the state of the
/// `actor -> target` edge when that edge is active, `None` otherwise.
pub trait RelationLookup {
    type Error;

    fn active_state(
        &self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Option<RelationState>, Self::Error>;
}

/// Snapshot of active edges, keyed by `(actor, target)`.
impl RelationLookup for BTreeMap<(IdentityId, IdentityId), RelationState> {
    type Error = Infallible;

    fn active_state(
        &self,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Option<RelationState>, Self::Error> {
        Ok(self.get(&(actor, target)).copied())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationAction {
    Follow,
    Block,
    Unfollow,
    Unblock,
    UndoRequest,
    Accept,
    Decline,
}

const FOLLOW_GUARDS: &[Guard] = &[
    Guard::NotIdentical,
    Guard::NotBlocked,
    Guard::StateNotAlreadySet(RelationState::Follows),
    Guard::NotAlreadyBlocked,
];
const BLOCK_GUARDS: &[Guard] = &[
    Guard::NotIdentical,
    Guard::StateNotAlreadySet(RelationState::Blocks),
];
const UNFOLLOW_GUARDS: &[Guard] = &[
    Guard::NotIdentical,
    Guard::NotBlocked,
    Guard::NotAlreadyBlocked,
];
const UNBLOCK_GUARDS: &[Guard] = &[Guard::AlreadyBlocked];
const UNDO_REQUEST_GUARDS: &[Guard] = &[Guard::NotBlocked, Guard::NotAlreadyBlocked];
const RESPOND_GUARDS: &[Guard] = &[Guard::IsRequested];

impl RelationAction {
    pub const ALL: [RelationAction; 7] = [
        RelationAction::Follow,
        RelationAction::Block,
        RelationAction::Unfollow,
        RelationAction::Unblock,
        RelationAction::UndoRequest,
        RelationAction::Accept,
        RelationAction::Decline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationAction::Follow => "follow",
            RelationAction::Block => "block",
            RelationAction::Unfollow => "unfollow",
            RelationAction::Unblock => "unblock",
            RelationAction::UndoRequest => "undo_request",
            RelationAction::Accept => "accept",
            RelationAction::Decline => "decline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value.trim())
    }

    pub fn guards(self) -> &'static [Guard] {
        match self {
            RelationAction::Follow => FOLLOW_GUARDS,
            RelationAction::Block => BLOCK_GUARDS,
            RelationAction::Unfollow => UNFOLLOW_GUARDS,
            RelationAction::Unblock => UNBLOCK_GUARDS,
            RelationAction::UndoRequest => UNDO_REQUEST_GUARDS,
            RelationAction::Accept | RelationAction::Decline => RESPOND_GUARDS,
        }
    }

    /// Returns the first guard of this action that does not hold, if any.
    pub fn first_denial<L: RelationLookup>(
        self,
        lookup: &L,
        actor: IdentityId,
        target: IdentityId,
    ) -> Result<Option<Guard>, L::Error> {
        first_denial(self.guards(), lookup, actor, target)
    }
}

impl fmt::Display for RelationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluates `guards` left to right and stops at the first one that fails.
pub fn first_denial<L: RelationLookup>(
    guards: &[Guard],
    lookup: &L,
    actor: IdentityId,
    target: IdentityId,
) -> Result<Option<Guard>, L::Error> {
    for guard in guards {
        if !guard.holds(lookup, actor, target)? {
            return Ok(Some(*guard));
        }
    }
    Ok(None)
}
