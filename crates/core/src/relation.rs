#![forbid(unsafe_code)]

use crate::ids::IdentityId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationState {
    Follows,
    Blocks,
    Requested,
}

impl RelationState {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationState::Follows => "FOLLOWS",
            RelationState::Blocks => "BLOCKS",
            RelationState::Requested => "REQUESTED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, RelationStateError> {
        match value {
            "FOLLOWS" => Ok(RelationState::Follows),
            "BLOCKS" => Ok(RelationState::Blocks),
            "REQUESTED" => Ok(RelationState::Requested),
            _ => Err(RelationStateError::Unknown),
        }
    }

    /// State a `follow` lands in for a target with the given privacy.
    pub fn for_follow(target_is_private: bool) -> Self {
        if target_is_private {
            RelationState::Requested
        } else {
            RelationState::Follows
        }
    }
}

impl fmt::Display for RelationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RelationStateError {
    #[error("unknown relation state")]
    Unknown,
}

/// Directed edge `actor -> target`. One row per ordered pair; `is_active=false`
/// is a soft delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub actor: IdentityId,
    pub target: IdentityId,
    pub state: RelationState,
    pub is_active: bool,
    pub modified_at_ms: i64,
}

impl Relation {
    pub fn is_active_in(&self, state: RelationState) -> bool {
        self.is_active && self.state == state
    }
}
