#![forbid(unsafe_code)]

use crate::ids::IdentityId;
use crate::target::{TargetKind, TargetRef};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PINNED_POST_LIMIT: u32 = 3;
pub const DEFAULT_PINNED_COMMENT_LIMIT: u32 = 1;

/// Toggle record for one `(target, user)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub target: TargetRef,
    pub user: IdentityId,
    pub is_liked: bool,
    pub created_at_ms: i64,
}

/// Pin record. There is at most one per target; `user` is whoever created it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub target: TargetRef,
    pub user: IdentityId,
    pub is_active: bool,
    pub modified_at_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinOutcome {
    Pinned,
    Unpinned,
}

impl PinOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            PinOutcome::Pinned => "pinned",
            PinOutcome::Unpinned => "unpinned",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinToggle {
    pub pin: Pin,
    pub outcome: PinOutcome,
    /// `true` when this call inserted the record instead of flipping an existing one.
    pub created: bool,
}

/// Per-kind ceiling on simultaneously active pins held by one owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinLimits {
    pub post: u32,
    pub comment: u32,
}

impl PinLimits {
    pub fn limit(&self, kind: TargetKind) -> u32 {
        match kind {
            TargetKind::Post => self.post,
            TargetKind::Comment => self.comment,
        }
    }

    pub fn set_limit(&mut self, kind: TargetKind, value: u32) {
        match kind {
            TargetKind::Post => self.post = value,
            TargetKind::Comment => self.comment = value,
        }
    }

    /// Whether an owner already holding `active` pins of `kind` may create another.
    pub fn admits(&self, kind: TargetKind, active: u32) -> bool {
        active < self.limit(kind)
    }
}

impl Default for PinLimits {
    fn default() -> Self {
        Self {
            post: DEFAULT_PINNED_POST_LIMIT,
            comment: DEFAULT_PINNED_COMMENT_LIMIT,
        }
    }
}
