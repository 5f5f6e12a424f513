#![forbid(unsafe_code)]

use crate::ids::{CommentId, IdError, PostId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::Post, TargetKind::Comment];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
        }
    }

    pub fn parse(value: &str) -> Result<Self, TargetError> {
        match value.trim() {
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            _ => Err(TargetError::UnknownKind),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything a user can like or pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TargetRef {
    Post(PostId),
    Comment(CommentId),
}

impl TargetRef {
    pub fn kind(self) -> TargetKind {
        match self {
            TargetRef::Post(_) => TargetKind::Post,
            TargetRef::Comment(_) => TargetKind::Comment,
        }
    }

    pub fn raw_id(self) -> i64 {
        match self {
            TargetRef::Post(id) => id.get(),
            TargetRef::Comment(id) => id.get(),
        }
    }

    /// Rebuilds a reference from its persisted `(kind, id)` columns.
    pub fn from_parts(kind: &str, id: i64) -> Result<Self, TargetError> {
        match TargetKind::parse(kind)? {
            TargetKind::Post => Ok(TargetRef::Post(PostId::try_new(id)?)),
            TargetKind::Comment => Ok(TargetRef::Comment(CommentId::try_new(id)?)),
        }
    }
}

impl From<PostId> for TargetRef {
    fn from(value: PostId) -> Self {
        TargetRef::Post(value)
    }
}

impl From<CommentId> for TargetRef {
    fn from(value: CommentId) -> Self {
        TargetRef::Comment(value)
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.raw_id())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("unknown target kind")]
    UnknownKind,
    #[error(transparent)]
    InvalidId(#[from] IdError),
}
