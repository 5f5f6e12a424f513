#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a user account. Rows in every table point at identities by this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(i64);

impl IdentityId {
    pub fn get(self) -> i64 {
        self.0
    }

    pub fn try_new(value: i64) -> Result<Self, IdError> {
        validate_row_id(value)?;
        Ok(Self(value))
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u:{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    pub fn get(self) -> i64 {
        self.0
    }

    pub fn try_new(value: i64) -> Result<Self, IdError> {
        validate_row_id(value)?;
        Ok(Self(value))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(i64);

impl CommentId {
    pub fn get(self) -> i64 {
        self.0
    }

    pub fn try_new(value: i64) -> Result<Self, IdError> {
        validate_row_id(value)?;
        Ok(Self(value))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("id must be a positive integer")]
    NotPositive,
}

// SQLite rowids start at 1.
fn validate_row_id(value: i64) -> Result<(), IdError> {
    if value <= 0 {
        return Err(IdError::NotPositive);
    }
    Ok(())
}
