#![forbid(unsafe_code)]

use rusqlite::ErrorCode;
use sg_core::{Guard, IdentityId, RelationAction, TargetKind, TargetRef};

/// Transport-neutral classification a caller maps onto its own status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    NotFound,
    LimitExceeded,
    Conflict,
    InvalidInput,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("config: {0}")]
    Config(String),
    #[error("config json: {0}")]
    ConfigJson(#[from] serde_json::Error),
    #[error("unknown identity {0}")]
    UnknownIdentity(IdentityId),
    #[error("unknown target {0}")]
    UnknownTarget(TargetRef),
    #[error("unknown relation ({actor} -> {target})")]
    UnknownRelation {
        actor: IdentityId,
        target: IdentityId,
    },
    #[error("permission denied: {action} requires {guard}")]
    PermissionDenied { action: RelationAction, guard: Guard },
    #[error("a follow request has already been sent to this user")]
    AlreadyRequested,
    #[error("you are not following this user")]
    NotFollowing,
    #[error("no active follow request exists")]
    NoActiveRequest,
    #[error("only the author may pin {0}")]
    NotAuthor(TargetRef),
    #[error("pin limit exceeded (kind={kind}, limit={limit})")]
    PinLimitExceeded { kind: TargetKind, limit: u32 },
    #[error("concurrent write conflict")]
    Conflict,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied { .. } | Self::AlreadyRequested | Self::NotAuthor(_) => {
                ErrorKind::PermissionDenied
            }
            Self::UnknownIdentity(_)
            | Self::UnknownTarget(_)
            | Self::UnknownRelation { .. }
            | Self::NotFollowing
            | Self::NoActiveRequest => ErrorKind::NotFound,
            Self::PinLimitExceeded { .. } => ErrorKind::LimitExceeded,
            Self::Conflict => ErrorKind::Conflict,
            Self::Sql(err) if is_lock_contention(err) => ErrorKind::Conflict,
            Self::InvalidInput(_) | Self::Config(_) | Self::ConfigJson(_) => {
                ErrorKind::InvalidInput
            }
            Self::Io(_) | Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

/// Maps a uniqueness violation on insert to [`StoreError::Conflict`].
pub(crate) fn map_write_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::Conflict;
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => code.code == ErrorCode::ConstraintViolation,
        _ => false,
    }
}

fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if matches!(code.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
