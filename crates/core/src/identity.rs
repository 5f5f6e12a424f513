#![forbid(unsafe_code)]

use crate::ids::IdentityId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub is_private: bool,
    pub created_at_ms: i64,
}
