#![forbid(unsafe_code)]

use super::guard_tx::ConnLookup;
use super::identities::require_identity_tx;
use super::{SqliteStore, StoreError};
use sg_core::visibility::{ProfileAccess, can_view_full_profile};
use sg_core::{IdentityId, RelationLookup, RelationState};

impl SqliteStore {
    /// Whether `viewer` gets the full representation of `owner`'s profile
    /// rather than the restricted one.
    pub fn can_view_full_profile(
        &self,
        viewer: IdentityId,
        owner: IdentityId,
    ) -> Result<bool, StoreError> {
        let owner_identity = require_identity_tx(&self.conn, owner)?;
        let access = ProfileAccess {
            owner_is_private: owner_identity.is_private,
            viewer_follows_owner: ConnLookup(&self.conn).active_state(viewer, owner)?
                == Some(RelationState::Follows),
        };
        Ok(can_view_full_profile(access))
    }

    /// Whether `owner` holds an active block against `viewer`.
    pub fn is_blocked_by(&self, viewer: IdentityId, owner: IdentityId) -> Result<bool, StoreError> {
        require_identity_tx(&self.conn, owner)?;
        Ok(ConnLookup(&self.conn).active_state(owner, viewer)? == Some(RelationState::Blocks))
    }
}
