#![forbid(unsafe_code)]

/// Facts about a viewer/owner pair that decide which profile representation
/// the viewer gets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProfileAccess {
    pub owner_is_private: bool,
    pub viewer_follows_owner: bool,
}

/// Full profile unless the owner is private and the viewer does not follow
/// them. Blocks are not considered here; see `is_blocked_by` on the store.
pub fn can_view_full_profile(access: ProfileAccess) -> bool {
    !access.owner_is_private || access.viewer_follows_owner
}
