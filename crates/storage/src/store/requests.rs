#![forbid(unsafe_code)]

use sg_core::{CommentId, IdentityId, PostId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewComment {
    pub author: IdentityId,
    pub post: PostId,
    /// Set for replies; the parent must belong to `post`.
    pub parent: Option<CommentId>,
}
