#![forbid(unsafe_code)]

use super::guard_tx::identity_id;
use super::identities::require_identity_tx;
use super::{NewComment, SqliteStore, StoreError, now_ms};
use rusqlite::{Connection, OptionalExtension, params};
use sg_core::{CommentId, IdentityId, PostId, TargetRef};
use tracing::debug;

impl SqliteStore {
    pub fn register_post(&mut self, author: IdentityId) -> Result<PostId, StoreError> {
        let tx = self.write_tx()?;
        require_identity_tx(&tx, author)?;
        tx.execute(
            "INSERT INTO posts(author, created_at_ms) VALUES (?1, ?2)",
            params![author.get(), now_ms()],
        )?;
        let id = PostId::try_new(tx.last_insert_rowid())
            .map_err(|_| StoreError::InvalidInput("invalid post id row"))?;
        tx.commit()?;

        debug!(%author, post = id.get(), "post registered");
        Ok(id)
    }

    pub fn register_comment(&mut self, request: NewComment) -> Result<CommentId, StoreError> {
        let tx = self.write_tx()?;
        require_identity_tx(&tx, request.author)?;
        require_target_tx(&tx, TargetRef::Post(request.post))?;

        if let Some(parent) = request.parent {
            let parent_post = tx
                .query_row(
                    "SELECT post FROM comments WHERE id=?1",
                    params![parent.get()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .ok_or(StoreError::UnknownTarget(TargetRef::Comment(parent)))?;
            if parent_post != request.post.get() {
                return Err(StoreError::InvalidInput(
                    "reply must belong to the parent's post",
                ));
            }
        }

        tx.execute(
            "INSERT INTO comments(author, post, parent, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![
                request.author.get(),
                request.post.get(),
                request.parent.map(CommentId::get),
                now_ms(),
            ],
        )?;
        let id = CommentId::try_new(tx.last_insert_rowid())
            .map_err(|_| StoreError::InvalidInput("invalid comment id row"))?;
        tx.commit()?;

        debug!(
            author = %request.author,
            post = request.post.get(),
            comment = id.get(),
            reply = request.parent.is_some(),
            "comment registered"
        );
        Ok(id)
    }

    pub fn content_author(&self, target: TargetRef) -> Result<IdentityId, StoreError> {
        require_target_tx(&self.conn, target)
    }

    pub fn is_reply(&self, comment: CommentId) -> Result<bool, StoreError> {
        let parent = self
            .conn
            .query_row(
                "SELECT parent FROM comments WHERE id=?1",
                params![comment.get()],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .ok_or(StoreError::UnknownTarget(TargetRef::Comment(comment)))?;
        Ok(parent.is_some())
    }

    pub fn has_replies(&self, comment: CommentId) -> Result<bool, StoreError> {
        require_target_tx(&self.conn, TargetRef::Comment(comment))?;
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM comments WHERE parent=?1 LIMIT 1",
                params![comment.get()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some())
    }
}

/// Returns the author of `target`, failing when the target does not exist.
pub(super) fn require_target_tx(
    conn: &Connection,
    target: TargetRef,
) -> Result<IdentityId, StoreError> {
    let sql = match target {
        TargetRef::Post(_) => "SELECT author FROM posts WHERE id=?1",
        TargetRef::Comment(_) => "SELECT author FROM comments WHERE id=?1",
    };
    let author = conn
        .query_row(sql, params![target.raw_id()], |row| row.get::<_, i64>(0))
        .optional()?
        .ok_or(StoreError::UnknownTarget(target))?;
    identity_id(author)
}
