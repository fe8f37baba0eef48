use async_trait::async_trait;

use crate::{CommentId, CommentRecord, NewComment, PrayerId, UserId};

/// Somewhere prayer comments live: the HTTP backend, or a mock of it.
///
/// Mutations are never patched into an existing tree; callers re-fetch and
/// rebuild afterwards.
#[async_trait]
pub trait CommentSource {
    fn current_user(&self) -> Option<UserId>;
    async fn fetch_comments(&mut self, prayer: &PrayerId) -> anyhow::Result<Vec<CommentRecord>>;
    async fn create_comment(&mut self, c: NewComment) -> anyhow::Result<CommentRecord>;
    async fn delete_comment(&mut self, id: &CommentId) -> anyhow::Result<()>;
}
