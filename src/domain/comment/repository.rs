use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::aggregate::Comment;
use super::value_objects::{CommentId, NewsId, Status};

// ============================================================================
// Comment Repository Contract
// ============================================================================
//
// The only persistence seam the workflows depend on. Implemented by the
// Postgres repository in production and by an in-memory repository in tests.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("comment not found: {0}")]
    NotFound(i64),

    #[error("datastore error: {0}")]
    Datastore(#[source] anyhow::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Persists a new comment and returns the assigned id.
    async fn create(&self, comment: &Comment) -> Result<CommentId, RepositoryError>;

    /// Loads one comment by id.
    async fn find_by_id(&self, id: CommentId) -> Result<Comment, RepositoryError>;

    /// Loads all approved comments for one news article, as a flat list.
    async fn find_approved_by_news(&self, news_id: NewsId)
        -> Result<Vec<Comment>, RepositoryError>;

    /// Writes a moderation outcome back. `pub_time` is set only on approval.
    async fn update_status(
        &self,
        id: CommentId,
        status: Status,
        pub_time: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;
}
