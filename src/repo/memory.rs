use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::comment::{
    Comment, CommentId, CommentRepository, NewsId, RepositoryError, Status,
};

// ============================================================================
// In-Memory Comment Repository
// ============================================================================

#[derive(Default)]
struct State {
    next_id: i64,
    comments: HashMap<i64, Comment>,
}

/// Hash-map backed repository with sequential id assignment. Used by the
/// workflow tests; mirrors the Postgres repository's observable behavior.
#[derive(Default)]
pub struct InMemoryCommentRepository {
    state: Mutex<State>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<CommentId, RepositoryError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;

        let id = CommentId::new(state.next_id)
            .map_err(|e| RepositoryError::Datastore(anyhow::anyhow!(e)))?;
        let mut stored = comment.clone();
        stored.assign_id(id);
        state.comments.insert(id.value(), stored);

        Ok(id)
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Comment, RepositoryError> {
        let state = self.state.lock().await;
        state
            .comments
            .get(&id.value())
            .cloned()
            .ok_or(RepositoryError::NotFound(id.value()))
    }

    async fn find_approved_by_news(
        &self,
        news_id: NewsId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let state = self.state.lock().await;
        let mut approved: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.news_id() == news_id && c.is_approved())
            .cloned()
            .collect();

        // Same ordering the SQL query produces.
        approved.sort_by_key(|c| {
            (
                c.pub_time().unwrap_or_else(|| c.created_at()),
                c.id().map(|id| id.value()).unwrap_or_default(),
            )
        });

        Ok(approved)
    }

    async fn update_status(
        &self,
        id: CommentId,
        status: Status,
        pub_time: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let current = state
            .comments
            .get(&id.value())
            .ok_or(RepositoryError::NotFound(id.value()))?;

        let updated = Comment::rehydrate(
            id,
            current.news_id(),
            current.parent(),
            current.username().clone(),
            current.content().clone(),
            current.created_at(),
            pub_time.or_else(|| current.pub_time()),
            status,
        );
        state.comments.insert(id.value(), updated);

        Ok(())
    }
}
