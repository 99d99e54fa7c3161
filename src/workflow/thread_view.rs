use std::sync::Arc;

use crate::domain::comment::{
    build_thread, CommentError, CommentRepository, NewsId, RepositoryError, ThreadNode,
};

// ============================================================================
// Thread-View Workflow
// ============================================================================
//
// Read path for the public thread: load the flat approved list for one
// article and reconstruct the nested tree. Pending and rejected comments
// never reach this view.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ThreadViewError {
    #[error(transparent)]
    Validation(#[from] CommentError),

    #[error("datastore error")]
    Repository(#[source] RepositoryError),
}

pub struct ThreadViewWorkflow {
    repo: Arc<dyn CommentRepository>,
}

impl ThreadViewWorkflow {
    pub fn new(repo: Arc<dyn CommentRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, news_id: i32) -> Result<Vec<ThreadNode>, ThreadViewError> {
        let news_id = NewsId::new(news_id)?;

        let comments = self
            .repo
            .find_approved_by_news(news_id)
            .await
            .map_err(ThreadViewError::Repository)?;

        Ok(build_thread(comments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comment::{Comment, ParentRef, Status};
    use crate::repo::InMemoryCommentRepository;
    use chrono::Utc;

    async fn create_approved(
        repo: &InMemoryCommentRepository,
        news_id: i32,
        parent_id: Option<i64>,
    ) -> i64 {
        let mut comment =
            Comment::new(news_id, ParentRef::Root, "commenter_one", "hello").unwrap();
        if let Some(pid) = parent_id {
            comment.set_parent(ParentRef::from(Some(pid)));
        }
        let id = repo.create(&comment).await.unwrap();
        repo.update_status(id, Status::Approved, Some(Utc::now()))
            .await
            .unwrap();
        id.value()
    }

    #[tokio::test]
    async fn test_invalid_news_id_is_rejected() {
        let workflow = ThreadViewWorkflow::new(Arc::new(InMemoryCommentRepository::new()));

        assert!(matches!(
            workflow.execute(0).await,
            Err(ThreadViewError::Validation(CommentError::InvalidNewsId))
        ));
    }

    #[tokio::test]
    async fn test_thread_contains_only_requested_article() {
        let repo = Arc::new(InMemoryCommentRepository::new());
        let root = create_approved(&repo, 1, None).await;
        create_approved(&repo, 1, Some(root)).await;
        create_approved(&repo, 2, None).await;

        let workflow = ThreadViewWorkflow::new(repo);
        let thread = workflow.execute(1).await.unwrap();

        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].children.len(), 1);
    }

    #[tokio::test]
    async fn test_pending_comments_are_invisible() {
        let repo = Arc::new(InMemoryCommentRepository::new());
        create_approved(&repo, 1, None).await;
        repo.create(&Comment::new(1, ParentRef::Root, "commenter_two", "pending").unwrap())
            .await
            .unwrap();

        let workflow = ThreadViewWorkflow::new(repo);
        let thread = workflow.execute(1).await.unwrap();

        assert_eq!(thread.len(), 1);
    }

    #[tokio::test]
    async fn test_reply_to_rejected_parent_surfaces_as_root() {
        let repo = Arc::new(InMemoryCommentRepository::new());
        let parent = repo
            .create(&Comment::new(1, ParentRef::Root, "commenter_one", "bad").unwrap())
            .await
            .unwrap();
        repo.update_status(parent, Status::Rejected, None)
            .await
            .unwrap();
        create_approved(&repo, 1, Some(parent.value())).await;

        let workflow = ThreadViewWorkflow::new(repo);
        let thread = workflow.execute(1).await.unwrap();

        assert_eq!(thread.len(), 1);
        assert!(thread[0].children.is_empty());
    }
}
