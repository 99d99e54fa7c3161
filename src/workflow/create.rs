use std::sync::Arc;

use crate::domain::comment::{
    Comment, CommentError, CommentId, CommentRepository, ParentRef, RepositoryError,
};
use crate::events::{CommentCreatedEvent, COMMENT_CREATED_TOPIC};
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;

// ============================================================================
// Creation Workflow
// ============================================================================
//
// validate -> persist -> publish, three independent steps, no transaction
// spanning the broker. Validation failures have no side effect. The
// publish after persist is best effort: a durable comment beats a missed
// moderation event, so a publish failure is logged as an operator signal
// (the comment stays pending until reconciled) but the caller still gets
// a created comment.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Validation(#[from] CommentError),

    #[error("parent comment not found: {0}")]
    ParentNotFound(i64),

    #[error("datastore error")]
    Repository(#[source] RepositoryError),
}

#[derive(Debug, Clone)]
pub struct NewCommentRequest {
    pub news_id: i32,
    pub parent_id: Option<i64>,
    pub username: String,
    pub content: String,
}

pub struct CreateCommentWorkflow {
    repo: Arc<dyn CommentRepository>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
}

impl CreateCommentWorkflow {
    pub fn new(
        repo: Arc<dyn CommentRepository>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repo,
            publisher,
            metrics,
        }
    }

    pub async fn execute(&self, request: NewCommentRequest) -> Result<Comment, CreateError> {
        let mut comment = Comment::new(
            request.news_id,
            ParentRef::Root,
            request.username,
            request.content,
        )?;

        if let Some(parent_id) = request.parent_id {
            let pid =
                CommentId::new(parent_id).map_err(|_| CommentError::InvalidParentId)?;
            // Check-then-act: a parent deleted between this lookup and the
            // insert is an accepted race.
            match self.repo.find_by_id(pid).await {
                Ok(_) => comment.set_parent(ParentRef::ChildOf(pid)),
                Err(e) if e.is_not_found() => return Err(CreateError::ParentNotFound(parent_id)),
                Err(e) => return Err(CreateError::Repository(e)),
            }
        }

        let id = self
            .repo
            .create(&comment)
            .await
            .map_err(CreateError::Repository)?;
        comment.assign_id(id);
        self.metrics.comments_created.inc();

        let event = CommentCreatedEvent {
            comment_id: id.value(),
            news_id: Some(comment.news_id().value()),
            content: comment.content().as_str().to_string(),
            created_at: comment.created_at(),
        };

        if let Err(e) = self.publish_created(&event).await {
            // Not fatal to the caller, but this comment will sit pending
            // until reconciled out-of-band; make sure operators see it.
            self.metrics.publish_failures.inc();
            tracing::error!(
                comment_id = id.value(),
                error = %e,
                "Failed to publish comment-created event; comment remains unmoderated"
            );
        }

        Ok(comment)
    }

    async fn publish_created(&self, event: &CommentCreatedEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(event)?;
        self.publisher
            .publish(COMMENT_CREATED_TOPIC, &event.key(), &payload)
            .await
    }
}
