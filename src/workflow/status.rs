use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::comment::{CommentError, CommentId, CommentRepository};
use crate::events::{ModerationVerdictEvent, Verdict};
use crate::messaging::MessageHandler;
use crate::metrics::Metrics;

// ============================================================================
// Status-Update Workflow
// ============================================================================
//
// Consumes verdict events and performs the only status mutation after
// creation. The broker delivers at-least-once, so every non-transient
// failure mode here must resolve to a committed offset:
// - unknown comment id: a verdict for a comment that does not exist is
//   unrecoverable, logged and dropped
// - already-terminal status: duplicate delivery, logged and dropped
//   without touching status or publication time
// Only datastore errors propagate; the consumer retries the same event
// until the write succeeds, and the offset stays uncommitted until then.
//
// ============================================================================

pub struct StatusUpdateWorkflow {
    repo: Arc<dyn CommentRepository>,
    metrics: Arc<Metrics>,
}

impl StatusUpdateWorkflow {
    pub fn new(repo: Arc<dyn CommentRepository>, metrics: Arc<Metrics>) -> Self {
        Self { repo, metrics }
    }

    pub async fn apply(&self, event: ModerationVerdictEvent) -> anyhow::Result<()> {
        let id = match CommentId::new(event.comment_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(
                    comment_id = event.comment_id,
                    error = %e,
                    "Discarding verdict with invalid comment id"
                );
                self.count("orphaned");
                return Ok(());
            }
        };

        let mut comment = match self.repo.find_by_id(id).await {
            Ok(comment) => comment,
            Err(e) if e.is_not_found() => {
                tracing::error!(
                    comment_id = %id,
                    "Discarding verdict for unknown comment"
                );
                self.count("orphaned");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let transition = match event.status {
            Verdict::Approved => comment.approve(Utc::now()),
            Verdict::Rejected => comment.reject(),
        };

        if let Err(CommentError::AlreadyModerated(status)) = transition {
            tracing::warn!(
                comment_id = %id,
                status = %status,
                "Duplicate verdict delivery, comment already moderated"
            );
            self.count("duplicate");
            return Ok(());
        }
        transition?;

        self.repo
            .update_status(id, comment.status(), comment.pub_time())
            .await?;

        self.count("applied");
        tracing::info!(
            comment_id = %id,
            status = %comment.status(),
            "Comment status updated"
        );

        Ok(())
    }

    fn count(&self, outcome: &str) {
        self.metrics
            .status_updates
            .with_label_values(&[outcome])
            .inc();
    }
}

#[async_trait]
impl MessageHandler for StatusUpdateWorkflow {
    async fn handle(&self, _key: Option<&[u8]>, payload: &[u8]) -> anyhow::Result<()> {
        let event: ModerationVerdictEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Discarding undecodable verdict event");
                return Ok(());
            }
        };

        self.apply(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comment::{Comment, Content, NewsId, ParentRef, Status, Username};
    use crate::repo::InMemoryCommentRepository;
    use chrono::Duration;

    fn verdict(comment_id: i64, status: Verdict) -> ModerationVerdictEvent {
        ModerationVerdictEvent {
            comment_id,
            status,
            processed_at: Utc::now(),
        }
    }

    /// Seeds one pending comment submitted five minutes ago, so moderation
    /// visibly happens after submission.
    async fn seeded() -> (StatusUpdateWorkflow, Arc<InMemoryCommentRepository>, CommentId) {
        let repo = Arc::new(InMemoryCommentRepository::new());
        let pending = Comment::rehydrate(
            CommentId::new(1).unwrap(),
            NewsId::new(1).unwrap(),
            ParentRef::Root,
            Username::new("commenter_one").unwrap(),
            Content::new("hello").unwrap(),
            Utc::now() - Duration::minutes(5),
            None,
            Status::Pending,
        );
        let id = repo.create(&pending).await.unwrap();
        let workflow = StatusUpdateWorkflow::new(repo.clone(), Arc::new(Metrics::new().unwrap()));
        (workflow, repo, id)
    }

    #[tokio::test]
    async fn test_approval_stamps_publication_time() {
        let (workflow, repo, id) = seeded().await;
        let before = Utc::now();

        workflow
            .apply(verdict(id.value(), Verdict::Approved))
            .await
            .unwrap();

        let stored = repo.find_by_id(id).await.unwrap();
        assert_eq!(stored.status(), Status::Approved);
        let pub_time = stored.pub_time().unwrap();
        assert!(pub_time >= before);
        assert!(pub_time > stored.created_at());
    }

    #[tokio::test]
    async fn test_rejection_leaves_publication_time_unset() {
        let (workflow, repo, id) = seeded().await;

        workflow
            .apply(verdict(id.value(), Verdict::Rejected))
            .await
            .unwrap();

        let stored = repo.find_by_id(id).await.unwrap();
        assert_eq!(stored.status(), Status::Rejected);
        assert_eq!(stored.pub_time(), None);
    }

    #[tokio::test]
    async fn test_duplicate_verdict_is_a_committed_no_op() {
        let (workflow, repo, id) = seeded().await;

        workflow
            .apply(verdict(id.value(), Verdict::Approved))
            .await
            .unwrap();
        let first = repo.find_by_id(id).await.unwrap();

        // Redelivery with the opposite verdict must change nothing and
        // still succeed so the offset commits.
        workflow
            .apply(verdict(id.value(), Verdict::Rejected))
            .await
            .unwrap();

        let second = repo.find_by_id(id).await.unwrap();
        assert_eq!(second.status(), first.status());
        assert_eq!(second.pub_time(), first.pub_time());
    }

    #[tokio::test]
    async fn test_verdict_for_unknown_comment_is_dropped() {
        let repo = Arc::new(InMemoryCommentRepository::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let workflow = StatusUpdateWorkflow::new(repo, metrics.clone());

        workflow
            .apply(verdict(999, Verdict::Approved))
            .await
            .unwrap();

        assert_eq!(
            metrics.status_updates.with_label_values(&["orphaned"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_undecodable_payload_commits() {
        let repo = Arc::new(InMemoryCommentRepository::new());
        let workflow = StatusUpdateWorkflow::new(repo, Arc::new(Metrics::new().unwrap()));

        assert!(workflow.handle(None, b"{broken").await.is_ok());
    }

    #[tokio::test]
    async fn test_round_trip_approved_comment_is_listed_with_pub_time() {
        let (workflow, repo, id) = seeded().await;

        workflow
            .apply(verdict(id.value(), Verdict::Approved))
            .await
            .unwrap();

        let listed = repo
            .find_approved_by_news(crate::domain::comment::NewsId::new(1).unwrap())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].pub_time().unwrap() > listed[0].created_at());
    }
}
