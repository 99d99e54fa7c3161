use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::events::{CommentCreatedEvent, ModerationVerdictEvent, COMMENT_MODERATED_TOPIC};
use crate::messaging::{EventPublisher, MessageHandler};
use crate::metrics::Metrics;

use super::classifier::classify;

// ============================================================================
// Moderation Workflow
// ============================================================================
//
// Consumes comment-created events, classifies the body and emits a verdict
// keyed by comment id. The workflow holds no local state, so running it
// twice with the same event just emits the same verdict again; the
// status-update side is idempotent by key. A publish failure propagates
// and the consumer retries the event until the broker accepts the verdict.
//
// ============================================================================

pub struct ModerationWorkflow {
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
}

impl ModerationWorkflow {
    pub fn new(publisher: Arc<dyn EventPublisher>, metrics: Arc<Metrics>) -> Self {
        Self { publisher, metrics }
    }

    pub async fn moderate(&self, event: CommentCreatedEvent) -> anyhow::Result<()> {
        let verdict = classify(&event.content);

        let result = ModerationVerdictEvent {
            comment_id: event.comment_id,
            status: verdict,
            processed_at: Utc::now(),
        };

        let payload = serde_json::to_vec(&result)?;
        self.publisher
            .publish(COMMENT_MODERATED_TOPIC, &result.key(), &payload)
            .await?;

        self.metrics
            .moderation_verdicts
            .with_label_values(&[verdict.as_str()])
            .inc();
        tracing::info!(
            comment_id = event.comment_id,
            verdict = verdict.as_str(),
            "Comment moderated"
        );

        Ok(())
    }
}

#[async_trait]
impl MessageHandler for ModerationWorkflow {
    async fn handle(&self, _key: Option<&[u8]>, payload: &[u8]) -> anyhow::Result<()> {
        let event: CommentCreatedEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                // A malformed payload will never parse on redelivery either;
                // drop it so the offset commits.
                tracing::error!(error = %e, "Discarding undecodable comment-created event");
                return Ok(());
            }
        };

        self.moderate(event).await
    }
}
