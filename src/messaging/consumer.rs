use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::Message,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::metrics::Metrics;

// ============================================================================
// Kafka Consumer
// ============================================================================
//
// Single-threaded per consumer-group member: one message is processed to
// completion before the next fetch, and the offset is committed only after
// the handler succeeds. A handler error is retried in place with
// exponential backoff; the loop never fetches past a message that has not
// been handled, so a later commit can never acknowledge a failed one.
// Shutdown during a retry leaves the offset uncommitted and the group
// redelivers the message on restart.
//
// Fetch errors are always treated as transient: the loop sleeps with
// exponential backoff and continues, it never crashes.
//
// ============================================================================

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes one delivered message. Returning `Err` makes the consumer
    /// retry the same message; the handler must therefore be safe to run
    /// more than once with the same payload.
    async fn handle(&self, key: Option<&[u8]>, payload: &[u8]) -> anyhow::Result<()>;
}

/// Runs the handler against one message until it succeeds, sleeping with
/// exponential backoff between attempts. Returns `false` when shutdown
/// fires before success, in which case the message stays unacknowledged.
async fn deliver_until_handled(
    handler: &dyn MessageHandler,
    key: Option<&[u8]>,
    payload: &[u8],
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt: u64 = 1;

    loop {
        match handler.handle(key, payload).await {
            Ok(()) => return true,
            Err(e) => {
                tracing::error!(
                    attempt,
                    error = %e,
                    backoff_ms = backoff.as_millis() as u64,
                    "Handler failed, retrying same message after backoff"
                );
                tokio::select! {
                    _ = shutdown.changed() => return false,
                    _ = sleep(backoff) => {
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                        attempt += 1;
                    }
                }
            }
        }
    }
}

pub struct KafkaConsumer {
    consumer: StreamConsumer,
    handler: Arc<dyn MessageHandler>,
    topic: String,
    metrics: Arc<Metrics>,
}

impl KafkaConsumer {
    pub fn new(
        brokers: &str,
        group_id: &str,
        topic: &str,
        handler: Arc<dyn MessageHandler>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()?;

        consumer.subscribe(&[topic])?;

        Ok(Self {
            consumer,
            handler,
            topic: topic.to_string(),
            metrics,
        })
    }

    /// Runs the consume loop until the shutdown signal fires. The signal is
    /// observed between messages and between retry attempts, so a message
    /// taken off the queue is either completed and committed or left
    /// uncommitted for redelivery, never abandoned half-acknowledged.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(topic = %self.topic, "Starting Kafka consumer");
        let mut backoff = INITIAL_BACKOFF;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!(topic = %self.topic, "Stopping Kafka consumer");
                    return;
                }
                fetched = self.consumer.recv() => match fetched {
                    Err(e) => {
                        self.metrics.consumer_fetch_errors.inc();
                        tracing::warn!(
                            topic = %self.topic,
                            error = %e,
                            backoff_ms = backoff.as_millis() as u64,
                            "Fetch failed, retrying after backoff"
                        );
                        sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                    Ok(message) => {
                        backoff = INITIAL_BACKOFF;
                        let payload = message.payload().unwrap_or_default();

                        let handled = deliver_until_handled(
                            self.handler.as_ref(),
                            message.key(),
                            payload,
                            &mut shutdown,
                        )
                        .await;

                        if !handled {
                            tracing::info!(
                                topic = %self.topic,
                                offset = message.offset(),
                                "Stopping Kafka consumer mid-retry, offset left uncommitted for redelivery"
                            );
                            return;
                        }

                        if let Err(e) =
                            self.consumer.commit_message(&message, CommitMode::Async)
                        {
                            // Uncommitted offsets only widen the
                            // redelivery window; processing goes on.
                            tracing::error!(
                                topic = %self.topic,
                                error = %e,
                                "Failed to commit offset"
                            );
                        } else {
                            tracing::debug!(
                                topic = %self.topic,
                                offset = message.offset(),
                                "Message processed and committed"
                            );
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails a fixed number of times, then succeeds forever.
    struct ScriptedHandler {
        failures_left: AtomicUsize,
        attempts: AtomicUsize,
    }

    impl ScriptedHandler {
        fn failing(times: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(times),
                attempts: AtomicUsize::new(0),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageHandler for ScriptedHandler {
        async fn handle(&self, _key: Option<&[u8]>, _payload: &[u8]) -> anyhow::Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let failed = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok();
            if failed {
                anyhow::bail!("transient failure");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_successful_message_is_acknowledged_on_first_attempt() {
        let handler = ScriptedHandler::failing(0);
        let (_tx, mut shutdown) = watch::channel(false);

        assert!(deliver_until_handled(&handler, None, b"{}", &mut shutdown).await);
        assert_eq!(handler.attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_message_is_retried_in_place_until_handled() {
        let handler = ScriptedHandler::failing(2);
        let (_tx, mut shutdown) = watch::channel(false);

        // The same message is handed back to the handler; the consumer
        // never moves on to a later message while this one is failing.
        assert!(deliver_until_handled(&handler, None, b"{}", &mut shutdown).await);
        assert_eq!(handler.attempts(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_retries_without_acknowledging() {
        let handler = Arc::new(ScriptedHandler::failing(usize::MAX));
        let (tx, mut shutdown) = watch::channel(false);

        let delivery = tokio::spawn({
            let handler = handler.clone();
            async move {
                deliver_until_handled(handler.as_ref(), None, b"{}", &mut shutdown).await
            }
        });

        sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        assert!(!delivery.await.unwrap());
        assert!(handler.attempts() >= 1);
    }
}
