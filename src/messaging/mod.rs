// ============================================================================
// Messaging - Kafka producer/consumer plumbing
// ============================================================================
//
// The three workflows communicate only through the broker, never through
// shared memory. Publishing goes through the `EventPublisher` trait so
// workflow tests can swap in a recording fake.
//
// ============================================================================

mod consumer;
mod producer;

use async_trait::async_trait;

pub use consumer::{KafkaConsumer, MessageHandler};
pub use producer::KafkaPublisher;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event payload keyed for per-comment partition affinity.
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> anyhow::Result<()>;
}
