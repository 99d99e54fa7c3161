// ============================================================================
// newsroom - news platform with asynchronous comment moderation
// ============================================================================
//
// One library, three binaries:
// - comments-service: HTTP API plus the verdict consumer
// - moderation-service: classifies created comments, emits verdicts
// - api-gateway: public surface, aggregates articles with comment threads
//
// ============================================================================

pub mod config;
pub mod domain;
pub mod events;
pub mod gateway;
pub mod http;
pub mod messaging;
pub mod metrics;
pub mod moderation;
pub mod repo;
pub mod workflow;
