// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// This module contains domain-specific aggregates and business logic.
// The comment aggregate owns the moderation state machine; everything
// here is independent of Kafka, Postgres and HTTP.
//
// ============================================================================

pub mod comment;
