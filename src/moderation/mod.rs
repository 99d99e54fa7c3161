// ============================================================================
// Moderation - classifier and the workflow consuming created events
// ============================================================================

pub mod classifier;
pub mod workflow;

pub use classifier::classify;
pub use workflow::ModerationWorkflow;
