// ============================================================================
// Comment Domain - Business Logic for the Comment Aggregate
// ============================================================================
//
// This module contains ALL comment-specific code:
// - Value objects (CommentId, NewsId, ParentRef, Username, Content, Status)
// - Errors (CommentError enum)
// - Aggregate (Comment with the pending -> approved/rejected state machine)
// - Repository contract (the only persistence seam the workflows see)
// - Thread reconstruction (flat approved list -> nested tree)
//
// ============================================================================

pub mod aggregate;
pub mod errors;
pub mod repository;
pub mod thread;
pub mod value_objects;

// Re-export for convenience
pub use aggregate::*;
pub use errors::*;
pub use repository::*;
pub use thread::*;
pub use value_objects::*;
