// ============================================================================
// HTTP layer for the comments service
// ============================================================================

pub mod dto;
pub mod handlers;

pub use dto::{CommentDto, CreatedResponse, NewCommentBody, ThreadQuery, ThreadResponse};
pub use handlers::{configure, AppState};
