use super::value_objects::Status;

// ============================================================================
// Comment Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("comment id must be a positive integer")]
    InvalidCommentId,

    #[error("news id must be a positive integer")]
    InvalidNewsId,

    #[error("parent id must be a positive integer")]
    InvalidParentId,

    #[error("username length must be between 6 and 50 characters")]
    InvalidUsernameLength,

    #[error("comment content cannot be empty")]
    EmptyContent,

    #[error("invalid moderation status: {0}")]
    InvalidStatus(String),

    #[error("comment is already moderated with status {0}")]
    AlreadyModerated(Status),
}
