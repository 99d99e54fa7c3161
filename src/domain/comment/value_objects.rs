use serde::{Deserialize, Serialize};

use super::errors::CommentError;

// ============================================================================
// Comment Value Objects
// ============================================================================

/// Comment identifier, assigned by the repository on persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentId(i64);

impl CommentId {
    pub fn new(id: i64) -> Result<Self, CommentError> {
        if id < 1 {
            return Err(CommentError::InvalidCommentId);
        }
        Ok(Self(id))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the news article a comment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsId(i32);

impl NewsId {
    pub fn new(id: i32) -> Result<Self, CommentError> {
        if id < 1 {
            return Err(CommentError::InvalidNewsId);
        }
        Ok(Self(id))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// Position of a comment in its thread: either a thread root or a reply
/// to an existing comment. Replaces a nullable parent-id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    Root,
    ChildOf(CommentId),
}

impl ParentRef {
    /// Builds a `ChildOf` reference, rejecting non-positive ids.
    pub fn child_of(id: i64) -> Result<Self, CommentError> {
        if id < 1 {
            return Err(CommentError::InvalidParentId);
        }
        Ok(Self::ChildOf(CommentId(id)))
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    pub fn parent_id(&self) -> Option<CommentId> {
        match self {
            Self::Root => None,
            Self::ChildOf(id) => Some(*id),
        }
    }
}

impl From<Option<i64>> for ParentRef {
    /// Lossy conversion used when rehydrating from storage, where the
    /// value was validated at creation time.
    fn from(value: Option<i64>) -> Self {
        match value {
            Some(id) => Self::ChildOf(CommentId(id)),
            None => Self::Root,
        }
    }
}

/// Name of the user who left the comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Result<Self, CommentError> {
        let name = name.into();
        let len = name.chars().count();
        if !(6..=50).contains(&len) {
            return Err(CommentError::InvalidUsernameLength);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content(String);

impl Content {
    pub fn new(text: impl Into<String>) -> Result<Self, CommentError> {
        let text = text.into();
        if text.is_empty() {
            return Err(CommentError::EmptyContent);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Moderation status of a comment. Starts at `Pending` and transitions
/// exactly once to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub fn parse(value: &str) -> Result<Self, CommentError> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(CommentError::InvalidStatus(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
