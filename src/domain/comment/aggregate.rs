use chrono::{DateTime, Utc};

use super::errors::CommentError;
use super::value_objects::{CommentId, Content, NewsId, ParentRef, Status, Username};

// ============================================================================
// Comment Aggregate - Moderation State Machine
// ============================================================================
//
//  [pending] --(verdict=approved)--> [approved]   (terminal)
//  [pending] --(verdict=rejected)--> [rejected]   (terminal)
//
// The id is unset until the repository persists the comment. After
// persistence the repository is the system of record; an in-memory
// instance is a disposable snapshot.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    id: Option<CommentId>,
    news_id: NewsId,
    parent: ParentRef,
    username: Username,
    content: Content,
    created_at: DateTime<Utc>,
    pub_time: Option<DateTime<Utc>>,
    status: Status,
}

impl Comment {
    /// Validates the submitted fields and builds a new pending comment.
    /// Performs no I/O; parent existence is checked by the creation workflow.
    pub fn new(
        news_id: i32,
        parent: ParentRef,
        username: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, CommentError> {
        Ok(Self {
            id: None,
            news_id: NewsId::new(news_id)?,
            parent,
            username: Username::new(username)?,
            content: Content::new(content)?,
            created_at: Utc::now(),
            pub_time: None,
            status: Status::Pending,
        })
    }

    /// Rebuilds a comment from persisted state without re-validating.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: CommentId,
        news_id: NewsId,
        parent: ParentRef,
        username: Username,
        content: Content,
        created_at: DateTime<Utc>,
        pub_time: Option<DateTime<Utc>>,
        status: Status,
    ) -> Self {
        Self {
            id: Some(id),
            news_id,
            parent,
            username,
            content,
            created_at,
            pub_time,
            status,
        }
    }

    pub fn id(&self) -> Option<CommentId> {
        self.id
    }

    pub fn news_id(&self) -> NewsId {
        self.news_id
    }

    pub fn parent(&self) -> ParentRef {
        self.parent
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn pub_time(&self) -> Option<DateTime<Utc>> {
        self.pub_time
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_approved(&self) -> bool {
        self.status == Status::Approved
    }

    /// Records the repository-assigned identity after persistence.
    pub fn assign_id(&mut self, id: CommentId) {
        self.id = Some(id);
    }

    pub fn set_parent(&mut self, parent: ParentRef) {
        self.parent = parent;
    }

    /// Publishes the comment. `published_at` is the moderation instant,
    /// not the submission instant, so approval latency does not distort
    /// chronological ordering once public.
    pub fn approve(&mut self, published_at: DateTime<Utc>) -> Result<(), CommentError> {
        if self.status.is_terminal() {
            return Err(CommentError::AlreadyModerated(self.status));
        }
        self.status = Status::Approved;
        self.pub_time = Some(published_at);
        Ok(())
    }

    /// Rejects the comment. The publication time stays unset.
    pub fn reject(&mut self) -> Result<(), CommentError> {
        if self.status.is_terminal() {
            return Err(CommentError::AlreadyModerated(self.status));
        }
        self.status = Status::Rejected;
        Ok(())
    }
}
