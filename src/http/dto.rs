use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::{Comment, ThreadNode};

// ============================================================================
// Wire Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
    pub news_id: i32,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub username: String,
    pub content: String,
}

/// Query for the thread view. `article_id` is accepted as an alias so
/// gateway clients and direct clients can use either name.
#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    #[serde(alias = "article_id")]
    pub news_id: i32,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub comments: Vec<CommentDto>,
}

/// One rendered node of the public thread. `pub_time` is the moderation
/// instant; approved comments always carry one.
#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: i64,
    pub news_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub username: String,
    pub content: String,
    pub pub_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommentDto>,
}

impl CommentDto {
    pub fn from_node(node: ThreadNode) -> Self {
        let children = node
            .children
            .into_iter()
            .map(CommentDto::from_node)
            .collect();
        Self::from_comment(node.comment, children)
    }

    fn from_comment(comment: Comment, children: Vec<CommentDto>) -> Self {
        let pub_time = comment.pub_time().unwrap_or_else(|| comment.created_at());
        Self {
            id: comment.id().map(|id| id.value()).unwrap_or_default(),
            news_id: comment.news_id().value(),
            parent_id: comment.parent().parent_id().map(|id| id.value()),
            username: comment.username().as_str().to_string(),
            content: comment.content().as_str().to_string(),
            pub_time,
            children,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}
