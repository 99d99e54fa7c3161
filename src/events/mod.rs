use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::Status;

// ============================================================================
// Event Schema - the wire contract between comments and moderation
// ============================================================================
//
// Two JSON event types, one topic each. The producer key is the decimal
// string of the comment id so the broker keeps per-comment ordering when
// partitioning by key. Delivery is at-least-once; every consumer must
// tolerate redelivery.
//
// ============================================================================

/// Topic carrying comment-created events, consumed by the moderation service.
pub const COMMENT_CREATED_TOPIC: &str = "comments.created";

/// Topic carrying moderation verdicts, consumed by the comments service.
pub const COMMENT_MODERATED_TOPIC: &str = "comments.moderated";

/// Emitted once per successfully persisted comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentCreatedEvent {
    pub comment_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_id: Option<i32>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentCreatedEvent {
    pub fn key(&self) -> String {
        self.comment_id.to_string()
    }
}

/// Moderation outcome for one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl From<Verdict> for Status {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Approved => Status::Approved,
            Verdict::Rejected => Status::Rejected,
        }
    }
}

/// Emitted once per moderation decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationVerdictEvent {
    pub comment_id: i64,
    pub status: Verdict,
    pub processed_at: DateTime<Utc>,
}

impl ModerationVerdictEvent {
    pub fn key(&self) -> String {
        self.comment_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_created_event_wire_shape() {
        let event = CommentCreatedEvent {
            comment_id: 7,
            news_id: Some(42),
            content: "Great article, thanks!".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        };

        let json: serde_json::Value =
            serde_json::from_slice(&serde_json::to_vec(&event).unwrap()).unwrap();
        assert_eq!(json["comment_id"], 7);
        assert_eq!(json["news_id"], 42);
        assert_eq!(json["content"], "Great article, thanks!");
        assert_eq!(json["created_at"], "2025-06-01T12:00:00Z");
        assert_eq!(event.key(), "7");
    }

    #[test]
    fn test_created_event_news_id_is_optional_on_decode() {
        let event: CommentCreatedEvent = serde_json::from_str(
            r#"{"comment_id":3,"content":"hello","created_at":"2025-06-01T12:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(event.comment_id, 3);
        assert_eq!(event.news_id, None);
    }

    #[test]
    fn test_verdict_event_wire_shape() {
        let event = ModerationVerdictEvent {
            comment_id: 7,
            status: Verdict::Rejected,
            processed_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 5).unwrap(),
        };

        let json: serde_json::Value =
            serde_json::from_slice(&serde_json::to_vec(&event).unwrap()).unwrap();
        assert_eq!(json["comment_id"], 7);
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["processed_at"], "2025-06-01T12:00:05Z");

        let decoded: ModerationVerdictEvent =
            serde_json::from_value(json).unwrap();
        assert_eq!(decoded.status, Verdict::Rejected);
    }

    #[test]
    fn test_verdict_maps_to_terminal_status() {
        assert_eq!(Status::from(Verdict::Approved), Status::Approved);
        assert_eq!(Status::from(Verdict::Rejected), Status::Rejected);
    }
}
