use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::comment::{
    Comment, CommentId, CommentRepository, Content, NewsId, ParentRef, RepositoryError, Status,
    Username,
};

// ============================================================================
// Postgres Comment Repository
// ============================================================================

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS comments (
    id          BIGSERIAL PRIMARY KEY,
    news_id     INTEGER     NOT NULL,
    parent_id   BIGINT      NULL REFERENCES comments (id),
    user_name   TEXT        NOT NULL,
    content     TEXT        NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    pub_time    TIMESTAMPTZ NULL,
    status      TEXT        NOT NULL
)
"#;

pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates the comments table when missing. Called once at startup.
    pub async fn init_schema(&self) -> anyhow::Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn datastore(e: impl Into<anyhow::Error>) -> RepositoryError {
    RepositoryError::Datastore(e.into())
}

fn map_row(row: &PgRow) -> Result<Comment, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(datastore)?;
    let news_id: i32 = row.try_get("news_id").map_err(datastore)?;
    let parent_id: Option<i64> = row.try_get("parent_id").map_err(datastore)?;
    let user_name: String = row.try_get("user_name").map_err(datastore)?;
    let content: String = row.try_get("content").map_err(datastore)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(datastore)?;
    let pub_time: Option<DateTime<Utc>> = row.try_get("pub_time").map_err(datastore)?;
    let status: String = row.try_get("status").map_err(datastore)?;

    Ok(Comment::rehydrate(
        CommentId::new(id).map_err(datastore)?,
        NewsId::new(news_id).map_err(datastore)?,
        ParentRef::from(parent_id),
        Username::new(user_name).map_err(datastore)?,
        Content::new(content).map_err(datastore)?,
        created_at,
        pub_time,
        Status::parse(&status).map_err(datastore)?,
    ))
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<CommentId, RepositoryError> {
        const QUERY: &str = r#"
            INSERT INTO comments (news_id, parent_id, user_name, content, created_at, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
        "#;

        let row = sqlx::query(QUERY)
            .bind(comment.news_id().value())
            .bind(comment.parent().parent_id().map(|p| p.value()))
            .bind(comment.username().as_str())
            .bind(comment.content().as_str())
            .bind(comment.created_at())
            .bind(comment.status().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(datastore)?;

        let id: i64 = row.try_get("id").map_err(datastore)?;
        CommentId::new(id).map_err(datastore)
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Comment, RepositoryError> {
        const QUERY: &str = r#"
            SELECT id, news_id, parent_id, user_name, content, created_at, pub_time, status
            FROM comments WHERE id = $1
        "#;

        let row = sqlx::query(QUERY)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(datastore)?
            .ok_or(RepositoryError::NotFound(id.value()))?;

        map_row(&row)
    }

    async fn find_approved_by_news(
        &self,
        news_id: NewsId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        const QUERY: &str = r#"
            SELECT id, news_id, parent_id, user_name, content, created_at, pub_time, status
            FROM comments
            WHERE news_id = $1 AND status = $2
            ORDER BY pub_time ASC, id ASC
        "#;

        let rows = sqlx::query(QUERY)
            .bind(news_id.value())
            .bind(Status::Approved.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(datastore)?;

        rows.iter().map(map_row).collect()
    }

    async fn update_status(
        &self,
        id: CommentId,
        status: Status,
        pub_time: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        const WITH_TIME: &str = "UPDATE comments SET status = $2, pub_time = $3 WHERE id = $1";
        const NO_TIME: &str = "UPDATE comments SET status = $2 WHERE id = $1";

        let result = match pub_time {
            Some(pub_time) => {
                sqlx::query(WITH_TIME)
                    .bind(id.value())
                    .bind(status.as_str())
                    .bind(pub_time)
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query(NO_TIME)
                    .bind(id.value())
                    .bind(status.as_str())
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(datastore)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.value()));
        }

        Ok(())
    }
}
