use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use crate::metrics::Metrics;
use crate::workflow::{
    CreateCommentWorkflow, CreateError, NewCommentRequest, ThreadViewError, ThreadViewWorkflow,
};

use super::dto::{CommentDto, CreatedResponse, ErrorBody, NewCommentBody, ThreadQuery, ThreadResponse};

// ============================================================================
// Comments-Service Handlers
// ============================================================================
//
// Thin translation layer: decode the request, run the workflow, map the
// workflow error to a status code. Datastore details never leak into
// response bodies.
//
// ============================================================================

pub struct AppState {
    pub create: CreateCommentWorkflow,
    pub thread: ThreadViewWorkflow,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/comments", web::post().to(create_comment))
        .route("/comments", web::get().to(list_comments))
        .route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics));
}

fn error_response(status: actix_web::http::StatusCode, code: &'static str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody { code, message })
}

async fn create_comment(
    body: web::Json<NewCommentBody>,
    state: web::Data<AppState>,
) -> impl Responder {
    let body = body.into_inner();
    let request = NewCommentRequest {
        news_id: body.news_id,
        parent_id: body.parent_id,
        username: body.username,
        content: body.content,
    };

    match state.create.execute(request).await {
        Ok(comment) => {
            let id = comment.id().map(|id| id.value()).unwrap_or_default();
            HttpResponse::Created().json(CreatedResponse {
                id,
                status: comment.status().as_str().to_string(),
            })
        }
        Err(CreateError::Validation(e)) => error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "validation_error",
            e.to_string(),
        ),
        Err(e @ CreateError::ParentNotFound(_)) => error_response(
            actix_web::http::StatusCode::NOT_FOUND,
            "parent_not_found",
            e.to_string(),
        ),
        Err(CreateError::Repository(e)) => {
            tracing::error!(error = %e, "Comment creation failed in the datastore");
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "failed to create comment".to_string(),
            )
        }
    }
}

async fn list_comments(
    query: web::Query<ThreadQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    match state.thread.execute(query.news_id).await {
        Ok(thread) => HttpResponse::Ok().json(ThreadResponse {
            comments: thread.into_iter().map(CommentDto::from_node).collect(),
        }),
        Err(ThreadViewError::Validation(e)) => error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "validation_error",
            e.to_string(),
        ),
        Err(ThreadViewError::Repository(e)) => {
            tracing::error!(news_id = query.news_id, error = %e, "Thread lookup failed");
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "failed to load comments".to_string(),
            )
        }
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "comments-service"
    }))
}

async fn metrics(state: web::Data<AppState>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::EventPublisher;
    use crate::repo::InMemoryCommentRepository;
    use actix_web::{test, App};
    use async_trait::async_trait;

    struct NullPublisher;

    #[async_trait]
    impl EventPublisher for NullPublisher {
        async fn publish(&self, _: &str, _: &str, _: &[u8]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn state() -> web::Data<AppState> {
        let repo = Arc::new(InMemoryCommentRepository::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        web::Data::new(AppState {
            create: CreateCommentWorkflow::new(
                repo.clone(),
                Arc::new(NullPublisher),
                metrics.clone(),
            ),
            thread: ThreadViewWorkflow::new(repo),
            metrics,
        })
    }

    #[actix_web::test]
    async fn test_post_comments_returns_201_pending() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let request = test::TestRequest::post()
            .uri("/comments")
            .set_json(serde_json::json!({
                "news_id": 1,
                "username": "commenter_one",
                "content": "hello there"
            }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 201);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["status"], "pending");
    }

    #[actix_web::test]
    async fn test_post_comments_validation_maps_to_400() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let request = test::TestRequest::post()
            .uri("/comments")
            .set_json(serde_json::json!({
                "news_id": 1,
                "username": "tiny",
                "content": "hello there"
            }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 400);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], "validation_error");
    }

    #[actix_web::test]
    async fn test_post_reply_to_missing_parent_maps_to_404() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let request = test::TestRequest::post()
            .uri("/comments")
            .set_json(serde_json::json!({
                "news_id": 1,
                "parent_id": 999,
                "username": "commenter_one",
                "content": "hello there"
            }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 404);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], "parent_not_found");
    }

    #[actix_web::test]
    async fn test_get_comments_accepts_article_id_alias() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/comments?article_id=5")
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["comments"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_get_comments_rejects_non_positive_article() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/comments?news_id=0").to_request(),
        )
        .await;

        assert_eq!(response.status(), 400);
    }

    #[actix_web::test]
    async fn test_health_reports_service_name() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let response =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["service"], "comments-service");
    }
}
