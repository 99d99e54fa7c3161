use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::Metrics;

use super::client::{InboundContext, ProxyClient, ProxyError, UpstreamResponse};
use super::registry::{RouteRegistry, COMMENTS_ROUTE, NEWS_ROUTE};

// ============================================================================
// Gateway Aggregator
// ============================================================================
//
// Merges one article lookup and one comment-thread lookup into a single
// client-facing payload. The two upstream calls run concurrently; both
// results are joined before responding.
//
// Failure semantics, deliberately asymmetric:
// - article call failed or non-2xx: surface the article upstream's
//   status/body verbatim, the comment result is discarded (comments are
//   meaningless without the article)
// - article ok but comment call failed or non-2xx: surface the comment
//   upstream's error rather than degrading to an article-only response
//
// ============================================================================

/// Article fields the gateway extracts for merging. Unknown upstream
/// fields are not round-tripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDoc {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_time: Option<String>,
}

/// One node of the comment thread as the comments service renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pub_time: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommentNode>,
}

#[derive(Debug, Deserialize)]
struct CommentList {
    #[serde(default)]
    comments: Vec<CommentNode>,
}

/// The merged payload for `GET /articles/{id}`.
#[derive(Debug, Serialize)]
pub struct ArticleWithComments {
    pub article: ArticleDoc,
    pub comments: Vec<CommentNode>,
}

/// A fully decided gateway reply, independent of the HTTP framework.
#[derive(Debug)]
pub struct GatewayResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    pub fn json(status: u16, value: &impl Serialize) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    pub fn error(status: u16, code: &str, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "code": code, "message": message }))
    }

    /// Surfaces an upstream response verbatim.
    pub fn passthrough(upstream: UpstreamResponse) -> Self {
        Self {
            status: upstream.status,
            content_type: upstream
                .content_type
                .unwrap_or_else(|| "application/json".to_string()),
            body: upstream.body,
        }
    }
}

/// Pure merge decision over the two joined upstream outcomes.
pub fn combine(
    article: Result<UpstreamResponse, ProxyError>,
    comments: Result<UpstreamResponse, ProxyError>,
) -> GatewayResponse {
    let article = match article {
        Err(e) => return GatewayResponse::error(502, "bad_gateway", &e.to_string()),
        Ok(response) if !response.is_success() => {
            return GatewayResponse::passthrough(response)
        }
        Ok(response) => response,
    };

    let article_doc: ArticleDoc = match serde_json::from_slice(&article.body) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(error = %e, "Unparseable article payload from upstream");
            return GatewayResponse::error(
                500,
                "invalid_upstream_payload",
                "failed to parse article data",
            );
        }
    };

    let comments = match comments {
        Err(e) => return GatewayResponse::error(502, "bad_gateway", &e.to_string()),
        Ok(response) if !response.is_success() => {
            return GatewayResponse::passthrough(response)
        }
        Ok(response) => response,
    };

    let comment_list: CommentList = match serde_json::from_slice(&comments.body) {
        Ok(list) => list,
        Err(e) => {
            tracing::error!(error = %e, "Unparseable comment payload from upstream");
            return GatewayResponse::error(
                500,
                "invalid_upstream_payload",
                "failed to parse comment data",
            );
        }
    };

    GatewayResponse::json(
        200,
        &ArticleWithComments {
            article: article_doc,
            comments: comment_list.comments,
        },
    )
}

/// Wraps a proxied upstream response: successful JSON bodies are nested
/// under `data`, everything else passes through verbatim.
pub fn wrap_proxied(upstream: UpstreamResponse) -> GatewayResponse {
    if !upstream.is_success() {
        return GatewayResponse::passthrough(upstream);
    }

    match serde_json::from_slice::<serde_json::Value>(&upstream.body) {
        Ok(raw) => GatewayResponse::json(upstream.status, &serde_json::json!({ "data": raw })),
        Err(_) => GatewayResponse::passthrough(upstream),
    }
}

pub struct Aggregator {
    client: Arc<ProxyClient>,
    registry: Arc<RouteRegistry>,
    metrics: Arc<Metrics>,
}

impl Aggregator {
    pub fn new(
        client: Arc<ProxyClient>,
        registry: Arc<RouteRegistry>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            client,
            registry,
            metrics,
        }
    }

    pub async fn article_with_comments(
        &self,
        article_id: &str,
        ctx: &InboundContext,
    ) -> GatewayResponse {
        let (news_base, comments_base) = match (
            self.registry.lookup(NEWS_ROUTE),
            self.registry.lookup(COMMENTS_ROUTE),
        ) {
            (Some(news), Some(comments)) => {
                (news.base_url.clone(), comments.base_url.clone())
            }
            _ => {
                return GatewayResponse::error(
                    500,
                    "route_not_configured",
                    "upstream service route missing",
                )
            }
        };

        let article_url = format!("{news_base}/news/{article_id}");
        let comments_url = format!("{comments_base}/comments?news_id={article_id}");

        let (article, comments) = tokio::join!(
            self.client.forward(Method::GET, &article_url, ctx, None),
            self.client.forward(Method::GET, &comments_url, ctx, None),
        );

        self.observe(NEWS_ROUTE, &article);
        self.observe(COMMENTS_ROUTE, &comments);

        combine(article, comments)
    }

    fn observe(&self, route: &str, result: &Result<UpstreamResponse, ProxyError>) {
        let outcome = match result {
            Ok(response) if response.is_success() => "ok",
            Ok(_) => "http_error",
            Err(_) => "unreachable",
        };
        self.metrics
            .gateway_upstream_responses
            .with_label_values(&[route, outcome])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_json(body: &str) -> Result<UpstreamResponse, ProxyError> {
        Ok(UpstreamResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
        })
    }

    fn upstream(status: u16, body: &str) -> Result<UpstreamResponse, ProxyError> {
        Ok(UpstreamResponse {
            status,
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
        })
    }

    const TWO_COMMENTS: &str = r#"{"comments":[
        {"id":1,"username":"commenter_one","content":"first","pub_time":"2025-06-01T12:00:00Z"},
        {"id":2,"parent_id":1,"username":"commenter_two","content":"second","pub_time":"2025-06-01T12:01:00Z"}
    ]}"#;

    #[test]
    fn test_merges_article_and_comments() {
        let reply = combine(ok_json(r#"{"id":42,"title":"X"}"#), ok_json(TWO_COMMENTS));

        assert_eq!(reply.status, 200);
        let merged: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(merged["article"]["id"], 42);
        assert_eq!(merged["article"]["title"], "X");
        assert_eq!(merged["comments"].as_array().unwrap().len(), 2);
        assert_eq!(merged["comments"][1]["parent_id"], 1);
    }

    #[test]
    fn test_article_404_passes_through_and_discards_comments() {
        let article_body = r#"{"code":"not_found","message":"no such article"}"#;
        let reply = combine(upstream(404, article_body), ok_json(TWO_COMMENTS));

        assert_eq!(reply.status, 404);
        assert_eq!(reply.body, article_body.as_bytes());
    }

    #[test]
    fn test_unreachable_article_service_maps_to_502() {
        let reply = combine(
            Err(ProxyError::RouteNotFound("news".to_string())),
            ok_json(TWO_COMMENTS),
        );

        assert_eq!(reply.status, 502);
        let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(body["code"], "bad_gateway");
    }

    #[test]
    fn test_comment_failure_surfaces_not_degrades() {
        let comment_body = r#"{"code":"internal_error","message":"boom"}"#;
        let reply = combine(
            ok_json(r#"{"id":42,"title":"X"}"#),
            upstream(500, comment_body),
        );

        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, comment_body.as_bytes());
    }

    #[test]
    fn test_unparseable_article_payload_is_a_500() {
        let reply = combine(ok_json("<html>oops</html>"), ok_json(TWO_COMMENTS));

        assert_eq!(reply.status, 500);
        let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(body["code"], "invalid_upstream_payload");
    }

    #[test]
    fn test_unknown_article_fields_are_not_round_tripped() {
        let reply = combine(
            ok_json(r#"{"id":42,"title":"X","internal_score":99}"#),
            ok_json(r#"{"comments":[]}"#),
        );

        let merged: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert!(merged["article"].get("internal_score").is_none());
        assert_eq!(merged["comments"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_wrap_proxied_nests_success_json_under_data() {
        let reply = wrap_proxied(UpstreamResponse {
            status: 201,
            content_type: Some("application/json".to_string()),
            body: br#"{"id":7,"status":"pending"}"#.to_vec(),
        });

        assert_eq!(reply.status, 201);
        let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(body["data"]["id"], 7);
    }

    #[test]
    fn test_wrap_proxied_passes_errors_through() {
        let upstream_body = r#"{"code":"validation_error","message":"bad"}"#;
        let reply = wrap_proxied(UpstreamResponse {
            status: 400,
            content_type: Some("application/json".to_string()),
            body: upstream_body.as_bytes().to_vec(),
        });

        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, upstream_body.as_bytes());
    }

    #[test]
    fn test_wrap_proxied_leaves_non_json_untouched() {
        let reply = wrap_proxied(UpstreamResponse {
            status: 200,
            content_type: Some("text/plain".to_string()),
            body: b"pong".to_vec(),
        });

        assert_eq!(reply.body, b"pong");
        assert_eq!(reply.content_type, "text/plain");
    }
}
