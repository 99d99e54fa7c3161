use actix_web::{web, HttpRequest, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};
use reqwest::Method;
use std::sync::Arc;

use crate::metrics::Metrics;

use super::aggregator::{wrap_proxied, Aggregator, GatewayResponse};
use super::client::{InboundContext, ProxyClient, ProxyError};
use super::registry::{RouteRegistry, COMMENTS_ROUTE};

// ============================================================================
// Gateway HTTP Handlers
// ============================================================================

pub struct GatewayState {
    pub aggregator: Aggregator,
    pub client: Arc<ProxyClient>,
    pub registry: Arc<RouteRegistry>,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/articles/{id}", web::get().to(article_with_comments))
        .route("/comments", web::post().to(proxy_create_comment))
        .route("/comments", web::get().to(proxy_list_comments))
        .route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics));
}

fn inbound_context(req: &HttpRequest) -> InboundContext {
    let request_id = req
        .headers()
        .get("X-Request-ID")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let headers = req
        .headers()
        .iter()
        .filter(|(name, _)| !name.as_str().eq_ignore_ascii_case("host"))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    InboundContext {
        request_id,
        headers,
    }
}

fn respond(reply: GatewayResponse) -> HttpResponse {
    let status = actix_web::http::StatusCode::from_u16(reply.status)
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status)
        .content_type(reply.content_type)
        .body(reply.body)
}

async fn article_with_comments(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<GatewayState>,
) -> impl Responder {
    let ctx = inbound_context(&req);
    let article_id = path.into_inner();

    tracing::info!(
        request_id = %ctx.request_id,
        article_id = %article_id,
        "Aggregating article with comments"
    );

    respond(state.aggregator.article_with_comments(&article_id, &ctx).await)
}

async fn proxy_create_comment(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<GatewayState>,
) -> impl Responder {
    proxy_to_comments(&req, Method::POST, "/comments", Some(body.to_vec()), &state).await
}

async fn proxy_list_comments(req: HttpRequest, state: web::Data<GatewayState>) -> impl Responder {
    let path = match req.query_string() {
        "" => "/comments".to_string(),
        query => format!("/comments?{query}"),
    };
    proxy_to_comments(&req, Method::GET, &path, None, &state).await
}

async fn proxy_to_comments(
    req: &HttpRequest,
    method: Method,
    path_and_query: &str,
    body: Option<Vec<u8>>,
    state: &web::Data<GatewayState>,
) -> HttpResponse {
    let ctx = inbound_context(req);

    let Some(route) = state.registry.lookup(COMMENTS_ROUTE) else {
        return respond(GatewayResponse::error(
            500,
            "route_not_configured",
            "upstream service route missing",
        ));
    };

    let url = format!("{}{}", route.base_url, path_and_query);
    let result = state.client.forward(method, &url, &ctx, body).await;

    let outcome = match &result {
        Ok(response) if response.is_success() => "ok",
        Ok(_) => "http_error",
        Err(_) => "unreachable",
    };
    state
        .metrics
        .gateway_upstream_responses
        .with_label_values(&[COMMENTS_ROUTE, outcome])
        .inc();

    match result {
        Ok(upstream) => respond(wrap_proxied(upstream)),
        Err(e @ ProxyError::Unreachable(_)) => {
            tracing::error!(request_id = %ctx.request_id, url = %url, error = %e, "Upstream unreachable");
            respond(GatewayResponse::error(502, "bad_gateway", &e.to_string()))
        }
        Err(e) => respond(GatewayResponse::error(500, "gateway_error", &e.to_string())),
    }
}

/// Reports the gateway as healthy and probes each configured upstream's
/// health endpoint. Upstream failures are reported, not fatal.
async fn health(req: HttpRequest, state: web::Data<GatewayState>) -> impl Responder {
    let ctx = inbound_context(&req);
    let mut upstreams = serde_json::Map::new();

    for route in state.registry.all() {
        let probe = state
            .client
            .forward(Method::GET, &route.health_url(), &ctx, None)
            .await;
        let status = match probe {
            Ok(response) if response.is_success() => "healthy",
            Ok(_) => "unhealthy",
            Err(_) => "unreachable",
        };
        upstreams.insert(route.name.clone(), status.into());
    }

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "api-gateway",
        "upstreams": upstreams
    }))
}

async fn metrics(state: web::Data<GatewayState>) -> impl Responder {
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
