use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsroom::config::Settings;
use newsroom::gateway::handlers::{configure, GatewayState};
use newsroom::gateway::{
    Aggregator, ProxyClient, Route, RouteRegistry, COMMENTS_ROUTE, NEWS_ROUTE,
};
use newsroom::metrics::Metrics;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,newsroom=debug")),
        )
        .init();

    let settings = Settings::new()?;
    tracing::info!("🚀 Starting api-gateway");

    let metrics = Arc::new(Metrics::new()?);
    let registry = Arc::new(RouteRegistry::new(vec![
        Route {
            name: NEWS_ROUTE.to_string(),
            base_url: settings.gateway.news_base_url.clone(),
            health_path: "/health".to_string(),
        },
        Route {
            name: COMMENTS_ROUTE.to_string(),
            base_url: settings.gateway.comments_base_url.clone(),
            health_path: "/health".to_string(),
        },
    ]));
    let client = Arc::new(ProxyClient::new(Duration::from_secs(
        settings.gateway.timeout_seconds,
    ))?);

    let state = web::Data::new(GatewayState {
        aggregator: Aggregator::new(client.clone(), registry.clone(), metrics.clone()),
        client,
        registry,
        metrics,
    });

    let bind = (settings.gateway.host.clone(), settings.gateway.port);
    tracing::info!("📡 Gateway listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(bind)?
        .run()
        .await?;

    Ok(())
}
