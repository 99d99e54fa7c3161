use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsroom::config::Settings;
use newsroom::events::COMMENT_CREATED_TOPIC;
use newsroom::messaging::{KafkaConsumer, KafkaPublisher};
use newsroom::metrics::Metrics;
use newsroom::moderation::ModerationWorkflow;

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
    tracing::info!("🚀 Starting moderation-service");

    let metrics = Arc::new(Metrics::new()?);
    let publisher = Arc::new(KafkaPublisher::new(&settings.kafka.brokers)?);

    let workflow = Arc::new(ModerationWorkflow::new(publisher, metrics.clone()));
    let consumer = KafkaConsumer::new(
        &settings.kafka.brokers,
        "moderation-service",
        COMMENT_CREATED_TOPIC,
        workflow,
        metrics.clone(),
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_handle = tokio::spawn(consumer.run(shutdown_rx));

    // Small HTTP surface for probes and scraping only.
    let bind = (settings.http.host.clone(), settings.http.port);
    tracing::info!("📊 Health and metrics on http://{}:{}", bind.0, bind.1);

    let state = web::Data::new(metrics);
    let server_result = match HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health))
            .route("/metrics", web::get().to(metrics_handler))
    })
    .bind(bind)
    {
        Ok(server) => server.run().await,
        Err(e) => Err(e),
    };

    // Drain the consumer whether the server stopped cleanly or failed.
    let _ = shutdown_tx.send(true);
    let _ = consumer_handle.await;

    server_result?;
    Ok(())
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "moderation-service"
    }))
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metrics.registry().gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}
