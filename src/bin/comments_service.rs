use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsroom::config::Settings;
use newsroom::events::COMMENT_MODERATED_TOPIC;
use newsroom::http::{configure, AppState};
use newsroom::messaging::{KafkaConsumer, KafkaPublisher};
use newsroom::metrics::Metrics;
use newsroom::repo::PgCommentRepository;
use newsroom::workflow::{CreateCommentWorkflow, StatusUpdateWorkflow, ThreadViewWorkflow};

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
    tracing::info!("🚀 Starting comments-service");

    // === 1. Datastore ===
    tracing::info!("Connecting to Postgres...");
    let repo = Arc::new(
        PgCommentRepository::connect(&settings.database.url, settings.database.max_connections)
            .await?,
    );
    repo.init_schema().await?;

    // === 2. Metrics and Kafka producer ===
    let metrics = Arc::new(Metrics::new()?);
    let publisher = Arc::new(KafkaPublisher::new(&settings.kafka.brokers)?);

    // === 3. Verdict consumer ===
    let status_updates = Arc::new(StatusUpdateWorkflow::new(repo.clone(), metrics.clone()));
    let consumer = KafkaConsumer::new(
        &settings.kafka.brokers,
        "comments-service",
        COMMENT_MODERATED_TOPIC,
        status_updates,
        metrics.clone(),
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_handle = tokio::spawn(consumer.run(shutdown_rx));

    // === 4. HTTP API ===
    let state = web::Data::new(AppState {
        create: CreateCommentWorkflow::new(repo.clone(), publisher, metrics.clone()),
        thread: ThreadViewWorkflow::new(repo),
        metrics,
    });

    let bind = (settings.http.host.clone(), settings.http.port);
    tracing::info!("📡 Listening on http://{}:{}", bind.0, bind.1);

    let server_result =
        match HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
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
