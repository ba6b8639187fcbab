use std::sync::Arc;

use bestiary_events::{NotificationConfig, NotificationDispatcher};
use bestiary_pipeline::CharacterOrchestrator;
use bestiary_providers::{ImageGenerationClient, ProviderConfig, TextGenerationClient};
use bestiary_worker::config::WorkerConfig;
use bestiary_worker::QueueWorker;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bestiary_worker=debug,bestiary_pipeline=debug,bestiary_providers=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        poll_interval_secs = config.poll_interval_secs,
        lease_secs = config.lease_secs,
        max_parse_attempts = config.max_parse_attempts,
        "Loaded worker configuration"
    );
    let provider_config = ProviderConfig::from_env();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = bestiary_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    bestiary_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // --- Providers ---
    let http = provider_config
        .http_client()
        .expect("Failed to build provider HTTP client");
    let text = TextGenerationClient::with_client(http.clone(), &provider_config);
    let image = ImageGenerationClient::with_client(http, &provider_config);
    let orchestrator =
        CharacterOrchestrator::new(Arc::new(text), Arc::new(image), config.orchestrator());

    let mut worker = QueueWorker::new(pool, orchestrator, config.lease_secs);

    // --- Notifications ---
    match NotificationConfig::from_env() {
        Some(notification_config) => {
            let dispatcher = NotificationDispatcher::from_config(notification_config)
                .expect("Failed to build notification dispatcher");
            worker = worker.with_notifier(Arc::new(dispatcher));
            tracing::info!("Notifications enabled");
        }
        None => tracing::info!("No notification channels configured"),
    }

    // --- Run until signalled ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    worker.run(config.poll_interval(), cancel).await;

    tracing::info!("Worker shut down");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), finishing current request");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, finishing current request");
        }
    }
}
