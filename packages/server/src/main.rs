use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vidhub_server::config::AppConfig;
use vidhub_server::state::AppState;
use vidhub_server::utils::media::MediaGateway;
use vidhub_server::{build_router, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::acquire(&config.database)
        .await
        .context("Failed to connect to database")?;
    database::ensure_indexes(db)
        .await
        .context("Failed to create database indexes")?;

    let media = MediaGateway::from_config(&config.storage)
        .await
        .context("Failed to initialize media storage")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db: db.clone(),
        config,
        media,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
