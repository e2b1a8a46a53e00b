use post_service::config::{Config, StorageDriver};
use post_service::store::{MemoryPostStore, PgPostStore};
use post_service::{api, telemetry, PostController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = Config::load()?;
    tracing::info!(?config, "Configuration loaded successfully");

    let app = match config.database.driver {
        StorageDriver::Postgres => {
            let store = PgPostStore::connect(&config.database).await?;
            if config.database.run_migrations {
                store.run_migrations().await?;
            }
            api::router(PostController::new(store, &config.api))
        }
        StorageDriver::Memory => {
            tracing::warn!("Using the in-memory store; posts are lost on restart");
            api::router(PostController::new(MemoryPostStore::new(), &config.api))
        }
    };

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
