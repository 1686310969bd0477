use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use portfolio_api::config::AppConfig;
use portfolio_api::storage::{HttpObjectStorage, ObjectStorage};
use portfolio_api::store::Store;
use portfolio_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends.
    let _ = dotenvy::dotenv();

    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Arc::new(AppConfig::from_env());
    info!("starting portfolio-api in {:?} mode", config.environment);

    let store = Store::connect(&config.database).await?;
    store.migrate().await?;

    let storage: Arc<dyn ObjectStorage> = Arc::new(HttpObjectStorage::from_config(&config.upload));

    let state = AppState {
        config: config.clone(),
        store: store.clone(),
        storage,
    };
    let router = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
