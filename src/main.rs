use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use traffic_eye::{router, AppState, Config, LocalStore, Poller};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let storage = LocalStore::open(&config.storage_path).await;
    info!(path = %storage.path().display(), "local storage opened");
    info!(source = ?config.source, backend = %config.api_base_url, "violation source configured");

    let port = config.port;
    let interval = config.refresh_interval;
    let state = AppState::new(config, storage);
    let poller = Poller::start(state.clone(), state.backend.http().clone(), interval);

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
