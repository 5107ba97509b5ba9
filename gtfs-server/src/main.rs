use gtfs_server::config::ServiceConfig;
use gtfs_server::feed::FeedClient;
use gtfs_server::refresh::RefreshWorker;
use gtfs_server::store::TableStore;
use gtfs_server::web::{AppState, create_router};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env();
    info!(
        url = %config.feed.source_url,
        refresh_secs = config.refresh_interval.as_secs(),
        timeout_secs = config.feed.timeout.as_secs(),
        "starting GTFS schedule server"
    );

    let client = match FeedClient::new(config.feed.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create feed client");
            std::process::exit(1);
        }
    };

    // Tables appear once the first refresh cycle completes; until then the
    // list endpoints answer 404.
    let store = TableStore::new();
    let refresh = RefreshWorker::new(client, store.clone())
        .with_interval(config.refresh_interval)
        .spawn();

    let app = create_router(AppState::new(store));

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "failed to bind");
            refresh.shutdown().await;
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind_addr, "listening");
    info!("  GET  /                       - Liveness message");
    info!("  GET  /routes, /stops, /trips - Table rows");
    info!("  GET  /route/{{id}}/stops       - Ordered stops of a route");
    info!("  GET  /status                 - Refresh status");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = served {
        error!(error = %e, "server error");
    }

    refresh.shutdown().await;
    info!("shut down");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
