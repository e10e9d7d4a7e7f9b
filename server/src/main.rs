use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// Use jemalloc on Linux for reduced fragmentation on long-running servers.
#[cfg(target_os = "linux")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use wayfarer_server::config::ServerConfig;
use wayfarer_server::state::ServerState;
use wayfarer_server::{db, presence, routing};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wayfarer_server=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting Wayfarer server");

    let config = ServerConfig::from_env()?;
    info!("Configuration loaded");

    let db = db::connect(&config).await?;
    info!("Database initialized");

    let sweeper = presence::spawn_sweeper(
        db.clone(),
        config.presence_ttl_seconds,
        Duration::from_secs(config.presence_sweep_seconds),
    );

    let state = Arc::new(ServerState::new(db.clone(), config.clone()));
    let app = routing::create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // Graceful shutdown signal (cross-platform)
    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received, draining connections...");
    };

    info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    sweeper.abort();
    db.close().await;

    info!("Server stopped cleanly");
    Ok(())
}
