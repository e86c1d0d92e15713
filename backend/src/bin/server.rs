//! LifeFlight HTTP Server Binary
//!
//! Loads configuration, installs the snapshot store and serves the dashboard
//! API.
//!
//! # Usage
//!
//! ```bash
//! MISSION_LOG_PATH=data/data.csv PORT=5000 cargo run --bin lifeflight-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 5000)
//! - `MISSION_LOG_PATH`, `CITY_COORDINATES_PATH`: input files
//! - `APP_ENV`: development | production | testing
//! - `RUST_LOG`: Log filter (default: debug in development, info in production)

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lifeflight_metrics::config::AppConfig;
use lifeflight_metrics::data;
use lifeflight_metrics::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.environment.default_log_filter()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting LifeFlight HTTP Server ({})", config.environment);
    info!(
        "Mission log: {}, coordinates: {}",
        config.data.mission_log.display(),
        config.data.city_coordinates.display()
    );

    let store = Arc::clone(data::init_store(config.data.clone()));

    // Load eagerly so bad input shows up in the startup log. The server still
    // starts; views report the error until a reload succeeds.
    let warmup = Arc::clone(&store);
    match tokio::task::spawn_blocking(move || warmup.get()).await? {
        Ok(snapshot) => info!(
            "Snapshot loaded: {} missions, {} cities, {} data-quality warnings",
            snapshot.mission_count(),
            snapshot.cities.len(),
            snapshot.warnings.total()
        ),
        Err(e) => warn!("Initial data load failed: {}", e),
    }

    let state = AppState::new(store, config.heatmap.clone());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on http://{}", addr);
    info!("Liveness check: http://{}/api/test", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
