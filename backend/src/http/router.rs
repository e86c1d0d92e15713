//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The dashboard is served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/test", get(handlers::test_connection))
        .route("/reload", post(handlers::reload))
        .route("/indicators", get(handlers::get_indicators))
        .route("/veh_count", get(handlers::get_vehicle_counts))
        .route("/hourly_departure", get(handlers::get_hourly_departures))
        .route("/heatmap", get(handlers::get_heatmap))
        .route("/monthly_missions", get(handlers::get_monthly_missions))
        .route("/events", get(handlers::get_events))
        .route("/event_impact", get(handlers::get_event_impact))
        .route("/weather_risk", get(handlers::get_weather_risk));

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeatmapSettings;
    use crate::data::{CityTable, Snapshot, SnapshotStore};
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let store = SnapshotStore::from_snapshot(Snapshot::from_parts(vec![], CityTable::new()));
        let state = AppState::new(Arc::new(store), HeatmapSettings::default());
        let _router = create_router(state);
    }
}
