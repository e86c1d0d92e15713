//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer. The first snapshot access reads the input files, so
//! service calls run on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::Uri,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};

use super::dto::{
    EventImpactData, EventImpactQuery, EventListData, HealthResponse, HeatmapQuery,
    HourlyDepartureData, IndexResponse, IndicatorsData, LocationQuery, MonthlyMissionsData,
    MonthlyQuery, ReloadResponse, SnapshotStatus, TestPayload, TestResponse, VehicleCountData,
    WeatherRiskData, WeatherRiskQuery, API_VERSION, SERVICE_NAME,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    AggregationLevel, ExtremeWeatherMethod, HeatmapCitySource, LocationFilter, LocationLevel,
    YearMonth,
};
use crate::data::{DataLoadResult, SnapshotStore};
use crate::services::{self, EventSelector, WeatherRiskOptions};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Run a store-backed service call on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&SnapshotStore) -> DataLoadResult<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    let data = tokio::task::spawn_blocking(move || f(store.as_ref())).await??;
    Ok(data)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an optional enum-valued query parameter.
fn parse_param<T>(raw: &Option<String>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    non_blank(raw)
        .map(|v| v.parse::<T>().map_err(AppError::BadRequest))
        .transpose()
}

/// Location filter from the query, or `None` when none was given.
///
/// With `county_defaults`, `location_level=county` without a value also
/// yields `None` so the caller can fill in a default county.
fn location_from_query(
    query: &LocationQuery,
    county_defaults: bool,
) -> Result<Option<LocationFilter>, AppError> {
    let level = parse_param::<LocationLevel>(&query.location_level)?;
    let value = non_blank(&query.location_value);

    match (non_blank(&query.city), non_blank(&query.county)) {
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "city and county cannot be combined".to_string(),
            ))
        }
        (Some(city), None) => return Ok(Some(LocationFilter::city(city))),
        (None, Some(county)) => return Ok(Some(LocationFilter::county(county))),
        (None, None) => {}
    }

    match level {
        None => Ok(None),
        Some(LocationLevel::County) if value.is_none() && county_defaults => Ok(None),
        Some(level) => LocationFilter::new(level, value)
            .map(Some)
            .map_err(AppError::BadRequest),
    }
}

// =============================================================================
// Service status
// =============================================================================

/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        status: "success".to_string(),
        message: "LifeFlight API is running".to_string(),
        version: API_VERSION.to_string(),
    })
}

/// GET /api/health
///
/// Reports whether a snapshot is loaded without triggering a load.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.peek();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        data: SnapshotStatus::from_snapshot(snapshot.as_deref()),
    })
}

/// GET /api/test
///
/// Liveness check. Never touches the data files.
pub async fn test_connection() -> Json<TestResponse> {
    Json(TestResponse {
        message: "Backend is working correctly".to_string(),
        data: TestPayload {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            test: true,
        },
    })
}

/// POST /api/reload
///
/// Re-read the input files. On failure the previous snapshot keeps serving.
pub async fn reload(State(state): State<AppState>) -> HandlerResult<ReloadResponse> {
    let store = Arc::clone(&state.store);
    let snapshot = tokio::task::spawn_blocking(move || store.reload()).await??;

    Ok(Json(ReloadResponse {
        status: "reloaded".to_string(),
        missions: snapshot.mission_count(),
        cities: snapshot.cities.len(),
        closure_events: snapshot.events.len(),
        loaded_at: snapshot.loaded_at,
        checksum: snapshot.checksum.clone(),
        warnings: snapshot.warnings.clone(),
    }))
}

// =============================================================================
// Dashboard views
// =============================================================================

/// GET /api/indicators
pub async fn get_indicators(State(state): State<AppState>) -> HandlerResult<IndicatorsData> {
    let data = run_blocking(&state, services::get_indicators).await?;
    Ok(Json(data))
}

/// GET /api/veh_count
pub async fn get_vehicle_counts(State(state): State<AppState>) -> HandlerResult<VehicleCountData> {
    let data = run_blocking(&state, services::get_vehicle_counts).await?;
    Ok(Json(data))
}

/// GET /api/hourly_departure
pub async fn get_hourly_departures(
    State(state): State<AppState>,
) -> HandlerResult<HourlyDepartureData> {
    let data = run_blocking(&state, services::get_hourly_departures).await?;
    Ok(Json(data))
}

/// GET /api/heatmap
///
/// JSON points by default; `?format=html` renders a standalone map page.
pub async fn get_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Response, AppError> {
    let source = match query.cities.as_deref() {
        Some(raw) => raw
            .parse::<HeatmapCitySource>()
            .map_err(AppError::BadRequest)?,
        None => HeatmapCitySource::default(),
    };
    let as_html = match query.format.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("json") => false,
        Some("html") => true,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "unknown format '{}'. Use json or html.",
                other
            )))
        }
    };

    let data = run_blocking(&state, move |store| services::get_heatmap(store, source)).await?;

    if as_html {
        Ok(Html(services::render_heatmap_html(&data, &state.heatmap)).into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// GET /api/monthly_missions
///
/// Whole system by default; `?city=`, `?county=` or
/// `?location_level=&location_value=` narrow it to one pickup location.
pub async fn get_monthly_missions(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> HandlerResult<MonthlyMissionsData> {
    let location = location_from_query(&query.location, false)?.unwrap_or_default();
    let data = run_blocking(&state, move |store| {
        services::get_monthly_missions(store, &location)
    })
    .await?;
    Ok(Json(data))
}

/// GET /api/events
///
/// Hospital closures usable as `event_id`, most recent first.
pub async fn get_events(State(state): State<AppState>) -> HandlerResult<EventListData> {
    let data = run_blocking(&state, services::get_events).await?;
    Ok(Json(data))
}

/// GET /api/event_impact
///
/// Pre/post comparison of monthly demand around a closure (`event_id`) or a
/// bare `event_month`. A closure's series defaults to its county.
pub async fn get_event_impact(
    State(state): State<AppState>,
    Query(query): Query<EventImpactQuery>,
) -> HandlerResult<EventImpactData> {
    let event = match (non_blank(&query.event_id), non_blank(&query.event_month)) {
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "event_id and event_month cannot be combined".to_string(),
            ))
        }
        (Some(id), None) => EventSelector::Closure(id.to_string()),
        (None, Some(month)) => {
            EventSelector::Month(month.parse::<YearMonth>().map_err(AppError::BadRequest)?)
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "event_id or event_month (YYYY-MM) is required".to_string(),
            ))
        }
    };

    let window_months = match non_blank(&query.window_months) {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            AppError::BadRequest(format!("window_months must be an integer, got '{}'", raw))
        })?,
        None => services::DEFAULT_WINDOW_MONTHS,
    };
    let window_months = services::validate_window(window_months).map_err(AppError::BadRequest)?;
    let location = location_from_query(&query.location, true)?;

    let lookup = event.clone();
    let data = run_blocking(&state, move |store| {
        services::get_event_impact(store, &lookup, window_months, location)
    })
    .await?;

    match (data, event) {
        (Some(data), _) => Ok(Json(data)),
        (None, EventSelector::Closure(id)) => {
            Err(AppError::NotFound(format!("Event not found: {}", id)))
        }
        (None, EventSelector::Month(month)) => Err(AppError::Internal(format!(
            "no impact computed for {}",
            month
        ))),
    }
}

/// GET /api/weather_risk
///
/// Boxplots of mission counts per extreme-weather stratum.
pub async fn get_weather_risk(
    State(state): State<AppState>,
    Query(query): Query<WeatherRiskQuery>,
) -> HandlerResult<WeatherRiskData> {
    let mut options = WeatherRiskOptions::default();
    if let Some(method) = parse_param::<ExtremeWeatherMethod>(&query.method)? {
        options.method = method;
    }
    if let Some(level) = parse_param::<AggregationLevel>(&query.aggregation_level)? {
        options.aggregation_level = level;
    }
    if let Some(raw) = non_blank(&query.quantiles) {
        let cuts = raw
            .split(',')
            .map(|q| {
                q.trim().parse::<f64>().map_err(|_| {
                    AppError::BadRequest(format!("quantiles must be numbers, got '{}'", q))
                })
            })
            .collect::<Result<Vec<f64>, AppError>>()?;
        options.quantiles = services::validate_quantiles(&cuts).map_err(AppError::BadRequest)?;
    }

    let data = run_blocking(&state, move |store| {
        services::get_weather_risk(store, &options)
    })
    .await?;

    data.map(Json).ok_or_else(|| {
        AppError::NotFound(
            "No weather data loaded. Configure data.weather or WEATHER_PATH.".to_string(),
        )
    })
}

// =============================================================================
// Fallback
// =============================================================================

/// Any unmatched path.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
