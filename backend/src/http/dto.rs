//! Data Transfer Objects for the HTTP API.
//!
//! Aggregation results are re-exported from [`crate::api`]; this module adds
//! the service-level envelopes and query parameter types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::api::{
    EventImpactData, EventListData, HeatmapData, HourlyDepartureData, IndicatorsData,
    MonthlyMissionsData, VehicleCountData, WeatherRiskData,
};
use crate::data::{LoadWarnings, Snapshot};

pub const SERVICE_NAME: &str = "LifeFlight Backend API";
pub const API_VERSION: &str = "1.0.0";

/// Root endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

/// Snapshot state reported by the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotStatus {
    /// Whether a snapshot has been loaded yet
    pub loaded: bool,
    /// Missions in the current snapshot (0 before the first load)
    pub missions: usize,
    pub loaded_at: Option<DateTime<Utc>>,
    /// SHA-256 of the loaded files; changes exactly when their content does
    pub checksum: Option<String>,
    /// Closure events available to the event picker
    pub closure_events: usize,
    /// Whether a weather table is loaded
    pub weather: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<LoadWarnings>,
}

impl SnapshotStatus {
    pub fn from_snapshot(snapshot: Option<&Snapshot>) -> Self {
        match snapshot {
            Some(s) => Self {
                loaded: true,
                missions: s.mission_count(),
                loaded_at: Some(s.loaded_at),
                checksum: Some(s.checksum.clone()),
                closure_events: s.events.len(),
                weather: s.weather.is_some(),
                warnings: Some(s.warnings.clone()),
            },
            None => Self {
                loaded: false,
                missions: 0,
                loaded_at: None,
                checksum: None,
                closure_events: 0,
                weather: false,
                warnings: None,
            },
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub data: SnapshotStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPayload {
    /// Server time, RFC 3339
    pub timestamp: String,
    pub test: bool,
}

/// Liveness check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResponse {
    pub message: String,
    pub data: TestPayload,
}

/// Response for a successful reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub status: String,
    pub missions: usize,
    pub cities: usize,
    pub closure_events: usize,
    pub loaded_at: DateTime<Utc>,
    /// Compare with the previous value to tell whether the data changed
    pub checksum: String,
    pub warnings: LoadWarnings,
}

/// Query parameters for the heatmap endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeatmapQuery {
    /// `json` (default) or `html`
    #[serde(default)]
    pub format: Option<String>,
    /// `origin` (default), `destination` or `both`
    #[serde(default)]
    pub cities: Option<String>,
}

/// Location parameters shared by the monthly and event impact endpoints.
///
/// `city` and `county` are shorthands for `location_level` plus
/// `location_value`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationQuery {
    /// `system`, `county` or `city`
    #[serde(default)]
    pub location_level: Option<String>,
    #[serde(default)]
    pub location_value: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
}

/// Query parameters for the monthly series endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonthlyQuery {
    #[serde(flatten)]
    pub location: LocationQuery,
}

/// Query parameters for the event impact endpoint.
///
/// Values are kept as strings so malformed input is reported in the API's
/// own error format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventImpactQuery {
    /// Closure from `/api/events`; exclusive with `event_month`
    #[serde(default)]
    pub event_id: Option<String>,
    /// Event month, `YYYY-MM`; exclusive with `event_id`
    #[serde(default)]
    pub event_month: Option<String>,
    /// Months on each side of the event (default: 12)
    #[serde(default)]
    pub window_months: Option<String>,
    #[serde(flatten)]
    pub location: LocationQuery,
}

/// Query parameters for the weather risk endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherRiskQuery {
    /// `precipitation` (default), `temperature` or `combined`
    #[serde(default)]
    pub method: Option<String>,
    /// `day` (default), `week` or `month`
    #[serde(default)]
    pub aggregation_level: Option<String>,
    /// Comma-separated cut points, e.g. `0,0.25,0.5,0.75,1`
    #[serde(default)]
    pub quantiles: Option<String>,
}
