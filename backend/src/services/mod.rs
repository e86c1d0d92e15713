//! Aggregation services.
//!
//! Every `compute_*` / `build_*` function is a pure function of mission
//! records; the matching `get_*` wrapper reads the current snapshot from a
//! [`SnapshotStore`](crate::data::SnapshotStore) first.

pub mod event_impact;
pub mod events;
pub mod heatmap;
pub mod hourly;
pub mod indicators;
pub mod monthly;
pub mod stats;
pub mod vehicles;
pub mod weather_risk;

pub use event_impact::{
    compute_event_impact, get_event_impact, validate_window, EventSelector,
    DEFAULT_WINDOW_MONTHS, MAX_WINDOW_MONTHS,
};
pub use events::{get_events, list_events};
pub use heatmap::{build_heatmap, get_heatmap, map_center, render_heatmap_html};
pub use hourly::{compute_hourly_departures, get_hourly_departures};
pub use indicators::{compute_indicators, count_cities_covered, get_indicators};
pub use monthly::{compute_monthly_missions, get_monthly_missions, in_location};
pub use stats::{summarize, SummaryStats};
pub use vehicles::{compute_vehicle_counts, get_vehicle_counts};
pub use weather_risk::{
    compute_weather_risk, get_weather_risk, validate_quantiles, WeatherRiskOptions,
    DEFAULT_QUANTILES,
};
