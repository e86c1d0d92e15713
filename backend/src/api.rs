//! Public API surface for the metrics service.
//!
//! This file consolidates the result types of every dashboard view.
//! All types derive Serialize/Deserialize for JSON serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::models::YearMonth;

/// Unit of every response-time statistic in the indicators view.
pub const RESPONSE_TIME_UNIT: &str = "minutes";

/// Number of hourly buckets in the departure density view.
pub const HOURS_PER_DAY: usize = 24;

// =========================================================
// Indicators
// =========================================================

/// Dashboard overview indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorsData {
    pub total_missions: usize,
    pub cities_covered: usize,
    /// Mean response time in minutes; `None` when no record has both
    /// timestamps.
    pub avg_response_time: Option<f64>,
    /// Median response time in minutes; `None` when no record has both
    /// timestamps.
    pub median_response_time: Option<f64>,
    pub min_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    /// Sample standard deviation; `0.0` for a single sample.
    pub response_time_std: Option<f64>,
    pub response_time_unit: String,
    /// Records contributing to the response-time statistics.
    pub response_time_samples: usize,
}

// =========================================================
// Vehicle counts
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCount {
    pub vehicle_type: String,
    pub count: usize,
}

/// Missions per vehicle type, descending by count then ascending by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCountData {
    pub vehicle_counts: Vec<VehicleCount>,
}

// =========================================================
// Hourly departures
// =========================================================

/// Departures per hour of day; index is the hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyDepartureData {
    pub hourly_counts: [usize; HOURS_PER_DAY],
}

// =========================================================
// Heatmap
// =========================================================

/// Which mission endpoint contributes heatmap weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapCitySource {
    /// Pickup city only.
    #[default]
    Origin,
    Destination,
    /// Origin and destination, counting a round trip within one city once.
    Both,
}

impl FromStr for HeatmapCitySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "origin" => Ok(Self::Origin),
            "destination" => Ok(Self::Destination),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown city source '{}'. Use origin, destination or both.",
                other
            )),
        }
    }
}

impl fmt::Display for HeatmapCitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Origin => "origin",
            Self::Destination => "destination",
            Self::Both => "both",
        })
    }
}

/// One weighted point of the geographic heat layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub weight: usize,
}

/// A city dropped from the heatmap for lack of coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedCity {
    pub city: String,
    pub missions: usize,
}

/// Heatmap points ordered by city name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub points: Vec<HeatmapPoint>,
    pub unresolved_cities: Vec<UnresolvedCity>,
    pub city_source: HeatmapCitySource,
}

// =========================================================
// Location filter
// =========================================================

/// Geographic scope of a monthly series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationLevel {
    /// Every mission.
    #[default]
    System,
    /// Missions picked up in one county.
    County,
    /// Missions picked up in one city.
    City,
}

impl FromStr for LocationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(Self::System),
            "county" => Ok(Self::County),
            "city" => Ok(Self::City),
            other => Err(format!(
                "unknown location level '{}'. Use system, county or city.",
                other
            )),
        }
    }
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::County => "county",
            Self::City => "city",
        })
    }
}

/// Location filter applied to a series. `location_value` is `None` exactly
/// when the level is `system`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub location_level: LocationLevel,
    pub location_value: Option<String>,
}

impl LocationFilter {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn county(county: impl Into<String>) -> Self {
        Self {
            location_level: LocationLevel::County,
            location_value: Some(county.into()),
        }
    }

    pub fn city(city: impl Into<String>) -> Self {
        Self {
            location_level: LocationLevel::City,
            location_value: Some(city.into()),
        }
    }

    /// Filter from a level and a (possibly blank) value. County and city
    /// levels need a value; the system level ignores it.
    pub fn new(level: LocationLevel, value: Option<&str>) -> Result<Self, String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match (level, value) {
            (LocationLevel::System, _) => Ok(Self::system()),
            (LocationLevel::County, Some(v)) => Ok(Self::county(v)),
            (LocationLevel::City, Some(v)) => Ok(Self::city(v)),
            (level, None) => Err(format!("location_value is required for location_level={}", level)),
        }
    }
}

// =========================================================
// Monthly series
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: YearMonth,
    pub mission_count: usize,
}

/// Missions per calendar month, ascending and gap-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyMissionsData {
    pub months: Vec<MonthlyCount>,
    pub location: LocationFilter,
}

// =========================================================
// Closure events
// =========================================================

/// One entry of the event picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: String,
    /// `"{hospital} - {county} ({year})"`.
    pub display_name: String,
    pub county: String,
    pub facility_type: Option<String>,
    pub closure_year: i32,
}

/// Closure events, most recent closure year first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListData {
    pub events: Vec<EventSummary>,
}

/// The closure an impact analysis was run for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub event_id: String,
    pub hospital_name: String,
    pub county: String,
    pub facility_type: Option<String>,
    pub closure_year: i32,
    pub closure_month: u32,
    pub reason: Option<String>,
}

// =========================================================
// Event impact
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPeriod {
    Pre,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Before/after comparison of monthly demand around an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrePostComparison {
    pub pre_period_mean: f64,
    pub post_period_mean: f64,
    pub difference: f64,
    pub percentage_change: f64,
    pub pre_period_std: f64,
    pub post_period_std: f64,
    pub pre_period_n: usize,
    pub post_period_n: usize,
    /// 95% interval of the difference (normal approximation).
    pub confidence_interval: ConfidenceInterval,
}

/// Running excess demand after the event, against the pre-event mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeImpactPoint {
    pub month: YearMonth,
    pub mission_count: usize,
    pub baseline: f64,
    pub excess: f64,
    pub cumulative_excess: f64,
    pub months_since_event: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub month: YearMonth,
    pub mission_count: usize,
    pub period: EventPeriod,
    pub baseline: f64,
}

/// Event impact replay for one event month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImpactData {
    pub event_month: YearMonth,
    pub window_months: u32,
    /// Present when the event was picked from the closure catalog.
    pub event_info: Option<EventInfo>,
    pub location: LocationFilter,
    pub pre_post_comparison: PrePostComparison,
    pub cumulative_impact: Vec<CumulativeImpactPoint>,
    pub timeline: Vec<TimelinePoint>,
}

// =========================================================
// Weather risk
// =========================================================

/// Rule marking a weather month as extreme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremeWeatherMethod {
    /// Precipitation above its 95th percentile.
    #[default]
    Precipitation,
    /// Average temperature above its 95th or below its 5th percentile.
    Temperature,
    /// Either of the above.
    Combined,
}

impl FromStr for ExtremeWeatherMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "precipitation" => Ok(Self::Precipitation),
            "temperature" => Ok(Self::Temperature),
            "combined" => Ok(Self::Combined),
            other => Err(format!(
                "unknown method '{}'. Use precipitation, temperature or combined.",
                other
            )),
        }
    }
}

/// Period over which missions are counted for the weather boxplots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationLevel {
    #[default]
    Day,
    /// Monday-to-Sunday weeks.
    Week,
    Month,
}

impl FromStr for AggregationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!(
                "unknown aggregation level '{}'. Use day, week or month.",
                other
            )),
        }
    }
}

/// Distribution of per-period mission counts within one weather stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBoxplot {
    /// Stratum label, e.g. `"Q1 (0.0-25.0%)"` or `"Q5 (100.0%+)"`.
    pub quantile: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub count: usize,
    /// Counts beyond 1.5 IQR from the quartiles.
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRiskMetadata {
    pub method: ExtremeWeatherMethod,
    pub aggregation_level: AggregationLevel,
    pub quantiles: Vec<f64>,
    pub n_quantiles: usize,
}

/// Mission demand stratified by extreme-weather frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRiskData {
    /// Sorted by label.
    pub boxplot_data: Vec<WeatherBoxplot>,
    pub metadata: WeatherRiskMetadata,
}
