//! Monthly weather observations for the weather-risk view.
//!
//! The CSV carries one row per month with the columns `Month` (written
//! `"January, 2020"`), `AvgTemp`, `MinTemp`, `MaxTemp` and `Precip`.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::info;

use super::error::{DataLoadError, DataLoadResult};
use crate::models::YearMonth;

/// One weather row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    pub month: YearMonth,
    pub avg_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub precip: Option<f64>,
}

impl WeatherObservation {
    pub fn new(month: YearMonth) -> Self {
        Self {
            month,
            avg_temp: None,
            min_temp: None,
            max_temp: None,
            precip: None,
        }
    }
}

/// Weather rows in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherTable {
    pub observations: Vec<WeatherObservation>,
}

impl WeatherTable {
    pub fn new(observations: Vec<WeatherObservation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawWeather {
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "AvgTemp", default)]
    avg_temp: Option<f64>,
    #[serde(rename = "MinTemp", default)]
    min_temp: Option<f64>,
    #[serde(rename = "MaxTemp", default)]
    max_temp: Option<f64>,
    #[serde(rename = "Precip", default)]
    precip: Option<f64>,
}

/// Parse `"January, 2020"`, `"Jan, 2020"` or `"2020-01"`.
pub fn parse_weather_month(raw: &str) -> Option<YearMonth> {
    let value = raw.trim();
    if let Ok(month) = value.parse::<YearMonth>() {
        return Some(month);
    }
    let date = NaiveDate::parse_from_str(&format!("1 {}", value), "%d %B, %Y").ok()?;
    YearMonth::new(date.year(), date.month())
}

/// Parse weather CSV text. `path` is only used in diagnostics.
pub fn parse_weather(text: &str, path: &Path) -> DataLoadResult<WeatherTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut observations = Vec::new();
    for (i, result) in reader.deserialize::<RawWeather>().enumerate() {
        let raw = result.map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let month = parse_weather_month(&raw.month).ok_or_else(|| DataLoadError::MalformedRow {
            path: path.to_path_buf(),
            row: i + 1,
            column: "Month".to_string(),
            message: format!("unrecognised month '{}'", raw.month),
        })?;

        observations.push(WeatherObservation {
            month,
            avg_temp: raw.avg_temp,
            min_temp: raw.min_temp,
            max_temp: raw.max_temp,
            precip: raw.precip,
        });
    }

    info!(
        "Loaded {} weather observations from {}",
        observations.len(),
        path.display()
    );
    Ok(WeatherTable::new(observations))
}
