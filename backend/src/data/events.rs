//! Hospital-closure event catalog.
//!
//! Read from a CSV with the columns `hospital_name, county, facility_type,
//! closure_year, closure_date, reason, status`. Only rows with a hospital
//! name, a closure year and a `Closed` or `Sold` status become events.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{DataLoadError, DataLoadResult};
use super::schema::non_empty;
use crate::models::YearMonth;

/// Statuses that mark a completed closure.
pub const CLOSURE_STATUSES: [&str; 2] = ["Closed", "Sold"];

/// Month used when the closure date is unknown.
pub const DEFAULT_CLOSURE_MONTH: u32 = 6;

/// A hospital closure usable as the event of an impact analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureEvent {
    /// `"{hospital} ({county}, {year})"`.
    pub event_id: String,
    pub hospital_name: String,
    pub county: String,
    pub facility_type: Option<String>,
    pub closure_year: i32,
    pub closure_month: u32,
    pub reason: Option<String>,
    pub status: String,
}

impl ClosureEvent {
    pub fn new(hospital_name: &str, county: &str, closure_year: i32, closure_month: u32) -> Self {
        Self {
            event_id: format!("{} ({}, {})", hospital_name, county, closure_year),
            hospital_name: hospital_name.to_string(),
            county: county.to_string(),
            facility_type: None,
            closure_year,
            closure_month,
            reason: None,
            status: CLOSURE_STATUSES[0].to_string(),
        }
    }

    /// `"{hospital} - {county} ({year})"`, as listed in the event picker.
    pub fn display_name(&self) -> String {
        format!(
            "{} - {} ({})",
            self.hospital_name, self.county, self.closure_year
        )
    }

    pub fn month(&self) -> Option<YearMonth> {
        YearMonth::new(self.closure_year, self.closure_month)
    }
}

/// Closure events in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCatalog {
    events: Vec<ClosureEvent>,
}

impl EventCatalog {
    pub fn new(events: Vec<ClosureEvent>) -> Self {
        Self { events }
    }

    /// First event with this identifier.
    pub fn find(&self, event_id: &str) -> Option<&ClosureEvent> {
        self.events.iter().find(|e| e.event_id == event_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClosureEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawClosure {
    #[serde(default)]
    hospital_name: String,
    #[serde(default)]
    county: String,
    #[serde(default)]
    facility_type: String,
    #[serde(default)]
    closure_year: String,
    #[serde(default)]
    closure_date: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    status: String,
}

/// Accepts `2015` as well as the `2015.0` a spreadsheet export writes.
fn parse_year(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|y| y.fract() == 0.0 && y.abs() < 10_000.0)
            .map(|y| y as i32)
    })
}

/// Month from a `YYYY-MM-DD` closure date, or [`DEFAULT_CLOSURE_MONTH`].
fn closure_month(date: &str) -> u32 {
    date.split('-')
        .nth(1)
        .and_then(|m| m.trim().parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m))
        .unwrap_or(DEFAULT_CLOSURE_MONTH)
}

/// Parse closure-catalog CSV text. `path` is only used in diagnostics.
pub fn parse_closure_events(text: &str, path: &Path) -> DataLoadResult<EventCatalog> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut events = Vec::new();
    for (i, result) in reader.deserialize::<RawClosure>().enumerate() {
        let row = i + 1;
        let raw = result.map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let (Some(hospital_name), Some(year)) =
            (non_empty(&raw.hospital_name), non_empty(&raw.closure_year))
        else {
            continue;
        };
        if !CLOSURE_STATUSES.contains(&raw.status.as_str()) {
            continue;
        }

        let closure_year = parse_year(&year).ok_or_else(|| DataLoadError::MalformedRow {
            path: path.to_path_buf(),
            row,
            column: "closure_year".to_string(),
            message: format!("'{}' is not a year", year),
        })?;

        let mut event = ClosureEvent::new(
            &hospital_name,
            &raw.county,
            closure_year,
            closure_month(&raw.closure_date),
        );
        event.facility_type = non_empty(&raw.facility_type);
        event.reason = non_empty(&raw.reason);
        event.status = raw.status;
        events.push(event);
    }

    info!("Loaded {} closure events from {}", events.len(), path.display());
    Ok(EventCatalog::new(events))
}
