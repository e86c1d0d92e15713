//! Typed schema for the mission log and the city-coordinate table.
//!
//! Raw rows are validated once at load time; everything downstream works on
//! [`MissionRecord`] and [`CityTable`] and never looks columns up by name.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Bucket name for records without a vehicle type.
pub const UNKNOWN_VEHICLE_TYPE: &str = "unknown";

/// One validated row of the operational mission log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRecord {
    pub mission_id: String,
    pub departure: Option<NaiveDateTime>,
    pub arrival: Option<NaiveDateTime>,
    pub origin_city: Option<String>,
    /// County of the pickup location (the export's second `PU City` column).
    #[serde(default)]
    pub origin_county: Option<String>,
    pub destination_city: Option<String>,
    pub vehicle_id: Option<String>,
    pub vehicle_type: Option<String>,
    /// The departure cell carried a date but no time of day.
    #[serde(default)]
    pub departure_date_only: bool,
    #[serde(default)]
    pub arrival_date_only: bool,
}

impl MissionRecord {
    /// Minimal record with only an identifier; the builder-style setters fill
    /// in the rest.
    pub fn new(mission_id: impl Into<String>) -> Self {
        Self {
            mission_id: mission_id.into(),
            departure: None,
            arrival: None,
            origin_city: None,
            origin_county: None,
            destination_city: None,
            vehicle_id: None,
            vehicle_type: None,
            departure_date_only: false,
            arrival_date_only: false,
        }
    }

    pub fn with_departure(mut self, departure: NaiveDateTime) -> Self {
        self.departure = Some(departure);
        self.departure_date_only = false;
        self
    }

    /// Departure known only to the day.
    pub fn with_departure_date(mut self, date: NaiveDate) -> Self {
        self.departure = Some(date.and_time(NaiveTime::MIN));
        self.departure_date_only = true;
        self
    }

    pub fn with_arrival(mut self, arrival: NaiveDateTime) -> Self {
        self.arrival = Some(arrival);
        self.arrival_date_only = false;
        self
    }

    pub fn with_arrival_date(mut self, date: NaiveDate) -> Self {
        self.arrival = Some(date.and_time(NaiveTime::MIN));
        self.arrival_date_only = true;
        self
    }

    pub fn with_origin(mut self, city: impl Into<String>) -> Self {
        self.origin_city = Some(city.into());
        self
    }

    pub fn with_origin_county(mut self, county: impl Into<String>) -> Self {
        self.origin_county = Some(county.into());
        self
    }

    pub fn with_destination(mut self, city: impl Into<String>) -> Self {
        self.destination_city = Some(city.into());
        self
    }

    pub fn with_vehicle_type(mut self, vehicle_type: impl Into<String>) -> Self {
        self.vehicle_type = Some(vehicle_type.into());
        self
    }

    /// Departure with a known time of day.
    pub fn departure_time(&self) -> Option<NaiveDateTime> {
        self.departure.filter(|_| !self.departure_date_only)
    }

    pub fn arrival_time(&self) -> Option<NaiveDateTime> {
        self.arrival.filter(|_| !self.arrival_date_only)
    }

    /// Elapsed minutes between departure and arrival.
    ///
    /// `None` when either timestamp is missing or date-only, or when the
    /// arrival precedes the departure.
    pub fn response_time_minutes(&self) -> Option<f64> {
        let (departure, arrival) = (self.departure_time()?, self.arrival_time()?);
        if arrival < departure {
            return None;
        }
        Some((arrival - departure).num_seconds() as f64 / 60.0)
    }

    /// Vehicle type, or the `"unknown"` bucket.
    pub fn vehicle_type_or_unknown(&self) -> &str {
        self.vehicle_type.as_deref().unwrap_or(UNKNOWN_VEHICLE_TYPE)
    }
}

/// A column of the mission log, with its canonical header and the headers of
/// the original LifeFlight export that map onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionColumn {
    MissionId,
    Departure,
    Arrival,
    OriginCity,
    OriginCounty,
    DestinationCity,
    VehicleId,
    VehicleType,
}

impl MissionColumn {
    pub const ALL: [MissionColumn; 8] = [
        MissionColumn::MissionId,
        MissionColumn::Departure,
        MissionColumn::Arrival,
        MissionColumn::OriginCity,
        MissionColumn::OriginCounty,
        MissionColumn::DestinationCity,
        MissionColumn::VehicleId,
        MissionColumn::VehicleType,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            MissionColumn::MissionId => "mission_id",
            MissionColumn::Departure => "departure_timestamp",
            MissionColumn::Arrival => "arrival_timestamp",
            MissionColumn::OriginCity => "origin_city",
            MissionColumn::OriginCounty => "origin_county",
            MissionColumn::DestinationCity => "destination_city",
            MissionColumn::VehicleId => "vehicle_id",
            MissionColumn::VehicleType => "vehicle_type",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            MissionColumn::MissionId => &["Incident Number"],
            MissionColumn::Departure => &["tdate", "Departure Time"],
            MissionColumn::Arrival => &["Arrival Time"],
            MissionColumn::OriginCity => &["PU City"],
            MissionColumn::OriginCounty => &["PU City.1", "PU County"],
            MissionColumn::DestinationCity => &["DO City"],
            MissionColumn::VehicleId => &["Vehicle"],
            MissionColumn::VehicleType => &["Vehicle Type"],
        }
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            MissionColumn::MissionId | MissionColumn::Departure | MissionColumn::OriginCity
        )
    }

    /// Whether a (trimmed) CSV header names this column.
    pub fn matches(self, header: &str) -> bool {
        let header = header.trim();
        header == self.canonical_name() || self.aliases().contains(&header)
    }
}

/// Resolved positions of each column within a CSV header row, indexed by
/// `MissionColumn as usize`.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: [Option<usize>; MissionColumn::ALL.len()],
}

impl ColumnIndex {
    /// Resolve header positions. The first matching header wins.
    ///
    /// A repeated header is renamed `NAME.1`, `NAME.2`, ... before matching,
    /// so the export's second `PU City` column resolves as `PU City.1`.
    pub fn resolve<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = ColumnIndex::default();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (pos, header) in headers.into_iter().enumerate() {
            let header = header.trim();
            let repeats = seen.entry(header.to_string()).or_insert(0);
            let name = if *repeats == 0 {
                header.to_string()
            } else {
                format!("{}.{}", header, repeats)
            };
            *repeats += 1;

            for column in MissionColumn::ALL {
                let slot = &mut index.positions[column as usize];
                if slot.is_none() && column.matches(&name) {
                    *slot = Some(pos);
                }
            }
        }
        index
    }

    pub fn position(&self, column: MissionColumn) -> Option<usize> {
        self.positions[column as usize]
    }

    /// Canonical names of required columns that were not found.
    pub fn missing_required(&self) -> Vec<String> {
        MissionColumn::ALL
            .iter()
            .filter(|c| c.is_required() && self.position(**c).is_none())
            .map(|c| c.canonical_name().to_string())
            .collect()
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A parsed timestamp cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Date and time of day.
    At(NaiveDateTime),
    /// Date without a time of day.
    Date(NaiveDate),
}

impl Timestamp {
    pub fn is_date_only(&self) -> bool {
        matches!(self, Timestamp::Date(_))
    }

    /// The instant, with date-only values pinned to midnight.
    pub fn naive(&self) -> NaiveDateTime {
        match *self {
            Timestamp::At(dt) => dt,
            Timestamp::Date(date) => date.and_time(NaiveTime::MIN),
        }
    }
}

/// Parse a timestamp cell.
///
/// Returns `Ok(None)` for an empty cell and `Err` with a short description
/// when the cell is non-empty but matches no supported format. Values with
/// an explicit UTC offset are converted to UTC; values without one are taken
/// as written.
pub fn parse_timestamp(raw: &str) -> Result<Option<Timestamp>, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(Timestamp::At(dt.naive_utc())));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(Timestamp::At(dt)));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(Some(Timestamp::Date(date)));
        }
    }

    Err(format!("unrecognised timestamp '{}'", value))
}

/// Trim a text cell, mapping blank cells to `None`.
pub fn non_empty(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// City name → coordinate lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityTable {
    cities: BTreeMap<String, Coordinate>,
}

impl CityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, city: impl Into<String>, coordinate: Coordinate) {
        self.cities.insert(city.into(), coordinate);
    }

    pub fn get(&self, city: &str) -> Option<Coordinate> {
        self.cities.get(city).copied()
    }

    pub fn contains(&self, city: &str) -> bool {
        self.cities.contains_key(city)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Coordinate)> {
        self.cities.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, Coordinate)> for CityTable {
    fn from_iter<T: IntoIterator<Item = (String, Coordinate)>>(iter: T) -> Self {
        Self {
            cities: iter.into_iter().collect(),
        }
    }
}
