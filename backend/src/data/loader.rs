//! Reading the mission log (CSV), the city-coordinate table (JSON) and the
//! optional closure catalog and weather table (CSV).
//!
//! Every file is validated against the typed schema in [`super::schema`].
//! Anything that prevents a faithful load is a [`DataLoadError`]; per-record
//! gaps (missing arrival, unknown vehicle type, ...) are counted as warnings.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::checksum::calculate_checksum;
use super::error::{DataLoadError, DataLoadResult, DataQualityWarning, LoadWarnings};
use super::events::{parse_closure_events, EventCatalog};
use super::schema::{
    non_empty, parse_timestamp, CityTable, ColumnIndex, Coordinate, MissionColumn, MissionRecord,
};
use super::snapshot::Snapshot;
use super::weather::parse_weather;
use crate::config::DataSources;

/// Parsed mission log with the warnings raised along the way.
#[derive(Debug, Clone, Default)]
pub struct MissionLog {
    pub records: Vec<MissionRecord>,
    pub warnings: LoadWarnings,
}

/// Decoded content of an input file.
#[derive(Debug, Clone, Default)]
pub struct TextFile {
    pub text: String,
    /// One `Latin1Line` warning per line that was not valid UTF-8.
    pub warnings: Vec<DataQualityWarning>,
}

/// Read a file as text. Lines that are not valid UTF-8 are decoded as
/// Latin-1, the encoding of the original dispatch exports; valid lines are
/// kept as UTF-8.
pub fn read_text(path: &Path) -> DataLoadResult<TextFile> {
    if !path.exists() {
        return Err(DataLoadError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let file = decode_text(bytes);
    if !file.warnings.is_empty() {
        warn!(
            "{}: {} line(s) are not valid UTF-8 and were decoded as Latin-1",
            path.display(),
            file.warnings.len()
        );
    }
    Ok(file)
}

/// Read an optional input. A configured file that does not exist is logged
/// and treated as absent.
fn read_optional(path: Option<&Path>) -> DataLoadResult<Option<(&Path, TextFile)>> {
    let Some(path) = path else {
        return Ok(None);
    };
    match read_text(path) {
        Ok(file) => Ok(Some((path, file))),
        Err(DataLoadError::MissingFile { .. }) => {
            warn!("Optional data file {} not found, skipping", path.display());
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn decode_text(bytes: Vec<u8>) -> TextFile {
    let bytes = match String::from_utf8(bytes) {
        Ok(text) => {
            return TextFile {
                text,
                warnings: Vec::new(),
            }
        }
        Err(err) => err.into_bytes(),
    };

    // A newline byte never occurs inside a multi-byte UTF-8 sequence, so
    // each line can be decoded on its own.
    let mut file = TextFile {
        text: String::with_capacity(bytes.len()),
        warnings: Vec::new(),
    };
    for (i, line) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
        match std::str::from_utf8(line) {
            Ok(valid) => file.text.push_str(valid),
            Err(_) => {
                file.text.extend(line.iter().copied().map(char::from));
                file.warnings.push(DataQualityWarning::Latin1Line { line: i + 1 });
            }
        }
    }
    file
}

/// Load and validate the mission log at `path`.
pub fn load_missions(path: &Path) -> DataLoadResult<MissionLog> {
    let file = read_text(path)?;
    let mut log = parse_missions(&file.text, path)?;
    for warning in &file.warnings {
        log.warnings.record(warning);
    }
    Ok(log)
}

/// Parse mission-log CSV text. `path` is only used in diagnostics.
pub fn parse_missions(text: &str, path: &Path) -> DataLoadResult<MissionLog> {
    let csv_error = |source| DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    let index = ColumnIndex::resolve(headers.iter());
    let missing = index.missing_required();
    if !missing.is_empty() {
        return Err(DataLoadError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let mut log = MissionLog::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(csv_error)?;
        let cell = |column: MissionColumn| {
            index
                .position(column)
                .and_then(|pos| record.get(pos))
                .unwrap_or("")
        };
        let malformed = |column: MissionColumn, message: String| DataLoadError::MalformedRow {
            path: path.to_path_buf(),
            row,
            column: column.canonical_name().to_string(),
            message,
        };

        let mission_id = non_empty(cell(MissionColumn::MissionId)).ok_or_else(|| {
            malformed(MissionColumn::MissionId, "empty mission identifier".to_string())
        })?;

        if let Some(first_row) = seen.insert(mission_id.clone(), row) {
            return Err(DataLoadError::DuplicateMission {
                path: path.to_path_buf(),
                mission_id,
                first_row,
                row,
            });
        }

        let departure = parse_timestamp(cell(MissionColumn::Departure))
            .map_err(|message| malformed(MissionColumn::Departure, message))?;
        let arrival = parse_timestamp(cell(MissionColumn::Arrival))
            .map_err(|message| malformed(MissionColumn::Arrival, message))?;

        let mission = MissionRecord {
            mission_id,
            departure: departure.map(|t| t.naive()),
            arrival: arrival.map(|t| t.naive()),
            origin_city: non_empty(cell(MissionColumn::OriginCity)),
            origin_county: non_empty(cell(MissionColumn::OriginCounty)),
            destination_city: non_empty(cell(MissionColumn::DestinationCity)),
            vehicle_id: non_empty(cell(MissionColumn::VehicleId)),
            vehicle_type: non_empty(cell(MissionColumn::VehicleType)),
            departure_date_only: departure.is_some_and(|t| t.is_date_only()),
            arrival_date_only: arrival.is_some_and(|t| t.is_date_only()),
        };

        for warning in record_warnings(&mission) {
            debug!("{}", warning);
            log.warnings.record(&warning);
        }
        log.records.push(mission);
    }

    info!(
        "Loaded {} missions from {} ({} warnings)",
        log.records.len(),
        path.display(),
        log.warnings.total()
    );

    Ok(log)
}

/// Data-quality warnings for a single validated record.
pub fn record_warnings(mission: &MissionRecord) -> Vec<DataQualityWarning> {
    let mission_id = || mission.mission_id.clone();
    let mut warnings = Vec::new();

    if mission.departure.is_none() {
        warnings.push(DataQualityWarning::MissingDeparture {
            mission_id: mission_id(),
        });
    }
    if mission.arrival.is_none() {
        warnings.push(DataQualityWarning::MissingArrival {
            mission_id: mission_id(),
        });
    }
    if mission.departure_date_only {
        warnings.push(DataQualityWarning::DateOnlyTimestamp {
            mission_id: mission_id(),
            column: MissionColumn::Departure.canonical_name().to_string(),
        });
    }
    if mission.arrival_date_only {
        warnings.push(DataQualityWarning::DateOnlyTimestamp {
            mission_id: mission_id(),
            column: MissionColumn::Arrival.canonical_name().to_string(),
        });
    }
    if let (Some(departure), Some(arrival)) = (mission.departure_time(), mission.arrival_time()) {
        if arrival < departure {
            warnings.push(DataQualityWarning::ArrivalBeforeDeparture {
                mission_id: mission_id(),
            });
        }
    }
    if mission.origin_city.is_none() {
        warnings.push(DataQualityWarning::MissingOriginCity {
            mission_id: mission_id(),
        });
    }

    warnings
}

/// Accepted shapes of one coordinate entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Pair([f64; 2]),
    Object {
        #[serde(alias = "latitude")]
        lat: f64,
        #[serde(alias = "longitude", alias = "lng")]
        lon: f64,
    },
}

impl From<RawCoordinate> for Coordinate {
    fn from(raw: RawCoordinate) -> Self {
        match raw {
            RawCoordinate::Pair([lat, lon]) => Coordinate::new(lat, lon),
            RawCoordinate::Object { lat, lon } => Coordinate::new(lat, lon),
        }
    }
}

/// Load and validate the city-coordinate table at `path`.
pub fn load_city_coordinates(path: &Path) -> DataLoadResult<CityTable> {
    let file = read_text(path)?;
    parse_city_coordinates(&file.text, path)
}

/// Parse a coordinate table of the form `{ "City": [lat, lon], ... }`.
///
/// `null` entries are skipped (the city stays unresolved); out-of-range
/// values are rejected.
pub fn parse_city_coordinates(text: &str, path: &Path) -> DataLoadResult<CityTable> {
    let raw: BTreeMap<String, Option<RawCoordinate>> =
        serde_json::from_str(text).map_err(|source| DataLoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let mut table = CityTable::new();
    for (city, entry) in raw {
        let Some(entry) = entry else {
            warn!("Coordinate table lists '{}' without coordinates", city);
            continue;
        };

        let coordinate = Coordinate::from(entry);
        if !coordinate.is_valid() {
            return Err(DataLoadError::InvalidCoordinates {
                path: path.to_path_buf(),
                city,
                lat: coordinate.lat,
                lon: coordinate.lon,
            });
        }
        table.insert(city.trim(), coordinate);
    }

    info!("Loaded {} city coordinates from {}", table.len(), path.display());
    Ok(table)
}

/// Read the input files and build a validated snapshot.
///
/// The mission log and the coordinate table are required. The closure
/// catalog and the weather table are optional; when absent the snapshot has
/// no events and no weather.
pub fn load_snapshot(sources: &DataSources) -> DataLoadResult<Snapshot> {
    let missions_file = read_text(&sources.mission_log)?;
    let cities_file = read_text(&sources.city_coordinates)?;
    let events_file = read_optional(sources.closure_events.as_deref())?;
    let weather_file = read_optional(sources.weather.as_deref())?;

    let mut log = parse_missions(&missions_file.text, &sources.mission_log)?;
    let cities = parse_city_coordinates(&cities_file.text, &sources.city_coordinates)?;
    let events = match &events_file {
        Some((path, file)) => parse_closure_events(&file.text, path)?,
        None => EventCatalog::default(),
    };
    let weather = match &weather_file {
        Some((path, file)) => Some(parse_weather(&file.text, path)?),
        None => None,
    };

    let optional_files = events_file.iter().chain(weather_file.iter()).map(|(_, f)| f);
    for file in [&missions_file, &cities_file].into_iter().chain(optional_files) {
        for warning in &file.warnings {
            log.warnings.record(warning);
        }
    }

    let checksum = calculate_checksum([
        missions_file.text.as_bytes(),
        cities_file.text.as_bytes(),
        optional_bytes(&events_file),
        optional_bytes(&weather_file),
    ]);

    Ok(Snapshot::new(log.records, cities, log.warnings, checksum)
        .with_events(events)
        .with_weather(weather))
}

fn optional_bytes<'a>(file: &'a Option<(&Path, TextFile)>) -> &'a [u8] {
    file.as_ref()
        .map(|(_, f)| f.text.as_bytes())
        .unwrap_or_default()
}

/// Path used in diagnostics for in-memory input.
pub fn inline_source(name: &str) -> PathBuf {
    PathBuf::from(format!("<{}>", name))
}
