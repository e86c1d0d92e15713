//! Error and warning types for loading the mission log and coordinate table.
//!
//! Load failures are fatal for every view, since all views read the same
//! snapshot. Data-quality issues are non-fatal: they are counted at load time
//! and degrade individual views without failing a request.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result type for data loading operations.
pub type DataLoadResult<T> = Result<T, DataLoadError>;

/// Fatal failure while reading or validating an input file.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The configured file does not exist.
    #[error("Data file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV header lacks one or more required columns.
    #[error("{} is missing required columns: {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    /// A data row could not be turned into a valid record.
    #[error("{} row {row}, column '{column}': {message}", path.display())]
    MalformedRow {
        path: PathBuf,
        row: usize,
        column: String,
        message: String,
    },

    /// The CSV reader itself failed (bad quoting, ragged rows, ...).
    #[error("Failed to parse CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The coordinate table is not valid JSON of the expected shape.
    #[error("Failed to parse coordinate table {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A coordinate pair is out of range.
    #[error("{}: invalid coordinates for '{city}': ({lat}, {lon})", path.display())]
    InvalidCoordinates {
        path: PathBuf,
        city: String,
        lat: f64,
        lon: f64,
    },

    /// Two rows share the same mission identifier.
    #[error("{}: duplicate mission_id '{mission_id}' at rows {first_row} and {row}", path.display())]
    DuplicateMission {
        path: PathBuf,
        mission_id: String,
        first_row: usize,
        row: usize,
    },
}

impl DataLoadError {
    /// Path of the file the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::MissingFile { path }
            | Self::Io { path, .. }
            | Self::MissingColumns { path, .. }
            | Self::MalformedRow { path, .. }
            | Self::Csv { path, .. }
            | Self::Json { path, .. }
            | Self::InvalidCoordinates { path, .. }
            | Self::DuplicateMission { path, .. } => path,
        }
    }
}

/// Non-fatal data-quality issue found while validating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataQualityWarning {
    MissingDeparture { mission_id: String },
    MissingArrival { mission_id: String },
    ArrivalBeforeDeparture { mission_id: String },
    /// A timestamp cell carried a date but no time of day.
    DateOnlyTimestamp { mission_id: String, column: String },
    MissingOriginCity { mission_id: String },
    UnresolvedCity { city: String },
    /// A line of the file was not valid UTF-8 and was read as Latin-1.
    Latin1Line { line: usize },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDeparture { mission_id } => {
                write!(f, "mission {} has no departure timestamp", mission_id)
            }
            Self::MissingArrival { mission_id } => {
                write!(f, "mission {} has no arrival timestamp", mission_id)
            }
            Self::ArrivalBeforeDeparture { mission_id } => {
                write!(f, "mission {} arrives before it departs", mission_id)
            }
            Self::DateOnlyTimestamp { mission_id, column } => {
                write!(f, "mission {} has a date-only {}", mission_id, column)
            }
            Self::MissingOriginCity { mission_id } => {
                write!(f, "mission {} has no origin city", mission_id)
            }
            Self::UnresolvedCity { city } => {
                write!(f, "city '{}' has no coordinates", city)
            }
            Self::Latin1Line { line } => {
                write!(f, "line {} is not valid UTF-8, decoded as Latin-1", line)
            }
        }
    }
}

/// Per-kind counters of the warnings raised during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWarnings {
    pub missing_departure: usize,
    pub missing_arrival: usize,
    pub arrival_before_departure: usize,
    pub date_only_timestamps: usize,
    pub missing_origin_city: usize,
    pub unresolved_cities: usize,
    pub latin1_lines: usize,
}

impl LoadWarnings {
    pub fn record(&mut self, warning: &DataQualityWarning) {
        match warning {
            DataQualityWarning::MissingDeparture { .. } => self.missing_departure += 1,
            DataQualityWarning::MissingArrival { .. } => self.missing_arrival += 1,
            DataQualityWarning::ArrivalBeforeDeparture { .. } => {
                self.arrival_before_departure += 1
            }
            DataQualityWarning::DateOnlyTimestamp { .. } => self.date_only_timestamps += 1,
            DataQualityWarning::MissingOriginCity { .. } => self.missing_origin_city += 1,
            DataQualityWarning::UnresolvedCity { .. } => self.unresolved_cities += 1,
            DataQualityWarning::Latin1Line { .. } => self.latin1_lines += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_departure
            + self.missing_arrival
            + self.arrival_before_departure
            + self.date_only_timestamps
            + self.missing_origin_city
            + self.unresolved_cities
            + self.latin1_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = DataLoadError::MissingColumns {
            path: PathBuf::from("data/data.csv"),
            columns: vec!["mission_id".to_string(), "origin_city".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("data/data.csv"));
        assert!(msg.contains("mission_id, origin_city"));
    }

    #[test]
    fn test_malformed_row_names_row_and_column() {
        let err = DataLoadError::MalformedRow {
            path: PathBuf::from("log.csv"),
            row: 7,
            column: "departure_timestamp".to_string(),
            message: "unrecognised timestamp 'yesterday'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "log.csv row 7, column 'departure_timestamp': unrecognised timestamp 'yesterday'"
        );
        assert_eq!(err.path(), &PathBuf::from("log.csv"));
    }

    #[test]
    fn test_warning_counters() {
        let mut warnings = LoadWarnings::default();
        warnings.record(&DataQualityWarning::MissingArrival {
            mission_id: "1".to_string(),
        });
        warnings.record(&DataQualityWarning::MissingArrival {
            mission_id: "2".to_string(),
        });
        warnings.record(&DataQualityWarning::UnresolvedCity {
            city: "Atlantis".to_string(),
        });

        warnings.record(&DataQualityWarning::DateOnlyTimestamp {
            mission_id: "3".to_string(),
            column: "departure_timestamp".to_string(),
        });

        assert_eq!(warnings.missing_arrival, 2);
        assert_eq!(warnings.unresolved_cities, 1);
        assert_eq!(warnings.date_only_timestamps, 1);
        assert_eq!(warnings.total(), 4);
    }
}
