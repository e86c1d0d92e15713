//! Immutable, validated copy of the input files.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::checksum::calculate_checksum;
use super::error::{DataQualityWarning, LoadWarnings};
use super::events::EventCatalog;
use super::schema::{CityTable, MissionRecord};
use super::weather::WeatherTable;

/// Everything the aggregators read. Never mutated after construction; a
/// reload builds a new one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub missions: Vec<MissionRecord>,
    pub cities: CityTable,
    /// Hospital closures available as impact-analysis events.
    pub events: EventCatalog,
    /// Monthly weather, when a weather table is configured.
    pub weather: Option<WeatherTable>,
    pub loaded_at: DateTime<Utc>,
    pub warnings: LoadWarnings,
    /// SHA-256 fingerprint of the source content.
    pub checksum: String,
}

impl Snapshot {
    /// Build a snapshot from already-validated parts.
    ///
    /// Per-record warnings are expected in `warnings`; unresolved-city
    /// warnings are derived here from the two tables.
    pub fn new(
        missions: Vec<MissionRecord>,
        cities: CityTable,
        mut warnings: LoadWarnings,
        checksum: String,
    ) -> Self {
        for city in unresolved_cities(&missions, &cities) {
            let warning = DataQualityWarning::UnresolvedCity { city };
            tracing::warn!("{}", warning);
            warnings.record(&warning);
        }

        Self {
            missions,
            cities,
            events: EventCatalog::default(),
            weather: None,
            loaded_at: Utc::now(),
            warnings,
            checksum,
        }
    }

    /// Snapshot over in-memory data, fingerprinted from its JSON encoding.
    pub fn from_parts(missions: Vec<MissionRecord>, cities: CityTable) -> Self {
        let missions_json = serde_json::to_vec(&missions).unwrap_or_default();
        let cities_json = serde_json::to_vec(&cities).unwrap_or_default();
        let checksum = calculate_checksum([missions_json.as_slice(), cities_json.as_slice()]);
        Self::new(missions, cities, LoadWarnings::default(), checksum)
    }

    pub fn with_events(mut self, events: EventCatalog) -> Self {
        self.events = events;
        self
    }

    pub fn with_weather(mut self, weather: Option<WeatherTable>) -> Self {
        self.weather = weather;
        self
    }

    pub fn mission_count(&self) -> usize {
        self.missions.len()
    }
}

/// Distinct city names referenced by any mission but absent from `cities`.
pub fn unresolved_cities(missions: &[MissionRecord], cities: &CityTable) -> BTreeSet<String> {
    missions
        .iter()
        .flat_map(|m| [m.origin_city.as_deref(), m.destination_city.as_deref()])
        .flatten()
        .filter(|city| !cities.contains(city))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::Coordinate;

    #[test]
    fn test_unresolved_cities_are_distinct_and_sorted() {
        let missions = vec![
            MissionRecord::new("1").with_origin("Bangor").with_destination("Portland"),
            MissionRecord::new("2").with_origin("Bangor").with_destination("Lewiston"),
            MissionRecord::new("3").with_origin("Augusta"),
        ];
        let mut cities = CityTable::new();
        cities.insert("Portland", Coordinate::new(43.66, -70.26));

        let unresolved: Vec<_> = unresolved_cities(&missions, &cities).into_iter().collect();
        assert_eq!(unresolved, vec!["Augusta", "Bangor", "Lewiston"]);
    }

    #[test]
    fn test_from_parts_counts_unresolved_cities() {
        let missions = vec![
            MissionRecord::new("1").with_origin("Bangor"),
            MissionRecord::new("2").with_origin("Bangor"),
        ];
        let snapshot = Snapshot::from_parts(missions, CityTable::new());

        assert_eq!(snapshot.mission_count(), 2);
        assert_eq!(snapshot.warnings.unresolved_cities, 1);
        assert_eq!(snapshot.checksum.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Snapshot::from_parts(vec![MissionRecord::new("1")], CityTable::new());
        let b = Snapshot::from_parts(vec![MissionRecord::new("1")], CityTable::new());
        let c = Snapshot::from_parts(vec![MissionRecord::new("2")], CityTable::new());
        assert_eq!(a.checksum, b.checksum);
        assert_ne!(a.checksum, c.checksum);
    }
}
