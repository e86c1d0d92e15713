use chrono::Timelike;

use crate::api::{HourlyDepartureData, HOURS_PER_DAY};
use crate::data::{DataLoadResult, MissionRecord, SnapshotStore};

/// Count departures per hour of day.
///
/// Always returns all 24 buckets. Records without a departure, or with a
/// date-only departure, are skipped.
pub fn compute_hourly_departures(missions: &[MissionRecord]) -> HourlyDepartureData {
    let mut hourly_counts = [0usize; HOURS_PER_DAY];
    for departure in missions.iter().filter_map(MissionRecord::departure_time) {
        hourly_counts[departure.hour() as usize] += 1;
    }
    HourlyDepartureData { hourly_counts }
}

/// Hourly departure density over the store's current snapshot.
pub fn get_hourly_departures(store: &SnapshotStore) -> DataLoadResult<HourlyDepartureData> {
    let snapshot = store.get()?;
    Ok(compute_hourly_departures(&snapshot.missions))
}
