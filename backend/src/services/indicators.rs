use std::collections::BTreeSet;

use crate::api::{IndicatorsData, RESPONSE_TIME_UNIT};
use crate::data::{DataLoadResult, MissionRecord, SnapshotStore};

use super::stats::summarize;

/// Number of distinct non-empty city names across origins and destinations.
pub fn count_cities_covered(missions: &[MissionRecord]) -> usize {
    missions
        .iter()
        .flat_map(|m| [m.origin_city.as_deref(), m.destination_city.as_deref()])
        .flatten()
        .collect::<BTreeSet<&str>>()
        .len()
}

/// Compute the overview indicators.
///
/// Response times are in minutes and only use records where both timestamps
/// are present, carry a time of day and are ordered; every record still
/// counts towards `total_missions`.
pub fn compute_indicators(missions: &[MissionRecord]) -> IndicatorsData {
    let response_times: Vec<f64> = missions
        .iter()
        .filter_map(MissionRecord::response_time_minutes)
        .collect();
    let stats = summarize(&response_times);

    IndicatorsData {
        total_missions: missions.len(),
        cities_covered: count_cities_covered(missions),
        avg_response_time: stats.map(|s| s.mean),
        median_response_time: stats.map(|s| s.median),
        min_response_time: stats.map(|s| s.min),
        max_response_time: stats.map(|s| s.max),
        response_time_std: stats.map(|s| s.std_dev),
        response_time_unit: RESPONSE_TIME_UNIT.to_string(),
        response_time_samples: stats.map_or(0, |s| s.count),
    }
}

/// Indicators over the store's current snapshot.
pub fn get_indicators(store: &SnapshotStore) -> DataLoadResult<IndicatorsData> {
    let snapshot = store.get()?;
    Ok(compute_indicators(&snapshot.missions))
}
