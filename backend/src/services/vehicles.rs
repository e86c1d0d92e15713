use std::collections::HashMap;

use crate::api::{VehicleCount, VehicleCountData};
use crate::data::{DataLoadResult, MissionRecord, SnapshotStore};

/// Count missions per vehicle type.
///
/// Records without a type land in the `"unknown"` bucket so the counts always
/// add up to the number of missions. Ordered by count descending, then by
/// vehicle type ascending.
pub fn compute_vehicle_counts(missions: &[MissionRecord]) -> VehicleCountData {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for mission in missions {
        *counts.entry(mission.vehicle_type_or_unknown()).or_default() += 1;
    }

    let mut vehicle_counts: Vec<VehicleCount> = counts
        .into_iter()
        .map(|(vehicle_type, count)| VehicleCount {
            vehicle_type: vehicle_type.to_string(),
            count,
        })
        .collect();
    vehicle_counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.vehicle_type.cmp(&b.vehicle_type))
    });

    VehicleCountData { vehicle_counts }
}

/// Vehicle counts over the store's current snapshot.
pub fn get_vehicle_counts(store: &SnapshotStore) -> DataLoadResult<VehicleCountData> {
    let snapshot = store.get()?;
    Ok(compute_vehicle_counts(&snapshot.missions))
}
