use std::collections::BTreeMap;

use crate::api::{LocationFilter, LocationLevel, MonthlyCount, MonthlyMissionsData, YearMonth};
use crate::data::{DataLoadResult, MissionRecord, SnapshotStore};

fn same_name(field: Option<&str>, wanted: &str) -> bool {
    field.is_some_and(|name| name.trim().eq_ignore_ascii_case(wanted.trim()))
}

/// Whether `mission` was picked up within `location`. City and county names
/// compare ignoring case and surrounding whitespace.
pub fn in_location(mission: &MissionRecord, location: &LocationFilter) -> bool {
    let Some(wanted) = location.location_value.as_deref() else {
        return true;
    };
    match location.location_level {
        LocationLevel::System => true,
        LocationLevel::County => same_name(mission.origin_county.as_deref(), wanted),
        LocationLevel::City => same_name(mission.origin_city.as_deref(), wanted),
    }
}

/// Missions per calendar month of departure.
///
/// The series runs from the first to the last observed month with empty
/// months filled in as zero. Records without a departure are skipped;
/// date-only departures still count towards their month.
pub fn compute_monthly_missions(
    missions: &[MissionRecord],
    location: &LocationFilter,
) -> MonthlyMissionsData {
    let mut counts: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for mission in missions {
        if !in_location(mission, location) {
            continue;
        }
        if let Some(departure) = &mission.departure {
            *counts.entry(YearMonth::of(departure)).or_default() += 1;
        }
    }

    let months = match (counts.keys().next(), counts.keys().next_back()) {
        (Some(&first), Some(&last)) => first
            .range_inclusive(last)
            .map(|month| MonthlyCount {
                month,
                mission_count: counts.get(&month).copied().unwrap_or(0),
            })
            .collect(),
        _ => Vec::new(),
    };

    MonthlyMissionsData {
        months,
        location: location.clone(),
    }
}

/// Monthly series over the store's current snapshot.
pub fn get_monthly_missions(
    store: &SnapshotStore,
    location: &LocationFilter,
) -> DataLoadResult<MonthlyMissionsData> {
    let snapshot = store.get()?;
    Ok(compute_monthly_missions(&snapshot.missions, location))
}
