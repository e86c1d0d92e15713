#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lifeflight_metrics::config::DataSources;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// The three-mission log used throughout the dashboard examples.
pub const EXAMPLE_MISSIONS_CSV: &str = "\
mission_id,departure_timestamp,arrival_timestamp,origin_city,destination_city,vehicle_type
1,2023-05-01 08:15:00,2023-05-01 08:45:00,Bangor,,Helicopter
2,2023-05-01 08:50:00,,Bangor,,Helicopter
3,2023-05-01 14:05:00,2023-05-01 14:40:00,Portland,,Ground
";

pub const EXAMPLE_COORDINATES_JSON: &str = r#"{
  "Bangor": [44.8016, -68.7712],
  "Portland": [43.6591, -70.2568]
}"#;

/// Two closures: one in Penobscot county (Bangor) in 2023-05, one with an
/// unknown closure date, and an open hospital that is not an event.
pub const EXAMPLE_CLOSURES_CSV: &str = "\
hospital_name,county,facility_type,closure_year,closure_date,reason,status
Eastern Maine Annex,Penobscot,Acute,2023,2023-05-15,Consolidation,Closed
Casco Bay Clinic,Cumberland,Clinic,2021,,Sold to network,Sold
Pine Tree General,York,Acute,2020,2020-02-01,,Open
";

/// Two months of weather: a dry May and a very wet June.
pub const EXAMPLE_WEATHER_CSV: &str = "\
Month,AvgTemp,MinTemp,MaxTemp,Precip
\"May, 2023\",54.1,38.0,71.2,1.5
\"June, 2023\",63.0,49.5,82.3,9.8
";

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

/// Write a mission log and coordinate table into `dir`.
pub fn write_sources(dir: &Path, missions_csv: &str, coordinates_json: &str) -> DataSources {
    DataSources::new(
        write_file(dir, "data.csv", missions_csv),
        write_file(dir, "city_coordinates.json", coordinates_json),
    )
}

/// The example dataset written into `dir`.
pub fn example_sources(dir: &Path) -> DataSources {
    write_sources(dir, EXAMPLE_MISSIONS_CSV, EXAMPLE_COORDINATES_JSON)
}

/// The example dataset plus a closure catalog and a weather table.
pub fn example_sources_with_events(dir: &Path) -> DataSources {
    example_sources(dir)
        .with_closure_events(write_file(dir, "closures.csv", EXAMPLE_CLOSURES_CSV))
        .with_weather(write_file(dir, "weather.csv", EXAMPLE_WEATHER_CSV))
}

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let saved = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.saved.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
