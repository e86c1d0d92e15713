mod support;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use lifeflight_metrics::config::{AppConfig, DataSources, Environment};
use lifeflight_metrics::data::{self, load_missions, load_snapshot, DataLoadError, SnapshotStore};
use tempfile::TempDir;

use support::{
    example_sources, example_sources_with_events, with_scoped_env, write_file, write_sources,
    EXAMPLE_COORDINATES_JSON,
};

#[test]
fn test_load_example_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = load_snapshot(&example_sources(dir.path())).unwrap();

    assert_eq!(snapshot.mission_count(), 3);
    assert_eq!(snapshot.cities.len(), 2);
    assert_eq!(snapshot.warnings.missing_arrival, 1);
    assert_eq!(snapshot.warnings.unresolved_cities, 0);
    assert_eq!(snapshot.checksum.len(), 64);
}

#[test]
fn test_checksum_tracks_file_content() {
    let dir = TempDir::new().unwrap();
    let sources = example_sources(dir.path());
    let first = load_snapshot(&sources).unwrap();
    let again = load_snapshot(&sources).unwrap();
    assert_eq!(first.checksum, again.checksum);

    write_file(dir.path(), "city_coordinates.json", r#"{"Bangor": [44.8, -68.77]}"#);
    let changed = load_snapshot(&sources).unwrap();
    assert_ne!(first.checksum, changed.checksum);
    assert_eq!(changed.warnings.unresolved_cities, 1);
}

#[test]
fn test_original_export_headers_and_latin1() {
    let dir = TempDir::new().unwrap();
    let mut bytes = b"Incident Number,tdate,PU City,PU City.1\n".to_vec();
    bytes.extend_from_slice(b"A-1,2019-03-04 10:00,Caribou,Aroostook\n");
    bytes.extend_from_slice(b"A-2,2019-03-05 11:30,L\xe9vis,Qu\xe9bec\n");
    let path = write_file(dir.path(), "export.csv", bytes);

    let log = load_missions(&path).unwrap();
    assert_eq!(log.records.len(), 2);
    assert_eq!(log.records[1].origin_city.as_deref(), Some("Lévis"));
    assert_eq!(log.records[0].origin_county.as_deref(), Some("Aroostook"));
    assert_eq!(log.records[0].destination_city, None);
    assert_eq!(log.warnings.latin1_lines, 1);
}

#[test]
fn test_duplicate_pickup_header_reads_county() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "export.csv",
        "Incident Number,tdate,PU City,PU City\nA-1,2019-03-04 10:00,Caribou,AROOSTOOK\n",
    );

    let log = load_missions(&path).unwrap();
    assert_eq!(log.records[0].origin_city.as_deref(), Some("Caribou"));
    assert_eq!(log.records[0].origin_county.as_deref(), Some("AROOSTOOK"));
}

#[test]
fn test_mixed_encoding_keeps_utf8_lines() {
    let dir = TempDir::new().unwrap();
    let mut bytes = b"mission_id,departure_timestamp,origin_city\n".to_vec();
    bytes.extend_from_slice("1,2023-05-01 08:15:00,Montréal\n".as_bytes());
    bytes.extend_from_slice(b"2,2023-05-01 09:15:00,L\xe9vis\n");
    let path = write_file(dir.path(), "mixed.csv", bytes);

    let log = load_missions(&path).unwrap();
    assert_eq!(log.records[0].origin_city.as_deref(), Some("Montréal"));
    assert_eq!(log.records[1].origin_city.as_deref(), Some("Lévis"));
    assert_eq!(log.warnings.latin1_lines, 1);
}

#[test]
fn test_optional_sources_are_loaded() {
    let dir = TempDir::new().unwrap();
    let sources = example_sources_with_events(dir.path());
    let snapshot = load_snapshot(&sources).unwrap();

    assert_eq!(snapshot.events.len(), 2);
    assert!(snapshot
        .events
        .find("Eastern Maine Annex (Penobscot, 2023)")
        .is_some());
    assert_eq!(snapshot.weather.as_ref().map(|w| w.len()), Some(2));

    let plain = load_snapshot(&example_sources(dir.path())).unwrap();
    assert_ne!(plain.checksum, snapshot.checksum);
}

#[test]
fn test_missing_optional_sources_are_skipped() {
    let dir = TempDir::new().unwrap();
    let sources = example_sources(dir.path())
        .with_closure_events(dir.path().join("no-closures.csv"))
        .with_weather(dir.path().join("no-weather.csv"));

    let snapshot = load_snapshot(&sources).unwrap();
    assert!(snapshot.events.is_empty());
    assert!(snapshot.weather.is_none());
    assert_eq!(snapshot.mission_count(), 3);
}

#[test]
fn test_malformed_weather_fails_load() {
    let dir = TempDir::new().unwrap();
    let sources = example_sources(dir.path())
        .with_weather(write_file(dir.path(), "weather.csv", "Month,Precip\nsoon,1.0\n"));

    let err = load_snapshot(&sources).unwrap_err();
    assert!(matches!(err, DataLoadError::MalformedRow { .. }));
    assert!(err.to_string().contains("weather.csv"));
}

#[test]
fn test_missing_file_names_path() {
    let dir = TempDir::new().unwrap();
    let mut sources = example_sources(dir.path());
    sources.mission_log = dir.path().join("absent.csv");

    let err = load_snapshot(&sources).unwrap_err();
    assert!(matches!(err, DataLoadError::MissingFile { .. }));
    assert_eq!(err.path(), &sources.mission_log);
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn test_missing_required_columns() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(
        dir.path(),
        "mission_id,arrival_timestamp\n1,2023-05-01 08:45\n",
        EXAMPLE_COORDINATES_JSON,
    );

    match load_snapshot(&sources).unwrap_err() {
        DataLoadError::MissingColumns { columns, .. } => {
            assert_eq!(columns, vec!["departure_timestamp", "origin_city"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_timestamp_names_row_and_column() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(
        dir.path(),
        "mission_id,departure_timestamp,origin_city\n1,2023-05-01 08:15,Bangor\n2,yesterday,Bangor\n",
        EXAMPLE_COORDINATES_JSON,
    );

    let err = load_snapshot(&sources).unwrap_err();
    match &err {
        DataLoadError::MalformedRow { row, column, .. } => {
            assert_eq!(*row, 2);
            assert_eq!(column, "departure_timestamp");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("data.csv row 2"));
}

#[test]
fn test_out_of_range_coordinates_rejected() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(
        dir.path(),
        support::EXAMPLE_MISSIONS_CSV,
        r#"{"Bangor": [144.8, -68.77]}"#,
    );
    assert!(matches!(
        load_snapshot(&sources).unwrap_err(),
        DataLoadError::InvalidCoordinates { .. }
    ));
}

#[test]
fn test_store_reload_swaps_snapshot() {
    let dir = TempDir::new().unwrap();
    let sources = example_sources(dir.path());
    let store = SnapshotStore::new(sources.clone());
    assert!(store.peek().is_none());

    let before = store.get().unwrap();
    assert_eq!(before.mission_count(), 3);

    let mut csv = support::EXAMPLE_MISSIONS_CSV.to_string();
    csv.push_str("4,2023-05-02 09:00:00,2023-05-02 09:30:00,Portland,,Ground\n");
    fs::write(&sources.mission_log, csv).unwrap();

    // Readers keep the snapshot they already hold.
    assert_eq!(store.get().unwrap().mission_count(), 3);

    let after = store.reload().unwrap();
    assert_eq!(after.mission_count(), 4);
    assert_eq!(before.mission_count(), 3);
    assert!(Arc::ptr_eq(&after, &store.get().unwrap()));
}

#[test]
fn test_failed_reload_keeps_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let sources = example_sources(dir.path());
    let store = SnapshotStore::new(sources.clone());
    let before = store.get().unwrap();

    fs::write(&sources.city_coordinates, "{ not json").unwrap();
    let err = store.reload().unwrap_err();
    assert!(matches!(err, DataLoadError::Json { .. }));

    let current = store.get().unwrap();
    assert!(Arc::ptr_eq(&before, &current));
}

#[test]
fn test_global_store_initialises_once() {
    let dir = TempDir::new().unwrap();
    let store = data::init_store(example_sources(dir.path()));
    let again = data::init_store(DataSources::new("/elsewhere/data.csv", "/elsewhere/cities.json"));
    assert!(Arc::ptr_eq(store, again));
}

#[test]
fn test_config_file_resolves_data_paths() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "lifeflight.toml",
        r#"
environment = "testing"

[server]
port = 5050

[data]
mission_log = "missions/log.csv"

[heatmap]
radius = 15
"#,
    );

    let config = AppConfig::from_file(&path).unwrap();
    assert_eq!(config.environment, Environment::Testing);
    assert_eq!(config.server.port, 5050);
    assert_eq!(config.data.mission_log, dir.path().join("missions/log.csv"));
    assert_eq!(
        config.data.city_coordinates,
        dir.path().join("data/city_coordinates.json")
    );
    assert_eq!(config.heatmap.radius, 15);
    assert_eq!(config.heatmap.zoom_start, 6);
}

#[test]
fn test_config_file_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "lifeflight.toml", "[server\nport = 1");
    let err = AppConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("lifeflight.toml"));
}

#[test]
fn test_env_overrides() {
    let config = with_scoped_env(
        &[
            ("HOST", Some("127.0.0.1")),
            ("PORT", Some("8081")),
            ("MISSION_LOG_PATH", Some("/srv/missions.csv")),
            ("CITY_COORDINATES_PATH", None),
            ("CLOSURE_EVENTS_PATH", Some("/srv/closures.csv")),
            ("WEATHER_PATH", None),
            ("APP_ENV", Some("production")),
        ],
        || AppConfig::default().apply_env(),
    )
    .unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.data.mission_log, PathBuf::from("/srv/missions.csv"));
    assert_eq!(
        config.data.city_coordinates,
        PathBuf::from("data/city_coordinates.json")
    );
    assert_eq!(
        config.data.closure_events,
        Some(PathBuf::from("/srv/closures.csv"))
    );
    assert_eq!(config.data.weather, None);
    assert_eq!(config.environment, Environment::Production);
}

#[test]
fn test_flask_env_alias_and_bad_port() {
    let config = with_scoped_env(
        &[("APP_ENV", None), ("FLASK_ENV", Some("testing")), ("PORT", None)],
        || AppConfig::default().apply_env(),
    )
    .unwrap();
    assert_eq!(config.environment, Environment::Testing);

    let err = with_scoped_env(&[("PORT", Some("eighty"))], || {
        AppConfig::default().apply_env()
    })
    .unwrap_err();
    assert!(err.to_string().contains("PORT"));
}
