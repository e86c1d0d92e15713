//! Geographic heat layer: mission counts per city joined to coordinates.

use std::collections::BTreeMap;

use tracing::warn;

use crate::api::{HeatmapCitySource, HeatmapData, HeatmapPoint, UnresolvedCity};
use crate::config::HeatmapSettings;
use crate::data::{CityTable, DataLoadResult, MissionRecord, SnapshotStore};

use super::stats::mean;

/// Cities a single mission contributes weight to under `source`.
fn weighted_cities(mission: &MissionRecord, source: HeatmapCitySource) -> Vec<&str> {
    let origin = mission.origin_city.as_deref();
    let destination = mission.destination_city.as_deref();
    match source {
        HeatmapCitySource::Origin => origin.into_iter().collect(),
        HeatmapCitySource::Destination => destination.into_iter().collect(),
        HeatmapCitySource::Both => match (origin, destination) {
            (Some(o), Some(d)) if o == d => vec![o],
            (o, d) => o.into_iter().chain(d).collect(),
        },
    }
}

/// Count missions per city and join the counts to `cities`.
///
/// Cities without a coordinate are left out of `points` and listed in
/// `unresolved_cities` instead. Both lists are ordered by city name.
pub fn build_heatmap(
    missions: &[MissionRecord],
    cities: &CityTable,
    source: HeatmapCitySource,
) -> HeatmapData {
    let mut weights: BTreeMap<&str, usize> = BTreeMap::new();
    for mission in missions {
        for city in weighted_cities(mission, source) {
            *weights.entry(city).or_default() += 1;
        }
    }

    let mut points = Vec::with_capacity(weights.len());
    let mut unresolved_cities = Vec::new();
    for (city, weight) in weights {
        match cities.get(city) {
            Some(coordinate) => points.push(HeatmapPoint {
                city: city.to_string(),
                lat: coordinate.lat,
                lon: coordinate.lon,
                weight,
            }),
            None => unresolved_cities.push(UnresolvedCity {
                city: city.to_string(),
                missions: weight,
            }),
        }
    }

    if !unresolved_cities.is_empty() {
        let dropped: usize = unresolved_cities.iter().map(|c| c.missions).sum();
        warn!(
            cities = unresolved_cities.len(),
            missions = dropped,
            source = %source,
            "Heatmap dropped cities without coordinates"
        );
    }

    HeatmapData {
        points,
        unresolved_cities,
        city_source: source,
    }
}

/// Heatmap over the store's current snapshot.
pub fn get_heatmap(store: &SnapshotStore, source: HeatmapCitySource) -> DataLoadResult<HeatmapData> {
    let snapshot = store.get()?;
    Ok(build_heatmap(&snapshot.missions, &snapshot.cities, source))
}

/// Map centre: unweighted mean of the point coordinates, or the configured
/// default when there are no points.
pub fn map_center(data: &HeatmapData, settings: &HeatmapSettings) -> [f64; 2] {
    if data.points.is_empty() {
        return settings.default_center;
    }
    let lats: Vec<f64> = data.points.iter().map(|p| p.lat).collect();
    let lons: Vec<f64> = data.points.iter().map(|p| p.lon).collect();
    [mean(&lats), mean(&lons)]
}

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_HEAT_JS: &str = "https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js";

/// Render a standalone Leaflet document with a heat layer over `data`.
pub fn render_heatmap_html(data: &HeatmapData, settings: &HeatmapSettings) -> String {
    let [center_lat, center_lon] = map_center(data, settings);
    let heat: Vec<[f64; 3]> = data
        .points
        .iter()
        .map(|p| [p.lat, p.lon, p.weight as f64])
        .collect();
    let max_weight = data.points.iter().map(|p| p.weight).max().unwrap_or(1).max(1);
    // Serializing f64 arrays cannot fail; keep the layer empty if it somehow does.
    let heat_json = serde_json::to_string(&heat).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>LifeFlight mission heatmap</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="{css}">
<script src="{leaflet}"></script>
<script src="{heat_js}"></script>
<style>html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{center_lat}, {center_lon}], {zoom});
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    attribution: "&copy; OpenStreetMap contributors",
    maxZoom: 18
}}).addTo(map);
L.heatLayer({heat_json}, {{ radius: {radius}, max: {max_weight} }}).addTo(map);
</script>
</body>
</html>
"#,
        css = LEAFLET_CSS,
        leaflet = LEAFLET_JS,
        heat_js = LEAFLET_HEAT_JS,
        center_lat = center_lat,
        center_lon = center_lon,
        zoom = settings.zoom_start,
        heat_json = heat_json,
        radius = settings.radius,
        max_weight = max_weight,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Coordinate;

    fn trip(id: &str, origin: &str, destination: Option<&str>) -> MissionRecord {
        let record = MissionRecord::new(id).with_origin(origin);
        match destination {
            Some(d) => record.with_destination(d),
            None => record,
        }
    }

    fn maine() -> CityTable {
        [
            ("Bangor".to_string(), Coordinate::new(44.80, -68.77)),
            ("Portland".to_string(), Coordinate::new(43.66, -70.26)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_origin_weights_ordered_by_city() {
        let missions = vec![
            trip("1", "Portland", None),
            trip("2", "Bangor", None),
            trip("3", "Bangor", Some("Portland")),
        ];
        let data = build_heatmap(&missions, &maine(), HeatmapCitySource::Origin);

        let weights: Vec<(&str, usize)> =
            data.points.iter().map(|p| (p.city.as_str(), p.weight)).collect();
        assert_eq!(weights, vec![("Bangor", 2), ("Portland", 1)]);
        assert_eq!(data.points[0].lat, 44.80);
        assert!(data.unresolved_cities.is_empty());
        assert_eq!(data.city_source, HeatmapCitySource::Origin);
    }

    #[test]
    fn test_missing_coordinate_drops_only_that_city() {
        let mut cities = CityTable::new();
        cities.insert("Portland", Coordinate::new(43.66, -70.26));
        let missions = vec![
            trip("1", "Bangor", None),
            trip("2", "Bangor", None),
            trip("3", "Portland", None),
        ];

        let data = build_heatmap(&missions, &cities, HeatmapCitySource::Origin);
        assert_eq!(data.points.len(), 1);
        assert_eq!(data.points[0].city, "Portland");
        assert_eq!(data.points[0].weight, 1);
        assert_eq!(
            data.unresolved_cities,
            vec![UnresolvedCity {
                city: "Bangor".to_string(),
                missions: 2
            }]
        );
    }

    #[test]
    fn test_destination_source() {
        let missions = vec![
            trip("1", "Bangor", Some("Portland")),
            trip("2", "Bangor", None),
        ];
        let data = build_heatmap(&missions, &maine(), HeatmapCitySource::Destination);
        assert_eq!(data.points.len(), 1);
        assert_eq!(data.points[0].city, "Portland");
        assert_eq!(data.points[0].weight, 1);
    }

    #[test]
    fn test_both_counts_round_trip_once() {
        let missions = vec![
            trip("1", "Bangor", Some("Portland")),
            trip("2", "Bangor", Some("Bangor")),
        ];
        let data = build_heatmap(&missions, &maine(), HeatmapCitySource::Both);
        let weights: Vec<(&str, usize)> =
            data.points.iter().map(|p| (p.city.as_str(), p.weight)).collect();
        assert_eq!(weights, vec![("Bangor", 2), ("Portland", 1)]);
    }

    #[test]
    fn test_mission_without_origin_has_no_weight() {
        let missions = vec![MissionRecord::new("1")];
        let data = build_heatmap(&missions, &maine(), HeatmapCitySource::Origin);
        assert!(data.points.is_empty());
        assert!(data.unresolved_cities.is_empty());
    }

    #[test]
    fn test_map_center_is_mean_or_default() {
        let settings = HeatmapSettings::default();
        let empty = build_heatmap(&[], &maine(), HeatmapCitySource::Origin);
        assert_eq!(map_center(&empty, &settings), [45.25, -69.0]);

        let missions = vec![trip("1", "Bangor", None), trip("2", "Portland", None)];
        let data = build_heatmap(&missions, &maine(), HeatmapCitySource::Origin);
        let [lat, lon] = map_center(&data, &settings);
        assert!((lat - 44.23).abs() < 1e-9);
        assert!((lon - (-69.515)).abs() < 1e-9);
    }

    #[test]
    fn test_render_html_contains_layer_settings() {
        let missions = vec![trip("1", "Bangor", None)];
        let data = build_heatmap(&missions, &maine(), HeatmapCitySource::Origin);
        let html = render_heatmap_html(&data, &HeatmapSettings::default());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("L.heatLayer([[44.8,-68.77,1.0]]"));
        assert!(html.contains("radius: 10"));
        assert!(html.contains("setView([44.8, -68.77], 6)"));
        assert!(html.contains("{s}.tile.openstreetmap.org"));
    }
}
