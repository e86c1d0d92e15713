//! Mission demand stratified by how often the weather was extreme.
//!
//! Each weather month is flagged extreme or not, which gives every calendar
//! month an extreme-weather frequency in percent. Missions inherit the
//! frequency of their departure month (0 when the month has no weather row),
//! are bucketed by quantiles of that frequency, and are then counted per day,
//! week or month. Each bucket reports boxplot statistics of those counts.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::api::{
    AggregationLevel, ExtremeWeatherMethod, WeatherBoxplot, WeatherRiskData, WeatherRiskMetadata,
    YearMonth,
};
use crate::data::{DataLoadResult, MissionRecord, SnapshotStore, WeatherTable};

use super::stats::{mean, population_std_dev, quantile, sorted};

/// Quartile strata.
pub const DEFAULT_QUANTILES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Precipitation or temperature above this percentile is extreme.
const EXTREME_UPPER: f64 = 0.95;

/// Temperature below this percentile is extreme.
const EXTREME_LOWER: f64 = 0.05;

/// Boxplot whiskers extend this many interquartile ranges.
const WHISKER_IQR: f64 = 1.5;

/// Parameters of one weather-risk analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRiskOptions {
    pub method: ExtremeWeatherMethod,
    pub aggregation_level: AggregationLevel,
    /// Ascending cut points in `[0, 1]`.
    pub quantiles: Vec<f64>,
}

impl Default for WeatherRiskOptions {
    fn default() -> Self {
        Self {
            method: ExtremeWeatherMethod::default(),
            aggregation_level: AggregationLevel::default(),
            quantiles: DEFAULT_QUANTILES.to_vec(),
        }
    }
}

/// Check requested quantile cut points.
pub fn validate_quantiles(quantiles: &[f64]) -> Result<Vec<f64>, String> {
    if quantiles.len() < 2 {
        return Err("quantiles needs at least two cut points".to_string());
    }
    if let Some(q) = quantiles.iter().find(|q| !(0.0..=1.0).contains(*q)) {
        return Err(format!("quantile {} is outside [0, 1]", q));
    }
    if quantiles.windows(2).any(|w| w[1] < w[0]) {
        return Err("quantiles must be ascending".to_string());
    }
    Ok(quantiles.to_vec())
}

fn percentile_of(values: impl Iterator<Item = f64>, q: f64) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        None
    } else {
        Some(quantile(&sorted(&values), q))
    }
}

/// Extreme flag for every row of `weather`, in table order.
pub fn extreme_flags(weather: &WeatherTable, method: ExtremeWeatherMethod) -> Vec<bool> {
    let rows = &weather.observations;

    let precip_threshold =
        percentile_of(rows.iter().filter_map(|w| w.precip), EXTREME_UPPER).unwrap_or(0.0);
    let temps = rows.iter().filter_map(|w| w.avg_temp);
    let temp_band = percentile_of(temps.clone(), EXTREME_LOWER)
        .zip(percentile_of(temps, EXTREME_UPPER));

    rows.iter()
        .map(|w| {
            let wet = w.precip.is_some_and(|p| p > precip_threshold);
            let harsh = match (w.avg_temp, temp_band) {
                (Some(t), Some((low, high))) => t < low || t > high,
                _ => false,
            };
            match method {
                ExtremeWeatherMethod::Precipitation => wet,
                ExtremeWeatherMethod::Temperature => harsh,
                ExtremeWeatherMethod::Combined => wet || harsh,
            }
        })
        .collect()
}

/// Percentage of extreme rows per calendar month.
pub fn extreme_frequency_by_month(
    weather: &WeatherTable,
    method: ExtremeWeatherMethod,
) -> BTreeMap<YearMonth, f64> {
    let mut tallies: BTreeMap<YearMonth, (usize, usize)> = BTreeMap::new();
    for (row, extreme) in weather.observations.iter().zip(extreme_flags(weather, method)) {
        let (hits, total) = tallies.entry(row.month).or_default();
        *hits += usize::from(extreme);
        *total += 1;
    }
    tallies
        .into_iter()
        .map(|(month, (hits, total))| (month, hits as f64 / total as f64 * 100.0))
        .collect()
}

/// Stratum label of `value` given the quantile cut values.
fn stratum_label(value: f64, cuts: &[f64]) -> String {
    for (i, pair) in cuts.windows(2).enumerate() {
        if pair[0] <= value && value < pair[1] {
            return format!("Q{} ({:.1}-{:.1}%)", i + 1, pair[0], pair[1]);
        }
    }
    let last = cuts.last().copied().unwrap_or(0.0);
    format!("Q{} ({:.1}%+)", cuts.len(), last)
}

/// Start of the period containing `date`. Weeks start on Monday.
pub fn period_start(date: NaiveDate, level: AggregationLevel) -> NaiveDate {
    match level {
        AggregationLevel::Day => date,
        AggregationLevel::Week => {
            date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        AggregationLevel::Month => date.with_day(1).unwrap_or(date),
    }
}

fn boxplot(label: String, values: &[f64]) -> WeatherBoxplot {
    let ordered = sorted(values);
    let q1 = quantile(&ordered, 0.25);
    let q3 = quantile(&ordered, 0.75);
    let iqr = q3 - q1;
    let average = mean(values);

    WeatherBoxplot {
        quantile: label,
        min: ordered.first().copied().unwrap_or(0.0),
        q1,
        median: quantile(&ordered, 0.5),
        q3,
        max: ordered.last().copied().unwrap_or(0.0),
        mean: average,
        std: population_std_dev(values, average),
        count: values.len(),
        outliers: values
            .iter()
            .copied()
            .filter(|v| *v < q1 - WHISKER_IQR * iqr || *v > q3 + WHISKER_IQR * iqr)
            .collect(),
    }
}

/// Stratify mission demand by extreme-weather frequency.
///
/// Missions without a departure are skipped. Date-only departures take part,
/// since every aggregation level is at least a day.
pub fn compute_weather_risk(
    missions: &[MissionRecord],
    weather: &WeatherTable,
    options: &WeatherRiskOptions,
) -> WeatherRiskData {
    let frequency = extreme_frequency_by_month(weather, options.method);

    let departures: Vec<(NaiveDate, f64)> = missions
        .iter()
        .filter_map(|m| m.departure)
        .map(|d| {
            let f = frequency.get(&YearMonth::of(&d)).copied().unwrap_or(0.0);
            (d.date(), f)
        })
        .collect();

    let ordered = sorted(&departures.iter().map(|(_, f)| *f).collect::<Vec<_>>());
    let cuts: Vec<f64> = if ordered.is_empty() {
        Vec::new()
    } else {
        options.quantiles.iter().map(|q| quantile(&ordered, *q)).collect()
    };

    let mut per_period: BTreeMap<(String, NaiveDate), usize> = BTreeMap::new();
    for (date, f) in &departures {
        let key = (
            stratum_label(*f, &cuts),
            period_start(*date, options.aggregation_level),
        );
        *per_period.entry(key).or_default() += 1;
    }

    let mut strata: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for ((label, _), count) in per_period {
        strata.entry(label).or_default().push(count as f64);
    }

    let boxplot_data: Vec<WeatherBoxplot> = strata
        .into_iter()
        .map(|(label, counts)| boxplot(label, &counts))
        .collect();

    WeatherRiskData {
        metadata: WeatherRiskMetadata {
            method: options.method,
            aggregation_level: options.aggregation_level,
            quantiles: options.quantiles.clone(),
            n_quantiles: boxplot_data.len(),
        },
        boxplot_data,
    }
}

/// Weather risk over the store's current snapshot; `Ok(None)` when no
/// weather table is loaded.
pub fn get_weather_risk(
    store: &SnapshotStore,
    options: &WeatherRiskOptions,
) -> DataLoadResult<Option<WeatherRiskData>> {
    let snapshot = store.get()?;
    Ok(snapshot
        .weather
        .as_ref()
        .map(|weather| compute_weather_risk(&snapshot.missions, weather, options)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::WeatherObservation;
    use chrono::NaiveDateTime;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn observation(month: &str, avg_temp: f64, precip: f64) -> WeatherObservation {
        WeatherObservation {
            avg_temp: Some(avg_temp),
            precip: Some(precip),
            ..WeatherObservation::new(ym(month))
        }
    }

    fn departing(id: &str, at: &str) -> MissionRecord {
        MissionRecord::new(id)
            .with_departure(NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap())
    }

    /// A dry May and a wet June.
    fn two_month_weather() -> WeatherTable {
        WeatherTable::new(vec![
            observation("2023-05", 54.1, 1.5),
            observation("2023-06", 63.0, 9.8),
        ])
    }

    fn missions() -> Vec<MissionRecord> {
        vec![
            departing("1", "2023-05-01 08:00"),
            departing("2", "2023-05-01 12:00"),
            departing("3", "2023-05-02 09:00"),
            departing("4", "2023-06-05 10:00"),
            departing("5", "2023-06-06 10:00"),
            departing("6", "2023-06-06 11:00"),
            departing("7", "2023-06-06 12:00"),
            MissionRecord::new("8"),
        ]
    }

    #[test]
    fn test_precipitation_flags_wettest_month() {
        let frequency =
            extreme_frequency_by_month(&two_month_weather(), ExtremeWeatherMethod::Precipitation);
        assert_eq!(frequency.get(&ym("2023-05")), Some(&0.0));
        assert_eq!(frequency.get(&ym("2023-06")), Some(&100.0));
    }

    #[test]
    fn test_temperature_flags_both_tails() {
        // One freezing month, twenty mild ones, one heat wave.
        let mut temps = vec![-10.0];
        temps.extend([50.0; 20]);
        temps.push(100.0);
        let start = ym("2020-01");
        let weather = WeatherTable::new(
            temps
                .iter()
                .enumerate()
                .map(|(i, t)| WeatherObservation {
                    avg_temp: Some(*t),
                    precip: Some(1.0),
                    ..WeatherObservation::new(start.offset(i as i64))
                })
                .collect(),
        );
        let flags = extreme_flags(&weather, ExtremeWeatherMethod::Temperature);
        let extreme: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(extreme, vec![0, 21]);

        let combined = extreme_flags(&weather, ExtremeWeatherMethod::Combined);
        assert_eq!(combined, flags);
    }

    #[test]
    fn test_daily_boxplots_per_stratum() {
        let data = compute_weather_risk(
            &missions(),
            &two_month_weather(),
            &WeatherRiskOptions::default(),
        );

        let labels: Vec<&str> = data.boxplot_data.iter().map(|b| b.quantile.as_str()).collect();
        assert_eq!(labels, vec!["Q2 (0.0-100.0%)", "Q5 (100.0%+)"]);
        assert_eq!(data.metadata.n_quantiles, 2);
        assert_eq!(data.metadata.quantiles, DEFAULT_QUANTILES.to_vec());

        let dry = &data.boxplot_data[0];
        assert_eq!((dry.min, dry.q1, dry.median, dry.q3, dry.max), (1.0, 1.25, 1.5, 1.75, 2.0));
        assert_eq!(dry.mean, 1.5);
        assert_eq!(dry.std, 0.5);
        assert_eq!(dry.count, 2);

        let wet = &data.boxplot_data[1];
        assert_eq!((wet.min, wet.median, wet.max), (1.0, 2.0, 3.0));
        assert_eq!(wet.std, 1.0);
        assert!(wet.outliers.is_empty());
    }

    #[test]
    fn test_monthly_aggregation() {
        let options = WeatherRiskOptions {
            aggregation_level: AggregationLevel::Month,
            ..WeatherRiskOptions::default()
        };
        let data = compute_weather_risk(&missions(), &two_month_weather(), &options);
        let counts: Vec<(f64, usize)> = data.boxplot_data.iter().map(|b| (b.max, b.count)).collect();
        assert_eq!(counts, vec![(3.0, 1), (4.0, 1)]);
    }

    #[test]
    fn test_months_without_weather_count_as_calm() {
        let missions = vec![departing("1", "2019-01-01 08:00"), departing("2", "2019-01-02 08:00")];
        let data = compute_weather_risk(&missions, &two_month_weather(), &WeatherRiskOptions::default());
        assert_eq!(data.boxplot_data.len(), 1);
        assert_eq!(data.boxplot_data[0].quantile, "Q5 (0.0%+)");
        assert_eq!(data.boxplot_data[0].count, 2);
    }

    #[test]
    fn test_outliers_beyond_whiskers() {
        let plot = boxplot("Q1".to_string(), &[1.0, 1.0, 1.0, 1.0, 10.0]);
        assert_eq!(plot.q1, 1.0);
        assert_eq!(plot.q3, 1.0);
        assert_eq!(plot.outliers, vec![10.0]);
    }

    #[test]
    fn test_week_periods_start_on_monday() {
        assert_eq!(period_start(day("2023-05-07"), AggregationLevel::Week), day("2023-05-01"));
        assert_eq!(period_start(day("2023-05-08"), AggregationLevel::Week), day("2023-05-08"));
        assert_eq!(period_start(day("2023-05-19"), AggregationLevel::Month), day("2023-05-01"));
    }

    #[test]
    fn test_no_missions_yields_no_strata() {
        let data = compute_weather_risk(&[], &two_month_weather(), &WeatherRiskOptions::default());
        assert!(data.boxplot_data.is_empty());
        assert_eq!(data.metadata.n_quantiles, 0);
    }

    #[test]
    fn test_validate_quantiles() {
        assert_eq!(validate_quantiles(&[0.0, 0.5, 1.0]), Ok(vec![0.0, 0.5, 1.0]));
        assert!(validate_quantiles(&[0.5]).is_err());
        assert!(validate_quantiles(&[0.0, 1.5]).is_err());
        assert!(validate_quantiles(&[0.5, 0.25]).is_err());
    }
}
