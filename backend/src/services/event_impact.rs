//! Before/after replay of monthly demand around an event month.
//!
//! The window covers `window_months` on each side of the event. Months before
//! the event form the baseline; the event month itself opens the post period.
//! The event is either a bare month or a hospital closure from the catalog,
//! in which case the series defaults to the closure's county.

use crate::api::{
    ConfidenceInterval, CumulativeImpactPoint, EventImpactData, EventInfo, EventPeriod,
    LocationFilter, MonthlyCount, PrePostComparison, TimelinePoint, YearMonth,
};
use crate::data::{DataLoadResult, SnapshotStore};

use super::monthly::compute_monthly_missions;
use super::stats::{mean, sample_std_dev};

pub const DEFAULT_WINDOW_MONTHS: u32 = 12;
pub const MAX_WINDOW_MONTHS: u32 = 120;

/// z-score of a two-sided 95% normal interval.
const Z_95: f64 = 1.96;

/// The event an impact analysis is anchored on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSelector {
    Month(YearMonth),
    /// `event_id` of a closure in the catalog.
    Closure(String),
}

/// Check a requested window size.
pub fn validate_window(window_months: u32) -> Result<u32, String> {
    if (1..=MAX_WINDOW_MONTHS).contains(&window_months) {
        Ok(window_months)
    } else {
        Err(format!(
            "window_months must be between 1 and {}, got {}",
            MAX_WINDOW_MONTHS, window_months
        ))
    }
}

fn counts_of(months: &[&MonthlyCount]) -> Vec<f64> {
    months.iter().map(|m| m.mission_count as f64).collect()
}

fn compare_periods(pre: &[&MonthlyCount], post: &[&MonthlyCount]) -> PrePostComparison {
    let pre_values = counts_of(pre);
    let post_values = counts_of(post);

    let pre_mean = mean(&pre_values);
    let post_mean = mean(&post_values);
    let pre_std = sample_std_dev(&pre_values, pre_mean);
    let post_std = sample_std_dev(&post_values, post_mean);
    let difference = post_mean - pre_mean;

    let percentage_change = if pre_mean == 0.0 {
        0.0
    } else {
        difference / pre_mean * 100.0
    };

    let mut variance = 0.0;
    if !pre_values.is_empty() {
        variance += pre_std * pre_std / pre_values.len() as f64;
    }
    if !post_values.is_empty() {
        variance += post_std * post_std / post_values.len() as f64;
    }
    let margin = Z_95 * variance.sqrt();

    PrePostComparison {
        pre_period_mean: pre_mean,
        post_period_mean: post_mean,
        difference,
        percentage_change,
        pre_period_std: pre_std,
        post_period_std: post_std,
        pre_period_n: pre_values.len(),
        post_period_n: post_values.len(),
        confidence_interval: ConfidenceInterval {
            lower: difference - margin,
            upper: difference + margin,
        },
    }
}

/// Replay a monthly series around `event_month`.
pub fn compute_event_impact(
    series: &[MonthlyCount],
    event_month: YearMonth,
    window_months: u32,
    location: LocationFilter,
) -> EventImpactData {
    let start = event_month.offset(-(window_months as i64));
    let end = event_month.offset(window_months as i64);

    let (pre, post): (Vec<&MonthlyCount>, Vec<&MonthlyCount>) = series
        .iter()
        .filter(|m| m.month >= start && m.month <= end)
        .partition(|m| m.month < event_month);

    let pre_post_comparison = compare_periods(&pre, &post);
    let baseline = pre_post_comparison.pre_period_mean;

    let mut cumulative_excess = 0.0;
    let cumulative_impact = post
        .iter()
        .map(|m| {
            let excess = m.mission_count as f64 - baseline;
            cumulative_excess += excess;
            CumulativeImpactPoint {
                month: m.month,
                mission_count: m.mission_count,
                baseline,
                excess,
                cumulative_excess,
                months_since_event: event_month.months_until(&m.month),
            }
        })
        .collect();

    let timeline = pre
        .iter()
        .map(|m| (m, EventPeriod::Pre))
        .chain(post.iter().map(|m| (m, EventPeriod::Post)))
        .map(|(m, period)| TimelinePoint {
            month: m.month,
            mission_count: m.mission_count,
            period,
            baseline,
        })
        .collect();

    EventImpactData {
        event_month,
        window_months,
        event_info: None,
        location,
        pre_post_comparison,
        cumulative_impact,
        timeline,
    }
}

/// Event impact over the store's current snapshot.
///
/// `location` defaults to the closure's county for a catalog event and to
/// the whole system for a bare month. Returns `Ok(None)` when the closure is
/// not in the catalog.
pub fn get_event_impact(
    store: &SnapshotStore,
    event: &EventSelector,
    window_months: u32,
    location: Option<LocationFilter>,
) -> DataLoadResult<Option<EventImpactData>> {
    let snapshot = store.get()?;

    let (event_month, closure) = match event {
        EventSelector::Month(month) => (*month, None),
        EventSelector::Closure(event_id) => {
            let Some(closure) = snapshot.events.find(event_id) else {
                return Ok(None);
            };
            let Some(month) = closure.month() else {
                return Ok(None);
            };
            (month, Some(closure))
        }
    };

    let location = location.unwrap_or_else(|| match closure {
        Some(c) if !c.county.trim().is_empty() => LocationFilter::county(c.county.trim()),
        _ => LocationFilter::system(),
    });

    let monthly = compute_monthly_missions(&snapshot.missions, &location);
    let mut data = compute_event_impact(&monthly.months, event_month, window_months, location);
    data.event_info = closure.map(EventInfo::from);
    Ok(Some(data))
}
