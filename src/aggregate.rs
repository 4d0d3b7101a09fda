use crate::filters::mean_progress;
use crate::geo::RegionField;
use crate::types::{
    HistogramBin, PercentageRecord, ProjectKpis, ProjectRecord, RegionAverage, ValueCount,
    WeekAverage, WeekComparisonRow, WeeklyKpis,
};
use crate::util::{average, count_distinct};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Mean `value` per calendar week, ascending by week.
pub fn average_by_week(records: &[PercentageRecord]) -> Vec<WeekAverage> {
    let mut by_week: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for r in records {
        by_week.entry(r.week).or_default().push(r.value);
    }
    by_week
        .into_iter()
        .map(|(week, values)| WeekAverage {
            week,
            mean: average(&values),
        })
        .collect()
}

fn values_at(records: &[PercentageRecord], week: i32) -> Vec<f64> {
    records
        .iter()
        .filter(|r| r.week == week)
        .map(|r| r.value)
        .collect()
}

/// `mean(current) - mean(previous)`, or `0` when either week has no rows.
///
/// A zero result does not mean `current` is the first week; use
/// [`previous_week`] to check adjacency.
pub fn delta_between_weeks(
    records: &[PercentageRecord],
    current_week: i32,
    previous_week: i32,
) -> f64 {
    let current = values_at(records, current_week);
    let previous = values_at(records, previous_week);
    if current.is_empty() || previous.is_empty() {
        return 0.0;
    }
    average(&current) - average(&previous)
}

pub fn distinct_weeks(records: &[PercentageRecord]) -> Vec<i32> {
    records
        .iter()
        .map(|r| r.week)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekStep {
    pub current: i32,
    /// Week to compare against. Equals `current` for the first week.
    pub previous: i32,
    pub is_first: bool,
}

/// Locate `selected` in the sorted week list and pick its predecessor.
/// Returns `None` when the week is not in the list.
pub fn previous_week(weeks: &[i32], selected: i32) -> Option<WeekStep> {
    let idx = weeks.iter().position(|w| *w == selected)?;
    Some(match idx {
        0 => WeekStep {
            current: selected,
            previous: selected,
            is_first: true,
        },
        _ => WeekStep {
            current: selected,
            previous: weeks[idx - 1],
            is_first: false,
        },
    })
}

/// Mean `value` per region, highest first. Ties keep region name order.
pub fn average_by_region(records: &[PercentageRecord]) -> Vec<RegionAverage> {
    let mut by_region: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        by_region.entry(r.region.as_str()).or_default().push(r.value);
    }
    let mut rows: Vec<RegionAverage> = by_region
        .into_iter()
        .map(|(region, values)| RegionAverage {
            region: region.to_string(),
            mean: average(&values),
        })
        .collect();
    rows.sort_by(|a, b| b.mean.partial_cmp(&a.mean).unwrap_or(Ordering::Equal));
    rows
}

/// Pivot of mean `value` per (region, group) at two weeks.
///
/// `difference` is absent when either week has no rows for the pair.
/// `pct_change` is relative to `previous` and falls back to `0` whenever it
/// cannot be computed.
pub fn week_comparison(
    records: &[PercentageRecord],
    previous_week: i32,
    current_week: i32,
) -> Vec<WeekComparisonRow> {
    #[derive(Default)]
    struct Acc {
        previous: Vec<f64>,
        current: Vec<f64>,
    }

    let mut map: BTreeMap<(&str, &str), Acc> = BTreeMap::new();
    for r in records {
        if r.week != previous_week && r.week != current_week {
            continue;
        }
        let e = map.entry((r.region.as_str(), r.group.as_str())).or_default();
        if r.week == previous_week {
            e.previous.push(r.value);
        }
        if r.week == current_week {
            e.current.push(r.value);
        }
    }

    map.into_iter()
        .map(|((region, group), acc)| {
            let previous = (!acc.previous.is_empty()).then(|| average(&acc.previous));
            let current = (!acc.current.is_empty()).then(|| average(&acc.current));
            let difference = match (previous, current) {
                (Some(p), Some(c)) => Some(c - p),
                _ => None,
            };
            // A zero previous mean gives an infinite change; it is exported as 0.
            let pct_change = match (difference, previous) {
                (Some(d), Some(p)) => Some(d / p * 100.0).filter(|v| v.is_finite()),
                _ => None,
            }
            .unwrap_or(0.0);
            WeekComparisonRow {
                region: region.to_string(),
                group: group.to_string(),
                previous,
                current,
                difference,
                pct_change,
            }
        })
        .collect()
}

pub fn project_kpis(records: &[ProjectRecord]) -> ProjectKpis {
    ProjectKpis {
        total_projects: records.len(),
        avg_progress: mean_progress(records),
        total_managers: count_distinct(
            records.iter().filter_map(|r| r.project_manager.as_deref()),
        ),
        total_locations: count_distinct(
            records.iter().filter_map(|r| r.geographical_scope.as_deref()),
        ),
    }
}

/// KPIs for one week of an already filtered percentage dataset.
pub fn weekly_kpis(records: &[PercentageRecord], step: WeekStep) -> WeeklyKpis {
    let week: Vec<&PercentageRecord> =
        records.iter().filter(|r| r.week == step.current).collect();
    let values: Vec<f64> = week.iter().map(|r| r.value).collect();
    WeeklyKpis {
        week: step.current,
        previous_week: step.previous,
        records: week.len(),
        avg_value: average(&values),
        delta: delta_between_weeks(records, step.current, step.previous),
        active_regions: count_distinct(week.iter().map(|r| r.region.as_str())),
        active_groups: count_distinct(week.iter().map(|r| r.group.as_str())),
    }
}

/// Projects per value of `field`, most frequent first. Ties keep first
/// appearance; projects without a value are not counted.
pub fn counts_by(records: &[ProjectRecord], field: RegionField) -> Vec<ValueCount> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in records.iter().filter_map(|r| field.value(r)) {
        let c = counts.entry(value).or_insert_with(|| {
            order.push(value);
            0
        });
        *c += 1;
    }
    let mut rows: Vec<ValueCount> = order
        .into_iter()
        .map(|value| ValueCount {
            value: value.to_string(),
            count: counts[value],
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

pub fn state_counts(records: &[ProjectRecord]) -> Vec<ValueCount> {
    counts_by(records, RegionField::State)
}

/// Projects per geographical scope.
pub fn area_counts(records: &[ProjectRecord]) -> Vec<ValueCount> {
    counts_by(records, RegionField::GeographicalScope)
}

/// Equal-width buckets of percent complete over `[0, 100]`. Projects without
/// a value are not counted.
pub fn progress_histogram(records: &[ProjectRecord], bins: usize) -> Vec<HistogramBin> {
    if bins == 0 {
        return Vec::new();
    }
    let width = 100.0 / bins as f64;
    let mut counts = vec![0usize; bins];
    for p in records.iter().filter_map(|r| r.percent_complete) {
        let idx = ((p / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count,
        })
        .collect()
}
