// Facet filtering over the loaded datasets.
//
// Every facet is a `Selection`. `Unrestricted` keeps every row, while `Only`
// keeps rows whose value is in the set, so an empty `Only` keeps nothing.
// Multi-select widgets send an empty list to mean "no restriction"; that
// mapping is opt-in through `Selection::from_multiselect`.

use crate::types::{PercentageRecord, ProjectRecord};
use crate::util::average;
use std::collections::BTreeSet;

/// Single-select values that stand for "everything".
const ALL_SENTINELS: [&str; 4] = ["todos", "todas", "all", "*"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unrestricted,
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }

    /// Multi-select convention: an empty choice means no restriction.
    pub fn from_multiselect<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match Self::only(values) {
            Selection::Only(set) if set.is_empty() => Selection::Unrestricted,
            sel => sel,
        }
    }

    /// Single-select convention: nothing, a blank, or an "all" sentinel
    /// means no restriction.
    pub fn from_single(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Selection::Unrestricted,
            Some(v) if ALL_SENTINELS.contains(&v.to_lowercase().as_str()) => {
                Selection::Unrestricted
            }
            Some(v) => Self::only([v]),
        }
    }

    /// A row with no value for the facet only passes when unrestricted.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::Unrestricted => true,
            Selection::Only(set) => value.is_some_and(|v| set.contains(v)),
        }
    }

    /// Both selections must accept a value.
    pub fn intersect(&self, other: &Selection) -> Selection {
        match (self, other) {
            (Selection::Unrestricted, sel) | (sel, Selection::Unrestricted) => sel.clone(),
            (Selection::Only(a), Selection::Only(b)) => {
                Selection::Only(a.intersection(b).cloned().collect())
            }
        }
    }

    /// Short human description, e.g. `all` or `EMEA, NAO`.
    pub fn describe(&self) -> String {
        match self {
            Selection::Unrestricted => "all".to_string(),
            Selection::Only(set) if set.is_empty() => "none".to_string(),
            Selection::Only(set) => set.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}

/// Project facets. `min_percent: None` applies no numeric threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectCriteria {
    pub states: Selection,
    pub areas: Selection,
    pub managers: Selection,
    pub min_percent: Option<f64>,
}

impl ProjectCriteria {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn with_states(mut self, states: Selection) -> Self {
        self.states = states;
        self
    }

    pub fn with_areas(mut self, areas: Selection) -> Self {
        self.areas = areas;
        self
    }

    pub fn with_managers(mut self, managers: Selection) -> Self {
        self.managers = managers;
        self
    }

    pub fn with_min_percent(mut self, min: f64) -> Self {
        self.min_percent = Some(min);
        self
    }

    pub fn matches(&self, record: &ProjectRecord) -> bool {
        self.states.matches(record.state.as_deref())
            && self.areas.matches(record.geographical_scope.as_deref())
            && self.managers.matches(record.project_manager.as_deref())
            && self
                .min_percent
                .map_or(true, |min| record.percent_complete.is_some_and(|p| p >= min))
    }

    pub fn describe(&self) -> Vec<String> {
        vec![
            format!("states: {}", self.states.describe()),
            format!("areas: {}", self.areas.describe()),
            format!("managers: {}", self.managers.describe()),
            match self.min_percent {
                Some(min) => format!("min progress: {}%", min),
                None => "min progress: none".to_string(),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectFilterResult {
    pub records: Vec<ProjectRecord>,
    /// Mean percent complete of `records`, `0` when nothing has a value.
    pub avg_progress: f64,
}

pub fn filter_projects(
    records: &[ProjectRecord],
    criteria: &ProjectCriteria,
) -> ProjectFilterResult {
    let records: Vec<ProjectRecord> = records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    let avg_progress = mean_progress(&records);
    ProjectFilterResult {
        records,
        avg_progress,
    }
}

/// Mean of the present percent-complete values, `0` if there are none.
pub fn mean_progress(records: &[ProjectRecord]) -> f64 {
    let values: Vec<f64> = records.iter().filter_map(|r| r.percent_complete).collect();
    average(&values)
}

pub fn filter_percentages(
    records: &[PercentageRecord],
    regions: &Selection,
    group: &Selection,
) -> Vec<PercentageRecord> {
    records
        .iter()
        .filter(|r| {
            regions.matches(Some(r.region.as_str())) && group.matches(Some(r.group.as_str()))
        })
        .cloned()
        .collect()
}

pub fn records_for_week(records: &[PercentageRecord], week: i32) -> Vec<PercentageRecord> {
    records.iter().filter(|r| r.week == week).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(
        name: &str,
        state: &str,
        area: Option<&str>,
        pm: Option<&str>,
        pct: Option<f64>,
    ) -> ProjectRecord {
        ProjectRecord {
            name: name.to_string(),
            state: Some(state.to_string()),
            geographical_scope: area.map(str::to_string),
            project_manager: pm.map(str::to_string),
            percent_complete: pct,
            project_type: "Launch".to_string(),
        }
    }

    fn sample_projects() -> Vec<ProjectRecord> {
        vec![
            project("A", "Open", Some("EMEA"), Some("Ana"), Some(50.0)),
            project("B", "Closed", Some("ASIA"), Some("Bo"), None),
            project("C", "Open", Some("NAO"), None, Some(75.0)),
            project("D", "On hold", None, Some("Ana"), Some(10.0)),
        ]
    }

    fn pct(region: &str, group: &str, week: i32, value: f64) -> PercentageRecord {
        PercentageRecord {
            region: region.to_string(),
            group: group.to_string(),
            week,
            value,
        }
    }

    #[test]
    fn unrestricted_criteria_is_identity() {
        let data = sample_projects();
        let out = filter_projects(&data, &ProjectCriteria::unrestricted());
        assert_eq!(out.records, data);
        assert!((out.avg_progress - 135.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn result_is_a_subset_matching_every_predicate() {
        let data = sample_projects();
        let criteria = ProjectCriteria::unrestricted()
            .with_states(Selection::only(["Open", "On hold"]))
            .with_managers(Selection::only(["Ana"]))
            .with_min_percent(20.0);
        let out = filter_projects(&data, &criteria);
        assert_eq!(out.records.len(), 1);
        for r in &out.records {
            assert!(data.contains(r));
            assert!(criteria.matches(r));
        }
        assert_eq!(out.records[0].name, "A");
        assert_eq!(out.avg_progress, 50.0);
    }

    #[test]
    fn zero_threshold_drops_absent_progress() {
        let data = sample_projects();
        let out = filter_projects(&data, &ProjectCriteria::unrestricted().with_min_percent(0.0));
        assert_eq!(out.records.len(), 3);
        assert!(out.records.iter().all(|r| r.percent_complete.is_some()));
        assert!((out.avg_progress - mean_progress(&data)).abs() < 1e-9);
    }

    #[test]
    fn empty_result_averages_to_zero() {
        let data = sample_projects();
        let out = filter_projects(&data, &ProjectCriteria::unrestricted().with_min_percent(99.0));
        assert!(out.records.is_empty());
        assert_eq!(out.avg_progress, 0.0);
    }

    #[test]
    fn empty_only_selection_matches_nothing() {
        let data = sample_projects();
        let criteria =
            ProjectCriteria::unrestricted().with_areas(Selection::only(Vec::<String>::new()));
        assert!(filter_projects(&data, &criteria).records.is_empty());

        let legacy = ProjectCriteria::unrestricted()
            .with_areas(Selection::from_multiselect(Vec::<String>::new()));
        assert_eq!(filter_projects(&data, &legacy).records.len(), data.len());
    }

    #[test]
    fn absent_facet_value_fails_only_selection() {
        let data = sample_projects();
        let criteria = ProjectCriteria::unrestricted()
            .with_areas(Selection::only(["EMEA", "ASIA", "NAO"]));
        let out = filter_projects(&data, &criteria);
        let names: Vec<&str> = out.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn single_select_sentinels() {
        assert_eq!(Selection::from_single(Some("Todos")), Selection::Unrestricted);
        assert_eq!(Selection::from_single(Some("Todas")), Selection::Unrestricted);
        assert_eq!(Selection::from_single(Some(" ")), Selection::Unrestricted);
        assert_eq!(Selection::from_single(None), Selection::Unrestricted);
        assert_eq!(Selection::from_single(Some("G1")), Selection::only(["G1"]));
    }

    #[test]
    fn intersect_narrows() {
        let a = Selection::only(["EMEA", "ASIA"]);
        let b = Selection::only(["ASIA", "NAO"]);
        assert_eq!(a.intersect(&b), Selection::only(["ASIA"]));
        assert_eq!(Selection::Unrestricted.intersect(&b), b);
        assert_eq!(a.describe(), "ASIA, EMEA");
    }

    #[test]
    fn filters_percentages_by_region_and_group() {
        let rows = vec![
            pct("EMEA", "G1", 1, 0.10),
            pct("EMEA", "G1", 2, 0.20),
            pct("ASIA", "G1", 2, 0.30),
            pct("EMEA", "G2", 2, 0.40),
        ];
        let emea = Selection::only(["EMEA"]);
        let out = filter_percentages(&rows, &emea, &Selection::from_single(Some("G1")));
        assert_eq!(out.len(), 2);
        assert_eq!(out.iter().map(|r| r.week).collect::<Vec<_>>(), vec![1, 2]);

        let every_group = Selection::from_single(Some("Todos"));
        let all = filter_percentages(&rows, &Selection::Unrestricted, &every_group);
        assert_eq!(all, rows);
        assert_eq!(records_for_week(&rows, 2).len(), 3);
    }
}
