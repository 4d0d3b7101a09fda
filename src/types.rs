use crate::util::{
    display_fraction, display_opt_fraction, display_opt_points, display_opt_text, display_points,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Deserialize)]
pub struct RawProjectRow {
    #[serde(rename = "Project Name")]
    pub project_name: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Geographical scope")]
    pub geographical_scope: Option<String>,
    #[serde(rename = "Project manager")]
    pub project_manager: Option<String>,
    #[serde(rename = "Percent complete")]
    pub percent_complete: Option<String>,
    #[serde(rename = "Project Type")]
    pub project_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPercentageRow {
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Group")]
    pub group: Option<String>,
    #[serde(rename = "CW")]
    pub cw: Option<String>,
    #[serde(rename = "valor")]
    pub valor: Option<String>,
}

/// One project from `proyectos.csv`.
///
/// `percent_complete` is either a finite value in `[0, 100]` or `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ProjectRecord {
    #[serde(rename = "Project Name")]
    #[tabled(rename = "Project Name")]
    pub name: String,
    #[serde(rename = "State")]
    #[tabled(rename = "State", display_with = "display_opt_text")]
    pub state: Option<String>,
    #[serde(rename = "Geographical scope")]
    #[tabled(rename = "Geographical scope", display_with = "display_opt_text")]
    pub geographical_scope: Option<String>,
    #[serde(rename = "Project manager")]
    #[tabled(rename = "Project manager", display_with = "display_opt_text")]
    pub project_manager: Option<String>,
    #[serde(rename = "Percent complete")]
    #[tabled(rename = "Percent complete", display_with = "display_opt_points")]
    pub percent_complete: Option<f64>,
    #[serde(rename = "Project Type")]
    #[tabled(rename = "Project Type")]
    pub project_type: String,
}

/// One (region, group, week) observation from `percentage_not_completed.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct PercentageRecord {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "CW")]
    #[tabled(rename = "CW")]
    pub week: i32,
    #[serde(rename = "valor")]
    #[tabled(rename = "valor", display_with = "display_fraction")]
    pub value: f64,
}

/// The optional region/domain dataset has no fixed schema, so it is kept as
/// plain text rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionDomainTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RegionDomainTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Tabled)]
pub struct WeekAverage {
    #[serde(rename = "CW")]
    #[tabled(rename = "CW")]
    pub week: i32,
    #[serde(rename = "AvgValue")]
    #[tabled(rename = "AvgValue", display_with = "display_fraction")]
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct RegionAverage {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "AvgValue")]
    #[tabled(rename = "AvgValue", display_with = "display_fraction")]
    pub mean: f64,
}

/// Mean value of one (region, group) pair at two weeks.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct WeekComparisonRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Previous")]
    #[tabled(rename = "Previous", display_with = "display_opt_fraction")]
    pub previous: Option<f64>,
    #[serde(rename = "Current")]
    #[tabled(rename = "Current", display_with = "display_opt_fraction")]
    pub current: Option<f64>,
    #[serde(rename = "Difference")]
    #[tabled(rename = "Difference", display_with = "display_opt_fraction")]
    pub difference: Option<f64>,
    #[serde(rename = "PctChange")]
    #[tabled(rename = "% Change", display_with = "display_points")]
    pub pct_change: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ValueCount {
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Half-open `[lower, upper)` bucket of percent complete; the last bucket
/// also holds `upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Tabled)]
pub struct HistogramBin {
    #[tabled(rename = "From", display_with = "display_points")]
    pub lower: f64,
    #[tabled(rename = "To", display_with = "display_points")]
    pub upper: f64,
    #[tabled(rename = "Projects")]
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Tabled)]
pub struct ProjectKpis {
    #[tabled(rename = "Total Projects")]
    pub total_projects: usize,
    #[tabled(rename = "Avg Progress", display_with = "display_points")]
    pub avg_progress: f64,
    #[tabled(rename = "Project Managers")]
    pub total_managers: usize,
    #[tabled(rename = "Locations")]
    pub total_locations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Tabled)]
pub struct WeeklyKpis {
    #[tabled(rename = "CW")]
    pub week: i32,
    #[tabled(rename = "Previous CW")]
    pub previous_week: i32,
    #[tabled(rename = "Records")]
    pub records: usize,
    #[tabled(rename = "Avg Value", display_with = "display_fraction")]
    pub avg_value: f64,
    #[tabled(rename = "Delta", display_with = "display_fraction")]
    pub delta: f64,
    #[tabled(rename = "Active Regions")]
    pub active_regions: usize,
    #[tabled(rename = "Active Groups")]
    pub active_groups: usize,
}

/// JSON document written next to each exported view.
#[derive(Debug, Serialize)]
pub struct ExportSummary<K: Serialize> {
    pub generated_at: DateTime<Utc>,
    pub view: String,
    pub filters: Vec<String>,
    pub kpis: K,
}

impl<K: Serialize> ExportSummary<K> {
    pub fn new(view: &str, filters: Vec<String>, kpis: K) -> Self {
        Self {
            generated_at: Utc::now(),
            view: view.to_string(),
            filters,
            kpis,
        }
    }
}
