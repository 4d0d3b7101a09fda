// Map support: fixed region coordinates and marker classification.

use crate::types::ProjectRecord;
use crate::util::{
    average, count_distinct, display_coord, display_opt_points, display_opt_text, display_points,
};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

static REGION_COORDINATES: Lazy<HashMap<&'static str, Coordinate>> = Lazy::new(|| {
    HashMap::from([
        ("EMEA", Coordinate { lat: 50.1109, lon: 8.6820 }),
        ("ASIA", Coordinate { lat: 35.6895, lon: 139.6917 }),
        ("NAO", Coordinate { lat: 42.3314, lon: -83.0458 }),
        ("BRAZIL", Coordinate { lat: -23.5505, lon: -46.6333 }),
    ])
});

/// Coordinate of a region code. Lookup is exact; unknown regions have none.
pub fn coordinates_for(region: &str) -> Option<Coordinate> {
    REGION_COORDINATES.get(region).copied()
}

/// Which project attribute carries the region code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionField {
    #[default]
    GeographicalScope,
    State,
}

impl RegionField {
    pub fn value<'a>(&self, record: &'a ProjectRecord) -> Option<&'a str> {
        match self {
            RegionField::GeographicalScope => record.geographical_scope.as_deref(),
            RegionField::State => record.state.as_deref(),
        }
    }
}

/// Marker colour bucket by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBand {
    Red,
    Orange,
    LightBlue,
    Green,
}

impl ProgressBand {
    pub const ALL: [ProgressBand; 4] = [
        ProgressBand::Red,
        ProgressBand::Orange,
        ProgressBand::LightBlue,
        ProgressBand::Green,
    ];

    pub fn for_progress(progress: f64) -> Self {
        if progress < 25.0 {
            ProgressBand::Red
        } else if progress < 50.0 {
            ProgressBand::Orange
        } else if progress < 75.0 {
            ProgressBand::LightBlue
        } else {
            ProgressBand::Green
        }
    }

    pub fn legend(&self) -> &'static str {
        match self {
            ProgressBand::Red => "< 25% progress",
            ProgressBand::Orange => "25-50% progress",
            ProgressBand::LightBlue => "50-75% progress",
            ProgressBand::Green => ">= 75% progress",
        }
    }
}

impl fmt::Display for ProgressBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressBand::Red => "red",
            ProgressBand::Orange => "orange",
            ProgressBand::LightBlue => "lightblue",
            ProgressBand::Green => "green",
        };
        f.write_str(s)
    }
}

fn display_band(band: &Option<ProgressBand>) -> String {
    band.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string())
}

/// A project placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GeoProject {
    #[serde(rename = "Project Name")]
    #[tabled(rename = "Project Name")]
    pub name: String,
    #[serde(rename = "Geographical scope")]
    #[tabled(rename = "Geographical scope", display_with = "display_opt_text")]
    pub geographical_scope: Option<String>,
    #[serde(rename = "State")]
    #[tabled(rename = "State", display_with = "display_opt_text")]
    pub state: Option<String>,
    #[serde(rename = "Percent complete")]
    #[tabled(rename = "Percent complete", display_with = "display_opt_points")]
    pub percent_complete: Option<f64>,
    #[serde(rename = "Project manager")]
    #[tabled(rename = "Project manager", display_with = "display_opt_text")]
    pub project_manager: Option<String>,
    #[serde(rename = "Project Type")]
    #[tabled(rename = "Project Type")]
    pub project_type: String,
    #[tabled(display_with = "display_coord")]
    pub lat: f64,
    #[tabled(display_with = "display_coord")]
    pub lon: f64,
    #[tabled(rename = "Marker", display_with = "display_band")]
    pub band: Option<ProgressBand>,
}

/// Attach coordinates to projects whose region is known; everything else is
/// dropped. Input order is preserved.
pub fn assign_coordinates(records: &[ProjectRecord], field: RegionField) -> Vec<GeoProject> {
    records
        .iter()
        .filter_map(|r| {
            let coord = coordinates_for(field.value(r)?)?;
            Some(GeoProject {
                name: r.name.clone(),
                geographical_scope: r.geographical_scope.clone(),
                state: r.state.clone(),
                percent_complete: r.percent_complete,
                project_manager: r.project_manager.clone(),
                project_type: r.project_type.clone(),
                lat: coord.lat,
                lon: coord.lon,
                band: r.percent_complete.map(ProgressBand::for_progress),
            })
        })
        .collect()
}

/// Mean position of the markers, `None` without markers.
pub fn map_center(projects: &[GeoProject]) -> Option<Coordinate> {
    if projects.is_empty() {
        return None;
    }
    let lats: Vec<f64> = projects.iter().map(|p| p.lat).collect();
    let lons: Vec<f64> = projects.iter().map(|p| p.lon).collect();
    Some(Coordinate {
        lat: average(&lats),
        lon: average(&lons),
    })
}

/// Highest progress first; projects without progress go last.
pub fn by_progress_desc(mut projects: Vec<GeoProject>) -> Vec<GeoProject> {
    projects.sort_by(|a, b| match (a.percent_complete, b.percent_complete) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    projects
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Tabled)]
pub struct MapKpis {
    #[tabled(rename = "Projects on Map")]
    pub projects_on_map: usize,
    #[tabled(rename = "Locations")]
    pub locations: usize,
    #[tabled(rename = "Avg Progress", display_with = "display_points")]
    pub avg_progress: f64,
}

pub fn map_kpis(projects: &[GeoProject]) -> MapKpis {
    let progress: Vec<f64> = projects.iter().filter_map(|p| p.percent_complete).collect();
    MapKpis {
        projects_on_map: projects.len(),
        locations: count_distinct(projects.iter().filter_map(|p| p.geographical_scope.as_deref())),
        avg_progress: average(&progress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, area: Option<&str>, pct: Option<f64>) -> ProjectRecord {
        ProjectRecord {
            name: name.to_string(),
            state: Some("Open".to_string()),
            geographical_scope: area.map(str::to_string),
            project_manager: None,
            percent_complete: pct,
            project_type: "Launch".to_string(),
        }
    }

    #[test]
    fn unknown_regions_are_dropped() {
        let rows = vec![
            project("mars", Some("MARS"), Some(10.0)),
            project("frankfurt", Some("EMEA"), Some(80.0)),
            project("nowhere", None, Some(10.0)),
            project("lowercase", Some("emea"), Some(10.0)),
        ];
        let geo = assign_coordinates(&rows, RegionField::GeographicalScope);
        assert_eq!(geo.len(), 1);
        assert_eq!(geo[0].name, "frankfurt");
        assert_eq!((geo[0].lat, geo[0].lon), (50.1109, 8.6820));
        assert_eq!(geo[0].band, Some(ProgressBand::Green));
    }

    #[test]
    fn output_is_a_stable_subset_of_known_regions() {
        let rows = vec![
            project("a", Some("BRAZIL"), None),
            project("b", Some("LATAM"), Some(1.0)),
            project("c", Some("ASIA"), Some(30.0)),
            project("d", Some("NAO"), Some(60.0)),
        ];
        let geo = assign_coordinates(&rows, RegionField::GeographicalScope);
        assert!(geo.len() <= rows.len());
        let names: Vec<&str> = geo.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
        for g in &geo {
            let region = g.geographical_scope.as_deref().unwrap();
            assert!(["EMEA", "ASIA", "NAO", "BRAZIL"].contains(&region));
        }
        assert_eq!(geo[0].band, None);
    }

    #[test]
    fn region_can_come_from_state() {
        let mut row = project("x", Some("MARS"), Some(5.0));
        row.state = Some("ASIA".to_string());
        let geo = assign_coordinates(&[row], RegionField::State);
        assert_eq!(geo.len(), 1);
        assert_eq!(geo[0].lon, 139.6917);
    }

    #[test]
    fn bands_split_at_quarters() {
        assert_eq!(ProgressBand::for_progress(0.0), ProgressBand::Red);
        assert_eq!(ProgressBand::for_progress(25.0), ProgressBand::Orange);
        assert_eq!(ProgressBand::for_progress(74.9), ProgressBand::LightBlue);
        assert_eq!(ProgressBand::for_progress(75.0), ProgressBand::Green);
    }

    #[test]
    fn center_and_ordering() {
        let rows = vec![
            project("low", Some("EMEA"), Some(10.0)),
            project("none", Some("ASIA"), None),
            project("high", Some("EMEA"), Some(90.0)),
        ];
        let geo = assign_coordinates(&rows, RegionField::GeographicalScope);
        let center = map_center(&geo).unwrap();
        assert!((center.lat - (50.1109 * 2.0 + 35.6895) / 3.0).abs() < 1e-9);
        assert!(map_center(&[]).is_none());

        let kpis = map_kpis(&geo);
        assert_eq!((kpis.projects_on_map, kpis.locations), (3, 2));
        assert_eq!(kpis.avg_progress, 50.0);

        let ordered = by_progress_desc(geo);
        let names: Vec<&str> = ordered.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["high", "low", "none"]);
    }
}
