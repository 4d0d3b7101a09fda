// Runtime configuration for the dashboard.
//
// Everything is read from environment variables with sensible defaults so the
// binary can be started from the project folder without arguments.
use std::env;
use std::path::{Path, PathBuf};

pub const PROJECTS_FILE: &str = "proyectos.csv";
pub const PERCENTAGES_FILE: &str = "percentage_not_completed.csv";
pub const REGION_DOMAIN_FILE: &str = "region_domain_data.csv";

pub const DATA_DIR_VAR: &str = "DASHBOARD_DATA_DIR";
pub const OUTPUT_DIR_VAR: &str = "DASHBOARD_OUTPUT_DIR";
pub const PREVIEW_ROWS_VAR: &str = "DASHBOARD_PREVIEW_ROWS";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl DashboardConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset. An unparseable or zero preview row
    /// count falls back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();
        if let Some(dir) = get(DATA_DIR_VAR) {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(OUTPUT_DIR_VAR) {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(PREVIEW_ROWS_VAR) {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => cfg.preview_rows = n,
                _ => log::warn!(
                    "Ignoring {}={:?}; using {} preview rows",
                    PREVIEW_ROWS_VAR,
                    raw,
                    DEFAULT_PREVIEW_ROWS
                ),
            }
        }
        cfg
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn projects_path(&self) -> PathBuf {
        self.data_dir.join(PROJECTS_FILE)
    }

    pub fn percentages_path(&self) -> PathBuf {
        self.data_dir.join(PERCENTAGES_FILE)
    }

    pub fn region_domain_path(&self) -> PathBuf {
        self.data_dir.join(REGION_DOMAIN_FILE)
    }

    pub fn output_path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
