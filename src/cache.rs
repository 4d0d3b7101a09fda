// Process-lifetime memoization of the loaded datasets.
//
// Each dataset is read from disk the first time it is asked for and then
// shared read-only. Nothing expires; `reset` is the only way to force a
// reload. A failed load is not cached, so the next call retries.

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::loader::{self, LoadReport};
use crate::types::{PercentageRecord, ProjectRecord, RegionDomainTable};
use once_cell::sync::OnceCell;
use std::sync::Arc;

type Loaded<T> = (Arc<T>, LoadReport);

#[derive(Debug)]
pub struct DatasetCache {
    config: DashboardConfig,
    projects: OnceCell<Loaded<Vec<ProjectRecord>>>,
    percentages: OnceCell<Loaded<Vec<PercentageRecord>>>,
    region_domain: OnceCell<Arc<RegionDomainTable>>,
}

impl DatasetCache {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            projects: OnceCell::new(),
            percentages: OnceCell::new(),
            region_domain: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn projects(&self) -> Result<Arc<Vec<ProjectRecord>>> {
        if self.projects.get().is_some() {
            log::debug!("projects served from cache");
        }
        let (data, _) = self.projects.get_or_try_init(|| {
            let (records, report) = loader::load_projects(&self.config.projects_path())?;
            Ok::<_, crate::error::DataError>((Arc::new(records), report))
        })?;
        Ok(Arc::clone(data))
    }

    pub fn percentages(&self) -> Result<Arc<Vec<PercentageRecord>>> {
        if self.percentages.get().is_some() {
            log::debug!("percentages served from cache");
        }
        let (data, _) = self.percentages.get_or_try_init(|| {
            let (records, report) = loader::load_percentages(&self.config.percentages_path())?;
            Ok::<_, crate::error::DataError>((Arc::new(records), report))
        })?;
        Ok(Arc::clone(data))
    }

    pub fn region_domain(&self) -> Result<Arc<RegionDomainTable>> {
        if self.region_domain.get().is_some() {
            log::debug!("region/domain data served from cache");
        }
        let data = self.region_domain.get_or_try_init(|| {
            loader::load_region_domain(&self.config.region_domain_path()).map(Arc::new)
        })?;
        Ok(Arc::clone(data))
    }

    pub fn projects_report(&self) -> Option<&LoadReport> {
        self.projects.get().map(|(_, report)| report)
    }

    pub fn percentages_report(&self) -> Option<&LoadReport> {
        self.percentages.get().map(|(_, report)| report)
    }

    /// Drop every cached dataset; the next access reads the files again.
    pub fn reset(&mut self) {
        self.projects.take();
        self.percentages.take();
        self.region_domain.take();
        log::debug!("dataset cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PERCENTAGES_FILE, PROJECTS_FILE};
    use crate::error::DataError;
    use std::fs;
    use std::path::Path;

    fn write_projects(dir: &Path, body: &str) {
        let header =
            "Project Name,State,Geographical scope,Project manager,Percent complete,Project Type\n";
        fs::write(dir.join(PROJECTS_FILE), format!("{header}{body},,,,,\n,,,,,\n")).unwrap();
    }

    fn cache_for(dir: &Path) -> DatasetCache {
        DatasetCache::new(DashboardConfig::default().with_data_dir(dir))
    }

    #[test]
    fn loads_once_and_shares_the_dataset() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_projects(dir.path(), "A,Open,EMEA,Ana,10,Launch\n");
        let cache = cache_for(dir.path());

        let first = cache.projects().unwrap();
        write_projects(dir.path(), "A,Open,EMEA,Ana,10,Launch\nB,Open,ASIA,Bo,20,Launch\n");
        let second = cache.projects().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
        assert_eq!(cache.projects_report().map(|r| r.kept_rows), Some(1));
    }

    #[test]
    fn reset_forces_a_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_projects(dir.path(), "A,Open,EMEA,Ana,10,Launch\n");
        let mut cache = cache_for(dir.path());
        assert_eq!(cache.projects().unwrap().len(), 1);

        write_projects(dir.path(), "A,Open,EMEA,Ana,10,Launch\nB,Open,ASIA,Bo,20,Launch\n");
        cache.reset();
        assert!(cache.projects_report().is_none());
        assert_eq!(cache.projects().unwrap().len(), 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = cache_for(dir.path());
        assert!(matches!(
            cache.projects(),
            Err(DataError::MissingRequiredFile { .. })
        ));
        write_projects(dir.path(), "A,Open,EMEA,Ana,10,Launch\n");
        assert_eq!(cache.projects().unwrap().len(), 1);
    }

    #[test]
    fn optional_datasets_default_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = cache_for(dir.path());
        assert!(cache.percentages().unwrap().is_empty());
        assert!(cache.region_domain().unwrap().is_empty());

        fs::write(dir.path().join(PERCENTAGES_FILE), "Region,Group,CW,valor\nEMEA,G1,1,0.5\n")
            .unwrap();
        // Still empty: the first (empty) result is cached until reset.
        assert!(cache.percentages().unwrap().is_empty());
    }
}
