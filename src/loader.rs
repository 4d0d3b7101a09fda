use crate::error::{DataError, Result};
use crate::types::{
    PercentageRecord, ProjectRecord, RawPercentageRow, RawProjectRow, RegionDomainTable,
};
use crate::util::{clean_text, coerce_percent, decode_latin1, parse_f64_safe, parse_week};
use csv::ReaderBuilder;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Rows at the end of the project export that hold totals, not projects.
pub const PROJECT_FOOTER_ROWS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub footer_rows_dropped: usize,
    pub coerced_missing: usize,
    pub parse_errors: usize,
}

/// Load `proyectos.csv`. The file is Latin-1 encoded and its last two rows
/// are discarded. A missing file is fatal.
pub fn load_projects(path: &Path) -> Result<(Vec<ProjectRecord>, LoadReport)> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DataError::MissingRequiredFile {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let text = decode_latin1(&bytes);
    let (records, report) = parse_projects(text.as_bytes())?;
    log::info!(
        "Loaded {} projects from {} ({} rows, {} footer rows dropped, {} without progress)",
        report.kept_rows,
        path.display(),
        report.total_rows,
        report.footer_rows_dropped,
        report.coerced_missing
    );
    Ok((records, report))
}

pub fn parse_projects<R: Read>(reader: R) -> Result<(Vec<ProjectRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let rows = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let total_rows = rows.len();
    let keep = total_rows.saturating_sub(PROJECT_FOOTER_ROWS);
    let mut report = LoadReport {
        total_rows,
        footer_rows_dropped: total_rows - keep,
        ..LoadReport::default()
    };

    let mut records = Vec::with_capacity(keep);
    for (idx, row) in rows.into_iter().take(keep).enumerate() {
        let raw: RawProjectRow = match row.deserialize(Some(&headers)) {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Skipping project row {}: {}", idx + 1, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let percent_complete = coerce_percent(raw.percent_complete.as_deref());
        if percent_complete.is_none() {
            report.coerced_missing += 1;
        }

        records.push(ProjectRecord {
            name: clean_text(raw.project_name).unwrap_or_default(),
            state: clean_text(raw.state),
            geographical_scope: clean_text(raw.geographical_scope),
            project_manager: clean_text(raw.project_manager),
            percent_complete,
            project_type: clean_text(raw.project_type).unwrap_or_default(),
        });
    }

    report.kept_rows = records.len();
    Ok((records, report))
}

/// Load `percentage_not_completed.csv`. A missing file yields an empty
/// dataset; rows with an unusable region, group, week or value are skipped.
pub fn load_percentages(path: &Path) -> Result<(Vec<PercentageRecord>, LoadReport)> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("{} not found; continuing without percentage data", path.display());
            return Ok((Vec::new(), LoadReport::default()));
        }
        Err(e) => return Err(e.into()),
    };
    let (records, report) = parse_percentages(file)?;
    log::info!(
        "Loaded {} percentage rows from {} ({} skipped)",
        report.kept_rows,
        path.display(),
        report.parse_errors
    );
    Ok((records, report))
}

pub fn parse_percentages<R: Read>(reader: R) -> Result<(Vec<PercentageRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (idx, result) in rdr.deserialize::<RawPercentageRow>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                log::debug!("Skipping percentage row {}: {}", idx + 1, e);
                report.parse_errors += 1;
                continue;
            }
        };
        let parsed = (
            clean_text(row.region),
            clean_text(row.group),
            parse_week(row.cw.as_deref()),
            parse_f64_safe(row.valor.as_deref()),
        );
        let (Some(region), Some(group), Some(week), Some(value)) = parsed else {
            log::debug!("Skipping percentage row {}: missing or invalid field", idx + 1);
            report.parse_errors += 1;
            continue;
        };
        records.push(PercentageRecord {
            region,
            group,
            week,
            value,
        });
    }

    report.kept_rows = records.len();
    Ok((records, report))
}

/// Load `region_domain_data.csv`. The file is optional; when it is absent an
/// empty table is returned.
pub fn load_region_domain(path: &Path) -> Result<RegionDomainTable> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("{} not found; region/domain data is empty", path.display());
            return Ok(RegionDomainTable::default());
        }
        Err(e) => return Err(e.into()),
    };
    let table = parse_region_domain(file)?;
    log::info!("Loaded {} region/domain rows from {}", table.len(), path.display());
    Ok(table)
}

pub fn parse_region_domain<R: Read>(reader: R) -> Result<RegionDomainTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(RegionDomainTable { headers, rows })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    const PROJECTS_HEADER: &str =
        "Project Name,State,Geographical scope,Project manager,Percent complete,Project Type\n";

    /// Yields `data`, then fails every later read.
    struct FailingReader {
        data: io::Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::other("device went away")),
                n => Ok(n),
            }
        }
    }

    pub(crate) const PROJECTS_CSV: &str = "\
Project Name,State,Geographical scope,Project manager,Percent complete,Project Type
Alpha,Open,EMEA,Ana,50,Launch
Beta,Closed,ASIA,Bo,abc,Launch
Gamma,Open,NAO,,75,Upgrade
Total,,,,,
Generated by export,,,,,
";

    #[test]
    fn drops_footer_and_coerces_progress() {
        let (records, report) = parse_projects(PROJECTS_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.footer_rows_dropped, 2);
        assert_eq!(report.coerced_missing, 1);

        let progress: Vec<Option<f64>> = records.iter().map(|r| r.percent_complete).collect();
        assert_eq!(progress, vec![Some(50.0), None, Some(75.0)]);
        assert_eq!(records[2].project_manager, None);
        assert_eq!(records[0].geographical_scope.as_deref(), Some("EMEA"));
    }

    #[test]
    fn fewer_rows_than_footer_yields_empty() {
        let csv = format!("{PROJECTS_HEADER}Total,,,,,\n");
        let (records, report) = parse_projects(csv.as_bytes()).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.footer_rows_dropped, 1);
    }

    #[test]
    fn project_file_is_read_as_latin1() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("proyectos.csv");
        let mut bytes = PROJECTS_HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"Planta Le\xf3n,Open,NAO,Jos\xe9,10,Launch\n,,,,,\n,,,,,\n");
        fs::write(&path, bytes).unwrap();

        let (records, _) = load_projects(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Planta León");
        assert_eq!(records[0].project_manager.as_deref(), Some("José"));
    }

    #[test]
    fn missing_project_file_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_projects(&dir.path().join("proyectos.csv")).unwrap_err();
        assert!(matches!(err, DataError::MissingRequiredFile { .. }));
    }

    #[test]
    fn missing_optional_files_are_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (records, report) = load_percentages(&dir.path().join("nope.csv")).unwrap();
        assert!(records.is_empty());
        assert_eq!(report, LoadReport::default());
        let table = load_region_domain(&dir.path().join("nope.csv")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn parses_percentages_and_skips_bad_rows() {
        let csv = "\
Region,Group,CW,valor
EMEA,G1,1,0.10
EMEA,G1,2.0,0.20
ASIA,G1,x,0.30
,G2,3,0.5
NAO,G2,3,
";
        let (records, report) = parse_percentages(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].week, 2);
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.parse_errors, 3);
    }

    #[test]
    fn read_failure_is_not_a_skipped_row() {
        let reader = FailingReader {
            data: io::Cursor::new(b"Region,Group,CW,valor\nEMEA,G1,1,0.10\n".to_vec()),
        };
        let err = parse_percentages(reader).unwrap_err();
        assert!(matches!(err, DataError::Csv(ref e) if e.is_io_error()));
    }

    #[test]
    fn region_domain_keeps_raw_text() {
        let csv = "Region, Domain\nEMEA,Seating\nASIA,Interiors\n";
        let table = parse_region_domain(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Region", "Domain"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["ASIA", "Interiors"]);
    }
}
