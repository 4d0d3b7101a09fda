// Entry point and interactive terminal front-end.
//
// Each menu option corresponds to one dashboard page:
// - [1] loads the CSV files and prints load diagnostics,
// - [2] general dashboard (project filters, KPIs, tables),
// - [3] temporal analysis (week over week percentages),
// - [4] project map (coordinates per region),
// - [5] drops the cached datasets so the next view reloads them.
// Views print Markdown previews and export CSV/JSON files.
use project_dashboard::aggregate::{
    area_counts, average_by_region, average_by_week, distinct_weeks, previous_week,
    progress_histogram, project_kpis, state_counts, week_comparison, weekly_kpis,
};
use project_dashboard::filters::{filter_percentages, filter_projects, records_for_week};
use project_dashboard::geo::{
    assign_coordinates, by_progress_desc, map_center, map_kpis, ProgressBand, RegionField,
};
use project_dashboard::types::ExportSummary;
use project_dashboard::util::{distinct_in_order, format_int, format_number};
use project_dashboard::{output, DashboardConfig, DatasetCache, ProjectCriteria, Selection};
use serde::Serialize;
use std::io::{self, Write};

const HISTOGRAM_BINS: usize = 20;

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_line("Enter choice: ")
}

/// Split a comma separated answer into trimmed, non-empty values.
fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_min_percent(input: &str) -> Result<Option<f64>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<f64>() {
        Ok(v) if (0.0..=100.0).contains(&v) => Ok(Some(v)),
        _ => Err(format!("'{}' is not a number between 0 and 100", input)),
    }
}

/// Show the available choices and read a multi-select answer. A blank
/// answer selects everything.
fn prompt_multiselect(label: &str, choices: &[String]) -> Selection {
    println!("{} available: {}", label, choices.join(", "));
    let answer = read_line(&format!("{} (comma separated, blank = all): ", label));
    Selection::from_multiselect(parse_list(&answer))
}

fn prompt_single(label: &str, choices: &[String]) -> Selection {
    println!("{} available: {}", label, choices.join(", "));
    let answer = read_line(&format!("{} (blank = all): ", label));
    Selection::from_single(Some(&answer))
}

fn export_csv<T: Serialize>(cfg: &DashboardConfig, file: &str, rows: &[T]) {
    let path = cfg.output_path(file);
    match output::write_csv(&path, rows) {
        Ok(()) => println!("(Full table exported to {})", path.display()),
        Err(e) => log::error!("Write error for {}: {}", path.display(), e),
    }
}

fn export_json<T: Serialize>(cfg: &DashboardConfig, file: &str, value: &T) {
    let path = cfg.output_path(file);
    match output::write_json(&path, value) {
        Ok(()) => println!("(Summary exported to {})", path.display()),
        Err(e) => log::error!("Write error for {}: {}", path.display(), e),
    }
}

/// Handle option [1]: load every dataset and print what happened.
fn handle_load(cache: &DatasetCache) {
    let projects = match cache.projects() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load project data: {}\n", e);
            return;
        }
    };
    if let Some(report) = cache.projects_report() {
        println!(
            "Projects: {} loaded ({} rows read, {} footer rows dropped, {} without progress)",
            format_int(projects.len()),
            format_int(report.total_rows),
            report.footer_rows_dropped,
            format_int(report.coerced_missing)
        );
    }

    match cache.percentages() {
        Ok(rows) => {
            let skipped = cache.percentages_report().map_or(0, |r| r.parse_errors);
            println!(
                "Percentages: {} rows loaded ({} skipped)",
                format_int(rows.len()),
                format_int(skipped)
            );
        }
        Err(e) => eprintln!("Failed to load percentage data: {}", e),
    }

    match cache.region_domain() {
        Ok(table) if table.is_empty() => println!("Region/domain data: not available"),
        Ok(table) => println!(
            "Region/domain data: {} rows ({})",
            format_int(table.len()),
            table.headers.join(", ")
        ),
        Err(e) => eprintln!("Failed to load region/domain data: {}", e),
    }
    println!();
}

/// Handle option [2]: general project dashboard.
fn handle_dashboard(cache: &DatasetCache) {
    let projects = match cache.projects() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load project data: {}\n", e);
            return;
        }
    };
    let cfg = cache.config();

    let states = distinct_in_order(projects.iter().filter_map(|p| p.state.as_deref()));
    let areas = distinct_in_order(projects.iter().filter_map(|p| p.geographical_scope.as_deref()));
    let managers = distinct_in_order(projects.iter().filter_map(|p| p.project_manager.as_deref()));

    let mut criteria = ProjectCriteria::unrestricted()
        .with_states(prompt_multiselect("States", &states))
        .with_areas(prompt_multiselect("Areas", &areas))
        .with_managers(prompt_multiselect("Project managers", &managers));
    loop {
        match parse_min_percent(&read_line("Minimum progress % (blank = none): ")) {
            Ok(min) => {
                criteria.min_percent = min;
                break;
            }
            Err(msg) => println!("{}", msg),
        }
    }

    let result = filter_projects(&projects, &criteria);
    let kpis = project_kpis(&result.records);
    log::info!(
        "dashboard: {} of {} projects match",
        result.records.len(),
        projects.len()
    );

    println!("\nGeneral KPIs\n");
    output::preview_table_rows(&[kpis], 1);

    println!("Projects\n");
    output::preview_table_rows(&result.records, cfg.preview_rows);
    export_csv(cfg, "dashboard_projects.csv", &result.records);

    println!("\nProjects by Geographical Scope\n");
    let by_area = area_counts(&result.records);
    output::preview_table_rows(&by_area, cfg.preview_rows);
    export_csv(cfg, "dashboard_area_counts.csv", &by_area);

    println!("\nProjects by State\n");
    let by_state = state_counts(&result.records);
    output::preview_table_rows(&by_state, cfg.preview_rows);
    export_csv(cfg, "dashboard_state_counts.csv", &by_state);

    println!("\nProgress Distribution\n");
    let bins: Vec<_> = progress_histogram(&result.records, HISTOGRAM_BINS)
        .into_iter()
        .filter(|b| b.count > 0)
        .collect();
    output::preview_table_rows(&bins, HISTOGRAM_BINS);

    export_json(
        cfg,
        "dashboard_summary.json",
        &ExportSummary::new("dashboard", criteria.describe(), kpis),
    );
    println!(
        "Average progress: {}%\n",
        format_number(result.avg_progress, 1)
    );
}

/// Handle option [3]: week over week analysis of the percentage data.
fn handle_temporal(cache: &DatasetCache) {
    let data = match cache.percentages() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to load percentage data: {}\n", e);
            return;
        }
    };
    if data.is_empty() {
        println!("No percentage data available.\n");
        return;
    }
    let cfg = cache.config();

    let groups = distinct_in_order(data.iter().map(|r| r.group.as_str()));
    let group = prompt_single("Group", &groups);

    let weeks = distinct_weeks(&data);
    let week_labels: Vec<String> = weeks.iter().map(|w| w.to_string()).collect();
    println!("Weeks available: {}", week_labels.join(", "));
    let answer = read_line("Week (blank = latest): ");
    let selected = if answer.is_empty() {
        weeks.last().copied()
    } else {
        answer.parse::<i32>().ok()
    };
    let Some(step) = selected.and_then(|w| previous_week(&weeks, w)) else {
        println!("Unknown week '{}'.\n", answer);
        return;
    };

    let regions = distinct_in_order(data.iter().map(|r| r.region.as_str()));
    let regions = prompt_multiselect("Regions", &regions);

    let filtered = filter_percentages(&data, &regions, &group);
    let kpis = weekly_kpis(&filtered, step);
    log::info!(
        "temporal: {} rows after filters, CW {} vs CW {}",
        filtered.len(),
        step.current,
        step.previous
    );

    println!("\nWeekly KPIs\n");
    output::preview_table_rows(&[kpis], 1);

    println!("Average Value per Week\n");
    let evolution = average_by_week(&filtered);
    output::preview_table_rows(&evolution, evolution.len());
    export_csv(cfg, "temporal_week_averages.csv", &evolution);

    println!("\nAverage Value per Region (CW {})\n", step.current);
    let by_region = average_by_region(&records_for_week(&filtered, step.current));
    output::preview_table_rows(&by_region, cfg.preview_rows);
    export_csv(cfg, "temporal_region_averages.csv", &by_region);

    println!("\nComparison Table\n");
    if step.is_first {
        println!("CW {} is the first week; pick a later week to compare.\n", step.current);
    } else {
        let table = week_comparison(&filtered, step.previous, step.current);
        output::preview_table_rows(&table, cfg.preview_rows);
        export_csv(cfg, "temporal_comparison.csv", &table);
    }

    let filters = vec![
        format!("group: {}", group.describe()),
        format!("regions: {}", regions.describe()),
        format!("week: {}", step.current),
    ];
    export_json(
        cfg,
        "temporal_summary.json",
        &ExportSummary::new("temporal", filters, kpis),
    );
    println!();
}

/// Handle option [4]: projects placed on the region map.
fn handle_map(cache: &DatasetCache) {
    let projects = match cache.projects() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load project data: {}\n", e);
            return;
        }
    };
    let cfg = cache.config();

    let areas = distinct_in_order(projects.iter().filter_map(|p| p.geographical_scope.as_deref()));
    let area = prompt_single("Area", &areas);
    let locations = prompt_multiselect("Locations", &areas);
    let states = distinct_in_order(projects.iter().filter_map(|p| p.state.as_deref()));
    let states = prompt_multiselect("States", &states);

    let criteria = ProjectCriteria::unrestricted()
        .with_areas(area.intersect(&locations))
        .with_states(states);
    let filtered = filter_projects(&projects, &criteria);
    let geo = assign_coordinates(&filtered.records, RegionField::GeographicalScope);
    let kpis = map_kpis(&geo);
    log::info!(
        "map: {} of {} filtered projects have coordinates",
        geo.len(),
        filtered.records.len()
    );

    println!("\nMap KPIs\n");
    output::preview_table_rows(&[kpis], 1);

    let Some(center) = map_center(&geo) else {
        println!("No projects to show with the selected filters.\n");
        return;
    };
    println!(
        "Map center: lat {}, lon {}\n",
        format_number(center.lat, 4),
        format_number(center.lon, 4)
    );
    println!("Marker colours:");
    for band in ProgressBand::ALL {
        println!("  {:<10} {}", band.to_string(), band.legend());
    }
    println!();

    println!("Project Detail\n");
    let detail = by_progress_desc(geo);
    output::preview_table_rows(&detail, cfg.preview_rows);
    export_csv(cfg, "map_projects.csv", &detail);
    export_json(
        cfg,
        "map_summary.json",
        &ExportSummary::new("map", criteria.describe(), kpis),
    );
    println!();
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = DashboardConfig::from_env();
    log::info!("reading data from {}", config.data_dir.display());
    let mut cache = DatasetCache::new(config);

    loop {
        println!("Project Dashboard");
        println!("[1] Load the data files");
        println!("[2] General dashboard");
        println!("[3] Temporal analysis");
        println!("[4] Project map");
        println!("[5] Reload data");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&cache),
            "2" => handle_dashboard(&cache),
            "3" => handle_temporal(&cache),
            "4" => handle_map(&cache),
            "5" => {
                cache.reset();
                handle_load(&cache);
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number from 0 to 5.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_answers_are_trimmed() {
        assert_eq!(parse_list(" EMEA, ,NAO ,"), vec!["EMEA", "NAO"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn min_percent_answers() {
        assert_eq!(parse_min_percent(""), Ok(None));
        assert_eq!(parse_min_percent("40"), Ok(Some(40.0)));
        assert!(parse_min_percent("140").is_err());
        assert!(parse_min_percent("abc").is_err());
    }
}
