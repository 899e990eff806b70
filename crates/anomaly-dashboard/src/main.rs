mod bootstrap;

use anyhow::Result;
use dashboard_core::settings::Settings;
use dashboard_core::DashboardError;
use dashboard_data::analysis::{
    company_deep_dive, company_selection, executive_summary, explorer, sector_analysis, watchlist,
};
use dashboard_data::export::export_csv;
use dashboard_runtime::data_manager::{Dataset, DatasetManager};
use dashboard_ui::pages;
use dashboard_ui::table_view::render_no_data;
use serde_json::json;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Anomaly Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Page: {}, Sector: {}, Format: {}",
        settings.page,
        settings.sector,
        settings.format
    );

    let data_dir = bootstrap::discover_data_dir(settings.data_dir.as_deref(), &settings.watchlist);
    tracing::debug!("Data directory: {}", data_dir.display());

    let mut manager = DatasetManager::new(settings.data_paths(&data_dir));
    let (data, warnings) = manager.snapshot();

    if let Some(path) = settings.export.as_ref() {
        let rows = explorer(&data.companies, settings.sector_filter());
        let n = export_csv(&rows, path)?;
        eprintln!("Exported {} rows to {}", n, path.display());
    }

    print!("{}", render_page(&settings, data, warnings)?);
    Ok(())
}

/// Render the requested page in the requested format.
fn render_page(settings: &Settings, data: &Dataset, warnings: &[String]) -> Result<String> {
    if settings.format == "json" {
        let body = page_json(settings, data)?;
        let doc = json!({
            "page": settings.page,
            "sector": settings.sector,
            "warnings": warnings,
            "data": body,
        });
        return Ok(format!("{}\n", serde_json::to_string_pretty(&doc)?));
    }

    let mut out = pages::render_warnings(warnings);
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&page_text(settings, data)?);
    Ok(out)
}

fn page_text(settings: &Settings, data: &Dataset) -> Result<String> {
    let records = &data.companies;
    let sector = settings.sector_filter();

    let text = match settings.page.as_str() {
        "summary" => pages::render_summary(&executive_summary(records, sector)),
        "watchlist" => pages::render_watchlist(&watchlist(records)),
        "sectors" => pages::render_sectors(&sector_analysis(records)),
        "company" => {
            match company_deep_dive(records, &data.history, settings.company.as_deref()) {
                Ok(dive) => pages::render_company(&dive),
                Err(DashboardError::LookupMiss { key, .. }) if key.is_empty() => {
                    render_no_data("Company Deep Dive", "No companies loaded.")
                }
                Err(DashboardError::LookupMiss { key, .. }) => {
                    tracing::warn!("Company not found: {}", key);
                    pages::render_company_not_found(&key, &company_selection(records))
                }
                Err(e) => return Err(e.into()),
            }
        }
        "explorer" => {
            let label = sector.unwrap_or(dashboard_core::settings::ALL_SECTORS);
            pages::render_explorer(&explorer(records, sector), label)
        }
        unknown => anyhow::bail!("Unknown page: {}", unknown),
    };
    Ok(text)
}

fn page_json(settings: &Settings, data: &Dataset) -> Result<serde_json::Value> {
    let records = &data.companies;
    let sector = settings.sector_filter();

    let value = match settings.page.as_str() {
        "summary" => serde_json::to_value(executive_summary(records, sector))?,
        "watchlist" => serde_json::to_value(watchlist(records))?,
        "sectors" => serde_json::to_value(sector_analysis(records))?,
        "company" => match company_deep_dive(records, &data.history, settings.company.as_deref()) {
            Ok(dive) => serde_json::to_value(dive)?,
            Err(DashboardError::LookupMiss { key, .. }) => json!({
                "error": "company not found",
                "query": key,
            }),
            Err(e) => return Err(e.into()),
        },
        "explorer" => serde_json::to_value(explorer(records, sector))?,
        unknown => anyhow::bail!("Unknown page: {}", unknown),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dashboard_core::settings::DataPaths;
    use std::path::Path;
    use tempfile::TempDir;

    const WATCHLIST: &str = "\
Symbol,Sector,Anomaly_Score,Anomaly_Label,TATA_Z,DSRI_Z,AQI_Z,P_OCF_Z,PEG_Z,DuPont_Discrepancy_Z,PCA_1,PCA_2
TCS,IT,-0.41,-1,2.5,0.1,0,0,0,0,1.2,-0.3
INFY,IT,0.12,1,0.2,0,0,0,0,0,0.1,0.4
HDFC,Banking,0.2,1,0,0,0,0,0,0,-0.5,0.2
";

    fn load(dir: &Path) -> (Dataset, Vec<String>) {
        let mut mgr = DatasetManager::new(DataPaths::resolve(
            dir,
            Path::new("universe.csv"),
            Path::new("watchlist.csv"),
            Path::new("history.csv"),
        ));
        let (data, warnings) = mgr.snapshot();
        (data.clone(), warnings.to_vec())
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join("universe.csv"),
            "Symbol,Company Name\nTCS,Tata Consultancy Services\nINFY,Infosys\n",
        )
        .expect("write universe");
        std::fs::write(dir.path().join("watchlist.csv"), WATCHLIST).expect("write watchlist");
        dir
    }

    fn settings(args: &[&str]) -> Settings {
        let mut argv = vec!["anomaly-dashboard"];
        argv.extend_from_slice(args);
        Settings::parse_from(argv)
    }

    #[test]
    fn test_summary_text() {
        let dir = fixture();
        let (data, warnings) = load(dir.path());

        let out = render_page(&settings(&[]), &data, &warnings).unwrap();

        assert!(out.starts_with("Executive Summary (All)"));
        assert!(out.contains("Anomalies Detected      : 1"));
    }

    #[test]
    fn test_company_page_lookup_miss_is_not_fatal() {
        let dir = fixture();
        let (data, warnings) = load(dir.path());

        let out = render_page(&settings(&["--page", "company", "--company", "XYZCO"]), &data, &warnings).unwrap();

        assert!(out.starts_with("Company not found: XYZCO"));
        assert!(out.contains("Tata Consultancy Services"));
    }

    #[test]
    fn test_company_page_json() {
        let dir = fixture();
        let (data, warnings) = load(dir.path());

        let out = render_page(
            &settings(&["--page", "company", "--company", "TCS", "--format", "json"]),
            &data,
            &warnings,
        )
        .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(doc["page"], "company");
        assert_eq!(doc["data"]["symbol"], "TCS");
        assert_eq!(doc["data"]["status"], "Outlier");
        assert!(doc["data"]["trend"].is_null());
    }

    #[test]
    fn test_explorer_json_sector_filter() {
        let dir = fixture();
        let (data, warnings) = load(dir.path());

        let out = render_page(
            &settings(&["--page", "explorer", "--sector", "Banking", "--format", "json"]),
            &data,
            &warnings,
        )
        .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = doc["data"].as_array().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Company Name"], "HDFC");
    }

    #[test]
    fn test_missing_data_renders_warning_and_empty_page() {
        let dir = TempDir::new().expect("tempdir");
        let (data, warnings) = load(dir.path());

        let out = render_page(&settings(&["--page", "watchlist"]), &data, &warnings).unwrap();

        assert!(out.starts_with("WARNING: Data files missing or unreadable"));
        assert!(out.contains("No data."));

        let company = render_page(&settings(&["--page", "company"]), &data, &warnings).unwrap();
        assert!(company.contains("No companies loaded."));
    }
}
