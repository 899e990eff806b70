//! Text renderers for the five dashboard pages.
//!
//! Each renderer takes a view computed by [`dashboard_data::analysis`] and
//! returns the full page as a `String`; nothing here touches the filesystem.

use dashboard_core::formatting::{
    format_amount, format_number, format_percent, format_score, percentage, MISSING,
};
use dashboard_core::models::{Direction, Feature, Status};
use dashboard_data::analysis::{CompanyDeepDive, CompanyRow, ExecutiveSummary, SectorAnalysis};
use dashboard_data::history::TrendPoint;

use crate::table_view::{display_width, render_no_data, TextTable};

const FEATURE_HEADERS: [&str; 6] = ["TATA", "DSRI", "AQI", "P/OCF", "PEG", "DuPont"];

fn heading(title: &str) -> String {
    format!("{title}\n{}\n", "=".repeat(display_width(title)))
}

/// Status cell with a marker so outliers stand out without colour.
fn status_cell(status: Status) -> String {
    match status {
        Status::Outlier => "! Outlier".to_string(),
        Status::Normal => "Normal".to_string(),
    }
}

fn label_cell(label: Option<i64>) -> String {
    label.map_or_else(|| MISSING.to_string(), |l| l.to_string())
}

// ── Warnings ──────────────────────────────────────────────────────────────────

/// Banner for recoverable load problems; empty when there are none.
pub fn render_warnings(warnings: &[String]) -> String {
    warnings.iter().map(|w| format!("WARNING: {w}\n")).collect()
}

// ── Executive summary ─────────────────────────────────────────────────────────

pub fn render_summary(summary: &ExecutiveSummary) -> String {
    let mut out = heading(&format!("Executive Summary ({})", summary.sector));
    out.push('\n');
    out.push_str(&format!("Total Companies Scanned : {}\n", summary.risk.total));
    out.push_str(&format!("Anomalies Detected      : {}\n", summary.risk.outliers));
    out.push_str(&format!(
        "Portfolio Risk Level    : {}\n",
        format_percent(summary.risk.risk_percent)
    ));
    out.push_str(&format!("Sectors                 : {}\n\n", summary.sector_options.join(", ")));

    if summary.map_points.is_empty() {
        out.push_str("No companies in this sector.\n");
        return out;
    }

    let mut map = TextTable::new("Market Map (PCA)", &["Symbol", "Company", "PCA 1", "PCA 2", "Size", "Status"])
        .right_align(&[2, 3, 4]);
    for p in &summary.map_points {
        map.push_row(vec![
            p.symbol.clone(),
            p.company_name.clone(),
            format_score(p.pca1),
            format_score(p.pca2),
            format_number(p.size, 3),
            status_cell(p.status),
        ]);
    }
    out.push_str(&map.render());
    out.push('\n');

    if summary.red_flags.is_empty() {
        out.push_str("Top Red Flags: none.\n");
        return out;
    }
    let mut flags = TextTable::new("Top Red Flags", &["Symbol", "Company", "Sector", "Anomaly Score"]).right_align(&[3]);
    for f in &summary.red_flags {
        flags.push_row(vec![
            f.symbol.clone(),
            f.company_name.clone(),
            f.sector.clone(),
            format_score(f.anomaly_score),
        ]);
    }
    out.push_str(&flags.render());
    out
}

// ── Watchlist ─────────────────────────────────────────────────────────────────

pub fn render_watchlist(rows: &[CompanyRow]) -> String {
    if rows.is_empty() {
        return render_no_data("The Watchlist", "No outliers were flagged.");
    }

    let mut headers = vec!["Symbol", "Company", "Sector", "Score"];
    headers.extend(FEATURE_HEADERS);
    let mut table = TextTable::new(format!("The Watchlist ({} outliers)", rows.len()), &headers)
        .right_align(&[3, 4, 5, 6, 7, 8, 9]);

    for r in rows {
        let mut cells = vec![
            r.symbol.clone(),
            r.company_name.clone(),
            r.sector.clone(),
            format_score(r.anomaly_score),
        ];
        cells.extend(r.feature_values().iter().map(|z| format_score(*z)));
        table.push_row(cells);
    }
    table.render()
}

// ── Sector analysis ───────────────────────────────────────────────────────────

pub fn render_sectors(analysis: &SectorAnalysis) -> String {
    if analysis.profile.is_empty() {
        return render_no_data("Sector Risk Profile", "No sectors to compare.");
    }

    let mut profile = TextTable::new("Sector Risk Profile", &["Sector", "Total", "Outliers", "Risk %"])
        .right_align(&[1, 2, 3]);
    let (mut total, mut outliers) = (0usize, 0usize);
    for s in &analysis.profile {
        total += s.total;
        outliers += s.outliers;
        profile.push_row(vec![
            s.sector.clone(),
            s.total.to_string(),
            s.outliers.to_string(),
            format_percent(s.risk_percent),
        ]);
    }
    profile.set_footer(vec![
        "All".to_string(),
        total.to_string(),
        outliers.to_string(),
        format_percent(percentage(outliers as f64, total as f64)),
    ]);

    let mut out = profile.render();
    out.push('\n');

    if analysis.outlier_dna.is_empty() {
        out.push_str("Forensic DNA: no outliers in any sector.\n");
        return out;
    }
    let mut headers = vec!["Sector", "Outliers"];
    headers.extend(FEATURE_HEADERS);
    let mut dna = TextTable::new("Forensic DNA (mean outlier z-score)", &headers)
        .right_align(&[1, 2, 3, 4, 5, 6, 7]);
    for s in &analysis.outlier_dna {
        let mut cells = vec![s.sector.clone(), s.outliers.to_string()];
        cells.extend(Feature::ALL.iter().map(|f| format_score(s.mean(*f))));
        dna.push_row(cells);
    }
    out.push_str(&dna.render());
    out
}

// ── Company deep dive ─────────────────────────────────────────────────────────

pub fn render_company(dive: &CompanyDeepDive) -> String {
    let mut out = heading(&format!("{} ({}) - {}", dive.company_name, dive.symbol, dive.sector));
    out.push('\n');

    match dive.status {
        Status::Outlier => out.push_str(&format!(
            "FLAGGED: {} is an anomaly (score {})\n\n",
            dive.company_name,
            format_score(dive.anomaly_score)
        )),
        Status::Normal => out.push_str(&format!(
            "NORMAL: {} looks ordinary relative to its peers (score {})\n\n",
            dive.company_name,
            format_score(dive.anomaly_score)
        )),
    }

    let mut fingerprint = TextTable::new("Forensic Fingerprint", &["Feature", "Z-Score", "Envelope"]).right_align(&[1]);
    for reading in &dive.fingerprint {
        fingerprint.push_row(vec![
            reading.label.to_string(),
            format_score(reading.z_score),
            if reading.outside_envelope { "outside +/-2" } else { "" }.to_string(),
        ]);
    }
    out.push_str(&fingerprint.render());
    out.push('\n');

    out.push_str("Primary Risk Driver\n");
    match &dive.driver {
        Some(d) => out.push_str(&format!(
            "  {} is {} (z = {})\n",
            d.feature.label(),
            match d.direction {
                Direction::High => "high",
                Direction::Low => "low",
            },
            format_score(d.z_score)
        )),
        None => out.push_str("  none\n"),
    }
    out.push_str(&format!("  {}\n\n", dive.narrative));

    match &dive.trend {
        Some(points) => out.push_str(&render_trend(points)),
        None => out.push_str("Financial Trend: no historical data for this company.\n"),
    }
    out
}

fn render_trend(points: &[TrendPoint]) -> String {
    let mut table = TextTable::new(
        "Financial Trend",
        &["Year", "Revenue", "Net Income", "Operating Cash Flow", "CFO / NI"],
    )
    .right_align(&[1, 2, 3, 4]);
    for p in points {
        table.push_row(vec![
            p.year.map_or_else(|| MISSING.to_string(), |y| y.to_string()),
            format_amount(p.revenue),
            format_amount(p.net_income),
            format_amount(p.operating_cash_flow),
            p.cash_conversion
                .map_or_else(|| MISSING.to_string(), |c| format_number(c, 2)),
        ]);
    }
    table.render()
}

/// Message shown when the requested company is not in the dataset.
pub fn render_company_not_found(query: &str, selection: &[&str]) -> String {
    let mut out = format!("Company not found: {query}\n");
    if !selection.is_empty() {
        out.push_str("Available companies (outliers first):\n");
        for name in selection.iter().take(10) {
            out.push_str(&format!("  {name}\n"));
        }
        if selection.len() > 10 {
            out.push_str(&format!("  ... and {} more\n", selection.len() - 10));
        }
    }
    out
}

// ── Data explorer ─────────────────────────────────────────────────────────────

pub fn render_explorer(rows: &[CompanyRow], sector: &str) -> String {
    let title = format!("Data Explorer ({sector})");
    if rows.is_empty() {
        return render_no_data(&title, "No rows match the current filter.");
    }

    let mut headers = vec!["Symbol", "Company", "Sector", "Score", "Label", "Status"];
    headers.extend(FEATURE_HEADERS);
    headers.extend(["PCA 1", "PCA 2"]);
    let mut table = TextTable::new(title, &headers).right_align(&[3, 4, 6, 7, 8, 9, 10, 11, 12, 13]);

    for r in rows {
        let mut cells = vec![
            r.symbol.clone(),
            r.company_name.clone(),
            r.sector.clone(),
            format_score(r.anomaly_score),
            label_cell(r.anomaly_label),
            status_cell(r.status),
        ];
        cells.extend(r.feature_values().iter().map(|z| format_score(*z)));
        cells.push(format_score(r.pca1));
        cells.push(format_score(r.pca2));
        table.push_row(cells);
    }
    let mut out = table.render();
    out.push_str(&format!("{} rows\n", rows.len()));
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::{CompanyRecord, FeatureScores, HistoricalRecord};
    use dashboard_core::narrative::INCONCLUSIVE;
    use dashboard_data::analysis::{company_deep_dive, executive_summary, explorer, sector_analysis, watchlist};
    use dashboard_data::history::HistoricalTable;

    fn make_record(symbol: &str, name: &str, sector: &str, score: f64, label: i64) -> CompanyRecord {
        CompanyRecord {
            symbol: symbol.to_string(),
            company_name: name.to_string(),
            sector: sector.to_string(),
            anomaly_score: score,
            anomaly_label: Some(label),
            features: FeatureScores::default(),
            pca1: 0.5,
            pca2: -0.5,
        }
    }

    fn sample() -> Vec<CompanyRecord> {
        let mut tcs = make_record("TCS", "Tata Consultancy Services", "IT", -0.41, -1);
        tcs.features = FeatureScores::new([2.6, 0.1, -0.3, 0.0, 0.0, 0.0]);
        vec![
            tcs,
            make_record("INFY", "Infosys", "IT", 0.12, 1),
            make_record("HDFC", "HDFC Bank", "Banking", 0.2, 1),
        ]
    }

    #[test]
    fn test_render_warnings() {
        assert_eq!(render_warnings(&[]), "");
        let out = render_warnings(&["Data files missing or unreadable".to_string()]);
        assert_eq!(out, "WARNING: Data files missing or unreadable\n");
    }

    #[test]
    fn test_render_summary_metrics_and_red_flags() {
        let out = render_summary(&executive_summary(&sample(), None));

        assert!(out.starts_with("Executive Summary (All)"));
        assert!(out.contains("Total Companies Scanned : 3"));
        assert!(out.contains("Anomalies Detected      : 1"));
        assert!(out.contains("Portfolio Risk Level    : 33.3%"));
        assert!(out.contains("Top Red Flags"));
        assert!(out.contains("! Outlier"));
    }

    #[test]
    fn test_render_summary_empty_sector() {
        let out = render_summary(&executive_summary(&sample(), Some("Textiles")));
        assert!(out.contains("Portfolio Risk Level    : 0.0%"));
        assert!(out.contains("No companies in this sector."));
    }

    #[test]
    fn test_render_watchlist() {
        let out = render_watchlist(&watchlist(&sample()));
        assert!(out.starts_with("The Watchlist (1 outliers)"));
        assert!(out.contains("Tata Consultancy Services"));
        assert!(out.contains("+2.600"));
        assert!(!out.contains("Infosys"));

        assert!(render_watchlist(&[]).contains("No data."));
    }

    #[test]
    fn test_render_sectors_with_totals() {
        let out = render_sectors(&sector_analysis(&sample()));
        assert!(out.contains("Sector Risk Profile"));
        assert!(out.contains("50.0%"));
        assert!(out.contains("All     |     3 |        1 |  33.3%"));
        assert!(out.contains("Forensic DNA"));
    }

    #[test]
    fn test_render_company_flagged_with_driver() {
        let records = sample();
        let dive = company_deep_dive(&records, &HistoricalTable::default(), Some("TCS")).unwrap();
        let out = render_company(&dive);

        assert!(out.contains("FLAGGED: Tata Consultancy Services is an anomaly (score -0.410)"));
        assert!(out.contains("Accruals (TATA) is high (z = +2.600)"));
        assert!(out.contains("outside +/-2"));
        assert!(out.contains("no historical data"));
    }

    #[test]
    fn test_render_company_normal_inconclusive_with_trend() {
        let mut records = sample();
        records[1].features = FeatureScores::new([f64::NAN; 6]);
        let history = HistoricalTable::new(vec![HistoricalRecord {
            symbol: "INFY".to_string(),
            year: Some(2024),
            revenue: Some(153670.0),
            net_income: Some(26000.0),
            operating_cash_flow: Some(13000.0),
            receivables: None,
            total_equity: None,
            extra: Vec::new(),
        }]);
        let dive = company_deep_dive(&records, &history, Some("Infosys")).unwrap();
        let out = render_company(&dive);

        assert!(out.contains("NORMAL: Infosys"));
        assert!(out.contains("  none\n"));
        assert!(out.contains(INCONCLUSIVE));
        assert!(out.contains("153,670.00"));
        assert!(out.contains("0.50"));
    }

    #[test]
    fn test_render_company_not_found_lists_choices() {
        let out = render_company_not_found("XYZCO", &["Tata Consultancy Services", "Infosys"]);
        assert!(out.starts_with("Company not found: XYZCO"));
        assert!(out.contains("  Infosys\n"));

        let many: Vec<String> = (0..12).map(|i| format!("Co {i}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        assert!(render_company_not_found("X", &refs).contains("... and 2 more"));
    }

    #[test]
    fn test_render_explorer() {
        let out = render_explorer(&explorer(&sample(), Some("IT")), "IT");
        assert!(out.starts_with("Data Explorer (IT)"));
        assert!(out.contains("2 rows"));
        assert!(!out.contains("HDFC Bank"));

        assert!(render_explorer(&[], "Textiles").contains("No rows match"));
    }
}
