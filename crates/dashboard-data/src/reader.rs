//! CSV loading and joining for the anomaly dashboard.
//!
//! Reads the universe, watchlist and historical statement tables and turns
//! them into [`CompanyRecord`] and [`HistoricalRecord`] rows. The watchlist is
//! left-joined onto the universe by symbol; no other validation happens here.
//! Cells are decoded lossily, so a stray non-UTF-8 byte only affects its own
//! cell.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::ByteRecord;
use dashboard_core::models::{CompanyRecord, Feature, FeatureScores, HistoricalRecord};
use dashboard_core::{DashboardError, Result};
use tracing::{debug, warn};

// ── Column contracts ──────────────────────────────────────────────────────────

pub const COL_SYMBOL: &str = "Symbol";
pub const COL_COMPANY_NAME: &str = "Company Name";
pub const COL_SECTOR: &str = "Sector";
pub const COL_ANOMALY_SCORE: &str = "Anomaly_Score";
pub const COL_ANOMALY_LABEL: &str = "Anomaly_Label";
pub const COL_PCA_1: &str = "PCA_1";
pub const COL_PCA_2: &str = "PCA_2";

pub const COL_TICKER: &str = "Ticker";
pub const COL_FISCAL_YEAR_END: &str = "Financial Year End";

/// Historical statement columns with a dedicated field on [`HistoricalRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementField {
    Revenue,
    NetIncome,
    OperatingCashFlow,
    Receivables,
    TotalEquity,
}

/// Fixed rename map applied to the historical file on ingest.
const STATEMENT_RENAMES: [(&str, StatementField); 5] = [
    ("Total Revenue", StatementField::Revenue),
    ("Net Income", StatementField::NetIncome),
    ("Operating Cash Flow (CFO)", StatementField::OperatingCashFlow),
    ("Receivables", StatementField::Receivables),
    ("Total Equity", StatementField::TotalEquity),
];

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the universe and watchlist tables and left-join them by symbol.
///
/// Every watchlist row survives, in file order. Rows whose symbol is absent
/// from the universe (or has a blank name there) use the symbol as their
/// company name. When the universe repeats a symbol, its first row wins.
///
/// Fails with [`DashboardError::DataUnavailable`] when either file is missing,
/// unreadable, or lacks a required column.
pub fn load_company_dataset(universe_path: &Path, watchlist_path: &Path) -> Result<Vec<CompanyRecord>> {
    let names = load_universe_names(universe_path)?;

    let (mut reader, columns) = open_csv(watchlist_path)?;
    let symbol_idx = columns.require(COL_SYMBOL, watchlist_path)?;
    let sector_idx = columns.require(COL_SECTOR, watchlist_path)?;
    let score_idx = columns.require(COL_ANOMALY_SCORE, watchlist_path)?;
    let label_idx = columns.require(COL_ANOMALY_LABEL, watchlist_path)?;
    let pca1_idx = columns.require(COL_PCA_1, watchlist_path)?;
    let pca2_idx = columns.require(COL_PCA_2, watchlist_path)?;
    let mut feature_idx = [0usize; 6];
    for feature in Feature::ALL {
        feature_idx[feature.index()] = columns.require(feature.column(), watchlist_path)?;
    }

    let mut records = Vec::new();
    let mut malformed_cells = 0usize;
    let mut unmatched = 0usize;

    for row in reader.byte_records() {
        let row = row.map_err(|e| DashboardError::unavailable(watchlist_path, e.to_string()))?;

        let mut number = |idx: usize| -> f64 {
            let cell = cell(&row, idx);
            match parse_number(&cell) {
                Some(v) => v,
                None => {
                    if !cell.is_empty() {
                        malformed_cells += 1;
                    }
                    f64::NAN
                }
            }
        };

        let anomaly_score = number(score_idx);
        let pca1 = number(pca1_idx);
        let pca2 = number(pca2_idx);
        let mut features = FeatureScores::default();
        for feature in Feature::ALL {
            features.set(feature, number(feature_idx[feature.index()]));
        }

        let label_cell = cell(&row, label_idx);
        let anomaly_label = parse_label(&label_cell);
        if anomaly_label.is_none() && !label_cell.is_empty() {
            malformed_cells += 1;
        }

        let symbol = cell(&row, symbol_idx).into_owned();
        let company_name = match names.get(&symbol) {
            Some(name) => name.clone(),
            None => {
                unmatched += 1;
                symbol.clone()
            }
        };

        records.push(CompanyRecord {
            symbol,
            company_name,
            sector: cell(&row, sector_idx).to_string(),
            anomaly_score,
            anomaly_label,
            features,
            pca1,
            pca2,
        });
    }

    debug!(
        "Joined {} watchlist rows from {} ({} without a universe name, {} malformed numeric cells)",
        records.len(),
        watchlist_path.display(),
        unmatched,
        malformed_cells,
    );

    Ok(records)
}

/// Load the optional historical statements table.
///
/// Applies the fixed column rename map and derives `year` from
/// `Financial Year End` when that column exists. Rows are returned in file
/// order; callers sort per symbol.
///
/// A missing file is not an error: it yields an empty table. A file that
/// exists but cannot be read fails with [`DashboardError::DataUnavailable`].
pub fn load_historical_dataset(path: &Path) -> Result<Vec<HistoricalRecord>> {
    if !path.exists() {
        debug!("No historical file at {}; trends disabled", path.display());
        return Ok(Vec::new());
    }

    let (mut reader, columns) = open_csv(path)?;
    let ticker_idx = columns.require(COL_TICKER, path)?;
    let year_idx = columns.optional(COL_FISCAL_YEAR_END);

    let renamed: Vec<(StatementField, usize)> = STATEMENT_RENAMES
        .iter()
        .filter_map(|(name, field)| columns.optional(name).map(|idx| (*field, idx)))
        .collect();

    // Columns passed through untouched: everything not consumed above.
    let passthrough: Vec<(usize, String)> = columns
        .names
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != ticker_idx && !renamed.iter().any(|(_, r)| r == idx))
        .map(|(idx, name)| (idx, name.clone()))
        .collect();

    let mut records = Vec::new();
    let mut undated = 0usize;

    for row in reader.byte_records() {
        let row = row.map_err(|e| DashboardError::unavailable(path, e.to_string()))?;

        let year = year_idx.and_then(|idx| fiscal_year(&cell(&row, idx)));
        if year_idx.is_some() && year.is_none() {
            undated += 1;
        }

        let mut record = HistoricalRecord {
            symbol: cell(&row, ticker_idx).to_string(),
            year,
            revenue: None,
            net_income: None,
            operating_cash_flow: None,
            receivables: None,
            total_equity: None,
            extra: passthrough
                .iter()
                .map(|(idx, name)| (name.clone(), cell(&row, *idx).to_string()))
                .collect(),
        };

        for (field, idx) in &renamed {
            let value = parse_number(&cell(&row, *idx));
            match field {
                StatementField::Revenue => record.revenue = value,
                StatementField::NetIncome => record.net_income = value,
                StatementField::OperatingCashFlow => record.operating_cash_flow = value,
                StatementField::Receivables => record.receivables = value,
                StatementField::TotalEquity => record.total_equity = value,
            }
        }

        records.push(record);
    }

    if year_idx.is_none() {
        warn!(
            "{} has no '{}' column; years are unavailable",
            path.display(),
            COL_FISCAL_YEAR_END
        );
    }
    debug!(
        "Loaded {} historical rows from {} ({} without a parseable year)",
        records.len(),
        path.display(),
        undated,
    );

    Ok(records)
}

/// Derive the calendar year from a fiscal-year-end cell.
///
/// Accepts the usual spreadsheet date shapes; as a last resort any text
/// starting with a plausible four-digit year.
pub fn fiscal_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    const DATE_FORMATS: [&str; 8] = [
        "%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y", "%d-%b-%Y", "%d %b %Y",
        "%b %d, %Y",
    ];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.year());
        }
    }

    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.year());
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }

    // Month-year shapes ("Mar 2024", "Mar-24", "Mar-2024") need a day to parse.
    for (prefix, fmt) in [("01 ", "%d %b %Y"), ("01-", "%d-%b-%y"), ("01-", "%d-%b-%Y")] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{prefix}{s}"), fmt) {
            return Some(date.year());
        }
    }

    let head: String = s.chars().take(4).collect();
    if head.len() == 4 && head.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = head.parse().ok()?;
        if (1900..=2100).contains(&year) {
            return Some(year);
        }
    }

    None
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Header name to position lookup for one CSV file.
struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &ByteRecord) -> Self {
        let names: Vec<String> = headers
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut index = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn require(&self, name: &str, path: &Path) -> Result<usize> {
        self.optional(name)
            .ok_or_else(|| DashboardError::unavailable(path, format!("missing required column '{name}'")))
    }
}

/// Open `path` as a headed CSV and index its columns.
fn open_csv(path: &Path) -> Result<(csv::Reader<File>, Columns)> {
    let file = File::open(path).map_err(|e| {
        let reason = if e.kind() == ErrorKind::NotFound {
            "file not found".to_string()
        } else {
            e.to_string()
        };
        DashboardError::unavailable(path, reason)
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .byte_headers()
        .map_err(|e| DashboardError::unavailable(path, e.to_string()))?;
    let columns = Columns::from_headers(headers);

    Ok((reader, columns))
}

/// Load `{Symbol -> Company Name}` from the universe file. First row wins.
fn load_universe_names(path: &Path) -> Result<HashMap<String, String>> {
    let (mut reader, columns) = open_csv(path)?;
    let symbol_idx = columns.require(COL_SYMBOL, path)?;
    let name_idx = columns.require(COL_COMPANY_NAME, path)?;

    let mut names = HashMap::new();
    let mut duplicates = 0usize;

    for row in reader.byte_records() {
        let row = row.map_err(|e| DashboardError::unavailable(path, e.to_string()))?;
        let name = cell(&row, name_idx);
        if name.is_empty() {
            continue;
        }
        let symbol = cell(&row, symbol_idx).into_owned();
        if names.contains_key(&symbol) {
            duplicates += 1;
            continue;
        }
        names.insert(symbol, name.into_owned());
    }

    debug!(
        "Loaded {} universe names from {} ({} duplicate symbols ignored)",
        names.len(),
        path.display(),
        duplicates,
    );

    Ok(names)
}

/// Field at `idx` decoded as UTF-8 (invalid bytes become U+FFFD), or `""`
/// for short rows.
fn cell(row: &ByteRecord, idx: usize) -> Cow<'_, str> {
    String::from_utf8_lossy(row.get(idx).unwrap_or(b""))
}

/// Parse a numeric cell; blanks and common NA markers yield `None`.
///
/// Infinite spellings (`inf`, `-infinity`) are rejected like any other
/// malformed value.
fn parse_number(cell: &str) -> Option<f64> {
    let s = cell.trim();
    if s.is_empty() || matches!(s, "NA" | "N/A" | "NaN" | "nan" | "null" | "-") {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the anomaly label, tolerating float spellings such as `-1.0`.
fn parse_label(cell: &str) -> Option<i64> {
    let s = cell.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
