//! Per-company financial trends over the optional historical table.

use dashboard_core::models::HistoricalRecord;
use serde::Serialize;

/// One fiscal year of a company's trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: Option<i32>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    /// `operating_cash_flow / net_income`; below 1.0 means profit is not
    /// backed by cash.
    pub cash_conversion: Option<f64>,
}

impl From<&HistoricalRecord> for TrendPoint {
    fn from(rec: &HistoricalRecord) -> Self {
        let cash_conversion = match (rec.operating_cash_flow, rec.net_income) {
            (Some(cfo), Some(ni)) if ni != 0.0 => Some(cfo / ni),
            _ => None,
        };
        Self {
            year: rec.year,
            revenue: rec.revenue,
            net_income: rec.net_income,
            operating_cash_flow: rec.operating_cash_flow,
            cash_conversion,
        }
    }
}

/// Read-only snapshot of the historical statements table.
///
/// An empty table is a normal state: the file was absent or had no rows.
#[derive(Debug, Clone, Default)]
pub struct HistoricalTable {
    records: Vec<HistoricalRecord>,
}

impl HistoricalTable {
    pub fn new(records: Vec<HistoricalRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Trend for `symbol`, sorted by year with undated rows last.
    ///
    /// Symbols match case-insensitively. `None` means "no data" for this
    /// company, which callers display rather than treat as a fault.
    pub fn company_trend(&self, symbol: &str) -> Option<Vec<TrendPoint>> {
        let wanted = symbol.trim();
        let mut rows: Vec<&HistoricalRecord> = self
            .records
            .iter()
            .filter(|r| r.symbol.trim().eq_ignore_ascii_case(wanted))
            .collect();
        if rows.is_empty() {
            return None;
        }

        rows.sort_by_key(|r| (r.year.is_none(), r.year));
        Some(rows.into_iter().map(TrendPoint::from).collect())
    }
}
