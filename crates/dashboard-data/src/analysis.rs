//! Page views over the joined dataset.
//!
//! Every view is a pure function of the loaded tables and the current filter,
//! recomputed on each request and handed to the rendering layer.

use dashboard_core::models::{CompanyRecord, Feature, Status};
use dashboard_core::settings::ALL_SECTORS;
use dashboard_core::{DashboardError, Result};
use serde::{Serialize, Serializer};

use crate::aggregator::{
    cmp_scores, driver_narrative, primary_driver, RiskDriver, SectorAggregator, SectorFeatureMeans,
    SectorRisk,
};
use crate::history::{HistoricalTable, TrendPoint};

/// Number of rows in the summary's "red flags" table.
pub const TOP_RED_FLAGS: usize = 5;

// ── CompanyRow ────────────────────────────────────────────────────────────────

/// Flat row of the joined schema, as shown in the explorer and exported.
///
/// Non-finite numbers serialize as empty cells (CSV) or `null` (JSON).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Anomaly_Score", serialize_with = "finite_or_empty")]
    pub anomaly_score: f64,
    #[serde(rename = "Anomaly_Label")]
    pub anomaly_label: Option<i64>,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "TATA_Z", serialize_with = "finite_or_empty")]
    pub tata_z: f64,
    #[serde(rename = "DSRI_Z", serialize_with = "finite_or_empty")]
    pub dsri_z: f64,
    #[serde(rename = "AQI_Z", serialize_with = "finite_or_empty")]
    pub aqi_z: f64,
    #[serde(rename = "P_OCF_Z", serialize_with = "finite_or_empty")]
    pub p_ocf_z: f64,
    #[serde(rename = "PEG_Z", serialize_with = "finite_or_empty")]
    pub peg_z: f64,
    #[serde(rename = "DuPont_Discrepancy_Z", serialize_with = "finite_or_empty")]
    pub dupont_discrepancy_z: f64,
    #[serde(rename = "PCA_1", serialize_with = "finite_or_empty")]
    pub pca1: f64,
    #[serde(rename = "PCA_2", serialize_with = "finite_or_empty")]
    pub pca2: f64,
}

impl From<&CompanyRecord> for CompanyRow {
    fn from(rec: &CompanyRecord) -> Self {
        let f = &rec.features;
        Self {
            symbol: rec.symbol.clone(),
            company_name: rec.company_name.clone(),
            sector: rec.sector.clone(),
            anomaly_score: rec.anomaly_score,
            anomaly_label: rec.anomaly_label,
            status: rec.status(),
            tata_z: f.get(Feature::Tata),
            dsri_z: f.get(Feature::Dsri),
            aqi_z: f.get(Feature::Aqi),
            p_ocf_z: f.get(Feature::POcf),
            peg_z: f.get(Feature::Peg),
            dupont_discrepancy_z: f.get(Feature::DupontDiscrepancy),
            pca1: rec.pca1,
            pca2: rec.pca2,
        }
    }
}

impl CompanyRow {
    /// Feature z-scores in declared order.
    pub fn feature_values(&self) -> [f64; 6] {
        [
            self.tata_z,
            self.dsri_z,
            self.aqi_z,
            self.p_ocf_z,
            self.peg_z,
            self.dupont_discrepancy_z,
        ]
    }
}

fn finite_or_empty<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

// ── Filtering ─────────────────────────────────────────────────────────────────

/// Records in `sector`, or all records when `sector` is `None`.
pub fn filter_by_sector<'a>(records: &'a [CompanyRecord], sector: Option<&str>) -> Vec<&'a CompanyRecord> {
    records
        .iter()
        .filter(|r| sector.map_or(true, |s| r.sector == s))
        .collect()
}

// ── Executive summary ─────────────────────────────────────────────────────────

/// One dot on the PCA market map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    #[serde(serialize_with = "finite_or_empty")]
    pub pca1: f64,
    #[serde(serialize_with = "finite_or_empty")]
    pub pca2: f64,
    pub status: Status,
    /// Marker size: `|anomaly_score|`, always non-negative.
    #[serde(serialize_with = "finite_or_empty")]
    pub size: f64,
}

/// One row of the summary's "red flags" table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedFlag {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    #[serde(serialize_with = "finite_or_empty")]
    pub anomaly_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    /// The applied filter, `"All"` when unfiltered.
    pub sector: String,
    pub sector_options: Vec<String>,
    pub risk: SectorRisk,
    pub map_points: Vec<MapPoint>,
    pub red_flags: Vec<RedFlag>,
}

/// Headline metrics, market map and top red flags for one sector (or all).
///
/// Red flags are the view's outliers ranked by anomaly score, highest first.
pub fn executive_summary(records: &[CompanyRecord], sector: Option<&str>) -> ExecutiveSummary {
    let view = filter_by_sector(records, sector);
    let label = sector.unwrap_or(ALL_SECTORS);

    let mut sector_options = vec![ALL_SECTORS.to_string()];
    sector_options.extend(SectorAggregator::sectors(records));

    let map_points = view
        .iter()
        .map(|r| MapPoint {
            symbol: r.symbol.clone(),
            company_name: r.company_name.clone(),
            sector: r.sector.clone(),
            pca1: r.pca1,
            pca2: r.pca2,
            status: r.status(),
            size: r.anomaly_score.abs(),
        })
        .collect();

    let mut outliers: Vec<&CompanyRecord> = view.iter().copied().filter(|r| r.is_outlier()).collect();
    outliers.sort_by(|a, b| cmp_scores(a.anomaly_score, b.anomaly_score, false));
    let red_flags = outliers
        .into_iter()
        .take(TOP_RED_FLAGS)
        .map(|r| RedFlag {
            symbol: r.symbol.clone(),
            company_name: r.company_name.clone(),
            sector: r.sector.clone(),
            anomaly_score: r.anomaly_score,
        })
        .collect();

    ExecutiveSummary {
        sector: label.to_string(),
        sector_options,
        risk: SectorAggregator::overall_risk(&view, label),
        map_points,
        red_flags,
    }
}

// ── Watchlist ─────────────────────────────────────────────────────────────────

/// All outliers, most anomalous (lowest score) first.
pub fn watchlist(records: &[CompanyRecord]) -> Vec<CompanyRow> {
    let mut outliers: Vec<&CompanyRecord> = records.iter().filter(|r| r.is_outlier()).collect();
    outliers.sort_by(|a, b| cmp_scores(a.anomaly_score, b.anomaly_score, true));
    outliers.into_iter().map(CompanyRow::from).collect()
}

// ── Sector analysis ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorAnalysis {
    pub profile: Vec<SectorRisk>,
    /// Mean outlier z-scores per sector ("forensic DNA").
    pub outlier_dna: Vec<SectorFeatureMeans>,
}

pub fn sector_analysis(records: &[CompanyRecord]) -> SectorAnalysis {
    SectorAnalysis {
        profile: SectorAggregator::risk_profile(records),
        outlier_dna: SectorAggregator::outlier_feature_means(records),
    }
}

// ── Company deep dive ─────────────────────────────────────────────────────────

/// One spoke of the forensic fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureReading {
    pub feature: Feature,
    pub label: &'static str,
    #[serde(serialize_with = "finite_or_empty")]
    pub z_score: f64,
    /// `|z| > 2.0`.
    pub outside_envelope: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDeepDive {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    pub status: Status,
    #[serde(serialize_with = "finite_or_empty")]
    pub anomaly_score: f64,
    pub fingerprint: Vec<FeatureReading>,
    pub driver: Option<RiskDriver>,
    pub narrative: &'static str,
    /// `None` when no historical rows exist for this company.
    pub trend: Option<Vec<TrendPoint>>,
}

/// Company names for the deep-dive selector: outliers first, then normals,
/// each group in watchlist order.
pub fn company_selection(records: &[CompanyRecord]) -> Vec<&str> {
    let outliers = records.iter().filter(|r| r.is_outlier());
    let normals = records.iter().filter(|r| !r.is_outlier());
    outliers.chain(normals).map(|r| r.company_name.as_str()).collect()
}

/// Find a company by exact display name, then by symbol (case-insensitive).
pub fn find_company<'a>(records: &'a [CompanyRecord], query: &str) -> Result<&'a CompanyRecord> {
    let q = query.trim();
    records
        .iter()
        .find(|r| r.company_name == q)
        .or_else(|| records.iter().find(|r| r.symbol.eq_ignore_ascii_case(q)))
        .ok_or_else(|| DashboardError::LookupMiss {
            what: "company",
            key: q.to_string(),
        })
}

/// Fingerprint, primary driver and trend for one company.
///
/// With no `query`, the first entry of [`company_selection`] is used.
pub fn company_deep_dive(
    records: &[CompanyRecord],
    history: &HistoricalTable,
    query: Option<&str>,
) -> Result<CompanyDeepDive> {
    let query = match query {
        Some(q) => q,
        None => company_selection(records).first().copied().ok_or_else(|| DashboardError::LookupMiss {
            what: "company",
            key: String::new(),
        })?,
    };
    let rec = find_company(records, query)?;

    let fingerprint = rec
        .features
        .iter()
        .map(|(feature, z)| FeatureReading {
            feature,
            label: feature.label(),
            z_score: z,
            outside_envelope: rec.features.envelope_breaches().contains(&feature),
        })
        .collect();

    let driver = primary_driver(&rec.features);
    let narrative = driver_narrative(driver.as_ref());

    Ok(CompanyDeepDive {
        symbol: rec.symbol.clone(),
        company_name: rec.company_name.clone(),
        sector: rec.sector.clone(),
        status: rec.status(),
        anomaly_score: rec.anomaly_score,
        fingerprint,
        driver,
        narrative,
        trend: history.company_trend(&rec.symbol),
    })
}

// ── Data explorer ─────────────────────────────────────────────────────────────

/// The full joined table, optionally restricted to one sector.
pub fn explorer(records: &[CompanyRecord], sector: Option<&str>) -> Vec<CompanyRow> {
    filter_by_sector(records, sector)
        .into_iter()
        .map(CompanyRow::from)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
