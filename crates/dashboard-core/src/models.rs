use serde::{Deserialize, Serialize};
use std::fmt;

/// Label value the upstream Isolation Forest assigns to outliers.
pub const OUTLIER_LABEL: i64 = -1;

/// Absolute z-score beyond which a feature is outside the "normal" envelope.
pub const NORMAL_ENVELOPE: f64 = 2.0;

/// Two-valued classification derived from the upstream anomaly label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Normal,
    Outlier,
}

impl Status {
    /// `Outlier` iff `label == -1`; anything else, including a missing or
    /// unparseable label, is `Normal`.
    pub fn from_label(label: Option<i64>) -> Self {
        if label == Some(OUTLIER_LABEL) {
            Status::Outlier
        } else {
            Status::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Normal => "Normal",
            Status::Outlier => "Outlier",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six sector-relative z-score features, in their declared order.
///
/// The order matters: primary-driver ties are broken by first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    /// Total accruals to total assets.
    Tata,
    /// Days sales in receivables index.
    Dsri,
    /// Asset quality index.
    Aqi,
    /// Price to operating cash flow.
    POcf,
    /// Price/earnings to growth.
    Peg,
    /// Gap between reported ROE and its DuPont decomposition.
    DupontDiscrepancy,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Tata,
        Feature::Dsri,
        Feature::Aqi,
        Feature::POcf,
        Feature::Peg,
        Feature::DupontDiscrepancy,
    ];

    /// Column header in the watchlist CSV.
    pub fn column(self) -> &'static str {
        match self {
            Feature::Tata => "TATA_Z",
            Feature::Dsri => "DSRI_Z",
            Feature::Aqi => "AQI_Z",
            Feature::POcf => "P_OCF_Z",
            Feature::Peg => "PEG_Z",
            Feature::DupontDiscrepancy => "DuPont_Discrepancy_Z",
        }
    }

    /// Human-readable label used on every page.
    pub fn label(self) -> &'static str {
        match self {
            Feature::Tata => "Accruals (TATA)",
            Feature::Dsri => "Receivables (DSRI)",
            Feature::Aqi => "Asset Quality (AQI)",
            Feature::POcf => "Price/CashFlow",
            Feature::Peg => "PEG Ratio",
            Feature::DupontDiscrepancy => "DuPont Discrepancy",
        }
    }

    /// Position in [`Feature::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of the peer mean a feature deviates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    High,
    Low,
}

impl Direction {
    /// Non-negative z-scores read as `High`.
    pub fn from_z(z: f64) -> Self {
        if z < 0.0 {
            Direction::Low
        } else {
            Direction::High
        }
    }
}

/// One z-score per [`Feature`]. Unparseable cells are stored as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores([f64; 6]);

impl FeatureScores {
    pub fn new(values: [f64; 6]) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.0[feature.index()] = value;
    }

    /// `(feature, z)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    /// Features whose magnitude exceeds [`NORMAL_ENVELOPE`].
    pub fn envelope_breaches(&self) -> Vec<Feature> {
        self.iter()
            .filter(|(_, z)| z.abs() > NORMAL_ENVELOPE)
            .map(|(f, _)| f)
            .collect()
    }
}

impl Default for FeatureScores {
    fn default() -> Self {
        Self([0.0; 6])
    }
}

/// One row of the joined universe/watchlist table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Ticker symbol; the join key.
    pub symbol: String,
    /// Display name, or `symbol` when the universe has no entry.
    pub company_name: String,
    pub sector: String,
    /// More negative means more anomalous. `NaN` when unparseable.
    pub anomaly_score: f64,
    /// Raw upstream label; `None` when the cell could not be read as an integer.
    pub anomaly_label: Option<i64>,
    pub features: FeatureScores,
    pub pca1: f64,
    pub pca2: f64,
}

impl CompanyRecord {
    /// Derived from `anomaly_label` on every call, never cached.
    pub fn status(&self) -> Status {
        Status::from_label(self.anomaly_label)
    }

    pub fn is_outlier(&self) -> bool {
        self.status() == Status::Outlier
    }
}

/// One fiscal year of financial statements for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Renamed from the `Ticker` column.
    pub symbol: String,
    /// Calendar year of `Financial Year End`, when present and parseable.
    pub year: Option<i32>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub receivables: Option<f64>,
    pub total_equity: Option<f64>,
    /// Every other column, untouched, in file order.
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}
