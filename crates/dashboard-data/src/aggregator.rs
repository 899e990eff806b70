//! Sector-level aggregation and per-record risk drivers.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use dashboard_core::formatting::percentage;
use dashboard_core::models::{CompanyRecord, Direction, Feature, FeatureScores};
use dashboard_core::narrative;
use serde::Serialize;

// ── SectorRisk ────────────────────────────────────────────────────────────────

/// Outlier rate for one sector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorRisk {
    pub sector: String,
    pub total: usize,
    pub outliers: usize,
    /// `100 * outliers / total`, or `0.0` for an empty sector.
    pub risk_percent: f64,
}

impl SectorRisk {
    fn from_counts(sector: impl Into<String>, total: usize, outliers: usize) -> Self {
        Self {
            sector: sector.into(),
            total,
            outliers,
            risk_percent: percentage(outliers as f64, total as f64),
        }
    }
}

// ── RiskDriver ────────────────────────────────────────────────────────────────

/// The feature that deviates most from the sector mean for one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDriver {
    pub feature: Feature,
    pub direction: Direction,
    pub z_score: f64,
    pub narrative: &'static str,
}

// ── SectorFeatureMeans ────────────────────────────────────────────────────────

/// Mean z-score of each feature over one sector's outliers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorFeatureMeans {
    pub sector: String,
    pub outliers: usize,
    /// Indexed like [`Feature::ALL`]; `NaN` when every value was missing.
    pub means: [f64; 6],
}

impl SectorFeatureMeans {
    pub fn mean(&self, feature: Feature) -> f64 {
        self.means[feature.index()]
    }
}

// ── SectorAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups company records by sector.
pub struct SectorAggregator;

impl SectorAggregator {
    /// Risk profile for every distinct sector, riskiest first.
    ///
    /// Ties keep sector-name order.
    pub fn risk_profile(records: &[CompanyRecord]) -> Vec<SectorRisk> {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for rec in records {
            let entry = counts.entry(rec.sector.as_str()).or_default();
            entry.0 += 1;
            if rec.is_outlier() {
                entry.1 += 1;
            }
        }

        let mut profile: Vec<SectorRisk> = counts
            .into_iter()
            .map(|(sector, (total, outliers))| SectorRisk::from_counts(sector, total, outliers))
            .collect();
        profile.sort_by(|a, b| {
            b.risk_percent
                .partial_cmp(&a.risk_percent)
                .unwrap_or(Ordering::Equal)
        });
        profile
    }

    /// Risk over all of `records` taken as one group.
    pub fn overall_risk(records: &[&CompanyRecord], label: &str) -> SectorRisk {
        let outliers = records.iter().filter(|r| r.is_outlier()).count();
        SectorRisk::from_counts(label, records.len(), outliers)
    }

    /// Mean feature z-scores of outliers, per sector, in sector-name order.
    ///
    /// Missing values are skipped. Sectors without outliers are omitted.
    pub fn outlier_feature_means(records: &[CompanyRecord]) -> Vec<SectorFeatureMeans> {
        let mut groups: BTreeMap<&str, (usize, [f64; 6], [usize; 6])> = BTreeMap::new();
        for rec in records.iter().filter(|r| r.is_outlier()) {
            let (count, sums, seen) = groups.entry(rec.sector.as_str()).or_default();
            *count += 1;
            for (feature, z) in rec.features.iter() {
                if !z.is_nan() {
                    sums[feature.index()] += z;
                    seen[feature.index()] += 1;
                }
            }
        }

        groups
            .into_iter()
            .map(|(sector, (count, sums, seen))| {
                let mut means = [f64::NAN; 6];
                for i in 0..6 {
                    if seen[i] > 0 {
                        means[i] = sums[i] / seen[i] as f64;
                    }
                }
                SectorFeatureMeans {
                    sector: sector.to_string(),
                    outliers: count,
                    means,
                }
            })
            .collect()
    }

    /// Distinct sectors, sorted.
    pub fn sectors(records: &[CompanyRecord]) -> Vec<String> {
        let mut sectors: Vec<String> = records.iter().map(|r| r.sector.clone()).collect();
        sectors.sort();
        sectors.dedup();
        sectors
    }
}

// ── Primary driver ────────────────────────────────────────────────────────────

/// The feature with the largest absolute z-score.
///
/// Ties go to the feature declared first in [`Feature::ALL`], so an all-zero
/// vector yields TATA (high). `NaN` values are ignored; `None` only when every
/// feature is `NaN`.
pub fn primary_driver(features: &FeatureScores) -> Option<RiskDriver> {
    let mut best: Option<(Feature, f64)> = None;
    for (feature, z) in features.iter() {
        if z.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if z.abs() <= current.abs() => {}
            _ => best = Some((feature, z)),
        }
    }

    let (feature, z_score) = best?;
    let direction = Direction::from_z(z_score);
    Some(RiskDriver {
        feature,
        direction,
        z_score,
        narrative: narrative::describe(feature, direction),
    })
}

/// Narrative for an optional driver, falling back to the inconclusive text.
pub fn driver_narrative(driver: Option<&RiskDriver>) -> &'static str {
    driver.map_or(narrative::INCONCLUSIVE, |d| d.narrative)
}

/// Order two scores with `NaN` always last, whatever the direction.
pub fn cmp_scores(a: f64, b: f64, ascending: bool) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
