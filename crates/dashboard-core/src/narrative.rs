//! Static narrative text for each feature and deviation direction.

use crate::models::{Direction, Feature};

/// Shown when no primary driver can be determined.
pub const INCONCLUSIVE: &str =
    "Inconclusive: no single forensic ratio stands out from the sector peer group.";

/// `(feature, direction, message)` rows. Kept as data so every pairing is
/// visible in one place.
const NARRATIVES: [(Feature, Direction, &str); 12] = [
    (
        Feature::Tata,
        Direction::High,
        "High accruals: reported earnings run well ahead of operating cash flow, a classic sign of aggressive revenue or expense recognition.",
    ),
    (
        Feature::Tata,
        Direction::Low,
        "Unusually low accruals: cash flow far exceeds reported profit, which can indicate conservative accounting or one-off cash inflows.",
    ),
    (
        Feature::Dsri,
        Direction::High,
        "Receivables are growing faster than sales: revenue may be booked before cash is collected, or credit terms are being loosened.",
    ),
    (
        Feature::Dsri,
        Direction::Low,
        "Receivables are shrinking relative to sales: collections are unusually fast compared with sector peers.",
    ),
    (
        Feature::Aqi,
        Direction::High,
        "Asset quality is deteriorating: a rising share of assets is intangible or deferred, suggesting costs are being capitalised.",
    ),
    (
        Feature::Aqi,
        Direction::Low,
        "Asset base is unusually hard: very little of the balance sheet sits in soft or deferred assets.",
    ),
    (
        Feature::POcf,
        Direction::High,
        "The market prices this company far above the cash it generates: valuation is stretched relative to operating cash flow.",
    ),
    (
        Feature::POcf,
        Direction::Low,
        "Priced cheaply relative to its operating cash flow: either a value opportunity or a market discount for perceived risk.",
    ),
    (
        Feature::Peg,
        Direction::High,
        "Valuation outpaces growth: the earnings multiple is high relative to the growth rate peers deliver.",
    ),
    (
        Feature::Peg,
        Direction::Low,
        "Growth looks cheap: the earnings multiple is low for the growth being reported, which warrants checking whether that growth is sustainable.",
    ),
    (
        Feature::DupontDiscrepancy,
        Direction::High,
        "Reported return on equity is not explained by margins, turnover and leverage: the profit figures do not reconcile cleanly.",
    ),
    (
        Feature::DupontDiscrepancy,
        Direction::Low,
        "Reported return on equity falls short of its DuPont components: equity or profit may be restated or carry unusual items.",
    ),
];

/// Narrative for `feature` deviating in `direction`.
pub fn describe(feature: Feature, direction: Direction) -> &'static str {
    NARRATIVES
        .iter()
        .find(|(f, d, _)| *f == feature && *d == direction)
        .map(|(_, _, text)| *text)
        .unwrap_or(INCONCLUSIVE)
}
