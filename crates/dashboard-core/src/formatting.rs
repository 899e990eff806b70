/// Placeholder shown for missing or non-finite values.
pub const MISSING: &str = "n/a";

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places. Non-finite values render as [`MISSING`].
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// assert_eq!(format_number(f64::NAN, 1), "n/a");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }

    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a fraction of an ULP so exact binary midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` is "0.xx"; keep ".xx".
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an optional statement value (revenue, cash flow, ...).
///
/// ```
/// use dashboard_core::formatting::format_amount;
///
/// assert_eq!(format_amount(Some(12500.0)), "12,500.00");
/// assert_eq!(format_amount(None), "n/a");
/// ```
pub fn format_amount(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format_number(v, 2))
}

/// Format a z-score or anomaly score with an explicit sign and three decimals.
///
/// ```
/// use dashboard_core::formatting::format_score;
///
/// assert_eq!(format_score(2.5), "+2.500");
/// assert_eq!(format_score(-0.41), "-0.410");
/// assert_eq!(format_score(f64::NAN), "n/a");
/// ```
pub fn format_score(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    format!("{:+.3}", value)
}

/// Format a percentage with one decimal place and a trailing `%`.
///
/// ```
/// use dashboard_core::formatting::format_percent;
///
/// assert_eq!(format_percent(12.345), "12.3%");
/// assert_eq!(format_percent(0.0), "0.0%");
/// ```
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value, 1))
}

/// Calculate `(part / whole) * 100`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    (part / whole) * 100.0
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
