// Utility helpers for names, counts and number formatting.
//
// This module centralizes the "dirty" CSV/text handling so the rest of the
// code can assume clean keys and typed counts.
use num_format::{Locale, ToFormattedString};

/// Map a human-readable region name to its lookup key.
///
/// Lower-cases the name and replaces every space with a hyphen, so
/// `"New York"` and `"new york"` both become `"new-york"`. The same function
/// keys the aggregation store and the region ids coming from the UI, which is
/// what makes the two sides join.
pub fn normalize(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Largest float count accepted (2^53).
pub const MAX_FLOAT_COUNT: f64 = 9_007_199_254_740_992.0;

/// Parse a count column from the daily report.
///
/// - Missing or blank cells count as `0`; the feed leaves them empty when a
///   county has nothing to report.
/// - Thousands separators (`","`) are stripped.
/// - Whole-valued decimals such as `"12.0"` are accepted.
/// - Negative, fractional or non-numeric values yield `None`, as do
///   floats past `MAX_FLOAT_COUNT`, which no longer hold exact integers.
pub fn parse_count_safe(s: Option<&str>) -> Option<u64> {
    let s = match s {
        Some(s) => s.trim(),
        None => return Some(0),
    };
    if s.is_empty() {
        return Some(0);
    }
    let s = s.replace(',', "");
    if let Ok(n) = s.parse::<u64>() {
        return Some(n);
    }
    // Some exports write counts as floats.
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && (0.0..=MAX_FLOAT_COUNT).contains(&f) && f.fract() == 0.0 {
        Some(f as u64)
    } else {
        None
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name shown in the info panel for a summary.
pub fn display_name(name: &str) -> &str {
    match name {
        "US" => "United States",
        other => other,
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts (e.g. `9,855`).
    n.to_formatted_string(&Locale::en)
}
