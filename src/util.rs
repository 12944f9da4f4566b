// Parsing and formatting helpers.
//
// All "dirty" cell handling lives here so the engine modules can assume
// typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like cell into a finite `f64`.
///
/// - Accepts `Option<&str>` so callers can pass optional columns straight through.
/// - Trims whitespace and strips thousands separators (`,`, `_`, spaces).
/// - Rejects `NaN`/`inf` spellings that `str::parse` would otherwise accept.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | '_' | ' ')).collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Exports sometimes carry years as "2023.0".
    s.parse::<i32>().ok().or_else(|| {
        parse_f64_safe(Some(s))
            .filter(|v| v.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(v))
            .and_then(|v| i32::try_from(v as i64).ok())
    })
}

/// Truthy spellings of a 0/1 flag column.
pub fn parse_flag(s: Option<&str>) -> Option<bool> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    match s.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" => Some(true),
        _ => Some(false),
    }
}

/// Trimmed owned string, or `None` for missing/blank cells.
pub fn non_blank(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// `num / den`, or 0 when the denominator is not strictly positive.
pub fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// `num / den`, or `None` when the denominator is not strictly positive.
pub fn ratio_or_none(num: f64, den: f64) -> Option<f64> {
    if den > 0.0 {
        Some(num / den).filter(|v| v.is_finite())
    } else {
        None
    }
}

/// Relative change against a prior value, undefined for non-positive priors.
pub fn growth(current: f64, prior: f64) -> Option<f64> {
    ratio_or_none(current - prior, prior)
}

/// Fixed-decimal display value with `en` digit grouping (`1,234,567.89`).
///
/// Rounding happens once, in `format!`; only the integer digits are regrouped.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (digits, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = digits.parse::<u64>().map_or_else(|_| digits.to_string(), format_int);
    let sign = if n < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') { "-" } else { "" };
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

/// Display helper for optional metrics; undefined renders as `N/A`.
pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Same as [`format_opt`] for ratios shown as percentages.
pub fn format_pct(n: Option<f64>) -> String {
    format_opt(n.map(|v| v * 100.0), 2)
}

/// Row counts and other integers for console notes.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
