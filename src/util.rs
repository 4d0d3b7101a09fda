// Utility helpers for parsing, basic statistics and display formatting.
//
// This module centralizes all the "dirty" CSV cell handling so the rest of the
// code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};
use std::collections::HashSet;

/// Trim a text cell and turn blanks into `None`.
pub fn clean_text(s: Option<String>) -> Option<String> {
    let s = s?;
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Parse a numeric cell, returning `None` for anything that is not a plain
/// number (text, blanks, `inf`, `nan`).
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a percent-complete cell. Values outside `[0, 100]` are treated the
/// same as unparseable text.
pub fn coerce_percent(s: Option<&str>) -> Option<f64> {
    parse_f64_safe(s).filter(|v| (0.0..=100.0).contains(v))
}

/// Parse a calendar week. Exports sometimes write weeks as `12.0`, so an
/// integral float is accepted too.
pub fn parse_week(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(w) = s.parse::<i32>() {
        return Some(w);
    }
    let f = parse_f64_safe(Some(s))?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Decode ISO-8859-1 bytes. Every byte maps to the code point of the same
/// value, so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn average(v: &[f64]) -> f64 {
    // Arithmetic mean; returns 0 for an empty slice so callers always get a number.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Distinct values in order of first appearance.
pub fn distinct_in_order<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}

pub fn count_distinct<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().collect::<HashSet<_>>().len()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (e.g. `1,234.50`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

// Display adapters used by the `Tabled` derives.

pub fn display_opt_text(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "-".to_string())
}

/// A value already expressed in percentage points, e.g. `62.5%`.
pub fn display_points(v: &f64) -> String {
    format!("{:.1}%", v)
}

pub fn display_opt_points(v: &Option<f64>) -> String {
    v.as_ref().map(display_points).unwrap_or_else(|| "-".to_string())
}

/// A fraction rendered as a percentage, e.g. `0.1` -> `10.00%`.
pub fn display_fraction(v: &f64) -> String {
    format!("{:.2}%", v * 100.0)
}

pub fn display_opt_fraction(v: &Option<f64>) -> String {
    v.as_ref().map(display_fraction).unwrap_or_else(|| "-".to_string())
}

pub fn display_coord(v: &f64) -> String {
    format!("{:.4}", v)
}
