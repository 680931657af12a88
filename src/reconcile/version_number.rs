//! Sortable integer encoding of version strings.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEADING_DIGITS: Regex = Regex::new(r"^\s*(\d+)").unwrap();
}

/// Encode `major.minor.patch` as `major * 1_000_000 + minor * 1_000 + patch`.
///
/// Each of the first three dot-separated parts contributes its leading
/// digits; missing or non-numeric parts count as zero. Anything after the
/// third part is ignored.
///
/// # Examples
/// ```
/// use t3monitoring_core::reconcile::version_to_integer;
/// assert_eq!(version_to_integer("8.7.19"), 8_007_019);
/// assert_eq!(version_to_integer("10.4.0-dev"), 10_004_000);
/// ```
pub fn version_to_integer(version: &str) -> i64 {
    let mut parts = version.split('.');
    let mut encoded = 0i64;
    for _ in 0..3 {
        let part = parts.next().map(leading_number).unwrap_or(0);
        encoded = encoded.saturating_mul(1_000).saturating_add(part);
    }
    encoded
}

fn leading_number(part: &str) -> i64 {
    LEADING_DIGITS
        .captures(part)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}
