//! Normalization of raw IP address fields into 32-bit lookup keys
//!
//! The raw transaction data stores IPs inconsistently: dotted-quad strings,
//! plain integers, or float-formatted numerics left over from upstream
//! spreadsheet handling. All of them normalize to the same `u32` key space.
//! Anything unparseable maps to a sentinel instead of an error.

use std::net::Ipv4Addr;

/// Key assigned to unparseable IP fields. Fail-open: the sentinel sits
/// below ordinary allocations, so it resolves to `Unmatched` against any
/// real range table.
pub const SENTINEL_KEY: u32 = 0;

/// Parse an IP field into a `u32` key.
///
/// Accepted forms:
/// - dotted-quad: `"203.0.113.7"`
/// - integer: `"3405803527"`
/// - float-formatted: `"3405803527.81"` (fraction truncated toward zero)
///
/// Returns `None` for empty, negative, out-of-range, or non-numeric input.
pub fn parse_ip_value(raw: &str) -> Option<u32> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(addr) = value.parse::<Ipv4Addr>() {
        return Some(u32::from(addr));
    }
    if let Ok(int) = value.parse::<u64>() {
        return u32::try_from(int).ok();
    }
    if let Ok(float) = value.parse::<f64>() {
        // truncation, not rounding: 732758368.79 is key 732758368
        if float.is_finite() && float >= 0.0 && float <= f64::from(u32::MAX) {
            return Some(float as u32);
        }
    }
    None
}

/// Normalize an IP field to a lookup key, falling back to [`SENTINEL_KEY`].
pub fn normalize_ip(raw: &str) -> u32 {
    parse_ip_value(raw).unwrap_or(SENTINEL_KEY)
}
