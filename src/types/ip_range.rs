//! IP range table records and lookup results

use serde::{Deserialize, Serialize};

/// Country label rendered for transactions whose IP matched no range.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// One interval of the IP-to-country range table.
///
/// `lower <= upper` is expected but not guaranteed by the raw data; an
/// inverted range is tolerated and can never match any key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    /// Inclusive lower bound of the interval
    pub lower: u32,
    /// Inclusive upper bound of the interval
    pub upper: u32,
    /// Country assigned to addresses inside the interval
    pub country: String,
}

impl IpRange {
    pub fn new(lower: u32, upper: u32, country: impl Into<String>) -> Self {
        Self {
            lower,
            upper,
            country: country.into(),
        }
    }

    /// Whether the bounds are inverted (`lower > upper`). Such a range is
    /// inert: no key satisfies both inequalities.
    pub fn is_inverted(&self) -> bool {
        self.lower > self.upper
    }

    /// Inclusive containment check.
    pub fn contains(&self, key: u32) -> bool {
        self.lower <= key && key <= self.upper
    }
}

/// Outcome of a single range-containment query. Total: every key yields
/// exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The key fell inside a range mapped to this country
    Matched(String),
    /// No range contained the key (below all ranges, in a gap, or sentinel)
    Unmatched,
}

impl LookupResult {
    /// Country label for the output table; `Unmatched` renders as "Unknown".
    pub fn country(&self) -> &str {
        match self {
            LookupResult::Matched(country) => country,
            LookupResult::Unmatched => UNKNOWN_COUNTRY,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, LookupResult::Matched(_))
    }
}
