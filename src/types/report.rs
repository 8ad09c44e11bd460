//! Data-quality report emitted alongside the enriched dataset

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-run data-quality summary.
///
/// None of these conditions abort the run; the report is how they are
/// surfaced to whoever owns the raw data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Unique run identifier
    pub run_id: String,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,

    /// Transaction rows read from the raw CSV
    pub rows_read: u64,

    /// Rows the CSV decoder could not parse at all
    pub rows_undecodable: u64,

    /// Rows rejected for missing user_id/ip_address or bad timestamps
    pub rows_rejected: u64,

    /// Exact-duplicate rows dropped (first occurrence kept)
    pub duplicates_dropped: u64,

    /// Rows written to the enriched output
    pub rows_written: u64,

    /// IP fields that failed to parse and fell back to the sentinel key
    pub malformed_ips: u64,

    /// Range-table rows with lower > upper (indexed but inert)
    pub inverted_ranges: u64,

    /// Range-table rows skipped because bounds were unparseable
    pub ranges_skipped: u64,

    /// Transactions whose IP matched a country range
    pub matched: u64,

    /// Transactions labeled "Unknown"
    pub unmatched: u64,

    /// matched / (matched + unmatched), 0.0 on an empty run
    pub match_rate: f64,
}

impl QualityReport {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            rows_read: 0,
            rows_undecodable: 0,
            rows_rejected: 0,
            duplicates_dropped: 0,
            rows_written: 0,
            malformed_ips: 0,
            inverted_ranges: 0,
            ranges_skipped: 0,
            matched: 0,
            unmatched: 0,
            match_rate: 0.0,
        }
    }

    /// Recompute `match_rate` from the matched/unmatched counters.
    pub fn finalize(mut self) -> Self {
        let total = self.matched + self.unmatched;
        self.match_rate = if total > 0 {
            self.matched as f64 / total as f64
        } else {
            0.0
        };
        self
    }
}

impl Default for QualityReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization() {
        let mut report = QualityReport::new();
        report.rows_read = 100;
        report.matched = 80;
        report.unmatched = 15;
        let report = report.finalize();

        let json = serde_json::to_string(&report).unwrap();
        let deserialized: QualityReport = serde_json::from_str(&json).unwrap();

        assert_eq!(report.run_id, deserialized.run_id);
        assert_eq!(deserialized.rows_read, 100);
        assert!((deserialized.match_rate - 80.0 / 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_rate_empty_run() {
        let report = QualityReport::new().finalize();
        assert_eq!(report.match_rate, 0.0);
    }
}
