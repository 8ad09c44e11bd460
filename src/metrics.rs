//! Counters and stage timings for a pipeline run

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::report::QualityReport;

/// Metrics collector for one pipeline run.
///
/// Counters are atomic so the parallel lookup stage can record from worker
/// threads without coordination.
pub struct PipelineMetrics {
    /// Transaction rows read from the raw CSV
    pub rows_read: AtomicU64,
    /// Rows the CSV decoder could not parse
    pub rows_undecodable: AtomicU64,
    /// Rows rejected by the cleaner
    pub rows_rejected: AtomicU64,
    /// Exact duplicates dropped by the cleaner
    pub duplicates_dropped: AtomicU64,
    /// Rows written to the enriched output
    pub rows_written: AtomicU64,
    /// IP fields that normalized to the sentinel key
    pub malformed_ips: AtomicU64,
    /// Inverted ranges in the range table
    pub inverted_ranges: AtomicU64,
    /// Range rows skipped at read time
    pub ranges_skipped: AtomicU64,
    /// Lookups that matched a country range
    pub matched: AtomicU64,
    /// Lookups that fell back to "Unknown"
    pub unmatched: AtomicU64,
    /// Wall-clock duration per stage, in completion order
    stage_timings: RwLock<Vec<(String, Duration)>>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            rows_read: AtomicU64::new(0),
            rows_undecodable: AtomicU64::new(0),
            rows_rejected: AtomicU64::new(0),
            duplicates_dropped: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            malformed_ips: AtomicU64::new(0),
            inverted_ranges: AtomicU64::new(0),
            ranges_skipped: AtomicU64::new(0),
            matched: AtomicU64::new(0),
            unmatched: AtomicU64::new(0),
            stage_timings: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a completed stage's wall-clock time.
    pub fn record_stage(&self, stage: &str, elapsed: Duration) {
        if let Ok(mut timings) = self.stage_timings.write() {
            timings.push((stage.to_string(), elapsed));
        }
    }

    /// Time a closure as a named stage.
    pub fn time_stage<T>(&self, stage: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record_stage(stage, start.elapsed());
        result
    }

    pub fn add(&self, counter: &AtomicU64, value: u64) {
        counter.fetch_add(value, Ordering::Relaxed);
    }

    /// Fraction of lookups that matched, 0.0 on an empty run.
    pub fn match_rate(&self) -> f64 {
        let matched = self.matched.load(Ordering::Relaxed);
        let total = matched + self.unmatched.load(Ordering::Relaxed);
        if total > 0 {
            matched as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Snapshot the counters into a quality report.
    pub fn to_report(&self) -> QualityReport {
        let mut report = QualityReport::new();
        report.rows_read = self.rows_read.load(Ordering::Relaxed);
        report.rows_undecodable = self.rows_undecodable.load(Ordering::Relaxed);
        report.rows_rejected = self.rows_rejected.load(Ordering::Relaxed);
        report.duplicates_dropped = self.duplicates_dropped.load(Ordering::Relaxed);
        report.rows_written = self.rows_written.load(Ordering::Relaxed);
        report.malformed_ips = self.malformed_ips.load(Ordering::Relaxed);
        report.inverted_ranges = self.inverted_ranges.load(Ordering::Relaxed);
        report.ranges_skipped = self.ranges_skipped.load(Ordering::Relaxed);
        report.matched = self.matched.load(Ordering::Relaxed);
        report.unmatched = self.unmatched.load(Ordering::Relaxed);
        report.finalize()
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&self) {
        let rows_read = self.rows_read.load(Ordering::Relaxed);
        let rows_written = self.rows_written.load(Ordering::Relaxed);
        let rejected = self.rows_rejected.load(Ordering::Relaxed);
        let duplicates = self.duplicates_dropped.load(Ordering::Relaxed);
        let undecodable = self.rows_undecodable.load(Ordering::Relaxed);
        let malformed = self.malformed_ips.load(Ordering::Relaxed);
        let matched = self.matched.load(Ordering::Relaxed);
        let unmatched = self.unmatched.load(Ordering::Relaxed);
        let inverted = self.inverted_ranges.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed();

        info!("╔══════════════════════════════════════════════════════════╗");
        info!("║        FEATURE PIPELINE - RUN SUMMARY                    ║");
        info!("╠══════════════════════════════════════════════════════════╣");
        info!(
            "║ Rows: read={:>8}  written={:>8}  elapsed={:>6.1}s    ║",
            rows_read,
            rows_written,
            elapsed.as_secs_f64()
        );
        info!(
            "║ Dropped: undecodable={:>6}  rejected={:>6}  dup={:>6}  ║",
            undecodable, rejected, duplicates
        );
        info!(
            "║ Geolocation: matched={:>8}  unknown={:>8} ({:>5.1}%)  ║",
            matched,
            unmatched,
            self.match_rate() * 100.0
        );
        info!(
            "║ Data quality: malformed_ips={:>6}  inverted_ranges={:>4} ║",
            malformed, inverted
        );
        info!("╠══════════════════════════════════════════════════════════╣");
        if let Ok(timings) = self.stage_timings.read() {
            for (stage, elapsed) in timings.iter() {
                info!("║   {:<24} {:>10.1} ms                  ║", stage, elapsed.as_secs_f64() * 1000.0);
            }
        }
        info!("╚══════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_match_rate() {
        let metrics = PipelineMetrics::new();
        metrics.add(&metrics.matched, 8);
        metrics.add(&metrics.unmatched, 2);
        metrics.add(&metrics.rows_read, 10);

        assert_eq!(metrics.matched.load(Ordering::Relaxed), 8);
        assert!((metrics.match_rate() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_match_rate_empty() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.match_rate(), 0.0);
    }

    #[test]
    fn test_stage_timing() {
        let metrics = PipelineMetrics::new();
        let value = metrics.time_stage("clean", || 7);
        assert_eq!(value, 7);
        let timings = metrics.stage_timings.read().unwrap();
        assert_eq!(timings.len(), 1);
        assert_eq!(timings[0].0, "clean");
    }

    #[test]
    fn test_to_report_snapshot() {
        let metrics = PipelineMetrics::new();
        metrics.add(&metrics.rows_read, 5);
        metrics.add(&metrics.matched, 3);
        metrics.add(&metrics.unmatched, 1);
        metrics.add(&metrics.inverted_ranges, 2);

        let report = metrics.to_report();
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.inverted_ranges, 2);
        assert!((report.match_rate - 0.75).abs() < 1e-9);
    }
}
