//! Output stage: enriched CSV and data-quality report

use crate::types::report::QualityReport;
use crate::types::transaction::EnrichedTransaction;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Write the enriched transaction table as CSV with headers, creating
/// parent directories as needed.
pub fn write_enriched<P: AsRef<Path>>(path: P, rows: &[EnrichedTransaction]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output CSV at {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .context("Failed to serialize enriched row")?;
    }
    writer.flush().context("Failed to flush output CSV")?;

    info!(path = %path.display(), rows = rows.len(), "Wrote enriched dataset");
    Ok(())
}

/// Write the data-quality report as pretty JSON next to the dataset.
pub fn write_report<P: AsRef<Path>>(path: P, report: &QualityReport) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report at {}", path.display()))?;

    info!(path = %path.display(), run_id = %report.run_id, "Wrote quality report");
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched(user_id: &str, country: &str) -> EnrichedTransaction {
        EnrichedTransaction {
            user_id: user_id.to_string(),
            signup_time: "2015-02-24 22:55:49".to_string(),
            purchase_time: "2015-04-18 02:47:11".to_string(),
            purchase_value: Some(34.0),
            device_id: Some("QVPSPJUOCKZAR".to_string()),
            source: Some("SEO".to_string()),
            browser: Some("Chrome".to_string()),
            sex: Some("M".to_string()),
            age: Some(39),
            ip_address: "732758368.79972".to_string(),
            class: Some(0),
            ip_key: 732758368,
            country: country.to_string(),
            hour_of_day: 2,
            day_of_week: 5,
            time_since_signup: 4507882,
            user_id_count: 1,
            device_id_count: 1,
            ip_address_count: 1,
        }
    }

    #[test]
    fn test_write_enriched_creates_dirs_and_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/enriched.csv");

        write_enriched(&path, &[enriched("1", "Japan"), enriched("2", "Unknown")]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("user_id,signup_time,purchase_time"));
        assert!(header.ends_with("user_id_count,device_id_count,ip_address_count"));
        assert_eq!(lines.clone().count(), 2);
        assert!(lines.next().unwrap().contains("Japan"));
        assert!(lines.next().unwrap().contains("Unknown"));
    }

    #[test]
    fn test_write_empty_dataset_still_emits_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enriched.csv");

        write_enriched(&path, &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut report = QualityReport::new();
        report.matched = 9;
        report.unmatched = 1;
        let report = report.finalize();
        write_report(&path, &report).unwrap();

        let loaded: QualityReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert!((loaded.match_rate - 0.9).abs() < 1e-9);
    }
}
