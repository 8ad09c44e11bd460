//! Stage orchestration: read → clean → index → lookup → features → write

use crate::cleaner::TransactionCleaner;
use crate::config::AppConfig;
use crate::features::FeatureExtractor;
use crate::geo::key::{parse_ip_value, SENTINEL_KEY};
use crate::geo::RangeLookupIndex;
use crate::metrics::PipelineMetrics;
use crate::reader;
use crate::types::transaction::{CleanTransaction, EnrichedTransaction, TIMESTAMP_FORMAT};
use crate::writer;
use anyhow::Result;
use tracing::info;

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub rows_written: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub output_path: String,
    pub report_path: String,
}

/// Execute the full pipeline against the configured paths.
///
/// Hard errors are limited to unreadable inputs and unwritable outputs;
/// every data-quality condition is counted and the run continues.
pub fn run(config: &AppConfig, metrics: &PipelineMetrics) -> Result<RunSummary> {
    let transactions = metrics.time_stage("read_transactions", || {
        reader::read_transactions(&config.data.transactions_path)
    })?;
    metrics.add(&metrics.rows_read, transactions.rows.len() as u64);
    metrics.add(&metrics.rows_undecodable, transactions.undecodable);

    let range_table = metrics.time_stage("read_ip_ranges", || {
        reader::read_ip_ranges(&config.data.ip_country_path)
    })?;
    metrics.add(&metrics.ranges_skipped, range_table.skipped);

    let cleaned = metrics.time_stage("clean", || {
        TransactionCleaner::new().clean(transactions.rows)
    });
    metrics.add(&metrics.rows_rejected, cleaned.rejected);
    metrics.add(&metrics.duplicates_dropped, cleaned.duplicates);

    let index = metrics.time_stage("build_index", || {
        RangeLookupIndex::build(range_table.ranges)
    });
    metrics.add(&metrics.inverted_ranges, index.inverted_ranges());

    let keys = metrics.time_stage("normalize_keys", || normalize_keys(&cleaned.rows, metrics));

    let lookups = metrics.time_stage("geolocate", || {
        index.lookup_batch_parallel(
            &keys,
            config.pipeline.workers,
            config.pipeline.parallel_threshold,
        )
    });
    let matched = lookups.iter().filter(|r| r.is_matched()).count() as u64;
    metrics.add(&metrics.matched, matched);
    metrics.add(&metrics.unmatched, lookups.len() as u64 - matched);
    info!(
        keys = keys.len(),
        matched = matched,
        "Geolocation join complete"
    );

    let enriched = metrics.time_stage("derive_features", || {
        let extractor = FeatureExtractor::fit(&cleaned.rows);
        cleaned
            .rows
            .iter()
            .zip(keys.iter().zip(lookups.iter()))
            .map(|(row, (&key, lookup))| enrich(row, key, lookup.country(), &extractor))
            .collect::<Vec<_>>()
    });

    metrics.time_stage("write_output", || {
        writer::write_enriched(&config.data.output_path, &enriched)
    })?;
    metrics.add(&metrics.rows_written, enriched.len() as u64);

    let report = metrics.to_report();
    writer::write_report(&config.data.report_path, &report)?;

    Ok(RunSummary {
        rows_written: enriched.len() as u64,
        matched,
        unmatched: report.unmatched,
        output_path: config.data.output_path.clone(),
        report_path: config.data.report_path.clone(),
    })
}

/// Normalize every surviving row's IP field into a lookup key, counting
/// the fields that fell back to the sentinel.
fn normalize_keys(rows: &[CleanTransaction], metrics: &PipelineMetrics) -> Vec<u32> {
    let mut malformed = 0u64;
    let keys = rows
        .iter()
        .map(|row| match parse_ip_value(&row.ip_address) {
            Some(key) => key,
            None => {
                malformed += 1;
                SENTINEL_KEY
            }
        })
        .collect();
    metrics.add(&metrics.malformed_ips, malformed);
    keys
}

fn enrich(
    row: &CleanTransaction,
    ip_key: u32,
    country: &str,
    extractor: &FeatureExtractor,
) -> EnrichedTransaction {
    let features = extractor.extract(row);
    EnrichedTransaction {
        user_id: row.user_id.clone(),
        signup_time: row.signup_time.format(TIMESTAMP_FORMAT).to_string(),
        purchase_time: row.purchase_time.format(TIMESTAMP_FORMAT).to_string(),
        purchase_value: row.purchase_value,
        device_id: row.device_id.clone(),
        source: row.source.clone(),
        browser: row.browser.clone(),
        sex: row.sex.clone(),
        age: row.age,
        ip_address: row.ip_address.clone(),
        class: row.class,
        ip_key,
        country: country.to_string(),
        hour_of_day: features.hour_of_day,
        day_of_week: features.day_of_week,
        time_since_signup: features.time_since_signup,
        user_id_count: features.user_id_count,
        device_id_count: features.device_id_count,
        ip_address_count: features.ip_address_count,
    }
}
