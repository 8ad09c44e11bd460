//! CSV ingestion for the two raw dataset sources

use crate::geo::key::parse_ip_value;
use crate::types::ip_range::IpRange;
use crate::types::transaction::RawTransaction;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Transactions read from disk, with the count of rows the decoder had to
/// skip.
pub struct TransactionBatch {
    pub rows: Vec<RawTransaction>,
    pub undecodable: u64,
}

/// Range table read from disk, with the count of rows whose bounds were
/// unparseable.
pub struct RangeTable {
    pub ranges: Vec<IpRange>,
    pub skipped: u64,
}

/// One row of the IP-to-country CSV before bound conversion. Bounds arrive
/// as integer or float-formatted strings depending on upstream export.
#[derive(Debug, Deserialize)]
struct RawIpRange {
    lower_bound_ip_address: Option<String>,
    upper_bound_ip_address: Option<String>,
    country: Option<String>,
}

/// Read the raw transactions CSV.
///
/// A missing or unreadable file is a hard error. An individual row the
/// decoder cannot handle is skipped and counted, never fatal.
pub fn read_transactions<P: AsRef<Path>>(path: P) -> Result<TransactionBatch> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open transactions CSV at {}", path.display()))?;

    let mut rows = Vec::new();
    let mut undecodable = 0u64;
    for record in reader.deserialize::<RawTransaction>() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => {
                undecodable += 1;
                warn!(error = %e, "Skipping undecodable transaction row");
            }
        }
    }

    info!(
        path = %path.display(),
        rows = rows.len(),
        undecodable = undecodable,
        "Loaded transaction records"
    );

    Ok(TransactionBatch { rows, undecodable })
}

/// Read the IP-to-country range table CSV.
///
/// Bounds parse through the same truncating numeric conversion as
/// transaction IP keys; a row whose bounds or country are unusable is
/// skipped and counted.
pub fn read_ip_ranges<P: AsRef<Path>>(path: P) -> Result<RangeTable> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open IP range CSV at {}", path.display()))?;

    let mut ranges = Vec::new();
    let mut skipped = 0u64;
    for record in reader.deserialize::<RawIpRange>() {
        match record {
            Ok(row) => match convert_range(&row) {
                Some(range) => ranges.push(range),
                None => {
                    skipped += 1;
                    warn!(row = ?row, "Skipping range row with unusable bounds");
                }
            },
            Err(e) => {
                skipped += 1;
                warn!(error = %e, "Skipping undecodable range row");
            }
        }
    }

    info!(
        path = %path.display(),
        ranges = ranges.len(),
        skipped = skipped,
        "Loaded IP-to-country range table"
    );

    Ok(RangeTable { ranges, skipped })
}

fn convert_range(row: &RawIpRange) -> Option<IpRange> {
    let lower = parse_ip_value(row.lower_bound_ip_address.as_deref()?)?;
    let upper = parse_ip_value(row.upper_bound_ip_address.as_deref()?)?;
    let country = row.country.as_deref()?.trim();
    if country.is_empty() {
        return None;
    }
    Some(IpRange::new(lower, upper, country))
}
