//! Transaction cleaning: required fields, timestamp parsing, duplicates

use crate::types::transaction::{CleanTransaction, RawTransaction, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Result of a cleaning pass. Kept rows preserve input order.
pub struct CleanOutcome {
    pub rows: Vec<CleanTransaction>,
    /// Rows missing user_id/ip_address or carrying unparseable timestamps
    pub rejected: u64,
    /// Exact-duplicate rows dropped, first occurrence kept
    pub duplicates: u64,
}

/// Cleans raw transaction rows into the shape the rest of the pipeline
/// relies on. No condition here is fatal: bad rows are dropped and
/// counted.
pub struct TransactionCleaner;

impl TransactionCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Run the cleaning pass: drop exact duplicates, reject rows missing
    /// the join-critical fields, parse both timestamps.
    pub fn clean(&self, raw_rows: Vec<RawTransaction>) -> CleanOutcome {
        let mut seen = HashSet::with_capacity(raw_rows.len());
        let mut rows = Vec::with_capacity(raw_rows.len());
        let mut rejected = 0u64;
        let mut duplicates = 0u64;

        for raw in raw_rows {
            if !seen.insert(raw.dedup_key()) {
                duplicates += 1;
                continue;
            }
            match self.clean_row(raw) {
                Some(row) => rows.push(row),
                None => rejected += 1,
            }
        }

        info!(
            kept = rows.len(),
            rejected = rejected,
            duplicates = duplicates,
            "Cleaning pass complete"
        );

        CleanOutcome {
            rows,
            rejected,
            duplicates,
        }
    }

    fn clean_row(&self, raw: RawTransaction) -> Option<CleanTransaction> {
        let user_id = match non_empty(raw.user_id.as_deref()) {
            Some(v) => v.to_string(),
            None => {
                debug!("Rejecting row with missing user_id");
                return None;
            }
        };
        let ip_address = match non_empty(raw.ip_address.as_deref()) {
            Some(v) => v.to_string(),
            None => {
                debug!(user_id = %user_id, "Rejecting row with missing ip_address");
                return None;
            }
        };

        let signup_time = parse_timestamp(raw.signup_time.as_deref(), "signup_time", &user_id)?;
        let purchase_time =
            parse_timestamp(raw.purchase_time.as_deref(), "purchase_time", &user_id)?;

        Some(CleanTransaction {
            user_id,
            signup_time,
            purchase_time,
            purchase_value: raw.purchase_value,
            device_id: raw.device_id,
            source: raw.source,
            browser: raw.browser,
            sex: raw.sex,
            age: raw.age,
            ip_address,
            class: raw.class,
        })
    }
}

impl Default for TransactionCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_timestamp(value: Option<&str>, field: &str, user_id: &str) -> Option<NaiveDateTime> {
    let raw = non_empty(value)?;
    match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        Ok(ts) => Some(ts),
        Err(e) => {
            warn!(user_id = %user_id, field = field, value = raw, error = %e, "Rejecting row with unparseable timestamp");
            None
        }
    }
}
