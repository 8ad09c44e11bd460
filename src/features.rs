//! Behavioral and temporal feature derivation
//!
//! Two passes: `fit` builds the per-user/device/IP frequency tables over
//! the whole cleaned set, `extract` derives the feature block per row.
//! Matches the column layout the downstream training stage expects.

use crate::types::transaction::CleanTransaction;
use chrono::{Datelike, Timelike};
use std::collections::HashMap;
use tracing::debug;

/// Derived feature block for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorFeatures {
    /// Purchase hour, 0-23
    pub hour_of_day: u32,
    /// Purchase weekday, Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
    /// Purchase time minus signup time in whole seconds; negative values
    /// pass through for the trainer to judge
    pub time_since_signup: i64,
    /// Transactions sharing this row's user_id across the dataset
    pub user_id_count: u64,
    /// Transactions sharing this row's device_id (0 when the field is absent)
    pub device_id_count: u64,
    /// Transactions sharing this row's raw ip_address field
    pub ip_address_count: u64,
}

/// Feature extractor fitted on a cleaned transaction set.
pub struct FeatureExtractor {
    user_counts: HashMap<String, u64>,
    device_counts: HashMap<String, u64>,
    ip_counts: HashMap<String, u64>,
}

impl FeatureExtractor {
    /// Build the frequency tables from the full cleaned set.
    pub fn fit(rows: &[CleanTransaction]) -> Self {
        let mut user_counts: HashMap<String, u64> = HashMap::new();
        let mut device_counts: HashMap<String, u64> = HashMap::new();
        let mut ip_counts: HashMap<String, u64> = HashMap::new();

        for row in rows {
            *user_counts.entry(row.user_id.clone()).or_insert(0) += 1;
            if let Some(device_id) = &row.device_id {
                *device_counts.entry(device_id.clone()).or_insert(0) += 1;
            }
            *ip_counts.entry(row.ip_address.clone()).or_insert(0) += 1;
        }

        debug!(
            users = user_counts.len(),
            devices = device_counts.len(),
            ips = ip_counts.len(),
            "Frequency tables fitted"
        );

        Self {
            user_counts,
            device_counts,
            ip_counts,
        }
    }

    /// Derive the feature block for one transaction.
    ///
    /// The row is expected to come from the fitted set, so the frequency
    /// counts are at least 1; an unseen row degrades to zero counts rather
    /// than panicking.
    pub fn extract(&self, row: &CleanTransaction) -> BehaviorFeatures {
        BehaviorFeatures {
            hour_of_day: row.purchase_time.hour(),
            day_of_week: row.purchase_time.weekday().num_days_from_monday(),
            time_since_signup: (row.purchase_time - row.signup_time).num_seconds(),
            user_id_count: self.user_counts.get(&row.user_id).copied().unwrap_or(0),
            device_id_count: row
                .device_id
                .as_ref()
                .and_then(|d| self.device_counts.get(d))
                .copied()
                .unwrap_or(0),
            ip_address_count: self.ip_counts.get(&row.ip_address).copied().unwrap_or(0),
        }
    }

    /// Derived-column names in output order.
    pub fn feature_names() -> [&'static str; 6] {
        [
            "hour_of_day",
            "day_of_week",
            "time_since_signup",
            "user_id_count",
            "device_id_count",
            "ip_address_count",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;

    fn tx(user_id: &str, device_id: &str, ip: &str, signup: &str, purchase: &str) -> CleanTransaction {
        CleanTransaction {
            user_id: user_id.to_string(),
            signup_time: NaiveDateTime::parse_from_str(signup, TIMESTAMP_FORMAT).unwrap(),
            purchase_time: NaiveDateTime::parse_from_str(purchase, TIMESTAMP_FORMAT).unwrap(),
            purchase_value: Some(34.0),
            device_id: Some(device_id.to_string()),
            source: Some("SEO".to_string()),
            browser: Some("Chrome".to_string()),
            sex: Some("M".to_string()),
            age: Some(39),
            ip_address: ip.to_string(),
            class: Some(0),
        }
    }

    #[test]
    fn test_temporal_features() {
        // 2015-04-18 was a Saturday
        let rows = vec![tx("1", "D1", "100", "2015-04-18 00:00:00", "2015-04-18 02:47:11")];
        let extractor = FeatureExtractor::fit(&rows);
        let features = extractor.extract(&rows[0]);

        assert_eq!(features.hour_of_day, 2);
        assert_eq!(features.day_of_week, 5);
        assert_eq!(features.time_since_signup, 2 * 3600 + 47 * 60 + 11);
    }

    #[test]
    fn test_negative_time_since_signup_passes_through() {
        let rows = vec![tx("1", "D1", "100", "2015-04-18 01:00:00", "2015-04-18 00:00:00")];
        let extractor = FeatureExtractor::fit(&rows);
        assert_eq!(extractor.extract(&rows[0]).time_since_signup, -3600);
    }

    #[test]
    fn test_frequency_counts() {
        let rows = vec![
            tx("u1", "D1", "100", "2015-01-01 00:00:00", "2015-01-02 00:00:00"),
            tx("u1", "D1", "200", "2015-01-01 00:00:00", "2015-01-03 00:00:00"),
            tx("u2", "D1", "100", "2015-01-01 00:00:00", "2015-01-04 00:00:00"),
        ];
        let extractor = FeatureExtractor::fit(&rows);

        let first = extractor.extract(&rows[0]);
        assert_eq!(first.user_id_count, 2);
        assert_eq!(first.device_id_count, 3);
        assert_eq!(first.ip_address_count, 2);

        let third = extractor.extract(&rows[2]);
        assert_eq!(third.user_id_count, 1);
        assert_eq!(third.ip_address_count, 2);
    }

    #[test]
    fn test_missing_device_counts_zero() {
        let mut row = tx("u1", "D1", "100", "2015-01-01 00:00:00", "2015-01-02 00:00:00");
        row.device_id = None;
        let rows = vec![row];
        let extractor = FeatureExtractor::fit(&rows);
        assert_eq!(extractor.extract(&rows[0]).device_id_count, 0);
    }

    #[test]
    fn test_feature_names_order() {
        assert_eq!(
            FeatureExtractor::feature_names(),
            [
                "hour_of_day",
                "day_of_week",
                "time_since_signup",
                "user_id_count",
                "device_id_count",
                "ip_address_count",
            ]
        );
    }
}
