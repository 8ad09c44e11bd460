//! Transaction records at each stage of the pipeline

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used by the raw transaction CSV.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the raw transactions CSV, before any validation.
///
/// All fields are tolerant: timestamps stay as strings until the cleaner
/// parses them, and anything the source may omit is an `Option`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTransaction {
    pub user_id: Option<String>,
    pub signup_time: Option<String>,
    pub purchase_time: Option<String>,
    pub purchase_value: Option<f64>,
    pub device_id: Option<String>,
    pub source: Option<String>,
    pub browser: Option<String>,
    pub sex: Option<String>,
    pub age: Option<i32>,
    pub ip_address: Option<String>,
    pub class: Option<i32>,
}

impl RawTransaction {
    /// Stable identity of the full row, used for exact-duplicate removal.
    pub fn dedup_key(&self) -> String {
        format!(
            "{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}",
            self.user_id,
            self.signup_time,
            self.purchase_time,
            self.purchase_value,
            self.device_id,
            self.source,
            self.browser,
            self.sex,
            self.age,
            self.ip_address,
            self.class,
        )
    }
}

/// A transaction that survived cleaning: join-critical fields present and
/// timestamps parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTransaction {
    pub user_id: String,
    pub signup_time: NaiveDateTime,
    pub purchase_time: NaiveDateTime,
    pub purchase_value: Option<f64>,
    pub device_id: Option<String>,
    pub source: Option<String>,
    pub browser: Option<String>,
    pub sex: Option<String>,
    pub age: Option<i32>,
    pub ip_address: String,
    pub class: Option<i32>,
}

/// Output row: the cleaned transaction plus geolocation and derived
/// behavioral features, serialized as one CSV record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    pub user_id: String,
    pub signup_time: String,
    pub purchase_time: String,
    pub purchase_value: Option<f64>,
    pub device_id: Option<String>,
    pub source: Option<String>,
    pub browser: Option<String>,
    pub sex: Option<String>,
    pub age: Option<i32>,
    pub ip_address: String,
    pub class: Option<i32>,
    /// Normalized 32-bit key the geolocation join ran on
    pub ip_key: u32,
    /// Country from the range lookup, "Unknown" when unmatched
    pub country: String,
    pub hour_of_day: u32,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
    /// Purchase time minus signup time, whole seconds
    pub time_since_signup: i64,
    pub user_id_count: u64,
    pub device_id_count: u64,
    pub ip_address_count: u64,
}
