//! IP geolocation: key normalization and range-containment lookup

pub mod index;
pub mod key;

pub use index::RangeLookupIndex;
pub use key::{normalize_ip, parse_ip_value, SENTINEL_KEY};
