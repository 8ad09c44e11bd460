//! Type definitions for the feature-engineering pipeline

pub mod ip_range;
pub mod report;
pub mod transaction;

pub use ip_range::{IpRange, LookupResult};
pub use report::QualityReport;
pub use transaction::{CleanTransaction, EnrichedTransaction, RawTransaction};
