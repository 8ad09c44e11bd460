//! Configuration management for the feature-engineering pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Input/output dataset paths
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Raw transaction records CSV
    pub transactions_path: String,
    /// IP-to-country range table CSV
    pub ip_country_path: String,
    /// Destination for the enriched transactions CSV
    pub output_path: String,
    /// Destination for the JSON data-quality report
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

fn default_report_path() -> String {
    "data/processed/quality_report.json".to_string()
}

/// Pipeline execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Worker threads for the batch geolocation lookup (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Key batches smaller than this are looked up sequentially
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_workers() -> usize {
    4
}

fn default_parallel_threshold() -> usize {
    10_000
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                transactions_path: "data/raw/Fraud_Data.csv".to_string(),
                ip_country_path: "data/raw/IpAddress_to_Country.csv".to_string(),
                output_path: "data/processed/enriched_transactions.csv".to_string(),
                report_path: default_report_path(),
            },
            pipeline: PipelineConfig {
                workers: default_workers(),
                parallel_threshold: default_parallel_threshold(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
