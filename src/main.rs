//! Fraud Feature Pipeline - Main Entry Point
//!
//! Reads the raw transaction and IP-to-country CSVs, runs the cleaning /
//! geolocation / feature-derivation stages, and writes the enriched
//! dataset plus a data-quality report.

use anyhow::Result;
use fraud_feature_pipeline::{config::AppConfig, metrics::PipelineMetrics, pipeline};
use tracing::info;

fn main() -> Result<()> {
    // Load configuration first; the log level comes from it
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                format!("fraud_feature_pipeline={}", config.logging.level).parse()?,
            ),
        )
        .init();

    info!("Starting feature-engineering pipeline");
    info!(
        transactions = %config.data.transactions_path,
        ip_country = %config.data.ip_country_path,
        output = %config.data.output_path,
        workers = config.pipeline.workers,
        "Configuration loaded"
    );

    let metrics = PipelineMetrics::new();
    let summary = pipeline::run(&config, &metrics)?;

    info!(
        rows_written = summary.rows_written,
        matched = summary.matched,
        unmatched = summary.unmatched,
        output = %summary.output_path,
        report = %summary.report_path,
        "Pipeline complete"
    );
    metrics.print_summary();

    Ok(())
}
