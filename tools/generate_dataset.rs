//! Synthetic Dataset Generator
//!
//! Writes a matching pair of raw CSVs (transactions + IP-to-country
//! ranges) for local pipeline runs. A configurable slice of the rows is
//! deliberately dirty (bad IPs, bad timestamps, exact duplicates) to
//! exercise the fail-open paths.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;
use tracing::info;

const COUNTRIES: &[&str] = &[
    "United States",
    "China",
    "Japan",
    "Germany",
    "Brazil",
    "Australia",
    "Korea Republic of",
    "United Kingdom",
];

const SOURCES: &[&str] = &["SEO", "Ads", "Direct"];
const BROWSERS: &[&str] = &["Chrome", "FireFox", "Safari", "Opera", "IE"];

/// Synthetic transaction row generator
struct DatasetGenerator {
    rng: rand::rngs::ThreadRng,
    user_counter: u64,
    epoch: NaiveDateTime,
}

impl DatasetGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            user_counter: 0,
            epoch: NaiveDate::from_ymd_opt(2015, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
        }
    }

    /// IP range table: contiguous blocks with occasional gaps
    fn generate_ranges(&mut self, count: usize) -> Vec<[String; 3]> {
        let mut rows = Vec::with_capacity(count);
        let mut cursor: u64 = 16_777_216; // 1.0.0.0
        for _ in 0..count {
            // leave a gap before some blocks so lookups can miss
            if self.rng.gen_bool(0.2) {
                cursor += self.rng.gen_range(256..4096);
            }
            let width = self.rng.gen_range(256..65_536);
            let lower = cursor;
            let upper = cursor + width;
            cursor = upper + 1;
            rows.push([
                lower.to_string(),
                upper.to_string(),
                self.random_choice(COUNTRIES).to_string(),
            ]);
        }
        rows
    }

    /// One well-formed transaction row; IPs mostly land inside the range
    /// table's span, in the float form the real exports use
    fn generate_transaction(&mut self, max_ip: u64) -> [String; 11] {
        self.user_counter += 1;
        let signup = self.epoch + Duration::seconds(self.rng.gen_range(0..90 * 86_400));
        let purchase = signup + Duration::seconds(self.rng.gen_range(60..120 * 86_400));
        let ip = self.rng.gen_range(16_000_000..max_ip) as f64 + self.rng.gen::<f64>();

        [
            self.user_counter.to_string(),
            signup.format("%Y-%m-%d %H:%M:%S").to_string(),
            purchase.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.rng.gen_range(9..155).to_string(),
            format!("{:013X}", self.rng.gen::<u64>() & 0xFFFF_FFFF_FFFF),
            self.random_choice(SOURCES).to_string(),
            self.random_choice(BROWSERS).to_string(),
            if self.rng.gen_bool(0.5) { "M" } else { "F" }.to_string(),
            self.rng.gen_range(18..70).to_string(),
            format!("{ip:.5}"),
            if self.rng.gen_bool(0.09) { "1" } else { "0" }.to_string(),
        ]
    }

    fn corrupt(&mut self, mut row: [String; 11]) -> [String; 11] {
        match self.rng.gen_range(0..3) {
            0 => row[9] = "not.an.ip".to_string(),
            1 => row[2] = "18/04/2015 02:47".to_string(),
            _ => row[0] = String::new(),
        }
        row
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_dataset=info".parse()?),
        )
        .init();

    info!("Starting synthetic dataset generator");

    let args: Vec<String> = std::env::args().collect();
    let out_dir = args.get(1).map(|s| s.as_str()).unwrap_or("data/raw");
    let tx_count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10_000);
    let range_count: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(500);
    let dirty_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.02);

    info!(
        out_dir = %out_dir,
        tx_count = tx_count,
        range_count = range_count,
        dirty_rate = dirty_rate,
        "Configuration loaded"
    );

    std::fs::create_dir_all(out_dir)?;
    let mut generator = DatasetGenerator::new();

    let ranges = generator.generate_ranges(range_count);
    let max_ip: u64 = ranges
        .last()
        .and_then(|r| r[1].parse().ok())
        .unwrap_or(20_000_000);

    let ip_path = format!("{out_dir}/IpAddress_to_Country.csv");
    let mut ip_writer = csv::Writer::from_path(&ip_path)?;
    ip_writer.write_record([
        "lower_bound_ip_address",
        "upper_bound_ip_address",
        "country",
    ])?;
    for row in &ranges {
        ip_writer.write_record(row)?;
    }
    ip_writer.flush()?;
    info!(path = %ip_path, rows = ranges.len(), "Wrote range table");

    let tx_path = format!("{out_dir}/Fraud_Data.csv");
    let mut tx_writer = csv::Writer::from_path(&tx_path)?;
    tx_writer.write_record([
        "user_id",
        "signup_time",
        "purchase_time",
        "purchase_value",
        "device_id",
        "source",
        "browser",
        "sex",
        "age",
        "ip_address",
        "class",
    ])?;

    let mut rng = rand::thread_rng();
    let mut previous: Option<[String; 11]> = None;
    for _ in 0..tx_count {
        let mut row = generator.generate_transaction(max_ip);
        if rng.gen_bool(dirty_rate) {
            row = generator.corrupt(row);
        }
        // occasional exact duplicate of the previous row
        if let Some(prev) = &previous {
            if rng.gen_bool(dirty_rate / 2.0) {
                tx_writer.write_record(prev)?;
            }
        }
        tx_writer.write_record(&row)?;
        previous = Some(row);
    }
    tx_writer.flush()?;
    info!(path = %tx_path, rows = tx_count, "Wrote transaction data");

    info!("Dataset generation complete");
    Ok(())
}
