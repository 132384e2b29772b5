//! # DON Scraper
//!
//! Collects Disease Outbreak News reports published in one calendar year
//! from a humanitarian-information site's search listing, and writes them as
//! a flat table with derived year/month/day columns.
//!
//! ## Usage
//!
//! ```sh
//! don_scraper -y 2019 -p 6 -o outbreaks_2019.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing**: walk paginated search results, collect title + link
//! 2. **Detail**: fetch each report once for its published date and text
//! 3. **Accumulate**: place rows at offsets derived from real page counts
//! 4. **Normalize**: parse `DD Mon YYYY` dates into year/month/day
//! 5. **Output**: CSV (and optionally JSON)

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod http;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod scrapers;
mod stats;
mod table;
mod utils;

use cli::Cli;
use config::Config;
use outputs::{csv, json};
use pipeline::Pipeline;
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("don_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    info!(
        base_url = %config.base_url,
        year = config.year,
        pages = ?config.pages,
        on_error = %config.on_error,
        "Effective configuration"
    );

    // Fail on unwritable outputs before spending any requests.
    let csv_path = args.csv_path(&config);
    for path in std::iter::once(&csv_path).chain(args.json_output.as_ref()) {
        if let Err(e) = ensure_writable_parent(path).await {
            error!(path = %path.display(), error = %e, "Output location is not writable");
            return Err(e);
        }
    }

    let previous = match &args.resume {
        Some(path) => json::read_records(path).await?,
        None => Vec::new(),
    };

    // ---- Scrape ----
    let fetcher = http::fetcher_from_config(&config)?;
    let pipeline = Pipeline::new(&fetcher, &config).with_resume(&previous);
    let (table, summary) = pipeline.run().await?;

    if table.is_empty() {
        warn!("No reports found; writing an empty table");
    }

    // ---- Output ----
    csv::write_table(&table, &csv_path).await?;
    if let Some(path) = &args.json_output {
        json::write_records(&table, path).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        rows = table.len(),
        detail_failures = summary.detail_failures,
        date_failures = summary.normalize.failed(),
        csv = %csv_path.display(),
        "Execution complete"
    );

    Ok(())
}
