//! Command-line interface definitions.
//!
//! Flags override values from the optional YAML config file, which in turn
//! override the built-in defaults.

use crate::config::{Config, FailurePolicy};
use clap::Parser;
use std::path::PathBuf;

/// Scrape Disease Outbreak News reports for one year into CSV/JSON.
///
/// # Examples
///
/// ```sh
/// # 2019, six listing pages, CSV in the current directory
/// don_scraper
///
/// # 2020, walk until the listing runs out, keep a resumable JSON copy
/// don_scraper -y 2020 --until-empty -o out/don_2020.csv -j out/don_2020.json
///
/// # Re-run, skipping detail pages already captured
/// don_scraper -y 2020 --until-empty -j out/don_2020.json --resume out/don_2020.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Publication year to collect
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Number of listing pages to walk
    #[arg(short, long, conflicts_with = "until_empty")]
    pub pages: Option<u32>,

    /// Walk listing pages until one comes back empty
    #[arg(long)]
    pub until_empty: bool,

    /// Safety cap on pages when walking until empty
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Site root, e.g. https://reliefweb.int
    #[arg(long, env = "DON_BASE_URL")]
    pub base_url: Option<String>,

    /// Extra attempts for transient HTTP failures
    #[arg(long)]
    pub retries: Option<usize>,

    /// What to do when a detail page fails
    #[arg(long, value_enum)]
    pub on_error: Option<FailurePolicy>,

    /// CSV output path [default: outbreaks_<year>.csv]
    #[arg(short = 'o', long)]
    pub csv_output: Option<PathBuf>,

    /// Optional JSON output path (full records, usable with --resume)
    #[arg(short, long)]
    pub json_output: Option<PathBuf>,

    /// JSON output of a previous run whose detail pages should be reused
    #[arg(long)]
    pub resume: Option<PathBuf>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(year) = self.year {
            config.year = year;
        }
        if let Some(pages) = self.pages {
            config.pages = Some(pages);
        }
        if self.until_empty {
            config.pages = None;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(on_error) = self.on_error {
            config.on_error = on_error;
        }
    }

    pub fn csv_path(&self, config: &Config) -> PathBuf {
        self.csv_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("outbreaks_{}.csv", config.year)))
    }
}
