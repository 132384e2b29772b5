//! Run configuration.
//!
//! Every value the scraper used to hard-code (site, topic filter, year, page
//! count, page size, selectors) lives here. A YAML file can override any
//! subset of fields; the command line overrides the file.
//!
//! ```yaml
//! year: 2020
//! pages: null        # walk until an empty listing page
//! on_error: abort
//! selectors:
//!   content: ".rw-report__content"
//! ```

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// What to do when a detail page cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the row with empty date/description and an error marker.
    #[default]
    Skip,
    /// Stop the run at the first failure.
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Skip => f.write_str("skip"),
            FailurePolicy::Abort => f.write_str("abort"),
        }
    }
}

/// CSS selectors describing the listing and detail page markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One listing entry.
    pub article: String,
    /// Heading holding the title, relative to an entry.
    pub title: String,
    /// Detail link inside the entry's header, relative to an entry.
    pub link: String,
    /// The "date published" value in the detail page's metadata list.
    pub published: String,
    /// Content blocks making up the description.
    pub content: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            article: "article".to_string(),
            title: "h3".to_string(),
            link: "header a[href]".to_string(),
            published: ".rw-entity-meta__tag-value--published".to_string(),
            content: ".rw-report__content".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub listing_path: String,
    /// Topic part of the site's advanced-search expression, e.g. `(S1229)`.
    pub topic_filter: String,
    pub year: i32,
    /// Number of listing pages to walk; `None` walks until an empty page.
    pub pages: Option<u32>,
    /// Upper bound when walking until empty.
    pub max_pages: u32,
    /// Expected entries per listing page. Only used for sanity warnings.
    pub page_size: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub retries: usize,
    pub retry_base_ms: u64,
    pub on_error: FailurePolicy,
    pub selectors: SelectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://reliefweb.int".to_string(),
            listing_path: "/updates".to_string(),
            topic_filter: "(S1229)".to_string(),
            year: 2019,
            pages: Some(6),
            max_pages: 50,
            page_size: 20,
            user_agent: format!("don_scraper/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            retries: 2,
            retry_base_ms: 500,
            on_error: FailurePolicy::Skip,
            selectors: SelectorConfig::default(),
        }
    }
}

impl Config {
    /// Load a YAML configuration file. Missing keys fall back to defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML file
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Io`] if the file cannot be read and
    /// [`ScrapeError::Yaml`] if it is not a valid configuration.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&text)?;
        info!(year = config.year, pages = ?config.pages, "Loaded configuration file");
        Ok(config)
    }

    /// Reject values that would make the run meaningless.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.pages == Some(0) {
            return Err(ScrapeError::Config("pages must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(ScrapeError::Config("max_pages must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(ScrapeError::Config("page_size must be at least 1".into()));
        }
        self.base()?;
        Ok(())
    }

    pub fn base(&self) -> Result<Url, ScrapeError> {
        Url::parse(&self.base_url).map_err(|source| ScrapeError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    /// The full advanced-search expression: topic filter plus the
    /// publication-date range covering `year`.
    pub fn search_expression(&self) -> String {
        format!(
            "{}_(DO{y}0101-{y}1231)",
            self.topic_filter,
            y = self.year
        )
    }

    /// How many pages the pipeline may visit at most.
    pub fn page_bound(&self) -> u32 {
        self.pages.unwrap_or(self.max_pages)
    }

    /// Whether the walk stops at the first empty page.
    pub fn until_empty(&self) -> bool {
        self.pages.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_source_constants() {
        let c = Config::default();
        assert_eq!(c.year, 2019);
        assert_eq!(c.pages, Some(6));
        assert_eq!(c.page_size, 20);
        assert_eq!(c.on_error, FailurePolicy::Skip);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_search_expression() {
        let c = Config {
            year: 2021,
            ..Config::default()
        };
        assert_eq!(c.search_expression(), "(S1229)_(DO20210101-20211231)");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "year: 2020\npages: null\non_error: abort\nselectors:\n  content: \".body\"\n";
        let c: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.year, 2020);
        assert!(c.until_empty());
        assert_eq!(c.page_bound(), 50);
        assert_eq!(c.on_error, FailurePolicy::Abort);
        assert_eq!(c.selectors.content, ".body");
        assert_eq!(c.selectors.article, "article");
        assert_eq!(c.base_url, "https://reliefweb.int");
    }

    #[test]
    fn test_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "year: 2018\npages: 2").unwrap();
        let c = Config::load(f.path()).unwrap();
        assert_eq!(c.year, 2018);
        assert_eq!(c.pages, Some(2));
    }

    #[test]
    fn test_validate_rejects_zero_pages_and_bad_url() {
        let c = Config {
            pages: Some(0),
            ..Config::default()
        };
        assert!(matches!(c.validate(), Err(ScrapeError::Config(_))));

        let c = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(c.validate(), Err(ScrapeError::InvalidUrl { .. })));
    }
}
