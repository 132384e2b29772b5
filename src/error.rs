//! Error taxonomy for the scraping pipeline.
//!
//! Network, structural and parse failures are kept as separate variants so
//! that a record which "had no date" can never be confused with one whose
//! date "did not parse".

use thiserror::Error;

/// Everything that can go wrong while scraping, normalizing or exporting.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The page was fetched but the expected markup is absent.
    #[error("{url}: expected element `{element}` not found")]
    Structure { url: String, element: String },

    /// A configured or scraped URL could not be parsed or joined.
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A configured CSS selector does not compile.
    #[error("invalid CSS selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A scraped published-date string does not match `DD Mon YYYY`.
    #[error("row {row}: cannot parse published date {raw:?}: {source}")]
    DateParse {
        row: usize,
        raw: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Configuration file or value problem.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ScrapeError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Client errors (4xx) other than `429 Too Many Requests` are permanent;
    /// structural and parse errors are deterministic.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Network { .. } => true,
            ScrapeError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub(crate) fn structure(url: &str, element: &str) -> Self {
        ScrapeError::Structure {
            url: url.to_string(),
            element: element.to_string(),
        }
    }
}
