//! Page scrapers for the DON listing and detail pages.
//!
//! Scraping is two-phase, one module per phase:
//!
//! 1. **Listing** ([`listing`]): walk the paginated search results and
//!    collect `(title, link)` for each report entry
//! 2. **Detail** ([`detail`]): fetch each report once and pull the published
//!    date and description
//!
//! Each module exposes a pure `parse_*` function working on an HTML string
//! and a `fetch_*` wrapper that performs exactly one request through a
//! [`FetchPage`](crate::http::FetchPage).

pub mod detail;
pub mod listing;

use crate::error::ScrapeError;
use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Visible text of an element, whitespace-collapsed.
///
/// Text nodes are concatenated as-is so inline markup (`<a>`, `<strong>`,
/// `<sup>`) does not introduce spaces the reader never sees.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    crate::utils::normalize_text(&element.text().collect::<String>())
}
