//! Report detail page scraper.
//!
//! A detail page carries a metadata list with a "date published" entry and
//! one or more content blocks. Both fields come from a single request.
//!
//! When several content blocks match, each block's text is whitespace
//! collapsed, empty blocks are dropped, and the rest are joined in document
//! order with a blank line between them.

use super::{element_text, selector};
use crate::config::SelectorConfig;
use crate::error::ScrapeError;
use crate::http::FetchPage;
use crate::models::DetailPage;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use scraper::Html;
use tracing::{debug, info, instrument};

/// Separator placed between consecutive content blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Extract the published date and description from a detail page.
pub fn parse_detail(
    html: &str,
    url: &str,
    selectors: &SelectorConfig,
) -> Result<DetailPage, ScrapeError> {
    let document = Html::parse_document(html);
    let published_selector = selector(&selectors.published)?;
    let content_selector = selector(&selectors.content)?;

    let published = document
        .select(&published_selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ScrapeError::structure(url, &selectors.published))?;

    let blocks = document.select(&content_selector).collect::<Vec<_>>();
    if blocks.is_empty() {
        return Err(ScrapeError::structure(url, &selectors.content));
    }
    let description = blocks
        .into_iter()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .join(BLOCK_SEPARATOR);

    Ok(DetailPage {
        published,
        description,
    })
}

/// Fetch one detail page and extract both fields.
///
/// # Arguments
///
/// * `fetcher` - Transport used for the single request
/// * `url` - Absolute detail-page URL taken from the listing
/// * `selectors` - Where the published date and content blocks live
///
/// # Returns
///
/// The raw published-date string and the joined description.
///
/// # Errors
///
/// Network and status failures from the fetcher, or
/// [`ScrapeError::Structure`] naming the URL and the missing element.
#[instrument(level = "info", skip(fetcher, selectors))]
pub async fn fetch_detail<F: FetchPage>(
    fetcher: &F,
    url: &str,
    selectors: &SelectorConfig,
) -> Result<DetailPage, ScrapeError> {
    let html = fetcher.fetch(url).await?;
    let detail = parse_detail(&html, url, selectors)?;

    info!(
        published = %detail.published,
        bytes = detail.description.len(),
        "Parsed detail page"
    );
    debug!(preview = %truncate_for_log(&detail.description, 160), "Description");
    Ok(detail)
}
