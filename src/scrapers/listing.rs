//! Listing page scraper.
//!
//! A listing page is one page of the site's search results for the
//! configured topic and year. Each result is an `<article>` holding a
//! heading with the title and, inside its `<header>`, a link to the report.
//!
//! # URL Pattern
//!
//! ```text
//! {base_url}{listing_path}?advanced-search={topic}_(DO{year}0101-{year}1231)&page={p}
//! ```

use super::{element_text, selector};
use crate::config::{Config, SelectorConfig};
use crate::error::ScrapeError;
use crate::http::FetchPage;
use crate::models::ListingItem;
use scraper::Html;
use tracing::{debug, info, instrument};
use url::Url;

/// Build the URL of one listing page.
///
/// # Arguments
///
/// * `config` - Supplies base URL, listing path, topic filter and year
/// * `page` - Zero-based page number
///
/// # Returns
///
/// The absolute listing URL with the advanced-search expression
/// percent-encoded.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidUrl`] if the base URL or the joined path
/// does not parse.
pub fn listing_url(config: &Config, page: u32) -> Result<Url, ScrapeError> {
    let relative = format!(
        "{}?advanced-search={}&page={}",
        config.listing_path,
        urlencoding::encode(&config.search_expression()),
        page
    );
    config
        .base()?
        .join(&relative)
        .map_err(|source| ScrapeError::InvalidUrl {
            url: relative,
            source,
        })
}

/// Extract the report entries of one listing page, in document order.
///
/// Links are resolved against `page_url`. A page without any entry yields
/// an empty vector; an entry missing its heading or header link is an error.
pub fn parse_listing(
    html: &str,
    page_url: &Url,
    selectors: &SelectorConfig,
) -> Result<Vec<ListingItem>, ScrapeError> {
    let document = Html::parse_document(html);
    let article_selector = selector(&selectors.article)?;
    let title_selector = selector(&selectors.title)?;
    let link_selector = selector(&selectors.link)?;

    let mut items = Vec::new();
    for (position, article) in document.select(&article_selector).enumerate() {
        let title = article
            .select(&title_selector)
            .next()
            .map(element_text)
            .ok_or_else(|| {
                ScrapeError::structure(
                    page_url.as_str(),
                    &format!("{} #{position} {}", selectors.article, selectors.title),
                )
            })?;

        let href = article
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| {
                ScrapeError::structure(
                    page_url.as_str(),
                    &format!("{} #{position} {}", selectors.article, selectors.link),
                )
            })?;

        let link = page_url
            .join(href)
            .map_err(|source| ScrapeError::InvalidUrl {
                url: href.to_string(),
                source,
            })?;

        items.push(ListingItem {
            title,
            link: link.to_string(),
        });
    }
    Ok(items)
}

/// Fetch and parse one listing page.
///
/// Makes exactly one request through `fetcher`.
///
/// # Arguments
///
/// * `fetcher` - Transport used for the request
/// * `config` - Run configuration (URL parts and selectors)
/// * `page` - Zero-based page number
///
/// # Returns
///
/// The page's entries in document order; empty when the page lists none.
///
/// # Errors
///
/// Network and status failures from the fetcher, and
/// [`ScrapeError::Structure`] when an entry lacks its title or link.
#[instrument(level = "info", skip(fetcher, config))]
pub async fn fetch_listing<F: FetchPage>(
    fetcher: &F,
    config: &Config,
    page: u32,
) -> Result<Vec<ListingItem>, ScrapeError> {
    let url = listing_url(config, page)?;
    let html = fetcher.fetch(url.as_str()).await?;
    let items = parse_listing(&html, &url, &config.selectors)?;

    info!(count = items.len(), %url, "Indexed listing page");
    debug!(titles = ?items.iter().map(|i| &i.title).collect::<Vec<_>>(), "Listing titles");
    Ok(items)
}
