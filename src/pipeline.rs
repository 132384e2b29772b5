//! The scrape run: listing pages → detail pages → table → normalization.
//!
//! Row offsets are computed from the number of entries each listing page
//! actually returned, so a short or empty page never shifts later rows.
//! All requests are sequential; detail pages are walked lazily so that an
//! abort stops further fetching immediately.

use crate::config::{Config, FailurePolicy};
use crate::error::ScrapeError;
use crate::http::FetchPage;
use crate::models::{DetailPage, Field, ListingItem, OutbreakRecord};
use crate::normalize::{NormalizeReport, normalize};
use crate::scrapers::{detail, listing};
use crate::stats::OutbreakStats;
use crate::table::OutbreakTable;
use futures::pin_mut;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Where one listing page's entries landed in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub page: u32,
    /// Row index of the page's first entry.
    pub offset: usize,
    pub count: usize,
}

impl PageSpan {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.count
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages: Vec<PageSpan>,
    /// Detail pages that could not be fetched or parsed.
    pub detail_failures: usize,
    /// Detail pages taken from a previous run instead of fetched.
    pub reused: usize,
    pub normalize: NormalizeReport,
    /// Per-month and per-disease counts over the finished table.
    pub stats: OutbreakStats,
}

pub struct Pipeline<'a, F> {
    fetcher: &'a F,
    config: &'a Config,
    resume: HashMap<String, DetailPage>,
}

impl<'a, F: FetchPage> Pipeline<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a Config) -> Self {
        Self {
            fetcher,
            config,
            resume: HashMap::new(),
        }
    }

    /// Reuse detail fields from a previous run's records, keyed by link.
    pub fn with_resume(mut self, records: &[OutbreakRecord]) -> Self {
        for record in records {
            if let (Some(link), Some(published), Some(description)) =
                (&record.link, &record.raw_date, &record.description)
            {
                self.resume.insert(
                    link.clone(),
                    DetailPage {
                        published: published.clone(),
                        description: description.clone(),
                    },
                );
            }
        }
        info!(reusable = self.resume.len(), "Loaded resume records");
        self
    }

    /// Scrape every configured page, then normalize dates once.
    ///
    /// # Returns
    ///
    /// The finished table and a [`RunSummary`] with page spans, failure
    /// counts, the normalization report and per-month/per-disease counts.
    ///
    /// # Errors
    ///
    /// - Any listing page failure (network, status or markup)
    /// - Under [`FailurePolicy::Abort`], the first detail failure or the
    ///   first unparseable published date
    #[instrument(level = "info", skip_all, fields(year = self.config.year))]
    pub async fn run(&self) -> Result<(OutbreakTable, RunSummary), ScrapeError> {
        let t0 = Instant::now();
        let (mut table, mut summary) = self.scrape().await?;
        summary.normalize = normalize(&mut table);

        if self.config.on_error == FailurePolicy::Abort {
            if let Some(err) = summary.normalize.failures.drain(..).next() {
                error!(error = %err, "Aborting: unparseable published date");
                return Err(err);
            }
        }

        summary.stats = OutbreakStats::from_table(&table);
        debug!(by_month = ?summary.stats.by_month, by_disease = ?summary.stats.by_disease, "Report counts");

        info!(
            pages = summary.pages.len(),
            rows = table.len(),
            detail_failures = summary.detail_failures,
            reused = summary.reused,
            dates_parsed = summary.normalize.parsed,
            dates_missing = summary.normalize.missing,
            dates_failed = summary.normalize.failed(),
            by_year = ?summary.stats.by_year(),
            diseases = summary.stats.unique_diseases(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Scrape run complete"
        );
        Ok((table, summary))
    }

    /// Walk listing and detail pages, filling the table. No normalization.
    pub async fn scrape(&self) -> Result<(OutbreakTable, RunSummary), ScrapeError> {
        let mut table = OutbreakTable::new();
        let mut summary = RunSummary::default();
        let mut offset = 0usize;

        for page in 0..self.config.page_bound() {
            let items = listing::fetch_listing(self.fetcher, self.config, page).await?;
            let span = PageSpan {
                page,
                offset,
                count: items.len(),
            };
            summary.pages.push(span);

            if items.is_empty() {
                info!(page, "Listing page has no entries");
                if self.config.until_empty() {
                    break;
                }
                continue;
            }
            if items.len() != self.config.page_size {
                debug!(
                    page,
                    count = items.len(),
                    page_size = self.config.page_size,
                    "Listing page size differs from configured page_size"
                );
            }

            for (i, item) in items.iter().enumerate() {
                table.set(offset + i, Field::Outbreak, item.title.as_str());
                table.set(offset + i, Field::Link, item.link.as_str());
            }

            self.fill_details(&mut table, &mut summary, &items, offset).await?;
            debug!(page, rows = ?span.rows(), "Listing page accumulated");
            offset += items.len();
        }

        if self.config.until_empty() && summary.pages.last().is_some_and(|s| s.count > 0) {
            warn!(
                max_pages = self.config.max_pages,
                "Stopped at max_pages before reaching an empty listing page"
            );
        }
        Ok((table, summary))
    }

    async fn fill_details(
        &self,
        table: &mut OutbreakTable,
        summary: &mut RunSummary,
        items: &[ListingItem],
        offset: usize,
    ) -> Result<(), ScrapeError> {
        let details = stream::iter(items.iter().enumerate()).then(move |(i, item)| async move {
            (offset + i, item, self.detail_for(item).await)
        });
        pin_mut!(details);

        while let Some((row, item, result)) = details.next().await {
            match result {
                Ok((detail, reused)) => {
                    if reused {
                        summary.reused += 1;
                    }
                    table.set(row, Field::Date, detail.published);
                    table.set(row, Field::Description, detail.description);
                }
                Err(e) => match self.config.on_error {
                    FailurePolicy::Abort => {
                        error!(row, url = %item.link, error = %e, "Aborting on detail failure");
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        warn!(row, url = %item.link, error = %e, "Detail page failed; keeping row without date");
                        table.mark_failed(row, e.to_string());
                        summary.detail_failures += 1;
                    }
                },
            }
        }
        Ok(())
    }

    async fn detail_for(&self, item: &ListingItem) -> Result<(DetailPage, bool), ScrapeError> {
        if let Some(previous) = self.resume.get(&item.link) {
            debug!(url = %item.link, "Reusing detail from previous run");
            return Ok((previous.clone(), true));
        }
        let detail = detail::fetch_detail(self.fetcher, &item.link, &self.config.selectors).await?;
        Ok((detail, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordStage;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// In-memory site: URL → HTML, counting requests per URL.
    #[derive(Default)]
    struct StubSite {
        pages: HashMap<String, String>,
        hits: Mutex<HashMap<String, usize>>,
    }

    impl StubSite {
        fn hits(&self, url: &str) -> usize {
            self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    impl FetchPage for StubSite {
        async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
            *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Status {
                    url: url.to_string(),
                    status: reqwest::StatusCode::NOT_FOUND,
                })
        }
    }

    fn config(pages: Option<u32>) -> Config {
        Config {
            base_url: "https://don.test".into(),
            pages,
            max_pages: 10,
            page_size: 3,
            ..Config::default()
        }
    }

    fn listing_html(slugs: &[&str]) -> String {
        slugs
            .iter()
            .map(|s| {
                format!(r#"<article><header><h3><a href="/report/{s}">Report {s}</a></h3></header></article>"#)
            })
            .collect()
    }

    fn detail_html(date: Option<&str>, text: &str) -> String {
        let date = date
            .map(|d| format!(r#"<dd class="rw-entity-meta__tag-value--published">{d}</dd>"#))
            .unwrap_or_default();
        format!(r#"<dl>{date}</dl><div class="rw-report__content"><p>{text}</p></div>"#)
    }

    fn site(config: &Config, listing: &[&[&str]]) -> StubSite {
        let mut site = StubSite::default();
        for (page, slugs) in listing.iter().enumerate() {
            let url = listing::listing_url(config, page as u32).unwrap();
            site.pages.insert(url.to_string(), listing_html(slugs));
            for slug in slugs.iter() {
                site.pages.insert(
                    format!("https://don.test/report/{slug}"),
                    detail_html(Some("05 Jan 2019"), &format!("About {slug}.")),
                );
            }
        }
        site
    }

    #[tokio::test]
    async fn test_offsets_follow_actual_page_counts() {
        let config = config(Some(3));
        let site = site(&config, &[&["a", "b", "c"], &[], &["d", "e"]]);

        let (table, summary) = Pipeline::new(&site, &config).run().await.unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(
            summary.pages.iter().map(|s| (s.offset, s.count)).collect::<Vec<_>>(),
            vec![(0, 3), (3, 0), (3, 2)]
        );
        let page2: Vec<_> = summary.pages[2]
            .rows()
            .map(|r| table.get(r).unwrap().outbreak.clone().unwrap())
            .collect();
        assert_eq!(page2, vec!["Report d", "Report e"]);
        assert!(table.iter().all(|r| r.stage == RecordStage::Normalized));
        assert_eq!(summary.stats.by_month.get(&(2019, 1)), Some(&5));
        assert_eq!(summary.stats.undated, 0);
    }

    #[tokio::test]
    async fn test_until_empty_stops_at_first_empty_page() {
        let config = config(None);
        let site = site(&config, &[&["a", "b"], &[], &["never"]]);

        let (table, summary) = Pipeline::new(&site, &config).run().await.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(summary.pages.len(), 2);
        let page2 = listing::listing_url(&config, 2).unwrap();
        assert_eq!(site.hits(page2.as_str()), 0);
    }

    #[tokio::test]
    async fn test_one_request_per_detail_page() {
        let config = config(Some(1));
        let site = site(&config, &[&["a", "b"]]);

        Pipeline::new(&site, &config).run().await.unwrap();

        assert_eq!(site.hits("https://don.test/report/a"), 1);
        assert_eq!(site.hits("https://don.test/report/b"), 1);
    }

    #[tokio::test]
    async fn test_missing_date_marks_record_without_default() {
        let config = config(Some(1));
        let mut site = site(&config, &[&["a", "b"]]);
        site.pages.insert(
            "https://don.test/report/b".into(),
            detail_html(None, "No date here."),
        );

        let (table, summary) = Pipeline::new(&site, &config).run().await.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(summary.detail_failures, 1);
        assert_eq!(summary.normalize.missing, 1);
        assert_eq!(summary.stats.by_year().get(&2019), Some(&1));
        assert_eq!(summary.stats.undated, 1);

        let ok = table.get(0).unwrap();
        assert_eq!(ok.date, NaiveDate::from_ymd_opt(2019, 1, 5));

        let failed = table.get(1).unwrap();
        assert_eq!(failed.outbreak.as_deref(), Some("Report b"));
        assert_eq!(failed.date, None);
        assert_eq!((failed.year, failed.month, failed.day), (None, None, None));
        assert_eq!(failed.stage, RecordStage::Listed);
        assert!(failed.error.as_deref().unwrap().contains("published"));
    }

    #[tokio::test]
    async fn test_abort_policy_stops_on_detail_failure() {
        let config = Config {
            on_error: FailurePolicy::Abort,
            ..config(Some(1))
        };
        let mut site = site(&config, &[&["a", "b", "c"]]);
        site.pages.remove("https://don.test/report/b");

        let err = Pipeline::new(&site, &config).run().await.unwrap_err();

        assert!(matches!(err, ScrapeError::Status { .. }));
        assert_eq!(site.hits("https://don.test/report/c"), 0);
    }

    #[tokio::test]
    async fn test_abort_policy_fails_on_bad_date() {
        let config = Config {
            on_error: FailurePolicy::Abort,
            ..config(Some(1))
        };
        let mut site = site(&config, &[&["a"]]);
        site.pages.insert(
            "https://don.test/report/a".into(),
            detail_html(Some("2019-01-05"), "ISO date, wrong format."),
        );

        let err = Pipeline::new(&site, &config).run().await.unwrap_err();
        assert!(matches!(err, ScrapeError::DateParse { row: 0, .. }));
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let config = config(Some(2));
        let site = site(&config, &[&["a"]]);

        let err = Pipeline::new(&site, &config).run().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Status { .. }));
    }

    #[tokio::test]
    async fn test_resume_skips_known_links() {
        let config = config(Some(1));
        let site = site(&config, &[&["a", "b"]]);
        let previous = vec![OutbreakRecord {
            link: Some("https://don.test/report/a".into()),
            raw_date: Some("31 Dec 2018".into()),
            description: Some("Cached.".into()),
            ..OutbreakRecord::default()
        }];

        let (table, summary) = Pipeline::new(&site, &config)
            .with_resume(&previous)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.reused, 1);
        assert_eq!(site.hits("https://don.test/report/a"), 0);
        assert_eq!(site.hits("https://don.test/report/b"), 1);
        assert_eq!(table.get(0).unwrap().description.as_deref(), Some("Cached."));
        assert_eq!(table.get(0).unwrap().year, Some(2018));
    }

    mod end_to_end {
        use super::*;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_single_report_scenario() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/updates"))
                .and(query_param("page", "0"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    r#"<html><body>
                         <article><header><h3><a href="/don-1">Cholera – Country X</a></h3></header></article>
                       </body></html>"#,
                ))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/don-1"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    r#"<html><body>
                         <dl><dd class="rw-entity-meta__tag-value--published">12 Mar 2019</dd></dl>
                         <div class="rw-report__content">Summary text.</div>
                       </body></html>"#,
                ))
                .expect(1)
                .mount(&server)
                .await;

            let config = Config {
                base_url: server.uri(),
                pages: Some(1),
                retries: 0,
                ..Config::default()
            };
            let fetcher = crate::http::fetcher_from_config(&config).unwrap();

            let (table, summary) = Pipeline::new(&fetcher, &config).run().await.unwrap();

            assert_eq!(table.len(), 1);
            assert_eq!(summary.pages, vec![PageSpan { page: 0, offset: 0, count: 1 }]);
            let r = table.get(0).unwrap();
            assert_eq!(r.outbreak.as_deref(), Some("Cholera – Country X"));
            assert_eq!(r.link.as_deref(), Some(format!("{}/don-1", server.uri()).as_str()));
            assert_eq!(r.date, NaiveDate::from_ymd_opt(2019, 3, 12));
            assert_eq!((r.year, r.month, r.day), (Some(2019), Some(3), Some(12)));
            assert_eq!(r.description.as_deref(), Some("Summary text."));
            assert_eq!(r.error, None);
        }
    }
}
