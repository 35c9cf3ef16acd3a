use crate::config::CrawlerConfig;
use crate::crawlers::budget::{Admission, ContentBudget};
use crate::crawlers::fetcher::Fetcher;
use crate::crawlers::frontier::Frontier;
use crate::error::CrawlError;
use crate::filter::UrlFilter;
use crate::parsers::html;
use crate::results::PageRecord;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Emitted after every accepted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlProgress {
    pub url: String,
    pub visited: usize,
    pub max_pages: usize,
}

impl CrawlProgress {
    /// Map `visited / max_pages` into `[start, end]`
    pub fn scaled(&self, start: u8, end: u8) -> u8 {
        if self.max_pages == 0 || end <= start {
            return start;
        }
        let span = (end - start) as usize;
        let step = span * self.visited.min(self.max_pages) / self.max_pages;
        start + step as u8
    }
}

/// Sequential same-site crawler with a global content budget
pub struct SiteCrawler {
    fetcher: Arc<dyn Fetcher>,
    config: CrawlerConfig,
}

impl SiteCrawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: CrawlerConfig) -> Self {
        Self { fetcher, config }
    }

    /// Crawl from `start_url` until the frontier drains, `max_pages` pages are
    /// accepted, or the content budget is spent.
    ///
    /// Single-page failures are logged and skipped; only a crawl that accepts
    /// nothing is an error.
    pub async fn crawl<F>(
        &self,
        start_url: &str,
        max_pages: usize,
        mut on_progress: F,
    ) -> Result<Vec<PageRecord>, CrawlError>
    where
        F: FnMut(&CrawlProgress) + Send,
    {
        ::log::info!(
            "Starting scraping process for {} with max_pages={}",
            start_url,
            max_pages
        );

        let root_url = Url::parse(start_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{start_url}: {e}")))?;
        if root_url.host_str().is_none() || !matches!(root_url.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidUrl(start_url.to_string()));
        }

        let url_filter = UrlFilter::for_site(&root_url, &self.config)?;
        let mut frontier = Frontier::new(url_filter.normalize_url(&root_url));
        let mut visited: HashSet<String> = HashSet::new();
        let mut budget = ContentBudget::new(self.config.max_content_chars);
        let mut pages: Vec<PageRecord> = Vec::new();

        while visited.len() < max_pages {
            let Some(url) = frontier.pop() else {
                break;
            };
            if visited.contains(url.as_str()) {
                ::log::debug!("Skipping already visited URL: {}", url);
                continue;
            }

            ::log::info!("Scraping URL: {}", url);
            let Some(source) = self.fetcher.fetch(&url).await else {
                ::log::error!("No content obtained for {}", url);
                continue;
            };

            let parsed = html::parse(&source, url.as_str());
            if !parsed.record.has_content() {
                ::log::warn!("Skipping {} due to empty content", url);
                continue;
            }

            let record = match budget.admit(parsed.record, pages.is_empty()) {
                Admission::Accepted(record) => record,
                Admission::Trimmed(record) => {
                    ::log::warn!(
                        "First page {} exceeds the content budget, trimmed to {} chars",
                        url,
                        record.budget_len()
                    );
                    record
                }
                Admission::Exhausted { used, needed } => {
                    ::log::warn!(
                        "Content length limit reached ({} + {} > {}). Skipping remaining pages.",
                        used,
                        needed,
                        budget.ceiling()
                    );
                    break;
                }
            };

            visited.insert(url.to_string());
            pages.push(record);
            on_progress(&CrawlProgress {
                url: url.to_string(),
                visited: visited.len(),
                max_pages,
            });

            if visited.len() < max_pages {
                let queued = queue_links(&url, &parsed.links, &url_filter, &visited, &mut frontier);
                ::log::debug!("Added {} new URLs to visit", queued);
            }
        }

        ::log::info!(
            "Completed scraping {} pages, total content length: {}",
            visited.len(),
            budget.used()
        );

        if pages.is_empty() {
            return Err(CrawlError::NoContent(start_url.to_string()));
        }
        Ok(pages)
    }
}

/// Resolve, filter, and queue the links discovered on `page_url`
fn queue_links(
    page_url: &Url,
    links: &[String],
    url_filter: &UrlFilter,
    visited: &HashSet<String>,
    frontier: &mut Frontier,
) -> usize {
    let mut queued = 0;
    for link in links {
        let Ok(resolved) = page_url.join(link) else {
            continue;
        };
        if !url_filter.should_crawl(&resolved) {
            ::log::trace!("URL filter rejected: {}", resolved);
            continue;
        }

        let normalized = url_filter.normalize_url(&resolved);
        if visited.contains(normalized.as_str()) {
            continue;
        }

        let priority = url_filter.is_priority(&normalized);
        if frontier.push(normalized, priority) {
            queued += 1;
        }
    }
    queued
}
