use crate::config::CrawlerConfig;
use crate::crawlers::render::Renderer;
use crate::error::FetchError;
use crate::parsers::html;
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use url::Url;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Source of raw HTML for the crawler.
///
/// `None` means no usable content was obtained; the crawler skips the URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Option<String>;
}

/// Plain HTTP fetch with a headless-render fallback
pub struct HttpFetcher {
    client: reqwest::Client,
    config: CrawlerConfig,
    renderer: Renderer,
}

impl HttpFetcher {
    pub fn new(config: CrawlerConfig, renderer: Renderer) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            config,
            renderer,
        })
    }

    /// Issue the plain GET; non-2xx statuses are errors
    pub async fn get(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .headers(random_headers())
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        ::log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }

    async fn pause(&self) {
        let (min, max) = (self.config.min_delay_ms, self.config.max_delay_ms);
        if max == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(min.min(max)..=max);
        ::log::debug!("Waiting {} ms before request", delay);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Option<String> {
        self.pause().await;

        let plain = match self.get(url).await {
            Ok(body) => {
                if html::is_content_sufficient(&body, &self.config.sufficiency) {
                    return Some(body);
                }
                ::log::info!("Content seems insufficient, trying renderer for {}", url);
                Some(body)
            }
            Err(e) => {
                ::log::warn!("Plain fetch failed for {}: {}", url, e);
                None
            }
        };

        if !self.renderer.is_enabled() {
            return plain;
        }

        match self.renderer.render(url).await {
            Ok(rendered) => {
                ::log::info!("Successfully fetched content with renderer for {}", url);
                Some(rendered)
            }
            Err(e) => {
                ::log::warn!("Render fallback failed for {}: {}", url, e);
                plain
            }
        }
    }
}

/// Browser-like headers with a rotating User-Agent
pub fn random_headers() -> HeaderMap {
    let agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(agent));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}
