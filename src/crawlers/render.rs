use crate::config::RenderConfig;
use crate::error::FetchError;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use url::Url;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);
const READY_POLLS: usize = 20;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Headless browser fallback over WebDriver.
///
/// Every render opens its own session and closes it before returning, whatever
/// the outcome. Renders queue on `slot`; share one slot across the process so
/// at most one browser is alive at a time.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    slot: Arc<Semaphore>,
}

impl Renderer {
    pub fn new(config: RenderConfig, slot: Arc<Semaphore>) -> Self {
        Self { config, slot }
    }

    /// Renderer with a private single-permit slot
    pub fn single_slot(config: RenderConfig) -> Self {
        Self::new(config, Arc::new(Semaphore::new(1)))
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Load `url` in a fresh browser session and return the rendered HTML
    pub async fn render(&self, url: &Url) -> Result<String, FetchError> {
        if !self.config.enabled {
            return Err(FetchError::Disabled);
        }

        let _permit = self
            .slot
            .acquire()
            .await
            .map_err(|_| FetchError::Disabled)?;
        ::log::debug!("Acquired render slot for: {}", url);

        let limit = Duration::from_secs(self.config.timeout_secs);
        let started = Instant::now();

        let client = match timeout(limit, self.connect()).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.config.webdriver_url,
                    e
                );
                return Err(e.into());
            }
            Err(_) => return Err(FetchError::Timeout(self.config.timeout_secs)),
        };

        let remaining = limit.saturating_sub(started.elapsed());
        let outcome = timeout(remaining, self.capture(&client, url)).await;

        match timeout(CLOSE_TIMEOUT, client.close()).await {
            Ok(Ok(())) => ::log::debug!("Closed WebDriver session for: {}", url),
            Ok(Err(e)) => ::log::warn!("Failed to close WebDriver session: {}", e),
            Err(_) => ::log::warn!("Timed out closing WebDriver session for: {}", url),
        }

        match outcome {
            Ok(result) => result,
            Err(_) => {
                ::log::error!("Timeout rendering: {}", url);
                Err(FetchError::Timeout(self.config.timeout_secs))
            }
        }
    }

    async fn connect(&self) -> Result<Client, fantoccini::error::NewSessionError> {
        let mut capabilities = serde_json::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-setuid-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-gpu",
                ]
            }),
        );
        capabilities.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities);
        builder.connect(&self.config.webdriver_url).await
    }

    async fn capture(&self, client: &Client, url: &Url) -> Result<String, FetchError> {
        client
            .set_window_size(self.config.viewport_width, self.config.viewport_height)
            .await?;
        client.goto(url.as_str()).await?;

        for _ in 0..READY_POLLS {
            let state = client
                .execute("return document.readyState", Vec::new())
                .await?;
            if state.as_str() == Some("complete") {
                break;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        // Let late XHR-driven content land before reading the DOM.
        tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;

        let html = client.source().await?;
        ::log::info!("Rendered {} ({} bytes)", url, html.len());
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_renderer_never_connects() {
        let renderer = Renderer::single_slot(RenderConfig {
            enabled: false,
            ..RenderConfig::default()
        });
        let url = Url::parse("https://example.com/").unwrap();
        assert!(matches!(
            renderer.render(&url).await,
            Err(FetchError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_webdriver_fails_and_releases_slot() {
        let slot = Arc::new(Semaphore::new(1));
        let renderer = Renderer::new(
            RenderConfig {
                webdriver_url: "http://127.0.0.1:9".to_string(),
                timeout_secs: 5,
                ..RenderConfig::default()
            },
            Arc::clone(&slot),
        );
        let url = Url::parse("https://example.com/").unwrap();
        assert!(renderer.render(&url).await.is_err());
        assert_eq!(slot.available_permits(), 1);
    }
}
