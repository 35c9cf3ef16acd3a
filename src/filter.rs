use crate::config::CrawlerConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for URL filtering in crawlers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Host every crawled URL must share, compared after `www.` stripping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_host: Option<String>,

    /// Regex patterns for URLs to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Substrings that mark a URL as high priority
    #[serde(default)]
    pub priority_keywords: Vec<String>,
}

impl Default for UrlFilterConfig {
    fn default() -> Self {
        let crawler = CrawlerConfig::default();
        Self {
            required_host: None,
            exclude_patterns: crawler.exclude_patterns,
            priority_keywords: crawler.priority_keywords,
        }
    }
}

/// Lowercase a hostname and strip one leading `www.`
pub fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => host,
    }
}

/// URL filter restricting a crawl to one site
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    exclude_regexes: Vec<Regex>,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(UrlFilterConfig::default()).expect("Default regex patterns should be valid")
    }
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(mut config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        config.required_host = config.required_host.as_deref().map(normalize_host);
        config.priority_keywords = config
            .priority_keywords
            .iter()
            .map(|k| k.to_ascii_lowercase())
            .collect();

        Ok(Self {
            config,
            exclude_regexes,
        })
    }

    /// Filter scoped to the site of `root_url`
    pub fn for_site(root_url: &Url, crawler: &CrawlerConfig) -> Result<Self, regex::Error> {
        Self::new(UrlFilterConfig {
            required_host: root_url.host_str().map(str::to_string),
            exclude_patterns: crawler.exclude_patterns.clone(),
            priority_keywords: crawler.priority_keywords.clone(),
        })
    }

    /// Determine if a URL should be crawled based on all filtering rules
    pub fn should_crawl(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        if !self.is_same_site(url) {
            return false;
        }

        let url_str = url.as_str();
        !self.exclude_regexes.iter().any(|re| re.is_match(url_str))
    }

    /// Check if a URL belongs to the required host
    pub fn is_same_site(&self, url: &Url) -> bool {
        match (&self.config.required_host, url.host_str()) {
            (Some(required), Some(host)) => normalize_host(host) == *required,
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }

    /// Whether the URL mentions one of the priority keywords
    pub fn is_priority(&self, url: &Url) -> bool {
        let lowered = url.as_str().to_ascii_lowercase();
        self.config
            .priority_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }

    /// Create a normalized version of the URL (e.g., removing fragments)
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_filter(host: &str) -> UrlFilter {
        UrlFilter::new(UrlFilterConfig {
            required_host: Some(host.to_string()),
            ..UrlFilterConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_normalize_host_is_idempotent() {
        assert_eq!(normalize_host("www.example.com"), normalize_host("example.com"));
        assert_eq!(
            normalize_host(&normalize_host("WWW.Example.com")),
            normalize_host("www.example.com")
        );
    }

    #[test]
    fn test_www_and_bare_domain_are_same_site() {
        let filter = site_filter("www.example.com");
        assert!(filter.should_crawl(&Url::parse("https://example.com/about").unwrap()));
        assert!(filter.should_crawl(&Url::parse("https://www.example.com/about").unwrap()));

        let filter = site_filter("example.com");
        assert!(filter.should_crawl(&Url::parse("https://www.example.com/").unwrap()));
    }

    #[test]
    fn test_domain_restriction() {
        let filter = site_filter("example.com");
        assert!(!filter.should_crawl(&Url::parse("https://other.com/page").unwrap()));
        assert!(!filter.should_crawl(&Url::parse("https://blog.example.com/").unwrap()));
    }

    #[test]
    fn test_assets_and_non_http_are_excluded() {
        let filter = site_filter("example.com");
        assert!(!filter.should_crawl(&Url::parse("https://example.com/logo.PNG").unwrap()));
        assert!(!filter.should_crawl(&Url::parse("https://example.com/app.js").unwrap()));
        assert!(!filter.should_crawl(&Url::parse("mailto:hi@example.com").unwrap()));
    }

    #[test]
    fn test_priority_keywords() {
        let filter = site_filter("example.com");
        assert!(filter.is_priority(&Url::parse("https://example.com/Pricing").unwrap()));
        assert!(filter.is_priority(&Url::parse("https://example.com/plans/pro").unwrap()));
        assert!(!filter.is_priority(&Url::parse("https://example.com/about").unwrap()));
    }

    #[test]
    fn test_normalize_url_drops_fragment() {
        let filter = UrlFilter::default();
        let url = Url::parse("https://example.com/page#section").unwrap();
        assert_eq!(filter.normalize_url(&url).as_str(), "https://example.com/page");
    }
}
