use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub translate: TranslateConfig,

    #[serde(default)]
    pub debug_store: DebugStoreConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Configuration for the site crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Ceiling on `content + description` characters across accepted pages
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Connect/read timeout for the plain HTTP fetch
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Lower bound of the random delay before each request
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the random delay before each request
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Regex patterns for URLs that are never queued
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Substrings that move a link to the front of the frontier
    #[serde(default = "default_priority_keywords")]
    pub priority_keywords: Vec<String>,

    #[serde(default)]
    pub sufficiency: SufficiencyConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

/// Heuristics deciding whether a page needs a real browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SufficiencyConfig {
    #[serde(default = "default_min_content_elements")]
    pub min_content_elements: usize,

    /// Ids of client-side mount points that signal an unrendered app when empty
    #[serde(default = "default_js_root_ids")]
    pub js_root_ids: Vec<String>,
}

/// Headless render fallback through a WebDriver server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Upper bound for one whole render, session setup and teardown included
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Quiet period after load before the source is captured
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Completion backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Bound on a single completion call
    #[serde(default = "default_llm_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_concurrent_prompts")]
    pub max_concurrent_prompts: usize,

    /// Fallback order used when a prompt has no entry in `models`
    #[serde(default = "default_models")]
    pub default_models: Vec<String>,

    /// Ordered model preferences per prompt name
    #[serde(default)]
    pub models: BTreeMap<String, Vec<String>>,
}

/// Translation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    #[serde(default = "default_translate_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Largest text sent in one request
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
}

/// Rotating on-disk area for scraped data and model transcripts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugStoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_data_max_bytes")]
    pub data_max_bytes: u64,

    #[serde(default = "default_data_max_files")]
    pub data_max_files: usize,

    #[serde(default = "default_debug_max_bytes")]
    pub debug_max_bytes: u64,

    #[serde(default = "default_debug_max_files")]
    pub debug_max_files: usize,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup; empty values are ignored
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get("WEBDRIVER_URL") {
            self.crawler.render.webdriver_url = url;
        }
        if let Some(key) = get("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("LLM_API_URL") {
            self.llm.api_url = url;
        }
        if let Some(key) = get("GOOGLE_TRANSLATE_API_KEY") {
            self.translate.api_key = Some(key);
        }
        if let Some(dir) = get("SITE_PROFILER_DATA_DIR") {
            self.debug_store.data_dir = PathBuf::from(dir);
        }
        self
    }
}

impl LlmConfig {
    /// Ordered candidate models for a prompt
    pub fn models_for(&self, prompt: &str) -> Vec<String> {
        self.models
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| self.default_models.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_content_chars: default_max_content_chars(),
            request_timeout_secs: default_request_timeout_secs(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            exclude_patterns: default_exclude_patterns(),
            priority_keywords: default_priority_keywords(),
            sufficiency: SufficiencyConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for SufficiencyConfig {
    fn default() -> Self {
        Self {
            min_content_elements: default_min_content_elements(),
            js_root_ids: default_js_root_ids(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webdriver_url: default_webdriver_url(),
            timeout_secs: default_render_timeout_secs(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_llm_api_url(),
            api_key: None,
            request_timeout_secs: default_llm_timeout_secs(),
            max_concurrent_prompts: default_max_concurrent_prompts(),
            default_models: default_models(),
            models: BTreeMap::new(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            api_url: default_translate_api_url(),
            api_key: None,
            chunk_chars: default_chunk_chars(),
        }
    }
}

impl Default for DebugStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            data_max_bytes: default_data_max_bytes(),
            data_max_files: default_data_max_files(),
            debug_max_bytes: default_debug_max_bytes(),
            debug_max_files: default_debug_max_files(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_content_chars() -> usize {
    110_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    3000
}

fn default_exclude_patterns() -> Vec<String> {
    vec![r"(?i)\.(jpg|jpeg|png|gif|webp|css|js|ico|svg|woff|woff2|ttf|eot|pdf|zip|mp4|mp3)$".to_string()]
}

fn default_priority_keywords() -> Vec<String> {
    ["price", "pricing", "cost", "plans", "subscription"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_content_elements() -> usize {
    3
}

fn default_js_root_ids() -> Vec<String> {
    vec!["root".to_string(), "app".to_string(), "__next".to_string()]
}

fn default_true() -> bool {
    true
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_render_timeout_secs() -> u64 {
    60
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_settle_ms() -> u64 {
    500
}

fn default_llm_api_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    180
}

fn default_max_concurrent_prompts() -> usize {
    2
}

fn default_models() -> Vec<String> {
    vec![
        "microsoft/phi-4-reasoning-plus:free".to_string(),
        "deepseek/deepseek-chat-v3-0324:free".to_string(),
    ]
}

fn default_translate_api_url() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_chunk_chars() -> usize {
    30_000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_data_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_data_max_files() -> usize {
    5
}

fn default_debug_max_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_debug_max_files() -> usize {
    3
}
