//! Asynchronous site analysis: crawl, prompt fan-out, parse, merge, translate.
//!
//! Every submitted task reports its progress through a [`StatusStore`] under
//! a fixed schedule:
//!
//! | step                 | progress |
//! |----------------------|----------|
//! | `queued`             | 0        |
//! | `crawling`           | 5, then 10..=40 as pages are accepted |
//! | `ready_for_analysis` | 40       |
//! | `analyzing`          | 50       |
//! | `translating`        | 85       |
//! | `done`               | 100      |
//!
//! A failure moves the task to `error` at the last progress it reached.

use crate::config::LlmConfig;
use crate::crawlers::{CrawlProgress, SiteCrawler};
use crate::debug_store::{Area, DebugStore};
use crate::error::{AnalysisError, TranslateError};
use crate::llm::prompts::{self, ANSWER_PREFIX, AgentType};
use crate::llm::{Dispatcher, PromptJob, response};
use crate::results::combine_pages;
use crate::status::{StatusStore, TaskStatus, TaskStep};
use crate::translate::{Translator, translate_value};
use crate::utils::{sanitize_filename, site_domain};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

const CRAWL_PROGRESS_START: u8 = 10;
const READY_PROGRESS: u8 = 40;
const ANALYZING_PROGRESS: u8 = 50;
const TRANSLATING_PROGRESS: u8 = 85;

/// Output language of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    pub const CHOICES: [&'static str; 2] = ["en", "ja"];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ja => "ja",
        }
    }
}

impl FromStr for Language {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ja" => Ok(Language::Ja),
            other => Err(AnalysisError::InvalidRequest(format!(
                "unsupported language '{}', expected one of: {}",
                other,
                Language::CHOICES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which family of prompts runs over the crawled text
#[derive(Debug, Clone, Copy)]
pub enum AnalysisMode {
    Business,
    University(&'static AgentType),
}

/// One site analysis to run in the background
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub url: String,
    pub max_pages: usize,
    pub language: Language,
    pub mode: AnalysisMode,
}

/// Orchestrates crawl and analysis tasks
#[derive(Clone)]
pub struct Analyzer {
    crawler: Arc<SiteCrawler>,
    dispatcher: Dispatcher,
    status: Arc<dyn StatusStore>,
    translator: Option<Arc<dyn Translator>>,
    debug_store: Option<DebugStore>,
    llm: LlmConfig,
}

impl Analyzer {
    pub fn new(
        crawler: SiteCrawler,
        dispatcher: Dispatcher,
        status: Arc<dyn StatusStore>,
        llm: LlmConfig,
    ) -> Self {
        Self {
            crawler: Arc::new(crawler),
            dispatcher,
            status,
            translator: None,
            debug_store: None,
            llm,
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_debug_store(mut self, store: DebugStore) -> Self {
        self.debug_store = Some(store);
        self
    }

    pub fn status_store(&self) -> &Arc<dyn StatusStore> {
        &self.status
    }

    /// Queue a task and return its id immediately.
    ///
    /// The task runs on its own tokio task until it reaches `done` or `error`.
    /// There is no way to stop it once submitted.
    pub fn submit(&self, request: AnalysisRequest) -> String {
        let task_id = Uuid::new_v4().to_string();
        self.status.set(&task_id, TaskStatus::queued(&task_id));
        ::log::info!(
            "Accepted task {} for {} (max_pages={}, language={})",
            task_id,
            request.url,
            request.max_pages,
            request.language
        );

        let analyzer = self.clone();
        let id = task_id.clone();
        tokio::spawn(async move {
            analyzer.run(&id, request).await;
        });
        task_id
    }

    /// Drive one task to a terminal status
    pub async fn run(&self, task_id: &str, request: AnalysisRequest) {
        match self.execute(task_id, &request).await {
            Ok(result) => {
                ::log::info!("Task {} completed for {}", task_id, request.url);
                self.status.set(task_id, TaskStatus::done(task_id, result));
            }
            Err(e) => {
                ::log::error!("Task {} failed for {}: {}", task_id, request.url, e);
                let progress = self.status.get(task_id).map(|s| s.progress).unwrap_or(0);
                self.status
                    .set(task_id, TaskStatus::failed(task_id, progress, e.to_string()));
            }
        }
    }

    async fn execute(&self, task_id: &str, request: &AnalysisRequest) -> Result<Value, AnalysisError> {
        self.report(
            Some(task_id),
            TaskStep::Crawling,
            5,
            format!("Crawling {}", request.url),
        );

        let status = Arc::clone(&self.status);
        let pages = self
            .crawler
            .crawl(&request.url, request.max_pages, |progress: &CrawlProgress| {
                let message = format!(
                    "Scraped {} ({}/{})",
                    progress.url, progress.visited, progress.max_pages
                );
                let percent = progress.scaled(CRAWL_PROGRESS_START, READY_PROGRESS);
                status.set(
                    task_id,
                    TaskStatus::new(task_id, TaskStep::Crawling, percent, message),
                );
            })
            .await?;

        self.report(
            Some(task_id),
            TaskStep::ReadyForAnalysis,
            READY_PROGRESS,
            format!("Scraped {} pages", pages.len()),
        );

        if let Some(store) = &self.debug_store {
            let name = format!("{}-{}_pages", sanitize_filename(&request.url), request.max_pages);
            store.save_quietly(&pages, &name, Area::Data).await;
        }

        let content = combine_pages(&pages);
        let domain = site_domain(&request.url);
        self.analyze(Some(task_id), &content, &domain, request.mode, request.language)
            .await
    }

    /// Analyze already-collected text in the business mode, without a task
    pub async fn analyze_content(&self, content: &str, language: Language) -> Result<Value, AnalysisError> {
        if content.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest("content is empty".to_string()));
        }
        self.analyze(None, content, "", AnalysisMode::Business, language).await
    }

    async fn analyze(
        &self,
        task_id: Option<&str>,
        content: &str,
        domain: &str,
        mode: AnalysisMode,
        language: Language,
    ) -> Result<Value, AnalysisError> {
        self.report(task_id, TaskStep::Analyzing, ANALYZING_PROGRESS, "Running analysis prompts");

        let domain = Some(domain).filter(|d| !d.is_empty());
        let jobs = self.build_jobs(mode, content, domain);
        let names: Vec<String> = jobs.iter().map(|job| job.name.clone()).collect();
        let outputs = self.dispatcher.dispatch(jobs).await;

        let mut parsed = Vec::with_capacity(outputs.len());
        for (name, output) in names.into_iter().zip(outputs) {
            let text = output?;
            let value = response::parse(&text, Some(ANSWER_PREFIX)).map_err(|source| {
                AnalysisError::Parse {
                    prompt: name.clone(),
                    source,
                }
            })?;
            if let Some(store) = &self.debug_store {
                let document = json!({"prompt_name": name, "parsed_result": value});
                store
                    .save_quietly(&document, &format!("parsed_result_{name}"), Area::Debug)
                    .await;
            }
            parsed.push(value);
        }

        let merged = merge_results(mode, parsed);
        if language == Language::En {
            return Ok(merged);
        }

        self.report(
            task_id,
            TaskStep::Translating,
            TRANSLATING_PROGRESS,
            format!("Translating results to {language}"),
        );
        let translator = self
            .translator
            .as_deref()
            .ok_or(TranslateError::NotConfigured)?;
        Ok(translate_value(translator, merged, language.code()).await?)
    }

    /// Prompt jobs for `mode`, each carrying its configured model order
    pub fn build_jobs(&self, mode: AnalysisMode, content: &str, domain: Option<&str>) -> Vec<PromptJob> {
        let job = |name: &str, template: &str, domain: Option<&str>| {
            PromptJob::new(
                name,
                prompts::render(template, content, domain),
                self.llm.models_for(name),
            )
        };

        match mode {
            // Business prompts keep the domain placeholder for the client to fill.
            AnalysisMode::Business => vec![
                job("profile", prompts::BUSINESS_PROFILE_PROMPT, None),
                job("engagement", prompts::BUSINESS_ENGAGEMENT_PROMPT, None),
            ],
            AnalysisMode::University(agent) => vec![
                job("general", prompts::UNIVERSITY_GENERAL_PROMPT, domain),
                job(agent.key, agent.template, domain),
            ],
        }
    }

    fn report(&self, task_id: Option<&str>, step: TaskStep, progress: u8, message: impl Into<String>) {
        if let Some(id) = task_id {
            self.status.set(id, TaskStatus::new(id, step, progress, message));
        }
    }
}

/// Combine per-prompt objects into the final result.
///
/// Business results are the union of all objects, later keys winning.
pub fn merge_results(mode: AnalysisMode, parsed: Vec<Value>) -> Value {
    match mode {
        AnalysisMode::Business => {
            let mut merged = Map::new();
            for value in parsed {
                if let Value::Object(map) = value {
                    merged.extend(map);
                }
            }
            Value::Object(merged)
        }
        AnalysisMode::University(agent) => {
            let mut parts = parsed.into_iter();
            let general = parts.next().unwrap_or_else(|| json!({}));
            let specialized = parts.next().unwrap_or_else(|| json!({}));
            json!({
                "general": general,
                "specialized": {
                    "agentType": agent.key,
                    "displayName": agent.display_name,
                    "data": specialized,
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::crawlers::Fetcher;
    use crate::error::CompletionError;
    use crate::llm::CompletionBackend;
    use crate::status::InMemoryStatusStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    /// Serves canned HTML by URL and records every fetch
    struct SiteFetcher {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl SiteFetcher {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages.iter().map(|(u, h)| (u.to_string(), h.clone())).collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Fetcher for SiteFetcher {
        async fn fetch(&self, url: &Url) -> Option<String> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages.get(url.as_str()).cloned()
        }
    }

    /// Answers by prompt family; `None` fails every model
    struct FamilyBackend {
        fail: bool,
    }

    #[async_trait]
    impl CompletionBackend for FamilyBackend {
        async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError> {
            if self.fail {
                return Err(CompletionError::Status {
                    status: 502,
                    body: format!("{model} is down"),
                });
            }
            let answer = if prompt.contains("WebsiteProfile") {
                r#"{"businessOverview": "Widgets.", "brandVoice": "plain"}"#
            } else if prompt.contains("WebsiteEngagement") {
                r#"{"greetings": ["Welcome to ${domain}!"], "bestSalesLines": []}"#
            } else if prompt.contains("UniversityGeneralKnowledge") {
                r#"{"institutionOverview": "A college."}"#
            } else {
                r#"{"typesOfAidAvailable": ["grants"]}"#
            };
            Ok(format!("Reasoning first.\nAnswer: {answer}"))
        }
    }

    /// Keeps every status ever written, in order
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryStatusStore,
        history: Mutex<Vec<(TaskStep, u8)>>,
    }

    impl StatusStore for RecordingStore {
        fn set(&self, task_id: &str, status: TaskStatus) {
            self.history.lock().unwrap().push((status.step, status.progress));
            self.inner.set(task_id, status);
        }

        fn get(&self, task_id: &str) -> Option<TaskStatus> {
            self.inner.get(task_id)
        }
    }

    fn page(title: &str, body: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">link</a>"#))
            .collect();
        format!("<html><head><title>{title}</title></head><body><h1>{title}</h1><p>{body}</p><p>more</p>{anchors}</body></html>")
    }

    fn analyzer(
        fetcher: Arc<SiteFetcher>,
        fail: bool,
        max_content_chars: usize,
        status: Arc<dyn StatusStore>,
    ) -> Analyzer {
        let crawler = SiteCrawler::new(
            fetcher,
            CrawlerConfig {
                max_content_chars,
                ..CrawlerConfig::default()
            },
        );
        let llm = LlmConfig {
            default_models: vec!["model-a".to_string(), "model-b".to_string()],
            ..LlmConfig::default()
        };
        let dispatcher = Dispatcher::new(Arc::new(FamilyBackend { fail }), Duration::from_secs(5), 2);
        Analyzer::new(crawler, dispatcher, status, llm)
    }

    fn request(url: &str, max_pages: usize) -> AnalysisRequest {
        AnalysisRequest {
            url: url.to_string(),
            max_pages,
            language: Language::En,
            mode: AnalysisMode::Business,
        }
    }

    async fn wait_for_terminal(store: &dyn StatusStore, task_id: &str) -> TaskStatus {
        for _ in 0..200 {
            if let Some(status) = store.get(task_id) {
                if status.step.is_terminal() {
                    return status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {task_id} never finished");
    }

    #[test]
    fn test_language_parsing_lists_choices() {
        assert_eq!("JA".parse::<Language>().unwrap(), Language::Ja);
        let err = "fr".parse::<Language>().unwrap_err().to_string();
        assert!(err.contains("en, ja"), "{err}");
    }

    #[tokio::test]
    async fn test_single_page_task_reaches_ready_for_analysis_at_40() {
        let fetcher = Arc::new(SiteFetcher::new(&[(
            "https://example.com/",
            page("Home", "We sell widgets.", &["/about"]),
        )]));
        let store = Arc::new(RecordingStore::default());
        let analyzer = analyzer(fetcher, false, 110_000, store.clone());

        let task_id = analyzer.submit(request("https://example.com/", 1));
        let status = wait_for_terminal(store.as_ref(), &task_id).await;

        assert_eq!(status.step, TaskStep::Done);
        assert_eq!(status.progress, 100);
        let result = status.result.unwrap();
        assert_eq!(result["businessOverview"], "Widgets.");
        assert_eq!(result["greetings"][0], "Welcome to ${domain}!");

        let history = store.history.lock().unwrap().clone();
        assert_eq!(
            history,
            vec![
                (TaskStep::Queued, 0),
                (TaskStep::Crawling, 5),
                (TaskStep::Crawling, 40),
                (TaskStep::ReadyForAnalysis, 40),
                (TaskStep::Analyzing, 50),
                (TaskStep::Done, 100),
            ]
        );
    }

    #[tokio::test]
    async fn test_overflowing_second_page_stops_crawl() {
        let fetcher = Arc::new(SiteFetcher::new(&[
            ("https://example.com/", page("Home", &"a".repeat(100), &["/two", "/three"])),
            ("https://example.com/two", page("Two", &"b".repeat(150), &[])),
            ("https://example.com/three", page("Three", "c", &[])),
        ]));
        let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        let analyzer = analyzer(fetcher.clone(), false, 200, store.clone());

        let task_id = analyzer.submit(request("https://example.com/", 3));
        let status = wait_for_terminal(store.as_ref(), &task_id).await;

        assert_eq!(status.step, TaskStep::Done);
        assert_eq!(
            *fetcher.fetched.lock().unwrap(),
            vec!["https://example.com/", "https://example.com/two"]
        );
    }

    #[tokio::test]
    async fn test_both_models_failing_fails_task() {
        let fetcher = Arc::new(SiteFetcher::new(&[(
            "https://example.com/",
            page("Home", "We sell widgets.", &[]),
        )]));
        let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        let analyzer = analyzer(fetcher, true, 110_000, store.clone());

        let task_id = analyzer.submit(request("https://example.com/", 1));
        let status = wait_for_terminal(store.as_ref(), &task_id).await;

        assert_eq!(status.step, TaskStep::Error);
        assert_eq!(status.progress, ANALYZING_PROGRESS);
        assert!(status.result.is_none());
        let error = status.error.unwrap();
        assert!(error.contains("model-a: backend returned 502"), "{error}");
        assert!(error.contains("model-b: backend returned 502"), "{error}");
    }

    #[tokio::test]
    async fn test_site_without_content_fails_during_crawl() {
        let fetcher = Arc::new(SiteFetcher::new(&[]));
        let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        let analyzer = analyzer(fetcher, false, 110_000, store.clone());

        let task_id = analyzer.submit(request("https://example.com/", 2));
        let status = wait_for_terminal(store.as_ref(), &task_id).await;

        assert_eq!(status.step, TaskStep::Error);
        assert_eq!(status.progress, 5);
        assert!(status.error.unwrap().contains("No content scraped"));
    }

    #[tokio::test]
    async fn test_submitted_tasks_cannot_be_canceled() {
        let fetcher = Arc::new(SiteFetcher::new(&[(
            "https://example.com/",
            page("Home", "We sell widgets.", &[]),
        )]));
        let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        let analyzer = analyzer(fetcher, false, 110_000, store.clone());

        let task_id = analyzer.submit(request("https://example.com/", 1));
        drop(analyzer);

        let status = wait_for_terminal(store.as_ref(), &task_id).await;
        assert_eq!(status.step, TaskStep::Done);
    }

    #[tokio::test]
    async fn test_university_mode_nests_specialized_result() {
        let fetcher = Arc::new(SiteFetcher::new(&[]));
        let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        let analyzer = analyzer(fetcher, false, 110_000, store);
        let agent = prompts::resolve_agent("financial aid").unwrap();

        let jobs = analyzer.build_jobs(AnalysisMode::University(agent), "H1: Hi", Some("uni.edu"));
        assert_eq!(jobs[0].name, "general");
        assert_eq!(jobs[1].name, "financial_aid_ai");
        assert!(jobs[0].prompt.contains("uni.edu"));

        let merged = merge_results(
            AnalysisMode::University(agent),
            vec![json!({"a": 1}), json!({"b": 2})],
        );
        assert_eq!(
            merged,
            json!({
                "general": {"a": 1},
                "specialized": {"agentType": "financial_aid_ai", "displayName": "Financial Aid AI", "data": {"b": 2}}
            })
        );
    }

    #[tokio::test]
    async fn test_japanese_without_translator_is_an_error() {
        let fetcher = Arc::new(SiteFetcher::new(&[]));
        let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        let analyzer = analyzer(fetcher, false, 110_000, store);

        let err = analyzer
            .analyze_content("H1: Widgets", Language::Ja)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Translate(TranslateError::NotConfigured)));
    }
}
