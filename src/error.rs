use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    Filter(#[from] regex::Error),

    #[error("No content scraped from {0}")]
    NoContent(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver session error: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("WebDriver command error: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("Render timed out after {0} seconds")]
    Timeout(u64),

    #[error("Rendering is disabled")]
    Disabled,
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("empty completion")]
    Empty,

    #[error("missing field {0} in backend response")]
    MissingField(&'static str),

    #[error("backend response is not JSON: {0}")]
    InvalidResponse(String),

    #[error("no models configured for prompt {0}")]
    NoModels(String),

    #[error("all models failed for prompt {prompt}: {}", format_attempts(.attempts))]
    AllModelsFailed {
        prompt: String,
        attempts: Vec<(String, String)>,
    },

    #[error("worker for prompt {0} panicked")]
    Join(String),
}

fn format_attempts(attempts: &[(String, String)]) -> String {
    attempts
        .iter()
        .map(|(model, reason)| format!("{model}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum ResponseParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("model output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model output is JSON but not an object")]
    NotAnObject,
}

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("missing field {0} in translation response")]
    MissingField(&'static str),

    #[error("translation is not configured")]
    NotConfigured,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("could not parse {prompt} response: {source}")]
    Parse {
        prompt: String,
        #[source]
        source: ResponseParseError,
    },

    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
