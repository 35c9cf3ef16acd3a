pub mod error;
pub mod handlers;

use crate::analysis::Analyzer;
use crate::config::AppConfig;
use crate::crawlers::{HttpFetcher, Renderer, SiteCrawler};
use crate::debug_store::DebugStore;
use crate::llm::{ChatCompletionClient, Dispatcher};
use crate::status::InMemoryStatusStore;
use crate::translate::GoogleTranslator;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Analyzer,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }
}

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/analyze", post(handlers::analyze_content))
        .route("/api/analyze-url", post(handlers::analyze_url))
        .route("/api/status/:task_id", get(handlers::task_status))
        .route("/api/agent-types", get(handlers::agent_types))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
}

/// Wire the production collaborators described by `config`
pub fn build_analyzer(config: &AppConfig) -> Result<Analyzer, Box<dyn std::error::Error>> {
    let renderer = Renderer::single_slot(config.crawler.render.clone());
    let fetcher = HttpFetcher::new(config.crawler.clone(), renderer)?;
    let crawler = SiteCrawler::new(Arc::new(fetcher), config.crawler.clone());

    let debug_store = DebugStore::new(config.debug_store.clone());
    let backend = ChatCompletionClient::new(&config.llm)?;
    let dispatcher = Dispatcher::new(
        Arc::new(backend),
        config.llm.request_timeout(),
        config.llm.max_concurrent_prompts,
    )
    .with_debug_store(debug_store.clone());

    let mut analyzer = Analyzer::new(
        crawler,
        dispatcher,
        Arc::new(InMemoryStatusStore::new()),
        config.llm.clone(),
    )
    .with_debug_store(debug_store);

    if config.translate.api_key.is_some() {
        analyzer = analyzer.with_translator(Arc::new(GoogleTranslator::new(&config.translate)?));
    } else {
        ::log::warn!("GOOGLE_TRANSLATE_API_KEY not set, Japanese output is unavailable");
    }
    Ok(analyzer)
}

/// Bind the listener and serve until the process is stopped
pub async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = build_analyzer(&config)?;
    let app = create_routes(AppState::new(analyzer));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    ::log::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
