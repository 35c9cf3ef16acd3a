use crate::analysis::{AnalysisMode, AnalysisRequest, Language};
use crate::llm::prompts::{self, AGENT_TYPES};
use crate::results::{PageRecord, combine_pages};
use crate::server::AppState;
use crate::server::error::{ApiError, Result};
use crate::status::TaskStatus;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

pub const MAX_PAGES_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlRequest {
    pub url: Option<String>,
    /// Number or numeric string
    pub max_pages: Option<Value>,
    pub language: Option<String>,
    pub agent_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub task_id: String,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeContentRequest {
    /// Combined page text, or a list of page records
    pub content: Option<Value>,
    pub language: Option<String>,
}

pub async fn health() -> Json<Value> {
    ::log::debug!("Health check request received");
    Json(json!({"status": "healthy"}))
}

pub async fn analyze_url(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalyzeUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptedResponse>)> {
    let Json(body) = payload?;
    ::log::info!("Received request to /api/analyze-url");

    let request = AnalysisRequest {
        url: validate_url(body.url.as_deref())?,
        max_pages: parse_max_pages(body.max_pages.as_ref())?,
        language: parse_language(body.language.as_deref())?,
        mode: parse_mode(body.agent_type.as_deref())?,
    };

    let task_id = state.analyzer.submit(request);
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            task_id,
            status: "accepted",
        }),
    ))
}

pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatus>> {
    state
        .analyzer
        .status_store()
        .get(&task_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Task {task_id} not found")))
}

pub async fn analyze_content(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalyzeContentRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = payload?;
    ::log::info!("Received request to /api/analyze");

    let content = match body.content {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(pages @ Value::Array(_)) => {
            let pages: Vec<PageRecord> = serde_json::from_value(pages)
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid page list: {e}")))?;
            combine_pages(&pages)
        }
        _ => return Err(ApiError::InvalidRequest("No content provided".to_string())),
    };
    let language = parse_language(body.language.as_deref())?;

    ::log::debug!("Processing content of length: {}", content.len());
    let result = state.analyzer.analyze_content(&content, language).await?;
    Ok(Json(result))
}

pub async fn agent_types() -> Json<Value> {
    let agents: Vec<Value> = AGENT_TYPES
        .iter()
        .map(|agent| {
            json!({
                "key": agent.key,
                "displayName": agent.display_name,
                "aliases": agent.aliases,
            })
        })
        .collect();
    Json(json!({"agentTypes": agents}))
}

fn validate_url(url: Option<&str>) -> Result<String> {
    let raw = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("No URL provided".to_string()))?;

    let parsed = Url::parse(raw)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ApiError::InvalidRequest(format!(
            "Invalid URL '{raw}': expected an http(s) URL with a host"
        )));
    }
    Ok(raw.to_string())
}

fn parse_max_pages(value: Option<&Value>) -> Result<usize> {
    let pages = match value {
        None | Some(Value::Null) => Some(1),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| ApiError::InvalidRequest("max_pages must be a valid integer".to_string()))?;

    if pages < 1 {
        return Err(ApiError::InvalidRequest("max_pages must be at least 1".to_string()));
    }
    if pages > MAX_PAGES_LIMIT {
        return Err(ApiError::InvalidRequest(format!(
            "max_pages cannot exceed {MAX_PAGES_LIMIT}"
        )));
    }
    Ok(pages as usize)
}

fn parse_language(language: Option<&str>) -> Result<Language> {
    match language.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(Language::default()),
        Some(code) => Ok(code.parse::<Language>()?),
    }
}

fn parse_mode(agent_type: Option<&str>) -> Result<AnalysisMode> {
    match agent_type.map(str::trim).filter(|a| !a.is_empty()) {
        None => Ok(AnalysisMode::Business),
        Some(label) => prompts::resolve_agent(label)
            .map(AnalysisMode::University)
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "unknown agent_type '{}', expected one of: {}",
                    label,
                    prompts::agent_keys().join(", ")
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_pages_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_max_pages(None).unwrap(), 1);
        assert_eq!(parse_max_pages(Some(&json!(3))).unwrap(), 3);
        assert_eq!(parse_max_pages(Some(&json!(" 10 "))).unwrap(), 10);
    }

    #[test]
    fn test_max_pages_rejects_out_of_range() {
        for bad in [json!(0), json!(11), json!("many"), json!(2.5), json!([1])] {
            assert!(
                matches!(parse_max_pages(Some(&bad)), Err(ApiError::InvalidRequest(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url(Some("https://example.com")).is_ok());
        assert!(validate_url(None).is_err());
        assert!(validate_url(Some("ftp://example.com")).is_err());
        assert!(validate_url(Some("example.com")).is_err());
    }

    #[test]
    fn test_unknown_agent_lists_choices() {
        let err = parse_mode(Some("janitor")).unwrap_err().to_string();
        assert!(err.contains("recruiter_ai"), "{err}");
        assert!(matches!(parse_mode(Some("Recruiter")), Ok(AnalysisMode::University(_))));
        assert!(matches!(parse_mode(Some("")), Ok(AnalysisMode::Business)));
    }
}
