use crate::config::LlmConfig;
use crate::error::CompletionError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Text-completion backend: one prompt, one model, one answer
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint (OpenRouter by default)
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        if config.api_key.is_none() {
            ::log::warn!("No API key configured for {}", config.api_url);
        }

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        ::log::debug!("Sending {} prompt chars to {}", prompt.len(), model);
        let response = request.send().await?;
        let status = response.status();
        let raw_body = response.text().await?;

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: raw_body,
            });
        }

        let root: Value = serde_json::from_str(&raw_body)
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;
        extract_assistant_content(&root)
            .map(str::to_string)
            .ok_or(CompletionError::MissingField("choices[0].message.content"))
    }
}

fn extract_assistant_content(root: &Value) -> Option<&str> {
    root.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> LlmConfig {
        LlmConfig {
            api_url: format!("{}/v1/chat/completions", server.uri()),
            api_key: Some("secret".to_string()),
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_complete_returns_assistant_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({"model": "m1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Answer: {}"}}]
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&config(&server)).unwrap();
        let text = client.complete("hello", "m1").await.unwrap();
        assert_eq!(text, "Answer: {}");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&config(&server)).unwrap();
        match client.complete("hello", "m1").await {
            Err(CompletionError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_content_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&config(&server)).unwrap();
        assert!(matches!(
            client.complete("hello", "m1").await,
            Err(CompletionError::MissingField(_))
        ));
    }
}
