use crate::debug_store::{Area, DebugStore};
use crate::error::CompletionError;
use crate::llm::completion::CompletionBackend;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

/// One prompt plus its ordered model preferences
#[derive(Debug, Clone)]
pub struct PromptJob {
    pub name: String,
    pub prompt: String,
    pub models: Vec<String>,
}

impl PromptJob {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            models,
        }
    }
}

/// Runs prompt jobs concurrently with per-job model fallback
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn CompletionBackend>,
    debug_store: Option<DebugStore>,
    call_timeout: Duration,
    max_concurrent: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn CompletionBackend>, call_timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            backend,
            debug_store: None,
            call_timeout,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Persist every raw response here before it is parsed
    pub fn with_debug_store(mut self, store: DebugStore) -> Self {
        self.debug_store = Some(store);
        self
    }

    /// Run all jobs and wait for every one of them.
    ///
    /// Results come back in job order. A failed job never cancels the others.
    pub async fn dispatch(&self, jobs: Vec<PromptJob>) -> Vec<Result<String, CompletionError>> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let names: Vec<String> = jobs.iter().map(|job| job.name.clone()).collect();
        let mut set = JoinSet::new();

        for (index, job) in jobs.into_iter().enumerate() {
            let worker = self.clone();
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (index, worker.run_job(&job).await)
            });
        }

        let mut results: Vec<Option<Result<String, CompletionError>>> =
            names.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => ::log::error!("Prompt worker failed to complete: {}", e),
            }
        }

        results
            .into_iter()
            .zip(names)
            .map(|(result, name)| result.unwrap_or(Err(CompletionError::Join(name))))
            .collect()
    }

    /// Try each candidate model in order until one returns text
    pub async fn run_job(&self, job: &PromptJob) -> Result<String, CompletionError> {
        if job.models.is_empty() {
            return Err(CompletionError::NoModels(job.name.clone()));
        }

        let mut attempts = Vec::with_capacity(job.models.len());
        for model in &job.models {
            ::log::info!("Running {} prompt on {}", job.name, model);
            let outcome = match timeout(self.call_timeout, self.backend.complete(&job.prompt, model)).await {
                Ok(Ok(text)) if text.trim().is_empty() => Err(CompletionError::Empty),
                Ok(result) => result,
                Err(_) => Err(CompletionError::Timeout(self.call_timeout.as_secs())),
            };

            match outcome {
                Ok(text) => {
                    self.persist(job, model, &text).await;
                    return Ok(text);
                }
                Err(e) => {
                    ::log::warn!("Model {} failed for {} prompt: {}", model, job.name, e);
                    attempts.push((model.clone(), e.to_string()));
                }
            }
        }

        Err(CompletionError::AllModelsFailed {
            prompt: job.name.clone(),
            attempts,
        })
    }

    async fn persist(&self, job: &PromptJob, model: &str, raw: &str) {
        if let Some(store) = &self.debug_store {
            let document = json!({
                "prompt_name": job.name,
                "model": model,
                "prompt": job.prompt,
                "raw_response": raw,
            });
            store
                .save_quietly(&document, &format!("model_response_{}", job.name), Area::Debug)
                .await;
        }
    }
}
