use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Named stages of an analysis task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStep {
    Queued,
    Crawling,
    ReadyForAnalysis,
    Analyzing,
    Translating,
    Done,
    Error,
}

impl TaskStep {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStep::Done | TaskStep::Error)
    }
}

/// Latest known state of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub step: TaskStep,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatus {
    pub fn new(task_id: &str, step: TaskStep, progress: u8, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.to_string(),
            step,
            progress: progress.min(100),
            message: message.into(),
            result: None,
            error: None,
        }
    }

    pub fn queued(task_id: &str) -> Self {
        Self::new(task_id, TaskStep::Queued, 0, "Task accepted")
    }

    pub fn done(task_id: &str, result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::new(task_id, TaskStep::Done, 100, "Analysis complete")
        }
    }

    pub fn failed(task_id: &str, progress: u8, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            error: Some(error.clone()),
            ..Self::new(task_id, TaskStep::Error, progress, error)
        }
    }
}

/// Task id to latest status snapshot.
///
/// `set` overwrites the whole snapshot. Progress ordering is the writer's
/// responsibility.
pub trait StatusStore: Send + Sync {
    fn set(&self, task_id: &str, status: TaskStatus);
    fn get(&self, task_id: &str) -> Option<TaskStatus>;
}

/// Process-lifetime store behind one lock.
///
/// Entries are never evicted, so memory grows with the number of tasks
/// submitted since start-up.
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    entries: Mutex<HashMap<String, TaskStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TaskStatus>> {
        // A panicking writer cannot leave a torn snapshot: inserts are whole values.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StatusStore for InMemoryStatusStore {
    fn set(&self, task_id: &str, status: TaskStatus) {
        self.lock().insert(task_id.to_string(), status);
    }

    fn get(&self, task_id: &str) -> Option<TaskStatus> {
        self.lock().get(task_id).cloned()
    }
}
