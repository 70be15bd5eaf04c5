//! HTTP client for the reminder API, behind a trait seam.
//!
//! [`TaskApi`] is the interface the sync loop and submission pipeline depend
//! on; [`HttpTaskApi`] is the production implementation over [`reqwest`].
//! Tests substitute mock implementations to control timing and outcomes
//! without a network.

use serde::Deserialize;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::types::{Health, NewTaskRequest, Task, TaskCreated};

/// The reminder server's API surface, as seen by this client.
///
/// All implementations must be `Send + Sync` so fetches can run as spawned
/// tasks concurrently with submissions.
pub trait TaskApi: Send + Sync {
    /// Fetch the full task list. No pagination, filtering, or auth.
    fn list_tasks(&self) -> impl std::future::Future<Output = Result<Vec<Task>>> + Send;

    /// Create a new task. Each call creates a new server-side task; there is
    /// no de-duplication key, so callers must guard against double submission.
    fn add_task(
        &self,
        request: &NewTaskRequest,
    ) -> impl std::future::Future<Output = Result<TaskCreated>> + Send;

    /// Probe server liveness.
    fn health(&self) -> impl std::future::Future<Output = Result<Health>> + Send;
}

/// Structured rejection body the server may attach to a non-2xx response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`TaskApi`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    api_base: String,
}

impl HttpTaskApi {
    /// Build a client for the API base and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the config is invalid, or
    /// [`SyncError::Transport`] if the HTTP client cannot be constructed.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }

    /// Turn a non-2xx response into [`SyncError::Api`], using the server's
    /// structured `{error}` body when it has one.
    async fn rejection(response: reqwest::Response) -> SyncError {
        let status = response.status().as_u16();
        let server_message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.error);
        SyncError::api(status, server_message)
    }
}

impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let url = format!("{}/tasks", self.api_base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("tasks request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let tasks = response
            .json::<Vec<Task>>()
            .await
            .map_err(|e| SyncError::Transport(format!("invalid tasks response: {e}")))?;
        tracing::debug!(count = tasks.len(), "fetched task list");
        Ok(tasks)
    }

    async fn add_task(&self, request: &NewTaskRequest) -> Result<TaskCreated> {
        let url = format!("{}/add-task", self.api_base);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("add-task request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let created = response
            .json::<TaskCreated>()
            .await
            .map_err(|e| SyncError::Transport(format!("invalid add-task response: {e}")))?;
        tracing::debug!(task_id = %created.task_id, "task created");
        Ok(created)
    }

    async fn health(&self) -> Result<Health> {
        let url = format!("{}/health", self.api_base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("health request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<Health>()
            .await
            .map_err(|e| SyncError::Transport(format!("invalid health response: {e}")))
    }
}
