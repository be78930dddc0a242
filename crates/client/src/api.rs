//! REST client for the workflow API.
//!
//! Wraps the `/workflows` endpoints using [`reqwest`] and unwraps the
//! `{ success, data }` envelope. Failed calls are reported through an
//! optional hook before the error is returned to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use wizflow_core::types::DbId;
use wizflow_core::workflow::{NewWorkflow, Workflow, WorkflowPatch};

use crate::upload::LocalFile;

/// Base URL used when `WIZFLOW_API_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Shown when neither the response nor the transport explains a failure.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Callback invoked with every failed call.
pub type ErrorHook = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// Connection settings for [`WorkflowClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root including the `/api` segment, without a trailing slash.
    pub base_url: String,
    /// Headers sent with every request.
    pub default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientConfig {
    /// Read `WIZFLOW_API_URL`, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        let base_url = std::env::var("WIZFLOW_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

/// Errors from the workflow REST client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("{message}")]
    Api {
        status: u16,
        /// Message extracted from the error body.
        message: String,
        /// Individual validation messages, when the API sent them.
        errors: Vec<String>,
    },
}

impl ClientError {
    /// Human-readable message for notifications.
    pub fn message(&self) -> String {
        match self {
            ClientError::Request(e) => {
                let msg = e.to_string();
                if msg.trim().is_empty() {
                    UNEXPECTED_ERROR.to_string()
                } else {
                    msg
                }
            }
            ClientError::Api { message, .. } => message.clone(),
        }
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            ClientError::Api { status, .. } => Some(*status),
        }
    }
}

/// The operations the wizard and upload orchestrator depend on.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    async fn create_workflow(&self, draft: &NewWorkflow) -> Result<Workflow, ClientError>;

    async fn update_workflow(
        &self,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Workflow, ClientError>;

    async fn upload_files(&self, id: DbId, files: &[LocalFile]) -> Result<Workflow, ClientError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Message {
    message: String,
}

/// Fields the API (or a proxy in front of it) may use to explain a failure.
#[derive(Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    errors: Option<Vec<String>>,
    message: Option<String>,
}

/// HTTP client for the workflow API.
#[derive(Clone)]
pub struct WorkflowClient {
    client: reqwest::Client,
    base_url: String,
    on_error: Option<ErrorHook>,
}

impl std::fmt::Debug for WorkflowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowClient")
            .field("base_url", &self.base_url)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl WorkflowClient {
    /// Build a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .default_headers(config.default_headers)
            .build()?;
        Ok(Self::with_client(client, config.base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            on_error: None,
        }
    }

    /// Register a hook called with every failed call. Hooks compose: a
    /// previously registered hook still runs, before the new one.
    pub fn on_error(mut self, hook: impl Fn(&ClientError) + Send + Sync + 'static) -> Self {
        let hook: ErrorHook = match self.on_error.take() {
            Some(previous) => Arc::new(move |err: &ClientError| {
                previous(err);
                hook(err);
            }),
            None => Arc::new(hook),
        };
        self.on_error = Some(hook);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /workflows`, newest first.
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, ClientError> {
        let result: Result<_, ClientError> = async {
            let response = self.client.get(self.url("/workflows")).send().await?;
            Self::parse_data(response).await
        }
        .await;
        self.report(result)
    }

    /// `GET /workflows/{id}`.
    pub async fn get_workflow(&self, id: DbId) -> Result<Workflow, ClientError> {
        let result: Result<_, ClientError> = async {
            let response = self
                .client
                .get(self.url(&format!("/workflows/{id}")))
                .send()
                .await?;
            Self::parse_data(response).await
        }
        .await;
        self.report(result)
    }

    /// `POST /workflows`.
    pub async fn create_workflow(&self, draft: &NewWorkflow) -> Result<Workflow, ClientError> {
        let result: Result<_, ClientError> = async {
            let response = self
                .client
                .post(self.url("/workflows"))
                .json(draft)
                .send()
                .await?;
            Self::parse_data(response).await
        }
        .await;
        self.report(result)
    }

    /// `PUT /workflows/{id}` with only the fields present in `patch`.
    pub async fn update_workflow(
        &self,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Workflow, ClientError> {
        let result: Result<_, ClientError> = async {
            let response = self
                .client
                .put(self.url(&format!("/workflows/{id}")))
                .json(patch)
                .send()
                .await?;
            Self::parse_data(response).await
        }
        .await;
        self.report(result)
    }

    /// `DELETE /workflows/{id}`. Returns the server's confirmation message.
    pub async fn delete_workflow(&self, id: DbId) -> Result<String, ClientError> {
        let result: Result<_, ClientError> = async {
            let response = self
                .client
                .delete(self.url(&format!("/workflows/{id}")))
                .send()
                .await?;
            let message: Message = Self::parse_data(response).await?;
            Ok(message.message)
        }
        .await;
        self.report(result)
    }

    /// `POST /workflows/{id}/files`, one multipart part named `files` per
    /// file.
    pub async fn upload_files(
        &self,
        id: DbId,
        files: &[LocalFile],
    ) -> Result<Workflow, ClientError> {
        let result: Result<_, ClientError> = async {
            let mut form = Form::new();
            for file in files {
                let part = Part::bytes(file.content.clone())
                    .file_name(file.name.clone())
                    .mime_str(&file.mime_type)?;
                form = form.part("files", part);
            }

            let response = self
                .client
                .post(self.url(&format!("/workflows/{id}/files")))
                .multipart(form)
                .send()
                .await?;
            Self::parse_data(response).await
        }
        .await;
        self.report(result)
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn report<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(err) = &result {
            tracing::warn!(error = %err, status = ?err.status(), "Workflow API call failed");
            if let Some(hook) = &self.on_error {
                hook(err);
            }
        }
        result
    }

    /// Turn a non-2xx response into [`ClientError::Api`], extracting the
    /// most specific message the body offers.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let errors = body.errors.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message: extract_message(body.error, &errors, body.message),
            errors,
        })
    }

    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

/// Pick the message for an error body: `error`, then `errors` joined with
/// `", "`, then `message`, then [`UNEXPECTED_ERROR`].
fn extract_message(error: Option<String>, errors: &[String], message: Option<String>) -> String {
    let non_blank = |s: &Option<String>| s.as_ref().filter(|s| !s.trim().is_empty()).cloned();

    non_blank(&error)
        .or_else(|| (!errors.is_empty()).then(|| errors.join(", ")))
        .or_else(|| non_blank(&message))
        .unwrap_or_else(|| UNEXPECTED_ERROR.to_string())
}

#[async_trait]
impl WorkflowApi for WorkflowClient {
    async fn create_workflow(&self, draft: &NewWorkflow) -> Result<Workflow, ClientError> {
        WorkflowClient::create_workflow(self, draft).await
    }

    async fn update_workflow(
        &self,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Workflow, ClientError> {
        WorkflowClient::update_workflow(self, id, patch).await
    }

    async fn upload_files(&self, id: DbId, files: &[LocalFile]) -> Result<Workflow, ClientError> {
        WorkflowClient::upload_files(self, id, files).await
    }
}
