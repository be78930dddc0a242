//! Upload orchestration for the wizard.
//!
//! Files can only be attached to a persisted workflow, but the wizard lets
//! users drop files before the draft was ever saved. [`UploadOrchestrator`]
//! validates a selection locally, creates a backing workflow from the
//! draft on first use, and then attaches the files to it.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use wizflow_core::types::DbId;
use wizflow_core::upload::{mime_for_filename, validate_selection, SelectedFile, UploadConfig};
use wizflow_core::workflow::{NewWorkflow, Workflow, DEFAULT_WORKFLOW_NAME};

use crate::api::{ClientError, WorkflowApi};

/// Interval between simulated progress steps while an attach is in flight.
pub const PROGRESS_TICK: Duration = Duration::from_millis(500);

/// Amount added to the progress value on every tick.
pub const PROGRESS_STEP: u8 = 10;

/// Highest value the simulated progress reaches before the attach returns.
pub const PROGRESS_CAP: u8 = 90;

/// MIME type used when the file name has no recognised extension.
const FALLBACK_MIME: &str = "application/octet-stream";

/// A file picked by the user, held in memory until it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl LocalFile {
    /// Wrap in-memory bytes, deriving the MIME type from the file name.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_for_filename(&name).unwrap_or(FALLBACK_MIME).to_string();
        Self::with_mime(name, mime_type, content)
    }

    pub fn with_mime(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, content))
    }
}

impl SelectedFile for LocalFile {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// What the file list shows for an accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl From<&LocalFile> for AcceptedFile {
    fn from(file: &LocalFile) -> Self {
        Self {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            mime_type: file.mime_type.clone(),
        }
    }
}

/// Why a file selection was not attached. Each variant calls for a
/// different message.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The selection broke a local constraint; nothing was sent.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// The backing workflow could not be created; no files were attached.
    #[error("Failed to create workflow: {}", .0.message())]
    WorkflowCreationFailed(#[source] ClientError),

    /// The attach call failed.
    #[error("Failed to upload files: {}", .0.message())]
    AttachFailed(#[source] ClientError),
}

#[derive(Debug, Default)]
struct UploadState {
    workflow_id: Option<DbId>,
    accepted: Vec<AcceptedFile>,
}

/// Creates the backing workflow on demand and attaches file batches to it.
///
/// Batches are handled one at a time: the state lock is held for the whole
/// operation, including the lazy create, so two rapid drops never create
/// two workflows.
///
/// Progress is a presentation affordance, not a measurement: while the
/// attach call is in flight the value climbs by [`PROGRESS_STEP`] every
/// [`PROGRESS_TICK`] up to [`PROGRESS_CAP`], jumps to 100 on success and
/// returns to 0 once the operation ends. It says nothing about bytes sent.
#[derive(Debug)]
pub struct UploadOrchestrator {
    config: UploadConfig,
    state: Mutex<UploadState>,
    progress: watch::Sender<u8>,
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new(UploadConfig::default())
    }
}

impl UploadOrchestrator {
    pub fn new(config: UploadConfig) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            config,
            state: Mutex::new(UploadState::default()),
            progress,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Id of the backing workflow, once one exists.
    pub async fn workflow_id(&self) -> Option<DbId> {
        self.state.lock().await.workflow_id
    }

    /// Use an already persisted workflow instead of creating one.
    pub async fn adopt_workflow(&self, id: DbId) {
        self.state.lock().await.workflow_id = Some(id);
    }

    /// Files accepted by successful batches, in upload order.
    pub async fn selected_files(&self) -> Vec<AcceptedFile> {
        self.state.lock().await.accepted.clone()
    }

    /// Subscribe to the simulated progress value (0..=100).
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn current_progress(&self) -> u8 {
        *self.progress.borrow()
    }

    /// Validate `files`, make sure a backing workflow exists, then attach
    /// the batch to it.
    ///
    /// `draft` is the wizard's current draft; it is only read when the
    /// backing workflow still has to be created. A blank name is replaced
    /// by [`DEFAULT_WORKFLOW_NAME`].
    pub async fn handle_files_selected(
        &self,
        api: &dyn WorkflowApi,
        draft: &NewWorkflow,
        files: Vec<LocalFile>,
    ) -> Result<Workflow, UploadError> {
        let mut state = self.state.lock().await;

        let errors = validate_selection(&self.config, state.accepted.len(), &files);
        if !errors.is_empty() {
            tracing::warn!(count = files.len(), ?errors, "File selection rejected");
            return Err(UploadError::Validation(errors));
        }

        let id = match state.workflow_id {
            Some(id) => id,
            None => {
                let snapshot = creation_snapshot(draft);
                let created = api
                    .create_workflow(&snapshot)
                    .await
                    .map_err(UploadError::WorkflowCreationFailed)?;
                tracing::info!(workflow_id = created.id, "Backing workflow created for upload");
                state.workflow_id = Some(created.id);
                created.id
            }
        };

        let result = self.attach_with_progress(api, id, &files).await;
        let outcome = match result {
            Ok(workflow) => {
                self.progress.send_replace(100);
                state.accepted.extend(files.iter().map(AcceptedFile::from));
                tracing::info!(
                    workflow_id = id,
                    count = files.len(),
                    total = state.accepted.len(),
                    "Files attached"
                );
                Ok(workflow)
            }
            Err(err) => Err(UploadError::AttachFailed(err)),
        };
        self.progress.send_replace(0);
        outcome
    }

    /// Run the attach call while ticking the simulated progress value.
    async fn attach_with_progress(
        &self,
        api: &dyn WorkflowApi,
        id: DbId,
        files: &[LocalFile],
    ) -> Result<Workflow, ClientError> {
        self.progress.send_replace(0);

        let attach = api.upload_files(id, files);
        tokio::pin!(attach);

        let mut ticker = tokio::time::interval(PROGRESS_TICK);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                result = &mut attach => return result,
                _ = ticker.tick() => {
                    self.progress
                        .send_modify(|p| *p = p.saturating_add(PROGRESS_STEP).min(PROGRESS_CAP));
                }
            }
        }
    }
}

/// Draft used for the lazy create.
fn creation_snapshot(draft: &NewWorkflow) -> NewWorkflow {
    let mut snapshot = draft.clone();
    if snapshot.name.trim().is_empty() {
        snapshot.name = DEFAULT_WORKFLOW_NAME.to_string();
    }
    snapshot
}
