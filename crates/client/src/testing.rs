//! In-process [`WorkflowApi`] for unit tests: the real service functions
//! over an in-memory store, with call counters and switchable failures.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wizflow_core::error::CoreError;
use wizflow_core::service;
use wizflow_core::store::{InMemoryWorkflowStore, WorkflowStore};
use wizflow_core::types::DbId;
use wizflow_core::workflow::{FileDescriptor, NewWorkflow, Workflow, WorkflowPatch};

use crate::api::{ClientError, WorkflowApi};
use crate::upload::LocalFile;

#[derive(Default)]
pub(crate) struct FakeApi {
    store: InMemoryWorkflowStore,
    delay: Duration,
    creates: AtomicUsize,
    updates: AtomicUsize,
    uploads: AtomicUsize,
    fail_create: AtomicBool,
    fail_updates: AtomicBool,
    fail_uploads: AtomicBool,
    stored_seq: AtomicI64,
}

impl FakeApi {
    /// Every create and upload sleeps for `delay` first.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing_create() -> Self {
        let api = Self::default();
        api.fail_create.store(true, Ordering::SeqCst);
        api
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Insert a workflow without going through the counted calls.
    pub async fn seed(&self, name: &str) -> DbId {
        let input = NewWorkflow {
            name: name.to_string(),
            ..Default::default()
        };
        self.store.insert(&input).await.unwrap().id
    }

    pub async fn all(&self) -> Vec<Workflow> {
        self.store.list().await.unwrap()
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn unavailable() -> ClientError {
    ClientError::Api {
        status: 503,
        message: "Service unavailable".to_string(),
        errors: Vec::new(),
    }
}

fn to_client_error(err: CoreError) -> ClientError {
    let (status, errors) = match &err {
        CoreError::NotFound { .. } => (404, Vec::new()),
        CoreError::InvalidWorkflow { errors } => (400, errors.clone()),
        CoreError::Validation(_) => (400, Vec::new()),
        _ => (500, Vec::new()),
    };
    ClientError::Api {
        status,
        message: err.to_string(),
        errors,
    }
}

#[async_trait]
impl WorkflowApi for FakeApi {
    async fn create_workflow(&self, draft: &NewWorkflow) -> Result<Workflow, ClientError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let body = serde_json::to_value(draft).unwrap();
        service::create_workflow(&self.store, body)
            .await
            .map_err(to_client_error)
    }

    async fn update_workflow(
        &self,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Workflow, ClientError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let body = serde_json::to_value(patch).unwrap();
        service::update_workflow(&self.store, id, body)
            .await
            .map_err(to_client_error)
    }

    async fn upload_files(&self, id: DbId, files: &[LocalFile]) -> Result<Workflow, ClientError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let descriptors: Vec<FileDescriptor> = files
            .iter()
            .map(|f| {
                let seq = self.stored_seq.fetch_add(1, Ordering::SeqCst);
                let stored_filename = format!("{seq}-{}", f.name);
                FileDescriptor {
                    original_name: f.name.clone(),
                    storage_path: format!("/uploads/{stored_filename}"),
                    stored_filename,
                    mime_type: f.mime_type.clone(),
                    size_bytes: f.size_bytes as i64,
                }
            })
            .collect();
        service::attach_files(&self.store, id, &descriptors)
            .await
            .map_err(to_client_error)
    }
}
