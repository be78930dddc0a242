use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, WorkflowStore};
use crate::types::DbId;
use crate::workflow::{FileDescriptor, NewWorkflow, Workflow, WorkflowPatch};

/// Process-local [`WorkflowStore`] used when no database is configured and
/// by tests.
///
/// Every mutation runs under a single write lock, which makes
/// `append_files` atomic with respect to other appends.
#[derive(Debug)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<DbId, Workflow>>,
    next_id: AtomicI64,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored workflows.
    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn insert(&self, input: &NewWorkflow) -> Result<Workflow, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = chrono::Utc::now();
        let workflow = Workflow {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            source: input.source.clone(),
            processing_options: input.processing_options,
            schedule: input.schedule.clone(),
            status: input.status,
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.workflows.write().await.insert(id, workflow.clone());
        Ok(workflow)
    }

    async fn list(&self) -> Result<Vec<Workflow>, StoreError> {
        let mut all: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(all)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Workflow>, StoreError> {
        Ok(self.workflows.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Option<Workflow>, StoreError> {
        let mut workflows = self.workflows.write().await;
        let Some(workflow) = workflows.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(workflow);
        workflow.updated_at = chrono::Utc::now();
        Ok(Some(workflow.clone()))
    }

    async fn delete(&self, id: DbId) -> Result<Option<Workflow>, StoreError> {
        Ok(self.workflows.write().await.remove(&id))
    }

    async fn append_files(
        &self,
        id: DbId,
        files: &[FileDescriptor],
    ) -> Result<Option<Workflow>, StoreError> {
        let mut workflows = self.workflows.write().await;
        let Some(workflow) = workflows.get_mut(&id) else {
            return Ok(None);
        };
        workflow.files.extend_from_slice(files);
        workflow.updated_at = chrono::Utc::now();
        Ok(Some(workflow.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
