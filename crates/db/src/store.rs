//! [`WorkflowStore`] backed by PostgreSQL.

use async_trait::async_trait;
use wizflow_core::store::{StoreError, WorkflowStore};
use wizflow_core::types::DbId;
use wizflow_core::workflow::{FileDescriptor, NewWorkflow, Workflow, WorkflowPatch};

use crate::models::workflow::WorkflowRow;
use crate::repositories::WorkflowRepo;
use crate::DbPool;

/// Postgres-backed workflow store. Cheap to clone (wraps the pool).
#[derive(Clone)]
pub struct PgWorkflowStore {
    pool: DbPool,
}

impl PgWorkflowStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}

fn convert(row: Option<WorkflowRow>) -> Result<Option<Workflow>, StoreError> {
    row.map(Workflow::try_from).transpose()
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn insert(&self, input: &NewWorkflow) -> Result<Workflow, StoreError> {
        let row = WorkflowRepo::create(&self.pool, input)
            .await
            .map_err(backend)?;
        Workflow::try_from(row)
    }

    async fn list(&self) -> Result<Vec<Workflow>, StoreError> {
        WorkflowRepo::list(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(Workflow::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Workflow>, StoreError> {
        convert(
            WorkflowRepo::find_by_id(&self.pool, id)
                .await
                .map_err(backend)?,
        )
    }

    async fn update(
        &self,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Option<Workflow>, StoreError> {
        convert(
            WorkflowRepo::update(&self.pool, id, patch)
                .await
                .map_err(backend)?,
        )
    }

    async fn delete(&self, id: DbId) -> Result<Option<Workflow>, StoreError> {
        convert(WorkflowRepo::delete(&self.pool, id).await.map_err(backend)?)
    }

    async fn append_files(
        &self,
        id: DbId,
        files: &[FileDescriptor],
    ) -> Result<Option<Workflow>, StoreError> {
        convert(
            WorkflowRepo::append_files(&self.pool, id, files)
                .await
                .map_err(backend)?,
        )
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(backend)
    }
}
