//! Persistence contract for workflows.
//!
//! The store owns identity and timestamps: `insert` assigns the id and sets
//! `created_at` and `updated_at` to the same instant, every mutation
//! refreshes `updated_at`. Missing ids are reported as `Ok(None)`; turning
//! that into a not-found error is the service's job.
//!
//! [`WorkflowStore::append_files`] must be a single atomic operation on the
//! backing store. Two concurrent appends to the same workflow both land.

mod memory;

pub use memory::InMemoryWorkflowStore;

use async_trait::async_trait;

use crate::types::DbId;
use crate::workflow::{FileDescriptor, NewWorkflow, Workflow, WorkflowPatch};

/// Connectivity or persistence failure in a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A stored row could not be decoded into a [`Workflow`].
    #[error("Corrupt workflow record {id}: {reason}")]
    Corrupt { id: DbId, reason: String },
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Persist a new workflow, assigning its id and timestamps.
    async fn insert(&self, input: &NewWorkflow) -> Result<Workflow, StoreError>;

    /// All workflows, newest `created_at` first (ties: higher id first).
    async fn list(&self) -> Result<Vec<Workflow>, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Workflow>, StoreError>;

    /// Shallow-merge `patch` over the stored workflow and refresh `updated_at`.
    async fn update(
        &self,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Option<Workflow>, StoreError>;

    /// Hard-delete a workflow, returning the removed record.
    async fn delete(&self, id: DbId) -> Result<Option<Workflow>, StoreError>;

    /// Atomically append descriptors to the tail of `files`.
    async fn append_files(
        &self,
        id: DbId,
        files: &[FileDescriptor],
    ) -> Result<Option<Workflow>, StoreError>;

    /// Reachability check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
