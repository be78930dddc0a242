//! Workflow service operations.
//!
//! Plain async functions over an explicit [`WorkflowStore`] handle. Each
//! function validates its input, delegates to the store, and turns a
//! missing record into [`CoreError::NotFound`]. Store failures propagate
//! unchanged; nothing here retries.

use serde_json::Value;

use crate::error::CoreError;
use crate::store::WorkflowStore;
use crate::types::DbId;
use crate::workflow::{FileDescriptor, NewWorkflow, Workflow, WorkflowPatch};

const ENTITY: &str = "Workflow";

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound { entity: ENTITY, id }
}

/// Validate a raw candidate and persist it.
///
/// Defaults for every optional field are applied here, before the store
/// sees the record; the store only assigns id and timestamps.
pub async fn create_workflow(
    store: &dyn WorkflowStore,
    candidate: Value,
) -> Result<Workflow, CoreError> {
    let input = NewWorkflow::from_candidate(candidate)?;
    Ok(store.insert(&input).await?)
}

/// All workflows, newest first. No pagination.
pub async fn list_workflows(store: &dyn WorkflowStore) -> Result<Vec<Workflow>, CoreError> {
    Ok(store.list().await?)
}

pub async fn get_workflow(store: &dyn WorkflowStore, id: DbId) -> Result<Workflow, CoreError> {
    store.find_by_id(id).await?.ok_or_else(|| not_found(id))
}

/// Apply a partial update. Present top-level fields replace the stored
/// ones; nested objects are replaced, not merged.
pub async fn update_workflow(
    store: &dyn WorkflowStore,
    id: DbId,
    body: Value,
) -> Result<Workflow, CoreError> {
    let patch = WorkflowPatch::from_json(body)?;
    apply_patch(store, id, &patch).await
}

/// Typed variant of [`update_workflow`] for callers that already hold a
/// validated patch.
pub async fn apply_patch(
    store: &dyn WorkflowStore,
    id: DbId,
    patch: &WorkflowPatch,
) -> Result<Workflow, CoreError> {
    store.update(id, patch).await?.ok_or_else(|| not_found(id))
}

/// Hard-delete a workflow. Returns the removed record.
pub async fn delete_workflow(store: &dyn WorkflowStore, id: DbId) -> Result<Workflow, CoreError> {
    store.delete(id).await?.ok_or_else(|| not_found(id))
}

/// Append file descriptors to a workflow, preserving their order.
pub async fn attach_files(
    store: &dyn WorkflowStore,
    id: DbId,
    files: &[FileDescriptor],
) -> Result<Workflow, CoreError> {
    if files.is_empty() {
        return Err(CoreError::Validation("No files provided".to_string()));
    }
    store
        .append_files(id, files)
        .await?
        .ok_or_else(|| not_found(id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
