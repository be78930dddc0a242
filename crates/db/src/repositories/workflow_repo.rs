//! Repository for the `workflows` table.

use sqlx::PgPool;
use wizflow_core::types::DbId;
use wizflow_core::workflow::{FileDescriptor, NewWorkflow, WorkflowPatch};

use crate::models::workflow::WorkflowRow;

/// Column list for `workflows` queries.
const COLUMNS: &str = "id, name, description, source_type, source_config, \
     processing_options, schedule_type, schedule_config, status, files, \
     created_at, updated_at";

/// Provides CRUD operations for workflows.
pub struct WorkflowRepo;

impl WorkflowRepo {
    /// Insert a new workflow. Id and both timestamps come from the database.
    pub async fn create(pool: &PgPool, input: &NewWorkflow) -> Result<WorkflowRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflows \
                (name, description, source_type, source_config, processing_options, \
                 schedule_type, schedule_config, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowRow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.source.source_type.as_str())
            .bind(serde_json::Value::Object(input.source.config.clone()))
            .bind(to_json(&input.processing_options))
            .bind(input.schedule.schedule_type.as_str())
            .bind(serde_json::Value::Object(input.schedule.config.clone()))
            .bind(input.status.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a workflow by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkflowRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflows WHERE id = $1");
        sqlx::query_as::<_, WorkflowRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all workflows, most recent first.
    pub async fn list(pool: &PgPool) -> Result<Vec<WorkflowRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflows ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, WorkflowRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Shallow-merge a patch in a single statement. Absent fields keep
    /// their stored value; a present source or schedule replaces both its
    /// tag and its config. `description` is `Option<Option<_>>` so it can
    /// be cleared.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        patch: &WorkflowPatch,
    ) -> Result<Option<WorkflowRow>, sqlx::Error> {
        let description_provided = patch.description.is_some();
        let description_value = patch.description.as_ref().and_then(|d| d.as_deref());

        let query = format!(
            "UPDATE workflows SET \
                name = COALESCE($2, name), \
                description = CASE WHEN $10 THEN $3 ELSE description END, \
                source_type = COALESCE($4, source_type), \
                source_config = COALESCE($5, source_config), \
                processing_options = COALESCE($6, processing_options), \
                schedule_type = COALESCE($7, schedule_type), \
                schedule_config = COALESCE($8, schedule_config), \
                status = COALESCE($9, status), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowRow>(&query)
            .bind(id)
            .bind(patch.name.as_deref())
            .bind(description_value)
            .bind(patch.source.as_ref().map(|s| s.source_type.as_str()))
            .bind(
                patch
                    .source
                    .as_ref()
                    .map(|s| serde_json::Value::Object(s.config.clone())),
            )
            .bind(patch.processing_options.as_ref().map(to_json))
            .bind(patch.schedule.as_ref().map(|s| s.schedule_type.as_str()))
            .bind(
                patch
                    .schedule
                    .as_ref()
                    .map(|s| serde_json::Value::Object(s.config.clone())),
            )
            .bind(patch.status.map(|s| s.as_str()))
            .bind(description_provided)
            .fetch_optional(pool)
            .await
    }

    /// Delete a workflow, returning the removed row.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<WorkflowRow>, sqlx::Error> {
        let query = format!("DELETE FROM workflows WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, WorkflowRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Append file descriptors to the workflow's `files` array.
    ///
    /// Uses JSONB concatenation in one UPDATE, so concurrent appends to
    /// the same row serialize on the row lock and none is lost.
    pub async fn append_files(
        pool: &PgPool,
        id: DbId,
        files: &[FileDescriptor],
    ) -> Result<Option<WorkflowRow>, sqlx::Error> {
        let query = format!(
            "UPDATE workflows \
             SET files = files || $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowRow>(&query)
            .bind(id)
            .bind(to_json(&files))
            .fetch_optional(pool)
            .await
    }
}

/// Serialize a value that is known to be representable as JSON.
fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
