//! Workflow row model and conversion into the domain entity.

use sqlx::FromRow;
use wizflow_core::store::StoreError;
use wizflow_core::types::{DbId, Timestamp};
use wizflow_core::workflow::{
    ConfigMap, FileDescriptor, ProcessingOptions, Schedule, ScheduleType, Source, SourceType,
    Workflow, WorkflowStatus,
};

/// A row from the `workflows` table.
///
/// Enum columns are stored as text and nested records as JSONB; the
/// conversion into [`Workflow`] re-validates both.
#[derive(Debug, Clone, FromRow)]
pub struct WorkflowRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub source_type: String,
    pub source_config: serde_json::Value,
    pub processing_options: serde_json::Value,
    pub schedule_type: String,
    pub schedule_config: serde_json::Value,
    pub status: String,
    pub files: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<WorkflowRow> for Workflow {
    type Error = StoreError;

    fn try_from(row: WorkflowRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let source_type =
            SourceType::from_str_db(&row.source_type).map_err(|e| corrupt(e.to_string()))?;
        let schedule_type =
            ScheduleType::from_str_db(&row.schedule_type).map_err(|e| corrupt(e.to_string()))?;
        let status = WorkflowStatus::from_str_db(&row.status).map_err(|e| corrupt(e.to_string()))?;

        let source_config: ConfigMap = serde_json::from_value(row.source_config)
            .map_err(|e| corrupt(format!("source_config: {e}")))?;
        let schedule_config: ConfigMap = serde_json::from_value(row.schedule_config)
            .map_err(|e| corrupt(format!("schedule_config: {e}")))?;
        let processing_options: ProcessingOptions =
            serde_json::from_value(row.processing_options)
                .map_err(|e| corrupt(format!("processing_options: {e}")))?;
        let files: Vec<FileDescriptor> =
            serde_json::from_value(row.files).map_err(|e| corrupt(format!("files: {e}")))?;

        Ok(Workflow {
            id,
            name: row.name,
            description: row.description,
            source: Source {
                source_type,
                config: source_config,
            },
            processing_options,
            schedule: Schedule {
                schedule_type,
                config: schedule_config,
            },
            status,
            files,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
