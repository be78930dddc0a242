//! Workflow entity, DTOs, and schema validation.
//!
//! A workflow describes where input data comes from (`source`), how it is
//! processed (`processingOptions`), and when it runs (`schedule`). The
//! wire format is camelCase JSON so the browser wizard can post its draft
//! unchanged.
//!
//! Source and schedule configuration stay open key-value maps: the variant
//! tag is typed, the per-variant settings are not, so adding a new source
//! or schedule kind never requires a schema migration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Open configuration mapping attached to a source or schedule.
pub type ConfigMap = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Validation messages
// ---------------------------------------------------------------------------

pub const ERR_NAME_REQUIRED: &str = "Name is required";
pub const ERR_SOURCE_TYPE: &str = "Valid source type is required (file, api, or folder)";
pub const ERR_OUTPUT_FORMAT: &str = "Invalid output format";

/// Name used when a workflow has to be persisted before the user typed one.
pub const DEFAULT_WORKFLOW_NAME: &str = "New Workflow";

// ---------------------------------------------------------------------------
// Source type
// ---------------------------------------------------------------------------

/// Where a workflow reads its input data from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    File,
    Api,
    Folder,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [Self::File, Self::Api, Self::Folder];

    /// Parse a source type string from the database or a request body.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "file" => Ok(Self::File),
            "api" => Ok(Self::Api),
            "folder" => Ok(Self::Folder),
            _ => Err(CoreError::Validation(format!(
                "Invalid source type '{s}'. Must be one of: file, api, folder"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Api => "api",
            Self::Folder => "folder",
        }
    }
}

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

/// Format of the artefacts a workflow produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Csv,
    Pdf,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Csv, Self::Pdf, Self::Json];

    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "CSV" => Ok(Self::Csv),
            "PDF" => Ok(Self::Pdf),
            "JSON" => Ok(Self::Json),
            _ => Err(CoreError::Validation(format!(
                "Invalid output format '{s}'. Must be one of: CSV, PDF, JSON"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Pdf => "PDF",
            Self::Json => "JSON",
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule type
// ---------------------------------------------------------------------------

/// How a workflow is triggered. Stored only; nothing executes schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    #[default]
    Manual,
    Recurring,
    Triggered,
}

impl ScheduleType {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "manual" => Ok(Self::Manual),
            "recurring" => Ok(Self::Recurring),
            "triggered" => Ok(Self::Triggered),
            _ => Err(CoreError::Validation(format!(
                "Invalid schedule type '{s}'. Must be one of: manual, recurring, triggered"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Recurring => "recurring",
            Self::Triggered => "triggered",
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Active,
    Inactive,
}

impl WorkflowStatus {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(CoreError::Validation(format!(
                "Invalid workflow status '{s}'. Must be one of: active, inactive"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

// ---------------------------------------------------------------------------
// Nested records
// ---------------------------------------------------------------------------

/// Input data origin: a typed variant tag plus its open configuration
/// (`apiUrl`/`apiKey` for `api`, `folderPath`/`watchFolder` for `folder`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default)]
    pub config: ConfigMap,
}

/// Processing switches. Any field missing from a request takes its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingOptions {
    pub auto_process: bool,
    pub send_notifications: bool,
    pub archive_processed: bool,
    pub output_format: OutputFormat,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            auto_process: true,
            send_notifications: true,
            archive_processed: false,
            output_format: OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "type", default)]
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub config: ConfigMap,
}

/// Metadata for one uploaded file attached to a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub original_name: String,
    pub stored_filename: String,
    /// Public path the file is served from, e.g. `/uploads/<stored_filename>`.
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

// ---------------------------------------------------------------------------
// Entity and DTOs
// ---------------------------------------------------------------------------

/// A persisted workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub source: Source,
    pub processing_options: ProcessingOptions,
    pub schedule: Schedule,
    pub status: WorkflowStatus,
    /// Attached files in upload order. Only ever appended to.
    pub files: Vec<FileDescriptor>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a workflow; also the wizard's in-memory draft.
///
/// Everything except `name` and `source` falls back to the documented
/// defaults when omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkflow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: Source,
    #[serde(default)]
    pub processing_options: ProcessingOptions,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub status: WorkflowStatus,
}

impl NewWorkflow {
    /// Validate a raw request body and convert it into a typed DTO.
    ///
    /// All schema rules are checked before any parsing so the caller gets
    /// every violation at once.
    pub fn from_candidate(candidate: Value) -> Result<Self, CoreError> {
        let report = validate(&candidate);
        if !report.is_valid {
            return Err(CoreError::InvalidWorkflow {
                errors: report.errors,
            });
        }

        serde_json::from_value(candidate).map_err(|e| CoreError::InvalidWorkflow {
            errors: vec![e.to_string()],
        })
    }
}

/// DTO for a partial update.
///
/// Each present top-level field replaces the stored one wholesale; nested
/// objects are not deep-merged. `id`, `files` and the timestamps are not
/// updatable and are ignored when sent. A `null` field counts as absent,
/// except `description`, where `null` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_options: Option<ProcessingOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
}

impl WorkflowPatch {
    /// Validate a raw partial body and convert it into a typed patch.
    ///
    /// Only the fields present are checked, using the same messages as
    /// [`validate`].
    pub fn from_json(body: Value) -> Result<Self, CoreError> {
        if !body.is_object() {
            return Err(CoreError::Validation(
                "Update body must be a JSON object".to_string(),
            ));
        }

        let mut errors = Vec::new();
        if let Some(name) = present(&body, "/name") {
            if !is_non_blank_str(name) {
                errors.push(ERR_NAME_REQUIRED.to_string());
            }
        }
        if present(&body, "/source").is_some() && !has_valid_source_type(&body) {
            errors.push(ERR_SOURCE_TYPE.to_string());
        }
        if !output_format_ok(&body) {
            errors.push(ERR_OUTPUT_FORMAT.to_string());
        }
        if !errors.is_empty() {
            return Err(CoreError::InvalidWorkflow { errors });
        }

        serde_json::from_value(body).map_err(|e| CoreError::InvalidWorkflow {
            errors: vec![e.to_string()],
        })
    }

    /// `true` when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this patch over an existing workflow. Does not touch
    /// `updated_at`; stores refresh it when they persist the result.
    pub fn apply_to(&self, workflow: &mut Workflow) {
        if let Some(name) = &self.name {
            workflow.name = name.clone();
        }
        if let Some(description) = &self.description {
            workflow.description = description.clone();
        }
        if let Some(source) = &self.source {
            workflow.source = source.clone();
        }
        if let Some(options) = self.processing_options {
            workflow.processing_options = options;
        }
        if let Some(schedule) = &self.schedule {
            workflow.schedule = schedule.clone();
        }
        if let Some(status) = self.status {
            workflow.status = status;
        }
    }
}

impl From<NewWorkflow> for WorkflowPatch {
    /// A patch that overwrites every user-editable field with the draft.
    fn from(draft: NewWorkflow) -> Self {
        Self {
            name: Some(draft.name),
            description: Some(draft.description),
            source: Some(draft.source),
            processing_options: Some(draft.processing_options),
            schedule: Some(draft.schedule),
            status: Some(draft.status),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Outcome of validating a workflow candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check a create candidate against the minimal schema contract.
///
/// Rules are evaluated in a fixed order and all violations are collected:
///
/// 1. `name` present and non-blank.
/// 2. `source.type` present and one of `file`, `api`, `folder`.
/// 3. `processingOptions.outputFormat`, when present, one of `CSV`, `PDF`, `JSON`.
pub fn validate(candidate: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    if !present(candidate, "/name").is_some_and(is_non_blank_str) {
        errors.push(ERR_NAME_REQUIRED.to_string());
    }
    if !has_valid_source_type(candidate) {
        errors.push(ERR_SOURCE_TYPE.to_string());
    }
    if !output_format_ok(candidate) {
        errors.push(ERR_OUTPUT_FORMAT.to_string());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Look up a JSON pointer, treating `null` as absent.
/// Maps an explicit `null` to `Some(None)` so it is told apart from a
/// missing field.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    value.pointer(pointer).filter(|v| !v.is_null())
}

fn is_non_blank_str(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

fn has_valid_source_type(value: &Value) -> bool {
    present(value, "/source/type")
        .and_then(Value::as_str)
        .is_some_and(|t| SourceType::from_str_db(t).is_ok())
}

fn output_format_ok(value: &Value) -> bool {
    match present(value, "/processingOptions/outputFormat") {
        None => true,
        Some(v) => v
            .as_str()
            .is_some_and(|f| OutputFormat::from_str_db(f).is_ok()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
