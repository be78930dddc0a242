//! Four-step workflow wizard driver.
//!
//! Holds the in-memory draft, the navigation state from
//! [`wizflow_core::wizard`], and the [`UploadOrchestrator`] for the
//! source step. Field edits never touch the network; only file drops and
//! the final submit do.

use serde_json::Value;
use wizflow_core::types::DbId;
use wizflow_core::upload::UploadConfig;
use wizflow_core::wizard::{Advance, WizardProgress, WizardStep, WorkflowTemplate};
use wizflow_core::workflow::{
    validate, NewWorkflow, OutputFormat, ScheduleType, SourceType, Workflow, WorkflowPatch,
};

use crate::api::{ClientError, WorkflowApi};
use crate::upload::{AcceptedFile, LocalFile, UploadError, UploadOrchestrator};

/// One processing switch edited on the "Define Workflow" step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOption {
    AutoProcess(bool),
    SendNotifications(bool),
    ArchiveProcessed(bool),
    OutputFormat(OutputFormat),
}

/// Result of [`Wizard::complete_step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step was completed and the wizard moved forward.
    Advanced { from: u8, to: u8 },
    /// The draft was saved. The caller should leave the wizard.
    Submitted(Workflow),
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// The draft fails the workflow schema; nothing was sent.
    #[error("{}", .0.join(", "))]
    InvalidDraft(Vec<String>),

    /// Saving the draft failed. The draft is kept for another attempt.
    #[error("Failed to save workflow: {}", .0.message())]
    SubmitFailed(#[source] ClientError),

    #[error("Workflow has already been submitted")]
    AlreadySubmitted,
}

/// A wizard session.
#[derive(Debug)]
pub struct Wizard {
    draft: NewWorkflow,
    progress: WizardProgress,
    template: WorkflowTemplate,
    uploads: UploadOrchestrator,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// Start on step 1 with an empty draft: file source, manual schedule,
    /// default processing options.
    pub fn new() -> Self {
        Self::with_upload_config(UploadConfig::default())
    }

    pub fn with_upload_config(config: UploadConfig) -> Self {
        Self {
            draft: NewWorkflow::default(),
            progress: WizardProgress::new(),
            template: WorkflowTemplate::default(),
            uploads: UploadOrchestrator::new(config),
        }
    }

    // ---- read access ----

    pub fn draft(&self) -> &NewWorkflow {
        &self.draft
    }

    pub fn progress(&self) -> &WizardProgress {
        &self.progress
    }

    pub fn current_step(&self) -> WizardStep {
        self.progress.current_step()
    }

    pub fn template(&self) -> WorkflowTemplate {
        self.template
    }

    pub fn uploads(&self) -> &UploadOrchestrator {
        &self.uploads
    }

    pub fn is_submitted(&self) -> bool {
        self.progress.is_submitted()
    }

    /// Id of the workflow backing this draft, if files were already
    /// uploaded.
    pub async fn workflow_id(&self) -> Option<DbId> {
        self.uploads.workflow_id().await
    }

    pub async fn selected_files(&self) -> Vec<AcceptedFile> {
        self.uploads.selected_files().await
    }

    // ---- field edits ----

    pub fn select_template(&mut self, template: WorkflowTemplate) {
        self.template = template;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    /// A blank description clears the field.
    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.draft.description = (!description.trim().is_empty()).then_some(description);
    }

    /// Switching to a different source type drops the old type's config.
    pub fn set_source_type(&mut self, source_type: SourceType) {
        if self.draft.source.source_type != source_type {
            self.draft.source.source_type = source_type;
            self.draft.source.config.clear();
        }
    }

    pub fn set_source_config_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.draft.source.config.insert(key.into(), value.into());
    }

    pub fn set_processing_option(&mut self, option: ProcessingOption) {
        let options = &mut self.draft.processing_options;
        match option {
            ProcessingOption::AutoProcess(on) => options.auto_process = on,
            ProcessingOption::SendNotifications(on) => options.send_notifications = on,
            ProcessingOption::ArchiveProcessed(on) => options.archive_processed = on,
            ProcessingOption::OutputFormat(format) => options.output_format = format,
        }
    }

    /// Switching to a different schedule type drops the old type's config.
    pub fn set_schedule_type(&mut self, schedule_type: ScheduleType) {
        if self.draft.schedule.schedule_type != schedule_type {
            self.draft.schedule.schedule_type = schedule_type;
            self.draft.schedule.config.clear();
        }
    }

    pub fn set_schedule_config_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.draft.schedule.config.insert(key.into(), value.into());
    }

    // ---- navigation ----

    /// Jump to a completed step or stay on the current one. Returns
    /// `false` (and changes nothing) for any other step.
    pub fn go_to_step(&mut self, step: u8) -> bool {
        self.progress.go_to(step)
    }

    /// Complete the current step. On the last step the draft is saved:
    /// if file uploads already created a backing workflow it is updated
    /// with the draft, otherwise a new workflow is created.
    pub async fn complete_step(
        &mut self,
        api: &dyn WorkflowApi,
    ) -> Result<StepOutcome, WizardError> {
        match self.progress.advance() {
            Advance::Moved { from, to } => {
                tracing::debug!(from, to, "Wizard step completed");
                Ok(StepOutcome::Advanced { from, to })
            }
            Advance::Finished => Err(WizardError::AlreadySubmitted),
            Advance::ReadyToSubmit => self.submit(api).await,
        }
    }

    async fn submit(&mut self, api: &dyn WorkflowApi) -> Result<StepOutcome, WizardError> {
        let candidate = serde_json::to_value(&self.draft).unwrap_or(Value::Null);
        let report = validate(&candidate);
        if !report.is_valid {
            return Err(WizardError::InvalidDraft(report.errors));
        }

        let saved = match self.uploads.workflow_id().await {
            Some(id) => {
                let patch = WorkflowPatch::from(self.draft.clone());
                api.update_workflow(id, &patch).await
            }
            None => api.create_workflow(&self.draft).await,
        }
        .map_err(|err| {
            tracing::warn!(error = %err, "Workflow submit failed");
            WizardError::SubmitFailed(err)
        })?;

        self.uploads.adopt_workflow(saved.id).await;
        self.progress.mark_submitted();
        tracing::info!(workflow_id = saved.id, "Workflow submitted");
        Ok(StepOutcome::Submitted(saved))
    }

    // ---- files ----

    /// Hand a file drop to the upload orchestrator, creating the backing
    /// workflow from the current draft when needed.
    pub async fn files_selected(
        &self,
        api: &dyn WorkflowApi,
        files: Vec<LocalFile>,
    ) -> Result<Workflow, UploadError> {
        self.uploads
            .handle_files_selected(api, &self.draft, files)
            .await
    }
}
