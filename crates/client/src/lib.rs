//! Client side of the workflow wizard: a typed REST client, the upload
//! orchestrator that lazily creates a backing workflow before attaching
//! files, and the four-step wizard driver.

pub mod api;
pub mod upload;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ClientConfig, ClientError, WorkflowApi, WorkflowClient};
pub use upload::{LocalFile, UploadError, UploadOrchestrator};
pub use wizard::{StepOutcome, Wizard, WizardError};
