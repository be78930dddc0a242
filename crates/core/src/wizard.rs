//! Workflow wizard step definitions and navigation rules.
//!
//! The wizard is a linear four-step flow. Users may revisit any completed
//! step or stay on the current one, but never jump past the first
//! incomplete step. The final step submits the draft; the driver that
//! performs the submission lives in the client crate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// The four steps in the workflow wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectTemplate,
    ConfigureSources,
    DefineWorkflow,
    SaveSchedule,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 4;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 4;

impl WizardStep {
    /// Convert a 1-based step number to a `WizardStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::SelectTemplate),
            2 => Ok(Self::ConfigureSources),
            3 => Ok(Self::DefineWorkflow),
            4 => Ok(Self::SaveSchedule),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::SelectTemplate => 1,
            Self::ConfigureSources => 2,
            Self::DefineWorkflow => 3,
            Self::SaveSchedule => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SelectTemplate => "Select Template",
            Self::ConfigureSources => "Configure Sources",
            Self::DefineWorkflow => "Define Workflow",
            Self::SaveSchedule => "Save & Schedule",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SelectTemplate => "Choose a workflow template",
            Self::ConfigureSources => "Set up input data sources",
            Self::DefineWorkflow => "Set processing options",
            Self::SaveSchedule => "Schedule and activate",
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Starting point chosen on step 1. Held by the wizard only, never
/// persisted with the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowTemplate {
    #[default]
    Basic,
    Advanced,
}

impl WorkflowTemplate {
    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic Workflow",
            Self::Advanced => "Advanced Workflow",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Basic => "A simple workflow for beginners",
            Self::Advanced => "More options for power users",
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Result of completing the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The step was marked completed and the wizard moved forward.
    Moved { from: u8, to: u8 },
    /// The current step is the last one; the draft must be submitted.
    ReadyToSubmit,
    /// The wizard was already submitted; nothing changed.
    Finished,
}

/// Position of a wizard session: current step, completed set, and whether
/// the draft has been submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardProgress {
    current: u8,
    completed: BTreeSet<u8>,
    submitted: bool,
}

impl Default for WizardProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardProgress {
    /// Start on step 1 with nothing completed.
    pub fn new() -> Self {
        Self {
            current: MIN_STEP,
            completed: BTreeSet::new(),
            submitted: false,
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn current_step(&self) -> WizardStep {
        // `current` only ever holds values in MIN_STEP..=MAX_STEP.
        WizardStep::from_number(self.current).unwrap_or(WizardStep::SaveSchedule)
    }

    pub fn completed(&self) -> &BTreeSet<u8> {
        &self.completed
    }

    pub fn is_completed(&self, step: u8) -> bool {
        self.completed.contains(&step)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// A step may be visited if it is already completed or is the current
    /// step. Nothing is navigable once the draft has been submitted.
    pub fn can_go_to(&self, step: u8) -> bool {
        !self.submitted && (self.completed.contains(&step) || step == self.current)
    }

    /// Move to `step` if allowed. Returns whether the position changed or
    /// was confirmed; a disallowed step leaves the state untouched.
    pub fn go_to(&mut self, step: u8) -> bool {
        if !self.can_go_to(step) {
            return false;
        }
        self.current = step;
        true
    }

    /// Complete the current step. Below the last step this marks it
    /// completed (idempotently) and moves forward one; on the last step it
    /// only reports that a submission is due.
    pub fn advance(&mut self) -> Advance {
        if self.submitted {
            return Advance::Finished;
        }
        if self.current >= MAX_STEP {
            return Advance::ReadyToSubmit;
        }
        let from = self.current;
        self.completed.insert(from);
        self.current = from + 1;
        Advance::Moved {
            from,
            to: self.current,
        }
    }

    /// Record a successful submission of the final step.
    pub fn mark_submitted(&mut self) {
        self.completed.insert(MAX_STEP);
        self.submitted = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
