//! Values returned by progress operations.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{CompletionStatus, ProcessStep};

/// The step a visitor is currently on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDescriptor {
    pub progress_id: u64,
    /// Position of the step within the process
    pub index: u32,
    pub total_steps: u32,
    pub step: ProcessStep,
    /// Ledger status of the step for this visitor
    pub status: CompletionStatus,
    pub completion_percentage: f64,
    /// Version to pass back for compare-and-swap navigation
    pub version: u64,
}

/// A finished progress record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Completed {
    pub progress_id: u64,
    pub completed_at: Timestamp,
    pub completion_percentage: f64,
}

/// Where a navigation call left the visitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Navigation {
    Step(StepDescriptor),
    Completed(Completed),
}

impl Navigation {
    /// The step descriptor, unless the process finished.
    pub fn step(&self) -> Option<&StepDescriptor> {
        match self {
            Navigation::Step(descriptor) => Some(descriptor),
            Navigation::Completed(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Navigation::Completed(_))
    }
}

/// Result of completing or skipping a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionResult {
    pub progress_id: u64,
    pub step_id: u64,
    pub status: CompletionStatus,
    pub submission_id: Option<u64>,
    pub completed_at: Option<Timestamp>,
    pub completion_percentage: f64,
    /// True when the call repeated an earlier identical completion
    pub unchanged: bool,
}
