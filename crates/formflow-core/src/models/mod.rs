//! Data models for forms, processes, progress and submissions.
//!
//! Definitions ([`Form`], [`Process`], [`ProcessStep`]) are owned by process
//! administrators. Runtime state ([`Progress`], [`StepCompletion`],
//! [`Submission`]) belongs to visitors. Display implementations live in
//! [`crate::display::models`] and render every model as markdown.
//!
//! # Examples
//!
//! ```rust
//! use formflow_core::models::{NavigationMode, Process, Visibility};
//! use jiff::Timestamp;
//!
//! let process = Process {
//!     id: 1,
//!     title: "Onboarding".to_string(),
//!     slug: "onboarding".to_string(),
//!     description: None,
//!     mode: NavigationMode::Linear,
//!     visibility: Visibility::Public,
//! #   password_protected: false,
//! #   is_active: true,
//! #   allow_resubmission: false,
//! #   published_at: None,
//! #   created_at: Timestamp::now(),
//! #   updated_at: Timestamp::now(),
//! #   steps: vec![],
//! };
//! assert!(!process.is_published());
//! println!("{}", process);
//! ```

pub mod analytics;
pub mod filters;
pub mod form;
pub mod outcomes;
pub mod process;
pub mod progress;
pub mod requests;
pub mod status;
pub mod submission;

#[cfg(test)]
mod tests;

pub use analytics::{
    AbandonedProgress, ActivityOverTime, ChoiceCount, CompletionRate, CompletionTimes, DailyCount,
    DropOffReport, FieldAggregation, FieldSummary, FormDropOff, FormOverview, StepDropOff,
};
pub use filters::{Page, ProgressFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use form::{FieldKind, Form, FormField};
pub use outcomes::{Completed, CompletionResult, Navigation, StepDescriptor};
pub use process::{Process, ProcessStep};
pub use progress::{LedgerEntry, Progress, ProgressDetail, ProgressSummary, StepCompletion, Visitor};
pub use requests::{UpdateProcessRequest, UpdateStepRequest};
pub use status::{CompletionStatus, NavigationMode, ProgressStatus, SubmissionStatus, Visibility};
pub use submission::{Answers, Submission};
