//! Parameter structures for tracker operations.
//!
//! These structures are shared by every interface (CLI, MCP) and carry only
//! serde derives, plus JSON schemas behind the `schema` feature. Interface
//! layers wrap them with their own framework derives and convert with
//! `From`/`.into()`:
//!
//! ```ignore
//! // In the CLI crate
//! #[derive(Args)]
//! pub struct SkipArgs {
//!     pub progress_id: u64,
//!     pub step_id: u64,
//! }
//!
//! impl From<SkipArgs> for SkipStep {
//!     fn from(args: SkipArgs) -> Self {
//!         SkipStep { progress_id: args.progress_id, step_id: args.step_id }
//!     }
//! }
//! ```

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{Answers, FieldKind, ProgressStatus, SubmissionStatus, Visitor};

fn default_true() -> bool {
    true
}

/// Generic parameters for operations requiring just an ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Id {
    /// The ID of the resource to operate on
    pub id: u64,
}

/// Lookup by slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Slug {
    pub slug: String,
}

/// Parameters for creating a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CreateForm {
    pub title: String,
    /// Unique slug; derived from the title when omitted
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Parameters for appending a field to a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct AddField {
    pub form_id: u64,
    pub label: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    /// Field type with its validation rules
    pub kind: FieldKind,
}

/// Parameters for creating a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CreateProcess {
    pub title: String,
    /// Unique slug; derived from the title when omitted
    pub slug: Option<String>,
    pub description: Option<String>,
    /// "linear" (default) or "free"
    pub mode: Option<String>,
    /// "public" (default) or "private"
    pub visibility: Option<String>,
    #[serde(default)]
    pub allow_resubmission: bool,
}

/// Parameters for updating a process; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct UpdateProcess {
    pub id: u64,
    pub title: Option<String>,
    /// New description; blank text clears it
    pub description: Option<String>,
    pub mode: Option<String>,
    pub visibility: Option<String>,
    pub allow_resubmission: Option<bool>,
}

/// Parameters for listing processes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListProcesses {
    /// Include deactivated processes
    #[serde(default)]
    pub include_inactive: bool,
}

/// Sets or clears the access password of a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SetPassword {
    pub id: u64,
    /// New password; `None` removes the password
    pub password: Option<String>,
}

/// Parameters for appending a step to a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct AddStep {
    pub process_id: u64,
    /// Form whose fields the step collects
    pub form_id: u64,
    pub title: String,
    pub description: Option<String>,
    /// Optional steps may be skipped (defaults to required)
    #[serde(default = "default_true")]
    pub is_required: bool,
}

/// Parameters for inserting a step at a position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct InsertStep {
    #[serde(flatten)]
    pub step: AddStep,
    /// 0-indexed position; later steps shift down
    pub position: u32,
}

/// Parameters for updating a step; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct UpdateStep {
    pub id: u64,
    pub title: Option<String>,
    /// New description; blank text clears it
    pub description: Option<String>,
    pub is_required: Option<bool>,
    pub form_id: Option<u64>,
}

/// Parameters for swapping the order of two steps of the same process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SwapSteps {
    pub step1_id: u64,
    pub step2_id: u64,
}

/// Parameters for starting (or resuming) a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct StartProcess {
    pub process_id: u64,
    #[serde(flatten)]
    pub visitor: Visitor,
    /// Access password for private processes
    pub password: Option<String>,
}

/// Parameters for linear navigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Navigate {
    pub progress_id: u64,
    /// Fails with a concurrency conflict unless the record is at this version
    pub expected_version: Option<u64>,
}

/// Parameters for completing a step with answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CompleteStep {
    pub progress_id: u64,
    pub step_id: u64,
    /// Answers keyed by field ID
    #[serde(default)]
    pub answers: Answers,
}

/// Parameters for skipping an optional step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SkipStep {
    pub progress_id: u64,
    pub step_id: u64,
}

/// Parameters for listing the progress records of a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListProgress {
    pub process_id: u64,
    pub status: Option<ProgressStatus>,
    pub session_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Looks up the latest progress record of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct FindProgress {
    pub process_id: u64,
    pub session_id: String,
}

/// Parameters for a standalone form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SubmitForm {
    pub form_id: u64,
    pub session_id: String,
    #[serde(default)]
    pub answers: Answers,
    /// Save as a draft without validating required fields
    #[serde(default)]
    pub draft: bool,
}

/// Parameters for listing the submissions of a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListSubmissions {
    pub form_id: u64,
    pub status: Option<SubmissionStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Records that a session viewed a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct TrackView {
    pub process_id: u64,
    pub session_id: String,
}

/// Records that a session viewed a standalone form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct TrackFormView {
    pub form_id: u64,
    pub session_id: String,
}

/// Parameters for the daily activity series of a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ActivityWindow {
    pub process_id: u64,
    /// Days to cover, today included (1-365, default 30)
    pub days: Option<u32>,
}

/// Parameters for per-field answer summaries of a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct FieldReport {
    pub form_id: u64,
    /// Only summarize this field
    pub field_id: Option<u64>,
}
