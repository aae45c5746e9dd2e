//! Progress records and the per-step completion ledger.

use jiff::Timestamp;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{CompletionStatus, ProgressStatus};

/// Identity of whoever is traversing a process, resolved by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Visitor {
    /// Anonymous session token (always present)
    pub session_id: String,
    /// Authenticated user, when known
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Visitor {
    /// An anonymous visitor identified by session only.
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
        }
    }
}

/// One visitor's traversal of a process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    pub id: u64,
    pub process_id: u64,
    pub session_id: String,
    pub user_id: Option<String>,
    pub status: ProgressStatus,
    /// Index into the ordered steps; equals the step count once completed
    /// through navigation
    pub current_step_index: u32,
    /// 0.00 to 100.00
    pub completion_percentage: f64,
    /// Bumped on every mutation; used for compare-and-swap updates
    pub version: u64,
    pub started_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// Recorded outcome of one step for one progress record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepCompletion {
    pub id: u64,
    pub progress_id: u64,
    pub step_id: u64,
    pub submission_id: Option<u64>,
    pub status: CompletionStatus,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Compact progress information for owner listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressSummary {
    pub id: u64,
    pub session_id: String,
    pub user_id: Option<String>,
    pub status: ProgressStatus,
    pub current_step_index: u32,
    pub completion_percentage: f64,
    pub started_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl From<&Progress> for ProgressSummary {
    fn from(progress: &Progress) -> Self {
        Self {
            id: progress.id,
            session_id: progress.session_id.clone(),
            user_id: progress.user_id.clone(),
            status: progress.status,
            current_step_index: progress.current_step_index,
            completion_percentage: progress.completion_percentage,
            started_at: progress.started_at,
            last_activity_at: progress.last_activity_at,
            completed_at: progress.completed_at,
        }
    }
}

/// A progress record together with its ledger, in step order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressDetail {
    pub progress: Progress,
    pub process_title: String,
    pub entries: Vec<LedgerEntry>,
}

/// Ledger row joined with the step it describes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub step_id: u64,
    pub step_title: String,
    pub order: u32,
    pub is_required: bool,
    pub status: CompletionStatus,
    pub completed_at: Option<Timestamp>,
    pub submission_id: Option<u64>,
}
