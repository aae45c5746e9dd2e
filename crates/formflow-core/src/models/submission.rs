//! Form submissions.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::SubmissionStatus;

/// Raw answers keyed by field ID, as supplied by a visitor.
pub type Answers = BTreeMap<u64, serde_json::Value>;

/// Answers collected for one form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: u64,
    pub form_id: u64,
    /// Set when the submission belongs to a process step
    pub progress_id: Option<u64>,
    pub session_id: String,
    pub status: SubmissionStatus,
    pub answers: Answers,
    pub submitted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
