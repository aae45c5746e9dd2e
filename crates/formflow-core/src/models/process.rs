//! Process and step definitions.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{NavigationMode, Visibility};

/// A named, ordered workflow of form-backed steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Process {
    /// Unique identifier for the process
    pub id: u64,

    pub title: String,

    /// Unique, URL-safe identifier
    pub slug: String,

    pub description: Option<String>,

    /// Linear or free navigation between steps
    pub mode: NavigationMode,

    pub visibility: Visibility,

    /// Whether an access password is set (the hash never leaves storage)
    #[serde(default)]
    pub password_protected: bool,

    /// Soft-disable switch; inactive processes cannot be started
    pub is_active: bool,

    /// Whether a completed step may be submitted again with new answers
    #[serde(default)]
    pub allow_resubmission: bool,

    /// Set while the process is published
    pub published_at: Option<Timestamp>,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,

    /// Steps ordered by position (lazy-loaded)
    #[serde(default)]
    pub steps: Vec<ProcessStep>,
}

impl Process {
    /// Whether the process is published.
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// IDs of the steps that must be resolved before the process can finish.
    pub fn required_step_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.steps.iter().filter(|s| s.is_required).map(|s| s.id)
    }
}

/// One stage of a process, bound to exactly one form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessStep {
    pub id: u64,

    pub process_id: u64,

    pub form_id: u64,

    pub title: String,

    pub description: Option<String>,

    /// Position within the process (0-indexed, dense)
    pub order: u32,

    /// Optional steps may be skipped
    pub is_required: bool,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}
