//! Status and mode enumerations for processes, progress and submissions.

use std::str::FromStr;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a visitor may move between the steps of a process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Steps are completed in ascending order with explicit next/previous
    #[default]
    Linear,

    /// Steps may be completed in any order
    Free,
}

impl FromStr for NavigationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(NavigationMode::Linear),
            "free" => Ok(NavigationMode::Free),
            _ => Err(format!("Invalid navigation mode: {s}")),
        }
    }
}

impl NavigationMode {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationMode::Linear => "linear",
            NavigationMode::Free => "free",
        }
    }
}

/// Who may open a process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,

    /// Requires the access password when one is set
    Private,
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(format!("Invalid visibility: {s}")),
        }
    }
}

impl Visibility {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// Lifecycle of a visitor's traversal of a process.
///
/// `Completed` and `Abandoned` are absorbing: nothing transitions out of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_progress" | "inprogress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            "abandoned" => Ok(ProgressStatus::Abandoned),
            _ => Err(format!("Invalid progress status: {s}")),
        }
    }
}

impl ProgressStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Abandoned => "abandoned",
        }
    }

    /// Whether the status is absorbing.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressStatus::InProgress)
    }
}

/// Outcome of one step for one progress record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Pending,
    Completed,
    Skipped,
}

impl FromStr for CompletionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CompletionStatus::Pending),
            "completed" => Ok(CompletionStatus::Completed),
            "skipped" => Ok(CompletionStatus::Skipped),
            _ => Err(format!("Invalid completion status: {s}")),
        }
    }
}

impl CompletionStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Pending => "pending",
            CompletionStatus::Completed => "completed",
            CompletionStatus::Skipped => "skipped",
        }
    }

    /// Completed or skipped; either one lets a linear process move on.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, CompletionStatus::Pending)
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// ```rust
    /// use formflow_core::models::CompletionStatus;
    ///
    /// assert_eq!(CompletionStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(CompletionStatus::Skipped.with_icon(), "↷ Skipped");
    /// assert_eq!(CompletionStatus::Pending.with_icon(), "○ Pending");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "✓ Completed",
            CompletionStatus::Skipped => "↷ Skipped",
            CompletionStatus::Pending => "○ Pending",
        }
    }
}

/// Lifecycle of a form submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Draft,
    Submitted,
    Archived,
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(SubmissionStatus::Draft),
            "submitted" => Ok(SubmissionStatus::Submitted),
            "archived" => Ok(SubmissionStatus::Archived),
            _ => Err(format!("Invalid submission status: {s}")),
        }
    }
}

impl SubmissionStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Archived => "archived",
        }
    }
}
