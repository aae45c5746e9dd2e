//! Result wrapper types for displaying operation outcomes.
//!
//! This module provides wrapper types that format the results of create, update,
//! and delete operations with consistent messaging and resource display.

use std::fmt;

use crate::models::{Form, FormField, Process, ProcessStep, Submission};

/// Resources that the result wrappers know how to announce.
pub trait Resource: fmt::Display {
    /// Lowercase noun used in messages, e.g. "process".
    const KIND: &'static str;

    fn id(&self) -> u64;

    /// Human label for deletion messages.
    fn label(&self) -> &str;
}

impl Resource for Form {
    const KIND: &'static str = "form";

    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl Resource for FormField {
    const KIND: &'static str = "field";

    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl Resource for Process {
    const KIND: &'static str = "process";

    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl Resource for ProcessStep {
    const KIND: &'static str = "step";

    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl Resource for Submission {
    const KIND: &'static str = "submission";

    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.session_id
    }
}

/// Wrapper type for displaying the result of create operations.
///
/// # Examples
///
/// ```rust
/// use formflow_core::{display::CreateResult, models::Form};
/// use jiff::Timestamp;
///
/// let form = Form {
///     id: 3,
///     title: "Contact".to_string(),
///     slug: "contact".to_string(),
///     description: None,
///     is_active: true,
///     created_at: Timestamp::now(),
///     updated_at: Timestamp::now(),
///     fields: vec![],
/// };
///
/// let output = CreateResult::new(form).to_string();
/// assert!(output.starts_with("Created form with ID: 3"));
/// ```
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    /// Create a new CreateResult wrapper.
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl<T: Resource> fmt::Display for CreateResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created {} with ID: {}", T::KIND, self.resource.id())?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying the result of update operations, optionally
/// listing what changed.
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    /// Create a new UpdateResult wrapper.
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    /// Create an UpdateResult with a list of changes made.
    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }
}

impl<T: Resource> fmt::Display for UpdateResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated {} with ID: {}", T::KIND, self.resource.id())?;

        if !self.changes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
        }

        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying the result of delete operations.
pub struct DeleteResult<T> {
    pub resource: T,
}

impl<T> DeleteResult<T> {
    /// Create a new DeleteResult wrapper.
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl<T: Resource> fmt::Display for DeleteResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted {} '{}' (ID: {})",
            T::KIND,
            self.resource.label(),
            self.resource.id()
        )
    }
}
