//! Error types for the tracker library.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::{models::ProgressStatus, validation::FieldErrors};

/// Comprehensive error type for all tracker operations.
///
/// Business-rule variants (`StepIncomplete`, `StepRequired`, ...) are ordinary
/// outcomes that callers translate into user-facing responses. A
/// `ConcurrencyConflict` means the whole operation should be retried.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// No record exists for the given ID
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    /// No record exists for the given slug
    #[error("{entity} with slug '{slug}' not found")]
    SlugNotFound { entity: &'static str, slug: String },
    /// The process cannot be started right now
    #[error("Process {id} is unavailable: {reason}")]
    ProcessUnavailable { id: u64, reason: String },
    /// Submitted answers violate the form's field rules
    #[error("Validation failed: {errors}")]
    Validation { errors: FieldErrors },
    /// The current step must be completed or skipped before moving on
    #[error("Step {step_id} must be completed or skipped first")]
    StepIncomplete { step_id: u64 },
    /// Required steps cannot be skipped
    #[error("Step {step_id} is required and cannot be skipped")]
    StepRequired { step_id: u64 },
    /// The step was already completed and resubmission is disabled
    #[error("Step {step_id} is already completed")]
    AlreadyCompleted { step_id: u64 },
    /// The process cannot finish while required steps are open
    #[error("Required steps are not completed: {}", join_ids(.step_ids))]
    IncompleteRequiredSteps { step_ids: Vec<u64> },
    /// Navigation was requested on a free process
    #[error("Process {process_id} uses free navigation; step navigation is only available for linear processes")]
    LinearOnly { process_id: u64 },
    /// The progress record is terminal and cannot change
    #[error("Progress {id} is {status} and can no longer be modified")]
    ProgressClosed { id: u64, status: ProgressStatus },
    /// Lost a race against another writer; retry the whole operation
    #[error("Concurrency conflict: {message}")]
    ConcurrencyConflict { message: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    ///
    /// Lock contention (`SQLITE_BUSY`/`SQLITE_LOCKED`) that outlived the busy
    /// timeout becomes a [`TrackerError::ConcurrencyConflict`].
    pub fn with_source(self, source: rusqlite::Error) -> TrackerError {
        match source.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                TrackerError::ConcurrencyConflict {
                    message: format!("{}: database is locked", self.message),
                }
            }
            _ => TrackerError::Database {
                message: self.message,
                source,
            },
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> TrackerError {
        TrackerError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl TrackerError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::ConcurrencyConflict { .. })
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| TrackerError::database(message).with_source(e))
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
