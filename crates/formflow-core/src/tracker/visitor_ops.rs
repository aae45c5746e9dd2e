//! Visitor operations: the progress state machine behind async calls.
//!
//! Every mutation runs in a single write transaction. A
//! [`TrackerError::ConcurrencyConflict`] means another writer touched the
//! record first; retrying the whole call is always safe.

use super::Tracker;
use crate::{
    error::{Result, TrackerError},
    models::{Completed, CompletionResult, Navigation, Progress, StepDescriptor},
    params::{CompleteStep, Id, Navigate, SkipStep, StartProcess},
};

impl Tracker {
    /// Starts a process for a visitor.
    ///
    /// A visitor that already has an in-progress record for the process gets
    /// that record back with its activity refreshed.
    ///
    /// # Errors
    ///
    /// * `TrackerError::ProcessUnavailable` - Inactive, unpublished or empty
    ///   process, or a missing or wrong password on a private one
    /// * `TrackerError::InvalidInput` - Blank session ID
    pub async fn start(&self, params: &StartProcess) -> Result<Progress> {
        if params.visitor.session_id.trim().is_empty() {
            return Err(TrackerError::invalid_input("session_id")
                .with_reason("Session ID cannot be empty"));
        }

        let process_id = params.process_id;
        let visitor = params.visitor.clone();
        let password = params.password.clone();
        let now = self.now();

        self.with_db(move |db| db.start_progress(process_id, &visitor, password.as_deref(), now))
            .await
    }

    /// The step the visitor is currently on.
    pub async fn get_current_step(&self, params: &Id) -> Result<StepDescriptor> {
        let progress_id = params.id;
        self.with_db(move |db| db.current_step(progress_id)).await
    }

    /// Moves a linear process forward; past the last step it completes.
    pub async fn advance(&self, params: &Navigate) -> Result<Navigation> {
        let progress_id = params.progress_id;
        let expected_version = params.expected_version;
        let now = self.now();
        self.with_db(move |db| db.advance_progress(progress_id, expected_version, now))
            .await
    }

    /// Moves a linear process back one step. Does nothing on the first step.
    pub async fn retreat(&self, params: &Navigate) -> Result<StepDescriptor> {
        let progress_id = params.progress_id;
        let expected_version = params.expected_version;
        let now = self.now();
        self.with_db(move |db| db.retreat_progress(progress_id, expected_version, now))
            .await
    }

    /// Validates and records the answers for one step.
    ///
    /// Repeating a completion with identical answers changes nothing and
    /// reports `unchanged`.
    pub async fn complete_step(&self, params: &CompleteStep) -> Result<CompletionResult> {
        let progress_id = params.progress_id;
        let step_id = params.step_id;
        let answers = params.answers.clone();
        let validator = self.validator.clone();
        let now = self.now();

        self.with_db(move |db| {
            db.complete_step(progress_id, step_id, &answers, validator.as_ref(), now)
        })
        .await
    }

    /// Skips an optional step.
    pub async fn skip_step(&self, params: &SkipStep) -> Result<CompletionResult> {
        let progress_id = params.progress_id;
        let step_id = params.step_id;
        let now = self.now();
        self.with_db(move |db| db.skip_step(progress_id, step_id, now))
            .await
    }

    /// Finishes a process once every required step is completed.
    pub async fn complete(&self, params: &Id) -> Result<Completed> {
        let progress_id = params.id;
        let now = self.now();
        self.with_db(move |db| db.complete_progress(progress_id, now))
            .await
    }
}
