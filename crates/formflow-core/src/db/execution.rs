//! Visitor-side transitions of progress records.
//!
//! Every mutation opens an `IMMEDIATE` transaction, loads the record through
//! [`ProgressState`], applies one transition and saves it with a version
//! check. Rejected transitions roll back without writing.

use jiff::Timestamp;
use rusqlite::{params, TransactionBehavior};

use crate::{
    error::{DatabaseResultExt, Result, TrackerError},
    models::{
        Answers, Completed, CompletionResult, CompletionStatus, Navigation, Process, Progress,
        ProgressStatus, StepDescriptor, SubmissionStatus, Visibility, Visitor,
    },
    state::{Advanced, ProgressState},
    validation::FormValidator,
};

const INSERT_PROGRESS_SQL: &str = "INSERT INTO process_progress (process_id, session_id, user_id, status, current_step_index, completion_percentage, version, started_at, last_activity_at) VALUES (?1, ?2, ?3, 'in_progress', 0, 0, 0, ?4, ?4)";
const INSERT_PENDING_SQL: &str = "INSERT INTO step_completions (progress_id, step_id, status, created_at, updated_at) VALUES (?1, ?2, 'pending', ?3, ?3)";

/// Why a process cannot be started, if it cannot.
fn unavailability(process: &Process) -> Option<&'static str> {
    if !process.is_active {
        Some("process is inactive")
    } else if !process.is_published() {
        Some("process is not published")
    } else if process.steps.is_empty() {
        Some("process has no steps")
    } else {
        None
    }
}

fn check_expected(state: &ProgressState, expected_version: Option<u64>) -> Result<()> {
    match expected_version {
        Some(expected) if expected != state.progress.version => {
            Err(TrackerError::ConcurrencyConflict {
                message: format!(
                    "Progress {} is at version {}, expected {expected}",
                    state.progress.id, state.progress.version
                ),
            })
        }
        _ => Ok(()),
    }
}

fn describe(state: &ProgressState) -> Option<StepDescriptor> {
    let step = state.current_step()?;
    Some(StepDescriptor {
        progress_id: state.progress.id,
        index: state.progress.current_step_index,
        total_steps: state.total_steps(),
        step: step.clone(),
        status: state.status_of(step.id),
        completion_percentage: state.progress.completion_percentage,
        version: state.progress.version,
    })
}

fn no_current_step(progress_id: u64) -> TrackerError {
    TrackerError::NotFound {
        entity: "Current step of progress",
        id: progress_id,
    }
}

fn completed(progress: &Progress) -> Completed {
    Completed {
        progress_id: progress.id,
        completed_at: progress.completed_at.unwrap_or(progress.last_activity_at),
        completion_percentage: progress.completion_percentage,
    }
}

impl super::Database {
    /// Starts a process for a visitor, or resumes the visitor's open record.
    pub fn start_progress(
        &mut self,
        process_id: u64,
        visitor: &Visitor,
        password: Option<&str>,
        now: Timestamp,
    ) -> Result<Progress> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let process = Self::query_process(&tx, process_id)?.ok_or(TrackerError::NotFound {
            entity: "Process",
            id: process_id,
        })?;

        if let Some(reason) = unavailability(&process) {
            return Err(TrackerError::ProcessUnavailable {
                id: process_id,
                reason: reason.to_string(),
            });
        }
        if process.visibility == Visibility::Private
            && !Self::verify_password(&tx, process_id, password)?
        {
            return Err(TrackerError::ProcessUnavailable {
                id: process_id,
                reason: "a valid access password is required".to_string(),
            });
        }

        if let Some(mut existing) = Self::query_open_progress(&tx, process_id, &visitor.session_id)? {
            existing.last_activity_at = now;
            existing.version = Self::save_progress(&tx, &existing, existing.version)?;
            tx.commit().db_context("Failed to commit transaction")?;
            log::debug!(
                "Resumed progress {} for session {}",
                existing.id,
                visitor.session_id
            );
            return Ok(existing);
        }

        let now_str = now.to_string();
        tx.execute(
            INSERT_PROGRESS_SQL,
            params![
                process_id as i64,
                &visitor.session_id,
                visitor.user_id.as_deref(),
                &now_str
            ],
        )
        .db_context("Failed to insert progress")?;
        let id = tx.last_insert_rowid() as u64;

        for step in &process.steps {
            tx.execute(INSERT_PENDING_SQL, params![id as i64, step.id as i64, &now_str])
                .db_context("Failed to insert step completion")?;
        }

        tx.commit().db_context("Failed to commit transaction")?;
        log::debug!(
            "Started progress {id} on process {process_id} for session {}",
            visitor.session_id
        );

        Ok(Progress {
            id,
            process_id,
            session_id: visitor.session_id.clone(),
            user_id: visitor.user_id.clone(),
            status: ProgressStatus::InProgress,
            current_step_index: 0,
            completion_percentage: 0.0,
            version: 0,
            started_at: now,
            last_activity_at: now,
            completed_at: None,
        })
    }

    /// The step at the record's current index.
    pub fn current_step(&self, progress_id: u64) -> Result<StepDescriptor> {
        let state = Self::load_state(&self.connection, progress_id)?;
        if state.progress.status.is_terminal() {
            return Err(no_current_step(progress_id));
        }
        describe(&state).ok_or_else(|| no_current_step(progress_id))
    }

    /// Moves a linear record to its next step.
    pub fn advance_progress(
        &mut self,
        progress_id: u64,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<Navigation> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let mut state = Self::load_state(&tx, progress_id)?;
        check_expected(&state, expected_version)?;
        let version = state.progress.version;

        let outcome = state.advance(now)?;
        state.progress.version = Self::save_progress(&tx, &state.progress, version)?;
        tx.commit().db_context("Failed to commit transaction")?;

        match outcome {
            Advanced::Moved => {
                log::debug!(
                    "Progress {progress_id} advanced to step index {}",
                    state.progress.current_step_index
                );
                describe(&state)
                    .map(Navigation::Step)
                    .ok_or_else(|| no_current_step(progress_id))
            }
            Advanced::Finished => {
                log::info!("Progress {progress_id} completed");
                Ok(Navigation::Completed(completed(&state.progress)))
            }
        }
    }

    /// Moves a linear record back one step. A no-op at the first step.
    pub fn retreat_progress(
        &mut self,
        progress_id: u64,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<StepDescriptor> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let mut state = Self::load_state(&tx, progress_id)?;
        check_expected(&state, expected_version)?;
        let version = state.progress.version;

        if state.retreat(now)? {
            state.progress.version = Self::save_progress(&tx, &state.progress, version)?;
            tx.commit().db_context("Failed to commit transaction")?;
        }

        describe(&state).ok_or_else(|| no_current_step(progress_id))
    }

    /// Completes a step with answers, creating or updating its submission.
    pub fn complete_step(
        &mut self,
        progress_id: u64,
        step_id: u64,
        answers: &Answers,
        validator: &dyn FormValidator,
        now: Timestamp,
    ) -> Result<CompletionResult> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let mut state = Self::load_state(&tx, progress_id)?;
        state.ensure_open()?;
        let step = state.step(step_id)?.clone();
        state.check_order(&step)?;

        let fields = Self::query_fields(&tx, step.form_id)?;
        let cleaned = validator
            .validate(&fields, answers)
            .map_err(|errors| TrackerError::Validation { errors })?;

        let existing = Self::query_completion(&tx, progress_id, step_id)?;
        let submission_id = match existing {
            Some(ref completion) if completion.status == CompletionStatus::Completed => {
                let previous = match completion.submission_id {
                    Some(id) => Self::query_submission(&tx, id)?,
                    None => None,
                };
                let unchanged = previous.as_ref().map_or(cleaned.is_empty(), |s| {
                    s.answers == cleaned
                });

                if unchanged {
                    return Ok(CompletionResult {
                        progress_id,
                        step_id,
                        status: CompletionStatus::Completed,
                        submission_id: completion.submission_id,
                        completed_at: completion.completed_at,
                        completion_percentage: state.progress.completion_percentage,
                        unchanged: true,
                    });
                }
                if !state.process.allow_resubmission {
                    return Err(TrackerError::AlreadyCompleted { step_id });
                }

                match previous {
                    Some(submission) => {
                        Self::resubmit(&tx, submission.id, &cleaned, now)?;
                        submission.id
                    }
                    None => Self::insert_submission(
                        &tx,
                        step.form_id,
                        Some(progress_id),
                        &state.progress.session_id,
                        SubmissionStatus::Submitted,
                        &cleaned,
                        now,
                    )?,
                }
            }
            _ => Self::insert_submission(
                &tx,
                step.form_id,
                Some(progress_id),
                &state.progress.session_id,
                SubmissionStatus::Submitted,
                &cleaned,
                now,
            )?,
        };

        Self::upsert_completion(
            &tx,
            progress_id,
            step_id,
            Some(submission_id),
            CompletionStatus::Completed,
            Some(now),
            now,
        )?;

        let version = state.progress.version;
        state.record(step_id, CompletionStatus::Completed, now);
        state.progress.version = Self::save_progress(&tx, &state.progress, version)?;
        tx.commit().db_context("Failed to commit transaction")?;

        log::debug!("Progress {progress_id} completed step {step_id} with submission {submission_id}");
        Ok(CompletionResult {
            progress_id,
            step_id,
            status: CompletionStatus::Completed,
            submission_id: Some(submission_id),
            completed_at: Some(now),
            completion_percentage: state.progress.completion_percentage,
            unchanged: false,
        })
    }

    /// Skips an optional step.
    pub fn skip_step(
        &mut self,
        progress_id: u64,
        step_id: u64,
        now: Timestamp,
    ) -> Result<CompletionResult> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let mut state = Self::load_state(&tx, progress_id)?;
        state.ensure_open()?;
        let step = state.step(step_id)?.clone();
        if step.is_required {
            return Err(TrackerError::StepRequired { step_id });
        }

        match state.status_of(step_id) {
            CompletionStatus::Completed => return Err(TrackerError::AlreadyCompleted { step_id }),
            CompletionStatus::Skipped => {
                let existing = Self::query_completion(&tx, progress_id, step_id)?;
                return Ok(CompletionResult {
                    progress_id,
                    step_id,
                    status: CompletionStatus::Skipped,
                    submission_id: None,
                    completed_at: existing.and_then(|c| c.completed_at),
                    completion_percentage: state.progress.completion_percentage,
                    unchanged: true,
                });
            }
            CompletionStatus::Pending => {}
        }
        state.check_order(&step)?;

        Self::upsert_completion(
            &tx,
            progress_id,
            step_id,
            None,
            CompletionStatus::Skipped,
            Some(now),
            now,
        )?;

        let version = state.progress.version;
        state.record(step_id, CompletionStatus::Skipped, now);
        state.progress.version = Self::save_progress(&tx, &state.progress, version)?;
        tx.commit().db_context("Failed to commit transaction")?;

        log::debug!("Progress {progress_id} skipped step {step_id}");
        Ok(CompletionResult {
            progress_id,
            step_id,
            status: CompletionStatus::Skipped,
            submission_id: None,
            completed_at: Some(now),
            completion_percentage: state.progress.completion_percentage,
            unchanged: false,
        })
    }

    /// Finishes a record once every required step is resolved.
    ///
    /// Finishing an already completed record returns its completion.
    pub fn complete_progress(&mut self, progress_id: u64, now: Timestamp) -> Result<Completed> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let mut state = Self::load_state(&tx, progress_id)?;
        if state.progress.status == ProgressStatus::Completed {
            return Ok(completed(&state.progress));
        }

        let version = state.progress.version;
        state.finish(now)?;
        state.progress.version = Self::save_progress(&tx, &state.progress, version)?;
        tx.commit().db_context("Failed to commit transaction")?;

        log::info!("Progress {progress_id} completed");
        Ok(completed(&state.progress))
    }
}
