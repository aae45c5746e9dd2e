//! Progress state machine.
//!
//! [`ProgressState`] holds one progress record together with its process and
//! ledger, and applies every transition in memory. The database layer loads
//! it inside a write transaction, calls one transition, and persists the
//! result with a compare-and-swap on the record's version.

use std::collections::BTreeMap;

use jiff::Timestamp;

use crate::{
    error::{Result, TrackerError},
    models::{
        analytics::round2, CompletionStatus, NavigationMode, Process, ProcessStep, Progress,
        ProgressStatus,
    },
};

#[derive(Debug, Clone)]
pub(crate) struct ProgressState {
    /// Process with its steps in order
    pub process: Process,
    pub progress: Progress,
    /// Ledger status by step ID; steps without a row are pending
    pub ledger: BTreeMap<u64, CompletionStatus>,
}

/// What an advance call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advanced {
    Moved,
    Finished,
}

impl ProgressState {
    /// Assembles the state of one record. An open record whose index points
    /// past the last step (after steps were removed) is moved back onto the
    /// last step, so navigation still checks that step.
    pub fn new(
        process: Process,
        mut progress: Progress,
        ledger: BTreeMap<u64, CompletionStatus>,
    ) -> Self {
        let total = process.steps.len() as u32;
        if !progress.status.is_terminal() && total > 0 && progress.current_step_index >= total {
            log::debug!(
                "Progress {} points past the last of {total} steps, clamping",
                progress.id
            );
            progress.current_step_index = total - 1;
        }
        Self {
            process,
            progress,
            ledger,
        }
    }

    pub fn status_of(&self, step_id: u64) -> CompletionStatus {
        self.ledger
            .get(&step_id)
            .copied()
            .unwrap_or(CompletionStatus::Pending)
    }

    pub fn total_steps(&self) -> u32 {
        self.process.steps.len() as u32
    }

    /// The step at the current index, if the index is in range.
    pub fn current_step(&self) -> Option<&ProcessStep> {
        self.process
            .steps
            .get(self.progress.current_step_index as usize)
    }

    pub fn step(&self, step_id: u64) -> Result<&ProcessStep> {
        self.process
            .steps
            .iter()
            .find(|s| s.id == step_id)
            .ok_or(TrackerError::NotFound {
                entity: "Step",
                id: step_id,
            })
    }

    /// Fails when the record is completed or abandoned.
    pub fn ensure_open(&self) -> Result<()> {
        if self.progress.status.is_terminal() {
            return Err(TrackerError::ProgressClosed {
                id: self.progress.id,
                status: self.progress.status,
            });
        }
        Ok(())
    }

    pub fn ensure_linear(&self) -> Result<()> {
        if self.process.mode != NavigationMode::Linear {
            return Err(TrackerError::LinearOnly {
                process_id: self.process.id,
            });
        }
        Ok(())
    }

    /// In a linear process every earlier step must be resolved first.
    pub fn check_order(&self, step: &ProcessStep) -> Result<()> {
        if self.process.mode == NavigationMode::Free {
            return Ok(());
        }
        match self
            .process
            .steps
            .iter()
            .take_while(|s| s.order < step.order)
            .find(|s| !self.status_of(s.id).is_resolved())
        {
            Some(blocking) => Err(TrackerError::StepIncomplete {
                step_id: blocking.id,
            }),
            None => Ok(()),
        }
    }

    /// Moves to the next step, finishing the process past the last one.
    pub fn advance(&mut self, now: Timestamp) -> Result<Advanced> {
        self.ensure_open()?;
        self.ensure_linear()?;

        if let Some(step) = self.current_step() {
            if !self.status_of(step.id).is_resolved() {
                return Err(TrackerError::StepIncomplete { step_id: step.id });
            }
        }

        let next = self.progress.current_step_index.saturating_add(1);
        if next >= self.total_steps() {
            self.finish(now)?;
            return Ok(Advanced::Finished);
        }

        self.progress.current_step_index = next;
        self.touch(now);
        Ok(Advanced::Moved)
    }

    /// Moves to the previous step. Returns false at the first step.
    pub fn retreat(&mut self, now: Timestamp) -> Result<bool> {
        self.ensure_open()?;
        self.ensure_linear()?;

        if self.progress.current_step_index == 0 {
            return Ok(false);
        }
        let last = self.total_steps().saturating_sub(1);
        self.progress.current_step_index = (self.progress.current_step_index - 1).min(last);
        self.touch(now);
        Ok(true)
    }

    /// Records a ledger outcome and refreshes the percentage.
    pub fn record(&mut self, step_id: u64, status: CompletionStatus, now: Timestamp) {
        self.ledger.insert(step_id, status);
        self.recompute_percentage();
        self.touch(now);
    }

    /// Completed required steps over required steps; over all steps counting
    /// skips when nothing is required. Never decreases.
    pub fn recompute_percentage(&mut self) {
        let required: Vec<&ProcessStep> =
            self.process.steps.iter().filter(|s| s.is_required).collect();

        let (done, total) = if required.is_empty() {
            let resolved = self
                .process
                .steps
                .iter()
                .filter(|s| self.status_of(s.id).is_resolved())
                .count();
            (resolved, self.process.steps.len())
        } else {
            let completed = required
                .iter()
                .filter(|s| self.status_of(s.id) == CompletionStatus::Completed)
                .count();
            (completed, required.len())
        };

        if total == 0 {
            return;
        }
        let computed = round2(done as f64 / total as f64 * 100.0);
        self.progress.completion_percentage = self.progress.completion_percentage.max(computed);
    }

    /// Required steps that are neither completed nor skipped, in step order.
    pub fn unmet_required(&self) -> Vec<u64> {
        self.process
            .steps
            .iter()
            .filter(|s| s.is_required && !self.status_of(s.id).is_resolved())
            .map(|s| s.id)
            .collect()
    }

    /// Transitions to `completed`.
    pub fn finish(&mut self, now: Timestamp) -> Result<()> {
        self.ensure_open()?;
        let unmet = self.unmet_required();
        if !unmet.is_empty() {
            return Err(TrackerError::IncompleteRequiredSteps { step_ids: unmet });
        }

        self.progress.status = ProgressStatus::Completed;
        self.progress.completed_at = Some(now);
        self.progress.completion_percentage = 100.0;
        self.progress.current_step_index = self.total_steps();
        self.touch(now);
        Ok(())
    }

    pub fn touch(&mut self, now: Timestamp) {
        self.progress.last_activity_at = now;
    }
}
