//! Step operations for the Tracker.

use super::{require_text, Tracker};
use crate::{
    error::{Result, TrackerError},
    models::{ProcessStep, UpdateStepRequest},
    params::{AddStep, Id, InsertStep, SwapSteps, UpdateStep},
};

impl Tracker {
    /// Appends a step to the end of a process.
    pub async fn add_step(&self, params: &AddStep) -> Result<ProcessStep> {
        self.place_step(params, None).await
    }

    /// Inserts a step at a position, shifting later steps down.
    pub async fn insert_step(&self, params: &InsertStep) -> Result<ProcessStep> {
        self.place_step(&params.step, Some(params.position)).await
    }

    /// Applies a partial update to a step.
    pub async fn update_step(&self, params: &UpdateStep) -> Result<ProcessStep> {
        let step_id = params.id;
        let request = UpdateStepRequest::try_from(params.clone())?;
        let now = self.now();
        self.with_db(move |db| db.update_step(step_id, request, now))
            .await
    }

    pub async fn get_step(&self, params: &Id) -> Result<Option<ProcessStep>> {
        let step_id = params.id;
        self.with_db(move |db| db.get_step(step_id)).await
    }

    /// Steps of the process identified by `params`, in order.
    pub async fn list_steps(&self, params: &Id) -> Result<Vec<ProcessStep>> {
        let process_id = params.id;
        self.with_db(move |db| {
            if db.get_process(process_id)?.is_none() {
                return Err(TrackerError::NotFound {
                    entity: "Process",
                    id: process_id,
                });
            }
            db.get_steps(process_id)
        })
        .await
    }

    pub async fn swap_steps(&self, params: &SwapSteps) -> Result<()> {
        let (first, second) = (params.step1_id, params.step2_id);
        let now = self.now();
        self.with_db(move |db| db.swap_steps(first, second, now))
            .await
    }

    /// Removes a step and returns it. Ledger rows for the step go with it.
    pub async fn remove_step(&self, params: &Id) -> Result<ProcessStep> {
        let step_id = params.id;
        let now = self.now();
        let step = self
            .with_db(move |db| db.remove_step(step_id, now))
            .await?;
        log::debug!("Removed step {step_id} from process {}", step.process_id);
        Ok(step)
    }

    async fn place_step(&self, params: &AddStep, position: Option<u32>) -> Result<ProcessStep> {
        let title = require_text("title", &params.title)?;
        let process_id = params.process_id;
        let form_id = params.form_id;
        let description = params.description.clone();
        let is_required = params.is_required;
        let now = self.now();

        self.with_db(move |db| {
            db.insert_step(
                process_id,
                position,
                form_id,
                &title,
                description.as_deref(),
                is_required,
                now,
            )
        })
        .await
    }
}
