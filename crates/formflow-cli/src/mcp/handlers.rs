//! MCP tool handlers implementation

use std::fmt::Display;

use formflow_core::{
    display::{
        AbandonedList, CreateResult, DeleteResult, FieldSummaries, Forms, OperationStatus,
        Processes, Steps, UpdateResult,
    },
    params::*,
    Sweeper, Tracker,
};
use log::debug;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    ErrorData,
};

use super::errors::to_mcp_error;

pub type McpResult = Result<CallToolResult, ErrorData>;

fn text(value: impl Display) -> McpResult {
    Ok(CallToolResult::success(vec![Content::text(value.to_string())]))
}

fn success(message: String) -> McpResult {
    text(OperationStatus::success(message))
}

fn not_found(entity: &str, id: u64) -> ErrorData {
    ErrorData::resource_not_found(format!("{entity} {id} not found"), None)
}

/// Handler implementations for the MCP server
pub struct McpHandlers {
    tracker: Tracker,
}

impl McpHandlers {
    pub fn new(tracker: Tracker) -> Self {
        Self { tracker }
    }

    // Forms

    pub async fn create_form(&self, Parameters(params): Parameters<CreateForm>) -> McpResult {
        debug!("create_form: {:?}", params);
        let form = self
            .tracker
            .create_form(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to create form", &e))?;
        text(CreateResult::new(form))
    }

    pub async fn add_field(&self, Parameters(params): Parameters<AddField>) -> McpResult {
        debug!("add_field: {:?}", params);
        let field = self
            .tracker
            .add_field(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to add field", &e))?;
        text(CreateResult::new(field))
    }

    pub async fn show_form(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let form = self
            .tracker
            .get_form(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to get form", &e))?
            .ok_or_else(|| not_found("Form", params.id))?;
        text(form)
    }

    pub async fn list_forms(&self) -> McpResult {
        let forms = self
            .tracker
            .list_forms()
            .await
            .map_err(|e| to_mcp_error("Failed to list forms", &e))?;
        text(Forms(forms))
    }

    // Processes

    pub async fn create_process(&self, Parameters(params): Parameters<CreateProcess>) -> McpResult {
        debug!("create_process: {:?}", params);
        let process = self
            .tracker
            .create_process(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to create process", &e))?;
        text(CreateResult::new(process))
    }

    pub async fn update_process(&self, Parameters(params): Parameters<UpdateProcess>) -> McpResult {
        debug!("update_process: {:?}", params);
        let process = self
            .tracker
            .update_process(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to update process", &e))?;
        text(UpdateResult::new(process))
    }

    pub async fn show_process(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let process = self
            .tracker
            .get_process(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to get process", &e))?
            .ok_or_else(|| not_found("Process", params.id))?;
        text(process)
    }

    pub async fn list_processes(
        &self,
        Parameters(params): Parameters<ListProcesses>,
    ) -> McpResult {
        let processes = self
            .tracker
            .list_processes(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to list processes", &e))?;
        text(Processes(processes))
    }

    pub async fn publish_process(&self, Parameters(params): Parameters<Id>) -> McpResult {
        self.tracker
            .publish_process(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to publish process", &e))?;
        success(format!("Published process {}", params.id))
    }

    pub async fn unpublish_process(&self, Parameters(params): Parameters<Id>) -> McpResult {
        self.tracker
            .unpublish_process(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to unpublish process", &e))?;
        success(format!("Unpublished process {}", params.id))
    }

    pub async fn set_process_password(
        &self,
        Parameters(params): Parameters<SetPassword>,
    ) -> McpResult {
        let process = self
            .tracker
            .set_process_password(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to set password", &e))?;
        if process.password_protected {
            success(format!("Set the access password of process {}", process.id))
        } else {
            success(format!("Cleared the access password of process {}", process.id))
        }
    }

    // Steps

    pub async fn add_step(&self, Parameters(params): Parameters<AddStep>) -> McpResult {
        debug!("add_step: {:?}", params);
        let step = self
            .tracker
            .add_step(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to add step", &e))?;
        text(CreateResult::new(step))
    }

    pub async fn insert_step(&self, Parameters(params): Parameters<InsertStep>) -> McpResult {
        debug!("insert_step: {:?}", params);
        let step = self
            .tracker
            .insert_step(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to insert step", &e))?;
        text(CreateResult::new(step))
    }

    pub async fn update_step(&self, Parameters(params): Parameters<UpdateStep>) -> McpResult {
        debug!("update_step: {:?}", params);
        let step = self
            .tracker
            .update_step(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to update step", &e))?;
        text(UpdateResult::new(step))
    }

    pub async fn list_steps(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let steps = self
            .tracker
            .list_steps(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to list steps", &e))?;
        text(Steps(steps))
    }

    pub async fn swap_steps(&self, Parameters(params): Parameters<SwapSteps>) -> McpResult {
        self.tracker
            .swap_steps(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to swap steps", &e))?;
        success(format!(
            "Swapped steps {} and {}",
            params.step1_id, params.step2_id
        ))
    }

    pub async fn remove_step(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let step = self
            .tracker
            .remove_step(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to remove step", &e))?;
        text(DeleteResult::new(step))
    }

    // Visitor flow

    pub async fn track_view(&self, Parameters(params): Parameters<TrackView>) -> McpResult {
        self.tracker
            .track_view(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to record view", &e))?;
        success(format!("Recorded view of process {}", params.process_id))
    }

    pub async fn start_process(&self, Parameters(params): Parameters<StartProcess>) -> McpResult {
        debug!("start_process: process {}", params.process_id);
        let progress = self
            .tracker
            .start(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to start process", &e))?;
        text(progress)
    }

    pub async fn current_step(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let step = self
            .tracker
            .get_current_step(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to get current step", &e))?;
        text(step)
    }

    pub async fn advance(&self, Parameters(params): Parameters<Navigate>) -> McpResult {
        let navigation = self
            .tracker
            .advance(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to advance", &e))?;
        text(navigation)
    }

    pub async fn retreat(&self, Parameters(params): Parameters<Navigate>) -> McpResult {
        let step = self
            .tracker
            .retreat(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to go back", &e))?;
        text(step)
    }

    pub async fn complete_step(&self, Parameters(params): Parameters<CompleteStep>) -> McpResult {
        debug!(
            "complete_step: progress {} step {}",
            params.progress_id, params.step_id
        );
        let result = self
            .tracker
            .complete_step(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to complete step", &e))?;
        text(result)
    }

    pub async fn skip_step(&self, Parameters(params): Parameters<SkipStep>) -> McpResult {
        let result = self
            .tracker
            .skip_step(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to skip step", &e))?;
        text(result)
    }

    pub async fn complete_process(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let completed = self
            .tracker
            .complete(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to complete process", &e))?;
        text(completed)
    }

    // Progress and submissions

    pub async fn show_progress(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let detail = self
            .tracker
            .get_progress_detail(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to get progress", &e))?
            .ok_or_else(|| not_found("Progress", params.id))?;
        text(detail)
    }

    pub async fn list_progress(&self, Parameters(params): Parameters<ListProgress>) -> McpResult {
        let page = self
            .tracker
            .list_progress(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to list progress", &e))?;
        text(page)
    }

    pub async fn find_progress(&self, Parameters(params): Parameters<FindProgress>) -> McpResult {
        let progress = self
            .tracker
            .find_progress(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to find progress", &e))?;
        match progress {
            Some(progress) => text(progress),
            None => text(format!(
                "No progress for session '{}' in process {}\n",
                params.session_id, params.process_id
            )),
        }
    }

    pub async fn submit_form(&self, Parameters(params): Parameters<SubmitForm>) -> McpResult {
        debug!("submit_form: form {}", params.form_id);
        let submission = self
            .tracker
            .submit_form(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to submit form", &e))?;
        text(CreateResult::new(submission))
    }

    pub async fn list_submissions(
        &self,
        Parameters(params): Parameters<ListSubmissions>,
    ) -> McpResult {
        let page = self
            .tracker
            .list_submissions(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to list submissions", &e))?;
        text(page)
    }

    // Analytics

    pub async fn completion_rate(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let rate = self
            .tracker
            .completion_rate(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to compute completion rate", &e))?;
        text(rate)
    }

    pub async fn drop_off(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let report = self
            .tracker
            .drop_off(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to compute drop-off", &e))?;
        text(report)
    }

    pub async fn completion_times(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let times = self
            .tracker
            .completion_times(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to compute completion times", &e))?;
        text(times)
    }

    pub async fn abandoned_progress(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let records = self
            .tracker
            .abandoned_progress(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to list abandoned progress", &e))?;
        text(AbandonedList(records))
    }

    pub async fn activity_over_time(
        &self,
        Parameters(params): Parameters<ActivityWindow>,
    ) -> McpResult {
        let activity = self
            .tracker
            .activity_over_time(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to compute activity", &e))?;
        text(activity)
    }

    pub async fn track_form_view(&self, Parameters(params): Parameters<TrackFormView>) -> McpResult {
        self.tracker
            .track_form_view(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to record form view", &e))?;
        success(format!("Recorded view of form {}", params.form_id))
    }

    pub async fn form_overview(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let overview = self
            .tracker
            .form_overview(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to compute form overview", &e))?;
        text(overview)
    }

    pub async fn form_drop_off(&self, Parameters(params): Parameters<Id>) -> McpResult {
        let report = self
            .tracker
            .form_drop_off(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to compute form drop-off", &e))?;
        text(report)
    }

    pub async fn field_summary(&self, Parameters(params): Parameters<FieldReport>) -> McpResult {
        let summaries = self
            .tracker
            .field_summary(&params)
            .await
            .map_err(|e| to_mcp_error("Failed to summarize fields", &e))?;
        text(FieldSummaries(summaries))
    }

    pub async fn sweep(&self) -> McpResult {
        let report = Sweeper::new(self.tracker.clone())
            .sweep_once()
            .await
            .map_err(|e| to_mcp_error("Sweep failed", &e))?;
        text(report)
    }
}
