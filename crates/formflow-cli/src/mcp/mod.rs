//! MCP server implementation for Formflow
//!
//! Exposes the tracker's operations as MCP tools over stdio. Every tool
//! returns the same markdown the CLI prints.

use std::future::Future;

use anyhow::Result;
use formflow_core::{
    params::{
        ActivityWindow, AddField, AddStep, CompleteStep, CreateForm, CreateProcess, FieldReport,
        FindProgress, Id, InsertStep, ListProcesses, ListProgress, ListSubmissions, Navigate,
        SetPassword, SkipStep, StartProcess, SubmitForm, SwapSteps, TrackFormView, TrackView,
        UpdateProcess, UpdateStep,
    },
    Tracker,
};
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use tokio::signal::unix::{signal, SignalKind};

pub mod errors;
pub mod handlers;

pub use handlers::McpResult;
use handlers::McpHandlers;

/// MCP server for Formflow
#[derive(Clone)]
pub struct FormflowMcpServer {
    tracker: Tracker,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FormflowMcpServer {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            tracker,
            tool_router: Self::tool_router(),
        }
    }

    fn handlers(&self) -> McpHandlers {
        McpHandlers::new(self.tracker.clone())
    }

    #[tool(
        name = "create_form",
        description = "Create a form. Provide a title; the slug is derived from it unless given. Returns the form ID used to add fields."
    )]
    async fn create_form(&self, params: Parameters<CreateForm>) -> McpResult {
        self.handlers().create_form(params).await
    }

    #[tool(
        name = "add_field",
        description = "Append a field to a form. `kind` is an object tagged by `type`: text/textarea (min_length, max_length), number (min_value, max_value), email, date, select/radio (options), checkbox (options, min_selections, max_selections) or file (allowed_extensions)."
    )]
    async fn add_field(&self, params: Parameters<AddField>) -> McpResult {
        self.handlers().add_field(params).await
    }

    #[tool(
        name = "show_form",
        description = "Show a form with all its fields, their types, rules and IDs. Field IDs are the keys of step and submission answers."
    )]
    async fn show_form(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().show_form(params).await
    }

    #[tool(
        name = "list_forms",
        description = "List all forms with their slugs and field counts."
    )]
    async fn list_forms(&self) -> McpResult {
        self.handlers().list_forms().await
    }

    #[tool(
        name = "create_process",
        description = "Create a multi-step process. mode is 'linear' (default, steps in order) or 'free'; visibility is 'public' (default) or 'private'. Add steps, then publish it."
    )]
    async fn create_process(&self, params: Parameters<CreateProcess>) -> McpResult {
        self.handlers().create_process(params).await
    }

    #[tool(
        name = "update_process",
        description = "Change the title, description, mode, visibility or resubmission policy of a process. Omitted fields stay unchanged."
    )]
    async fn update_process(&self, params: Parameters<UpdateProcess>) -> McpResult {
        self.handlers().update_process(params).await
    }

    #[tool(
        name = "show_process",
        description = "Show a process with its settings and ordered steps."
    )]
    async fn show_process(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().show_process(params).await
    }

    #[tool(
        name = "list_processes",
        description = "List active processes, or all of them with include_inactive=true."
    )]
    async fn list_processes(&self, params: Parameters<ListProcesses>) -> McpResult {
        self.handlers().list_processes(params).await
    }

    #[tool(
        name = "publish_process",
        description = "Publish a process so visitors can start it. A process also needs to be active and have at least one step."
    )]
    async fn publish_process(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().publish_process(params).await
    }

    #[tool(
        name = "unpublish_process",
        description = "Withdraw a process from visitors. Open progress records are kept but cannot start anew."
    )]
    async fn unpublish_process(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().unpublish_process(params).await
    }

    #[tool(
        name = "set_process_password",
        description = "Set the access password visitors must give to start a private process, or clear it by omitting the password."
    )]
    async fn set_process_password(&self, params: Parameters<SetPassword>) -> McpResult {
        self.handlers().set_process_password(params).await
    }

    #[tool(
        name = "add_step",
        description = "Append a step backed by a form to a process. Steps are required unless is_required=false."
    )]
    async fn add_step(&self, params: Parameters<AddStep>) -> McpResult {
        self.handlers().add_step(params).await
    }

    #[tool(
        name = "insert_step",
        description = "Insert a step at a 0-indexed position. Steps at or after the position shift down."
    )]
    async fn insert_step(&self, params: Parameters<InsertStep>) -> McpResult {
        self.handlers().insert_step(params).await
    }

    #[tool(
        name = "update_step",
        description = "Change the title, description, required flag or form of a step."
    )]
    async fn update_step(&self, params: Parameters<UpdateStep>) -> McpResult {
        self.handlers().update_step(params).await
    }

    #[tool(
        name = "list_steps",
        description = "List the steps of a process in order."
    )]
    async fn list_steps(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().list_steps(params).await
    }

    #[tool(
        name = "swap_steps",
        description = "Swap the order of two steps of the same process."
    )]
    async fn swap_steps(&self, params: Parameters<SwapSteps>) -> McpResult {
        self.handlers().swap_steps(params).await
    }

    #[tool(
        name = "remove_step",
        description = "Remove a step. Later steps move up and the step's ledger entries are deleted."
    )]
    async fn remove_step(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().remove_step(params).await
    }

    #[tool(
        name = "track_view",
        description = "Record that a session viewed a process. Views feed the completion rate report."
    )]
    async fn track_view(&self, params: Parameters<TrackView>) -> McpResult {
        self.handlers().track_view(params).await
    }

    #[tool(
        name = "start_process",
        description = "Start a process for a visitor identified by session_id (and optionally user_id). Resumes the session's open record instead of creating a second one. Private processes need the password."
    )]
    async fn start_process(&self, params: Parameters<StartProcess>) -> McpResult {
        self.handlers().start_process(params).await
    }

    #[tool(
        name = "current_step",
        description = "Show the step a progress record is on, with its status, the completion percentage and the record version."
    )]
    async fn current_step(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().current_step(params).await
    }

    #[tool(
        name = "advance",
        description = "Move a linear process to the next step. The current step must be completed or skipped first. Advancing past the last step completes the process. Pass expected_version to fail on concurrent changes."
    )]
    async fn advance(&self, params: Parameters<Navigate>) -> McpResult {
        self.handlers().advance(params).await
    }

    #[tool(
        name = "retreat",
        description = "Move a linear process back one step. Does nothing on the first step."
    )]
    async fn retreat(&self, params: Parameters<Navigate>) -> McpResult {
        self.handlers().retreat(params).await
    }

    #[tool(
        name = "complete_step",
        description = "Complete a step with answers keyed by field ID. Answers are validated against the step's form; errors are reported per field. Repeating an identical completion is a no-op."
    )]
    async fn complete_step(&self, params: Parameters<CompleteStep>) -> McpResult {
        self.handlers().complete_step(params).await
    }

    #[tool(
        name = "skip_step",
        description = "Skip an optional step. Required steps cannot be skipped."
    )]
    async fn skip_step(&self, params: Parameters<SkipStep>) -> McpResult {
        self.handlers().skip_step(params).await
    }

    #[tool(
        name = "complete_process",
        description = "Finish a progress record. Fails with the IDs of unfinished required steps if any remain."
    )]
    async fn complete_process(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().complete_process(params).await
    }

    #[tool(
        name = "show_progress",
        description = "Show a progress record with the status of every step."
    )]
    async fn show_progress(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().show_progress(params).await
    }

    #[tool(
        name = "list_progress",
        description = "Page through the progress records of a process, newest first, optionally filtered by status or session."
    )]
    async fn list_progress(&self, params: Parameters<ListProgress>) -> McpResult {
        self.handlers().list_progress(params).await
    }

    #[tool(
        name = "find_progress",
        description = "Find the latest progress record of a session for a process."
    )]
    async fn find_progress(&self, params: Parameters<FindProgress>) -> McpResult {
        self.handlers().find_progress(params).await
    }

    #[tool(
        name = "submit_form",
        description = "Submit answers to a form outside of any process. draft=true skips the required-field check."
    )]
    async fn submit_form(&self, params: Parameters<SubmitForm>) -> McpResult {
        self.handlers().submit_form(params).await
    }

    #[tool(
        name = "list_submissions",
        description = "Page through the submissions of a form, newest first."
    )]
    async fn list_submissions(&self, params: Parameters<ListSubmissions>) -> McpResult {
        self.handlers().list_submissions(params).await
    }

    #[tool(
        name = "completion_rate",
        description = "Views, starts, completions and abandonments of a process with completion and abandonment rates."
    )]
    async fn completion_rate(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().completion_rate(params).await
    }

    #[tool(
        name = "drop_off",
        description = "Per-step started, completed and retention counts of a process."
    )]
    async fn drop_off(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().drop_off(params).await
    }

    #[tool(
        name = "completion_times",
        description = "Average, median, minimum and maximum minutes completed records took."
    )]
    async fn completion_times(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().completion_times(params).await
    }

    #[tool(
        name = "abandoned_progress",
        description = "Abandoned records of a process with how long they have been idle."
    )]
    async fn abandoned_progress(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().abandoned_progress(params).await
    }

    #[tool(
        name = "activity_over_time",
        description = "Daily views and completions of a process over the last `days` days (1-365, default 30), today included."
    )]
    async fn activity_over_time(&self, params: Parameters<ActivityWindow>) -> McpResult {
        self.handlers().activity_over_time(params).await
    }

    #[tool(
        name = "track_form_view",
        description = "Record that a session viewed a standalone form. Views feed the form overview and drop-off reports."
    )]
    async fn track_form_view(&self, params: Parameters<TrackFormView>) -> McpResult {
        self.handlers().track_form_view(params).await
    }

    #[tool(
        name = "form_overview",
        description = "Views, submitted count and conversion rate of a form, with the last view and submission times."
    )]
    async fn form_overview(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().form_overview(params).await
    }

    #[tool(
        name = "form_drop_off",
        description = "How many sessions viewed a form, started a submission (drafts included) and submitted it."
    )]
    async fn form_drop_off(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().form_drop_off(params).await
    }

    #[tool(
        name = "field_summary",
        description = "Per-field response counts over submitted answers: average, min, max and sum for number fields, option counts for select, radio and checkbox fields. Pass field_id to summarize one field."
    )]
    async fn field_summary(&self, params: Parameters<FieldReport>) -> McpResult {
        self.handlers().field_summary(params).await
    }

    #[tool(
        name = "sweep",
        description = "Mark progress records idle for longer than the inactivity threshold as abandoned. Safe to run repeatedly."
    )]
    async fn sweep(&self) -> McpResult {
        self.handlers().sweep().await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for FormflowMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(r#"Formflow tracks visitors through multi-step processes whose steps are forms.

## Core Concepts
- **Forms**: titled sets of typed fields with validation rules
- **Processes**: ordered steps, each backed by a form; linear processes are worked in order, free ones in any order
- **Progress**: one visitor's traversal of a process, with a completion ledger entry per step
- **Submissions**: validated answers to a form

## Building a Process
1. `create_form` and `add_field` for every form the process collects
2. `create_process`, then `add_step` or `insert_step` per step
3. `publish_process` to open it to visitors

## Running a Process
1. `start_process` with the visitor's session_id (resumes an open record)
2. `current_step` to see where the visitor is
3. `complete_step` with answers keyed by field ID, or `skip_step` for optional steps
4. `advance` / `retreat` to move through linear processes
5. `complete_process` once every required step is done

## Concurrency
`current_step` reports the record version. Pass it as `expected_version` to `advance` or `retreat`; a stale version fails with a retryable conflict instead of moving twice.

## Reporting
`completion_rate`, `drop_off`, `completion_times`, `abandoned_progress` and `activity_over_time` summarize a process. For standalone forms, record views with `track_form_view`, then read `form_overview`, `form_drop_off` and `field_summary`. `sweep` abandons records idle past the configured threshold."#.to_string()),
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: FormflowMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting Formflow MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}
