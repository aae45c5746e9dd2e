//! Command handlers for the `ff` binary.
//!
//! Arguments are parsed by the wrappers in [`definitions`] and [`visits`],
//! converted to core parameters and passed to the [`Tracker`]. Results are
//! printed through the [`TerminalRenderer`] as markdown, or as JSON with
//! `--json`.

use std::future::Future;

use anyhow::{anyhow, Result};
use formflow_core::{
    display::{
        AbandonedList, CreateResult, DeleteResult, FieldSummaries, Forms, OperationStatus,
        Processes, Steps, UpdateResult,
    },
    params::{FindProgress, ListProcesses, SwapSteps, TrackFormView, TrackView, UpdateProcess},
    Sweeper, Tracker,
};
use log::info;

use crate::renderer::TerminalRenderer;

pub mod definitions;
pub mod visits;

pub use definitions::{FormCommands, Lookup, ProcessCommands, StepCommands};
pub use visits::{
    FormStatsCommands, ProgressCommands, RunCommands, StatsCommands, SubmissionCommands, SweepArgs,
};

pub struct Cli {
    tracker: Tracker,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(tracker: Tracker, renderer: TerminalRenderer) -> Self {
        Self { tracker, renderer }
    }

    pub async fn handle_form_command(&self, command: FormCommands) -> Result<()> {
        match command {
            FormCommands::Create(args) => {
                let form = self.tracker.create_form(&args.into()).await?;
                self.renderer.show(&form, CreateResult::new(form.clone()))
            }
            FormCommands::AddField(args) => {
                let field = self.tracker.add_field(&args.into()).await?;
                self.renderer.show(&field, CreateResult::new(field.clone()))
            }
            FormCommands::Show(args) => {
                let form = match Lookup::from(args) {
                    Lookup::Id(id) => self.tracker.get_form(&id).await?,
                    Lookup::Slug(slug) => self.tracker.get_form_by_slug(&slug).await?,
                }
                .ok_or_else(|| anyhow!("Form not found"))?;
                self.renderer.show(&form, &form)
            }
            FormCommands::List => {
                let forms = self.tracker.list_forms().await?;
                self.renderer.show(&forms, Forms(forms.clone()))
            }
        }
    }

    pub async fn handle_process_command(&self, command: ProcessCommands) -> Result<()> {
        match command {
            ProcessCommands::Create(args) => {
                let process = self.tracker.create_process(&args.into()).await?;
                self.renderer
                    .show(&process, CreateResult::new(process.clone()))
            }
            ProcessCommands::List(args) => self.list_processes(&args.into()).await,
            ProcessCommands::Show(args) => {
                let process = match Lookup::from(args) {
                    Lookup::Id(id) => self.tracker.get_process(&id).await?,
                    Lookup::Slug(slug) => self.tracker.get_process_by_slug(&slug).await?,
                }
                .ok_or_else(|| anyhow!("Process not found"))?;
                self.renderer.show(&process, &process)
            }
            ProcessCommands::Update(args) => {
                let params: UpdateProcess = args.into();
                let process = self.tracker.update_process(&params).await?;
                self.renderer
                    .show(&process, UpdateResult::new(process.clone()))
            }
            ProcessCommands::Publish(args) => {
                let process = self.tracker.publish_process(&args.into()).await?;
                self.status(&process, format!("Published process {}", process.id))
            }
            ProcessCommands::Unpublish(args) => {
                let process = self.tracker.unpublish_process(&args.into()).await?;
                self.status(&process, format!("Unpublished process {}", process.id))
            }
            ProcessCommands::Activate(args) => {
                let process = self.tracker.activate_process(&args.into()).await?;
                self.status(&process, format!("Activated process {}", process.id))
            }
            ProcessCommands::Deactivate(args) => {
                let process = self.tracker.deactivate_process(&args.into()).await?;
                self.status(&process, format!("Deactivated process {}", process.id))
            }
            ProcessCommands::Password(args) => {
                let process = self.tracker.set_process_password(&args.into()).await?;
                let message = if process.password_protected {
                    format!("Set the access password of process {}", process.id)
                } else {
                    format!("Cleared the access password of process {}", process.id)
                };
                self.status(&process, message)
            }
        }
    }

    pub async fn handle_step_command(&self, command: StepCommands) -> Result<()> {
        match command {
            StepCommands::Add(args) => {
                let step = self.tracker.add_step(&args.into()).await?;
                self.renderer.show(&step, CreateResult::new(step.clone()))
            }
            StepCommands::Insert(args) => {
                let step = self.tracker.insert_step(&args.into()).await?;
                self.renderer.show(&step, CreateResult::new(step.clone()))
            }
            StepCommands::Update(args) => {
                let step = self.tracker.update_step(&args.into()).await?;
                self.renderer.show(&step, UpdateResult::new(step.clone()))
            }
            StepCommands::Show(args) => {
                let step = self
                    .tracker
                    .get_step(&args.into())
                    .await?
                    .ok_or_else(|| anyhow!("Step not found"))?;
                self.renderer.show(&step, &step)
            }
            StepCommands::List(args) => {
                let steps = self.tracker.list_steps(&args.into()).await?;
                self.renderer.show(&steps, Steps(steps.clone()))
            }
            StepCommands::Swap(args) => {
                let params: SwapSteps = args.into();
                self.tracker.swap_steps(&params).await?;
                let message = format!("Swapped steps {} and {}", params.step1_id, params.step2_id);
                self.status(&params, message)
            }
            StepCommands::Remove(args) => {
                let step = self.tracker.remove_step(&args.into()).await?;
                self.renderer.show(&step, DeleteResult::new(step.clone()))
            }
        }
    }

    pub async fn handle_run_command(&self, command: RunCommands) -> Result<()> {
        match command {
            RunCommands::Start(args) => {
                let progress = self.tracker.start(&args.into()).await?;
                self.renderer.show(&progress, &progress)
            }
            RunCommands::Current(args) => {
                let step = self.tracker.get_current_step(&args.into()).await?;
                self.renderer.show(&step, &step)
            }
            RunCommands::Advance(args) => {
                let navigation = self.tracker.advance(&args.into()).await?;
                self.renderer.show(&navigation, &navigation)
            }
            RunCommands::Retreat(args) => {
                let step = self.tracker.retreat(&args.into()).await?;
                self.renderer.show(&step, &step)
            }
            RunCommands::Complete(args) => {
                let result = self.tracker.complete_step(&args.into()).await?;
                self.renderer.show(&result, &result)
            }
            RunCommands::Skip(args) => {
                let result = self.tracker.skip_step(&args.into()).await?;
                self.renderer.show(&result, &result)
            }
            RunCommands::Finish(args) => {
                let completed = self.tracker.complete(&args.into()).await?;
                self.renderer.show(&completed, &completed)
            }
            RunCommands::View(args) => {
                let params: TrackView = args.into();
                self.tracker.track_view(&params).await?;
                let message = format!("Recorded view of process {}", params.process_id);
                self.status(&params, message)
            }
        }
    }

    pub async fn handle_progress_command(&self, command: ProgressCommands) -> Result<()> {
        match command {
            ProgressCommands::Show(args) => {
                let detail = self
                    .tracker
                    .get_progress_detail(&args.into())
                    .await?
                    .ok_or_else(|| anyhow!("Progress not found"))?;
                self.renderer.show(&detail, &detail)
            }
            ProgressCommands::List(args) => {
                let page = self.tracker.list_progress(&args.into()).await?;
                self.renderer.show(&page, &page)
            }
            ProgressCommands::Find(args) => {
                let params: FindProgress = args.into();
                let progress = self
                    .tracker
                    .find_progress(&params)
                    .await?
                    .ok_or_else(|| anyhow!("No progress for session '{}'", params.session_id))?;
                self.renderer.show(&progress, &progress)
            }
        }
    }

    pub async fn handle_submission_command(&self, command: SubmissionCommands) -> Result<()> {
        match command {
            SubmissionCommands::Submit(args) => {
                let submission = self.tracker.submit_form(&args.into()).await?;
                self.renderer
                    .show(&submission, CreateResult::new(submission.clone()))
            }
            SubmissionCommands::Show(args) => {
                let submission = self
                    .tracker
                    .get_submission(&args.into())
                    .await?
                    .ok_or_else(|| anyhow!("Submission not found"))?;
                self.renderer.show(&submission, &submission)
            }
            SubmissionCommands::List(args) => {
                let page = self.tracker.list_submissions(&args.into()).await?;
                self.renderer.show(&page, &page)
            }
            SubmissionCommands::Archive(args) => {
                let submission = self.tracker.archive_submission(&args.into()).await?;
                self.status(&submission, format!("Archived submission {}", submission.id))
            }
            SubmissionCommands::View(args) => {
                let params: TrackFormView = args.into();
                self.tracker.track_form_view(&params).await?;
                let message = format!("Recorded view of form {}", params.form_id);
                self.status(&params, message)
            }
        }
    }

    pub async fn handle_stats_command(&self, command: StatsCommands) -> Result<()> {
        match command {
            StatsCommands::Rate(args) => {
                let rate = self.tracker.completion_rate(&args.into()).await?;
                self.renderer.show(&rate, &rate)
            }
            StatsCommands::DropOff(args) => {
                let report = self.tracker.drop_off(&args.into()).await?;
                self.renderer.show(&report, &report)
            }
            StatsCommands::Times(args) => {
                let times = self.tracker.completion_times(&args.into()).await?;
                self.renderer.show(&times, &times)
            }
            StatsCommands::Abandoned(args) => {
                let records = self.tracker.abandoned_progress(&args.into()).await?;
                self.renderer.show(&records, AbandonedList(records.clone()))
            }
            StatsCommands::Activity(args) => {
                let activity = self.tracker.activity_over_time(&args.into()).await?;
                self.renderer.show(&activity, &activity)
            }
            StatsCommands::Form { command } => self.handle_form_stats(command).await,
        }
    }

    async fn handle_form_stats(&self, command: FormStatsCommands) -> Result<()> {
        match command {
            FormStatsCommands::Overview(args) => {
                let overview = self.tracker.form_overview(&args.into()).await?;
                self.renderer.show(&overview, &overview)
            }
            FormStatsCommands::DropOff(args) => {
                let report = self.tracker.form_drop_off(&args.into()).await?;
                self.renderer.show(&report, &report)
            }
            FormStatsCommands::Fields(args) => {
                let summaries = self.tracker.field_summary(&args.into()).await?;
                self.renderer
                    .show(&summaries, FieldSummaries(summaries.clone()))
            }
        }
    }

    /// Sweeps once, or until `shutdown` resolves with `--watch`.
    pub async fn handle_sweep<F>(&self, args: SweepArgs, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let sweeper = Sweeper::new(self.tracker.clone());
        if args.watch {
            info!("Watching for idle progress records");
            sweeper.run_until(shutdown).await?;
            Ok(())
        } else {
            let report = sweeper.sweep_once().await?;
            self.renderer.show(&report, &report)
        }
    }

    pub async fn list_processes(&self, params: &ListProcesses) -> Result<()> {
        let processes = self.tracker.list_processes(params).await?;
        self.renderer
            .show(&processes, Processes(processes.clone()))
    }

    fn status<T: serde::Serialize>(&self, value: &T, message: String) -> Result<()> {
        self.renderer
            .show(value, OperationStatus::success(message))
    }
}
