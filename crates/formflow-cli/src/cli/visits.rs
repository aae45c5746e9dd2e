//! Argument wrappers for the visitor-side commands and for inspecting what
//! visitors left behind.

use clap::{Args, Subcommand};
use formflow_core::{
    models::{Answers, ProgressStatus, SubmissionStatus, Visitor},
    params::*,
    Settings,
};
use serde_json::Value;

use super::definitions::IdArgs;

/// Parses `FIELD_ID=VALUE`, keeping the value as a string.
pub fn parse_answer(s: &str) -> Result<(u64, Value), String> {
    let (field, value) = split_answer(s)?;
    Ok((field, Value::String(value.to_string())))
}

/// Parses `FIELD_ID=JSON`, for lists and other structured answers.
pub fn parse_json_answer(s: &str) -> Result<(u64, Value), String> {
    let (field, value) = split_answer(s)?;
    let value = serde_json::from_str(value)
        .map_err(|e| format!("answer for field {field} is not valid JSON: {e}"))?;
    Ok((field, value))
}

fn split_answer(s: &str) -> Result<(u64, &str), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD_ID=VALUE, got '{s}'"))?;
    let field = field
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("'{field}' is not a field ID"))?;
    Ok((field, value))
}

/// Answers given on the command line
#[derive(Args)]
pub struct AnswerArgs {
    #[arg(
        short,
        long = "answer",
        value_name = "FIELD_ID=VALUE",
        value_parser = parse_answer,
        help = "Answer for one field (repeatable)"
    )]
    pub answers: Vec<(u64, Value)>,
    #[arg(
        long = "answer-json",
        value_name = "FIELD_ID=JSON",
        value_parser = parse_json_answer,
        help = "JSON answer for one field, e.g. 4='[\"a\",\"b\"]' (repeatable)"
    )]
    pub json_answers: Vec<(u64, Value)>,
}

impl From<AnswerArgs> for Answers {
    fn from(val: AnswerArgs) -> Self {
        val.answers.into_iter().chain(val.json_answers).collect()
    }
}

/// Start a process, or resume the session's open progress record
#[derive(Args)]
pub struct StartArgs {
    #[arg(help = "Unique identifier of the process to start")]
    pub process_id: u64,
    #[arg(long, help = "Session token identifying the visitor")]
    pub session: String,
    #[arg(long, help = "Authenticated user, when known")]
    pub user: Option<String>,
    #[arg(long, help = "Access password of a private process")]
    pub password: Option<String>,
}

impl From<StartArgs> for StartProcess {
    fn from(val: StartArgs) -> Self {
        StartProcess {
            process_id: val.process_id,
            visitor: Visitor {
                session_id: val.session,
                user_id: val.user,
            },
            password: val.password,
        }
    }
}

/// Move within a linear process
#[derive(Args)]
pub struct NavigateArgs {
    #[arg(help = "Unique identifier of the progress record")]
    pub progress_id: u64,
    #[arg(long, help = "Fail unless the record is still at this version")]
    pub expect_version: Option<u64>,
}

impl From<NavigateArgs> for Navigate {
    fn from(val: NavigateArgs) -> Self {
        Navigate {
            progress_id: val.progress_id,
            expected_version: val.expect_version,
        }
    }
}

/// Complete a step with answers
#[derive(Args)]
pub struct CompleteStepArgs {
    #[arg(help = "Unique identifier of the progress record")]
    pub progress_id: u64,
    #[arg(help = "Step to complete")]
    pub step_id: u64,
    #[command(flatten)]
    pub answers: AnswerArgs,
}

impl From<CompleteStepArgs> for CompleteStep {
    fn from(val: CompleteStepArgs) -> Self {
        CompleteStep {
            progress_id: val.progress_id,
            step_id: val.step_id,
            answers: val.answers.into(),
        }
    }
}

/// Skip an optional step
#[derive(Args)]
pub struct SkipStepArgs {
    #[arg(help = "Unique identifier of the progress record")]
    pub progress_id: u64,
    #[arg(help = "Optional step to skip")]
    pub step_id: u64,
}

impl From<SkipStepArgs> for SkipStep {
    fn from(val: SkipStepArgs) -> Self {
        SkipStep {
            progress_id: val.progress_id,
            step_id: val.step_id,
        }
    }
}

/// Record that a session looked at a process
#[derive(Args)]
pub struct ViewArgs {
    #[arg(help = "Unique identifier of the viewed process")]
    pub process_id: u64,
    #[arg(long, help = "Session token identifying the visitor")]
    pub session: String,
}

impl From<ViewArgs> for TrackView {
    fn from(val: ViewArgs) -> Self {
        TrackView {
            process_id: val.process_id,
            session_id: val.session,
        }
    }
}

#[derive(Subcommand)]
pub enum RunCommands {
    /// Start or resume a process
    Start(StartArgs),
    /// Show the step the visitor is on
    #[command(alias = "cur")]
    Current(IdArgs),
    /// Move to the next step of a linear process
    #[command(alias = "next")]
    Advance(NavigateArgs),
    /// Move back one step in a linear process
    #[command(alias = "back")]
    Retreat(NavigateArgs),
    /// Complete a step with answers
    #[command(alias = "c")]
    Complete(CompleteStepArgs),
    /// Skip an optional step
    Skip(SkipStepArgs),
    /// Finish the process once every required step is done
    Finish(IdArgs),
    /// Record a view of a process
    View(ViewArgs),
}

fn parse_progress_status(s: &str) -> Result<ProgressStatus, String> {
    s.parse()
}

fn parse_submission_status(s: &str) -> Result<SubmissionStatus, String> {
    s.parse()
}

/// List the progress records of a process, newest first
#[derive(Args)]
pub struct ListProgressArgs {
    #[arg(help = "Unique identifier of the process")]
    pub process_id: u64,
    #[arg(
        long,
        value_parser = parse_progress_status,
        help = "Only records in this status (in_progress, completed, abandoned)"
    )]
    pub status: Option<ProgressStatus>,
    #[arg(long, help = "Only records of this session")]
    pub session: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub offset: Option<u32>,
}

impl From<ListProgressArgs> for ListProgress {
    fn from(val: ListProgressArgs) -> Self {
        ListProgress {
            process_id: val.process_id,
            status: val.status,
            session_id: val.session,
            limit: val.limit,
            offset: val.offset,
        }
    }
}

/// Find the latest progress record of a session
#[derive(Args)]
pub struct FindProgressArgs {
    #[arg(help = "Unique identifier of the process")]
    pub process_id: u64,
    #[arg(long, help = "Session token identifying the visitor")]
    pub session: String,
}

impl From<FindProgressArgs> for FindProgress {
    fn from(val: FindProgressArgs) -> Self {
        FindProgress {
            process_id: val.process_id,
            session_id: val.session,
        }
    }
}

#[derive(Subcommand)]
pub enum ProgressCommands {
    /// Show a progress record with its step ledger
    #[command(alias = "s")]
    Show(IdArgs),
    /// List the progress records of a process
    #[command(aliases = ["l", "ls"])]
    List(ListProgressArgs),
    /// Find the latest record of a session
    #[command(alias = "f")]
    Find(FindProgressArgs),
}

/// Submit a form outside of any process
#[derive(Args)]
pub struct SubmitArgs {
    #[arg(help = "Unique identifier of the form")]
    pub form_id: u64,
    #[arg(long, help = "Session token identifying the visitor")]
    pub session: String,
    #[command(flatten)]
    pub answers: AnswerArgs,
    #[arg(long, help = "Save a draft without checking required fields")]
    pub draft: bool,
}

impl From<SubmitArgs> for SubmitForm {
    fn from(val: SubmitArgs) -> Self {
        SubmitForm {
            form_id: val.form_id,
            session_id: val.session,
            answers: val.answers.into(),
            draft: val.draft,
        }
    }
}

/// List the submissions of a form, newest first
#[derive(Args)]
pub struct ListSubmissionsArgs {
    #[arg(help = "Unique identifier of the form")]
    pub form_id: u64,
    #[arg(
        long,
        value_parser = parse_submission_status,
        help = "Only submissions in this status (draft, submitted, archived)"
    )]
    pub status: Option<SubmissionStatus>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub offset: Option<u32>,
}

impl From<ListSubmissionsArgs> for ListSubmissions {
    fn from(val: ListSubmissionsArgs) -> Self {
        ListSubmissions {
            form_id: val.form_id,
            status: val.status,
            limit: val.limit,
            offset: val.offset,
        }
    }
}

/// Record that a session looked at a form
#[derive(Args)]
pub struct FormViewArgs {
    #[arg(help = "Unique identifier of the viewed form")]
    pub form_id: u64,
    #[arg(long, help = "Session token identifying the visitor")]
    pub session: String,
}

impl From<FormViewArgs> for TrackFormView {
    fn from(val: FormViewArgs) -> Self {
        TrackFormView {
            form_id: val.form_id,
            session_id: val.session,
        }
    }
}

#[derive(Subcommand)]
pub enum SubmissionCommands {
    /// Validate and store answers for a form
    Submit(SubmitArgs),
    /// Show a submission
    #[command(alias = "s")]
    Show(IdArgs),
    /// List the submissions of a form
    #[command(aliases = ["l", "ls"])]
    List(ListSubmissionsArgs),
    /// Archive a submission
    Archive(IdArgs),
    /// Record a view of a form
    View(FormViewArgs),
}

#[derive(Subcommand)]
pub enum StatsCommands {
    /// Views, starts and outcome rates of a process
    Rate(IdArgs),
    /// Per-step retention of a process
    DropOff(IdArgs),
    /// How long completed records took
    Times(IdArgs),
    /// Abandoned records with their idle time
    Abandoned(IdArgs),
    /// Daily views and completions of a process
    Activity(ActivityArgs),
    /// Reports on a standalone form
    Form {
        #[command(subcommand)]
        command: FormStatsCommands,
    },
}

#[derive(Subcommand)]
pub enum FormStatsCommands {
    /// Views, submissions and conversion rate
    Overview(IdArgs),
    /// How many viewers started and submitted
    DropOff(IdArgs),
    /// Answer counts and aggregates per field
    Fields(FieldReportArgs),
}

#[derive(Args)]
pub struct ActivityArgs {
    #[arg(help = "Unique identifier of the process")]
    pub process_id: u64,
    #[arg(long, help = "Days to cover, today included (1-365, default 30)")]
    pub days: Option<u32>,
}

impl From<ActivityArgs> for ActivityWindow {
    fn from(val: ActivityArgs) -> Self {
        ActivityWindow {
            process_id: val.process_id,
            days: val.days,
        }
    }
}

#[derive(Args)]
pub struct FieldReportArgs {
    #[arg(help = "Unique identifier of the form")]
    pub form_id: u64,
    #[arg(long, help = "Only summarize this field")]
    pub field: Option<u64>,
}

impl From<FieldReportArgs> for FieldReport {
    fn from(val: FieldReportArgs) -> Self {
        FieldReport {
            form_id: val.form_id,
            field_id: val.field,
        }
    }
}

/// Mark idle progress records abandoned
#[derive(Args)]
pub struct SweepArgs {
    #[arg(
        short,
        long,
        help = "Keep sweeping on the configured interval until interrupted"
    )]
    pub watch: bool,

    #[arg(long, help = "Override the inactivity threshold in hours")]
    pub threshold_hours: Option<u32>,

    #[arg(long, help = "Override the seconds between sweeps in watch mode")]
    pub interval_secs: Option<u64>,
}

impl SweepArgs {
    /// Applies the command-line overrides on top of the loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(hours) = self.threshold_hours {
            settings.inactivity_threshold_hours = hours;
        }
        if let Some(secs) = self.interval_secs {
            settings.sweep_interval_secs = secs;
        }
    }
}
