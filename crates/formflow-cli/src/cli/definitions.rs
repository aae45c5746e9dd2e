//! Argument wrappers for the owner-side commands: forms, processes and
//! steps.
//!
//! Each wrapper carries the clap attributes for one command and converts
//! into the core parameter type, so the core stays free of CLI concerns:
//!
//! ```text
//! User Input → clap wrapper → formflow_core::params → Tracker
//! ```

use clap::{Args, Subcommand, ValueEnum};
use formflow_core::{models::FieldKind, params::*};

/// Create a new form
#[derive(Args)]
pub struct CreateFormArgs {
    /// Title of the form
    pub title: String,
    #[arg(long, help = "URL slug; derived from the title when omitted")]
    pub slug: Option<String>,
    #[arg(short, long, help = "Optional description shown above the fields")]
    pub description: Option<String>,
}

impl From<CreateFormArgs> for CreateForm {
    fn from(val: CreateFormArgs) -> Self {
        CreateForm {
            title: val.title,
            slug: val.slug,
            description: val.description,
        }
    }
}

/// Field types accepted by `form add-field`
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FieldKindArg {
    Text,
    Textarea,
    Number,
    Email,
    Select,
    Radio,
    Checkbox,
    Date,
    File,
}

/// Append a field to a form
///
/// Rules that do not apply to the chosen kind are ignored. Choice kinds
/// (select, radio, checkbox) need `--options`.
#[derive(Args)]
pub struct AddFieldArgs {
    #[arg(help = "Unique identifier of the form to extend")]
    pub form_id: u64,
    /// Label shown to visitors
    pub label: String,
    #[arg(short, long, value_enum, default_value = "text")]
    pub kind: FieldKindArg,
    #[arg(short, long, help = "Help text shown under the label")]
    pub description: Option<String>,
    #[arg(short, long, help = "Reject submissions that leave this field empty")]
    pub required: bool,
    #[arg(long, help = "Minimum length for text and textarea fields")]
    pub min_length: Option<u32>,
    #[arg(long, help = "Maximum length for text and textarea fields")]
    pub max_length: Option<u32>,
    #[arg(long, help = "Smallest accepted number", allow_negative_numbers = true)]
    pub min: Option<f64>,
    #[arg(long, help = "Largest accepted number", allow_negative_numbers = true)]
    pub max: Option<f64>,
    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Choices for select, radio and checkbox fields as a comma-separated list"
    )]
    pub options: Vec<String>,
    #[arg(long, help = "Minimum number of ticked checkbox options")]
    pub min_selections: Option<u32>,
    #[arg(long, help = "Maximum number of ticked checkbox options")]
    pub max_selections: Option<u32>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Accepted extensions for file fields as a comma-separated list"
    )]
    pub extensions: Vec<String>,
}

impl AddFieldArgs {
    fn kind(&self) -> FieldKind {
        match self.kind {
            FieldKindArg::Text => FieldKind::Text {
                min_length: self.min_length,
                max_length: self.max_length,
            },
            FieldKindArg::Textarea => FieldKind::Textarea {
                min_length: self.min_length,
                max_length: self.max_length,
            },
            FieldKindArg::Number => FieldKind::Number {
                min_value: self.min,
                max_value: self.max,
            },
            FieldKindArg::Email => FieldKind::Email,
            FieldKindArg::Select => FieldKind::Select {
                options: self.options.clone(),
            },
            FieldKindArg::Radio => FieldKind::Radio {
                options: self.options.clone(),
            },
            FieldKindArg::Checkbox => FieldKind::Checkbox {
                options: self.options.clone(),
                min_selections: self.min_selections,
                max_selections: self.max_selections,
            },
            FieldKindArg::Date => FieldKind::Date,
            FieldKindArg::File => FieldKind::File {
                allowed_extensions: self.extensions.clone(),
            },
        }
    }
}

impl From<AddFieldArgs> for AddField {
    fn from(val: AddFieldArgs) -> Self {
        let kind = val.kind();
        AddField {
            form_id: val.form_id,
            label: val.label,
            description: val.description,
            is_required: val.required,
            kind,
        }
    }
}

/// Look up a form or process by ID or by slug
#[derive(Args)]
pub struct LookupArgs {
    #[arg(required_unless_present = "slug", help = "Unique identifier to show")]
    pub id: Option<u64>,
    #[arg(long, conflicts_with = "id", help = "Look up by slug instead of ID")]
    pub slug: Option<String>,
}

/// Target of a lookup, resolved from [`LookupArgs`].
pub enum Lookup {
    Id(Id),
    Slug(Slug),
}

impl From<LookupArgs> for Lookup {
    fn from(val: LookupArgs) -> Self {
        match (val.id, val.slug) {
            (_, Some(slug)) => Lookup::Slug(Slug { slug }),
            (id, None) => Lookup::Id(Id {
                id: id.unwrap_or_default(),
            }),
        }
    }
}

/// Operate on a single resource by ID
#[derive(Args)]
pub struct IdArgs {
    #[arg(help = "Unique identifier of the resource")]
    pub id: u64,
}

impl From<IdArgs> for Id {
    fn from(val: IdArgs) -> Self {
        Id { id: val.id }
    }
}

#[derive(Subcommand)]
pub enum FormCommands {
    /// Create a new form
    #[command(alias = "c")]
    Create(CreateFormArgs),
    /// Append a field to a form
    #[command(alias = "af")]
    AddField(AddFieldArgs),
    /// Show a form with its fields
    #[command(alias = "s")]
    Show(LookupArgs),
    /// List all forms
    #[command(aliases = ["l", "ls"])]
    List,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Steps are worked in order
    Linear,
    /// Steps may be completed in any order
    Free,
}

impl ModeArg {
    fn as_str(self) -> &'static str {
        match self {
            ModeArg::Linear => "linear",
            ModeArg::Free => "free",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum VisibilityArg {
    Public,
    Private,
}

impl VisibilityArg {
    fn as_str(self) -> &'static str {
        match self {
            VisibilityArg::Public => "public",
            VisibilityArg::Private => "private",
        }
    }
}

/// Create a new process
#[derive(Args)]
pub struct CreateProcessArgs {
    /// Title of the process
    pub title: String,
    #[arg(long, help = "URL slug; derived from the title when omitted")]
    pub slug: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long, value_enum, help = "Navigation mode (default: linear)")]
    pub mode: Option<ModeArg>,
    #[arg(short, long, value_enum, help = "Who may start the process (default: public)")]
    pub visibility: Option<VisibilityArg>,
    #[arg(long, help = "Let visitors replace the answers of completed steps")]
    pub allow_resubmission: bool,
}

impl From<CreateProcessArgs> for CreateProcess {
    fn from(val: CreateProcessArgs) -> Self {
        CreateProcess {
            title: val.title,
            slug: val.slug,
            description: val.description,
            mode: val.mode.map(|m| m.as_str().to_string()),
            visibility: val.visibility.map(|v| v.as_str().to_string()),
            allow_resubmission: val.allow_resubmission,
        }
    }
}

/// Change a process; omitted options are left unchanged
#[derive(Args)]
pub struct UpdateProcessArgs {
    #[arg(help = "Unique identifier of the process to update")]
    pub id: u64,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long, help = "New description; pass \"\" to clear it")]
    pub description: Option<String>,
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,
    #[arg(short, long, value_enum)]
    pub visibility: Option<VisibilityArg>,
    #[arg(long)]
    pub allow_resubmission: Option<bool>,
}

impl From<UpdateProcessArgs> for UpdateProcess {
    fn from(val: UpdateProcessArgs) -> Self {
        UpdateProcess {
            id: val.id,
            title: val.title,
            description: val.description,
            mode: val.mode.map(|m| m.as_str().to_string()),
            visibility: val.visibility.map(|v| v.as_str().to_string()),
            allow_resubmission: val.allow_resubmission,
        }
    }
}

/// List processes
#[derive(Args)]
pub struct ListProcessesArgs {
    #[arg(short, long, help = "Include deactivated processes")]
    pub all: bool,
}

impl From<ListProcessesArgs> for ListProcesses {
    fn from(val: ListProcessesArgs) -> Self {
        ListProcesses {
            include_inactive: val.all,
        }
    }
}

/// Set or clear the access password of a private process
#[derive(Args)]
pub struct PasswordArgs {
    #[arg(help = "Unique identifier of the process")]
    pub id: u64,
    #[arg(required_unless_present = "clear", help = "New access password")]
    pub password: Option<String>,
    #[arg(long, conflicts_with = "password", help = "Remove the password")]
    pub clear: bool,
}

impl From<PasswordArgs> for SetPassword {
    fn from(val: PasswordArgs) -> Self {
        SetPassword {
            id: val.id,
            password: if val.clear { None } else { val.password },
        }
    }
}

#[derive(Subcommand)]
pub enum ProcessCommands {
    /// Create a new process
    #[command(alias = "c")]
    Create(CreateProcessArgs),
    /// List processes
    #[command(aliases = ["l", "ls"])]
    List(ListProcessesArgs),
    /// Show a process with its steps
    #[command(alias = "s")]
    Show(LookupArgs),
    /// Change a process
    #[command(alias = "u")]
    Update(UpdateProcessArgs),
    /// Make a process available to visitors
    Publish(IdArgs),
    /// Withdraw a process from visitors
    Unpublish(IdArgs),
    /// Reactivate a deactivated process
    Activate(IdArgs),
    /// Deactivate a process; open progress records stay untouched
    Deactivate(IdArgs),
    /// Set or clear the access password
    Password(PasswordArgs),
}

/// Append a step to a process
#[derive(Args)]
pub struct AddStepArgs {
    #[arg(help = "Unique identifier of the process to add this step to")]
    pub process_id: u64,
    #[arg(help = "Form whose fields this step collects")]
    pub form_id: u64,
    /// Title of the step
    pub title: String,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long, help = "Let visitors skip this step")]
    pub optional: bool,
}

impl From<AddStepArgs> for AddStep {
    fn from(val: AddStepArgs) -> Self {
        AddStep {
            process_id: val.process_id,
            form_id: val.form_id,
            title: val.title,
            description: val.description,
            is_required: !val.optional,
        }
    }
}

/// Insert a step at a position; later steps shift down
#[derive(Args)]
pub struct InsertStepArgs {
    #[arg(help = "Unique identifier of the process to insert this step into")]
    pub process_id: u64,
    #[arg(help = "0-based position index where to insert the step (0 = first position)")]
    pub position: u32,
    #[arg(help = "Form whose fields this step collects")]
    pub form_id: u64,
    /// Title of the step
    pub title: String,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long, help = "Let visitors skip this step")]
    pub optional: bool,
}

impl From<InsertStepArgs> for InsertStep {
    fn from(val: InsertStepArgs) -> Self {
        InsertStep {
            step: AddStep {
                process_id: val.process_id,
                form_id: val.form_id,
                title: val.title,
                description: val.description,
                is_required: !val.optional,
            },
            position: val.position,
        }
    }
}

/// Change a step; omitted options are left unchanged
#[derive(Args)]
pub struct UpdateStepArgs {
    #[arg(help = "Unique identifier of the step to update")]
    pub id: u64,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long, help = "Whether visitors must complete the step")]
    pub required: Option<bool>,
    #[arg(long, help = "Collect a different form in this step")]
    pub form_id: Option<u64>,
}

impl From<UpdateStepArgs> for UpdateStep {
    fn from(val: UpdateStepArgs) -> Self {
        UpdateStep {
            id: val.id,
            title: val.title,
            description: val.description,
            is_required: val.required,
            form_id: val.form_id,
        }
    }
}

/// Swap the order of two steps within the same process
#[derive(Args)]
pub struct SwapStepsArgs {
    #[arg(help = "Unique identifier of the first step to swap")]
    pub step1_id: u64,
    #[arg(help = "Unique identifier of the second step to swap")]
    pub step2_id: u64,
}

impl From<SwapStepsArgs> for SwapSteps {
    fn from(val: SwapStepsArgs) -> Self {
        SwapSteps {
            step1_id: val.step1_id,
            step2_id: val.step2_id,
        }
    }
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Append a step to a process
    #[command(alias = "a")]
    Add(AddStepArgs),
    /// Insert a step at a specific position
    #[command(alias = "i")]
    Insert(InsertStepArgs),
    /// Change a step
    #[command(alias = "u")]
    Update(UpdateStepArgs),
    /// Show a single step
    #[command(alias = "s")]
    Show(IdArgs),
    /// List the steps of a process in order
    #[command(aliases = ["l", "ls"])]
    List(IdArgs),
    /// Swap the order of two steps
    #[command(alias = "sw")]
    Swap(SwapStepsArgs),
    /// Remove a step and its ledger entries
    #[command(aliases = ["rm", "d"])]
    Remove(IdArgs),
}
