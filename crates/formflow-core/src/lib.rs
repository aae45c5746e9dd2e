//! Core library for the Formflow process tracker.
//!
//! Formflow tracks visitors through multi-step processes whose steps are
//! forms. It provides process and form definitions, the per-visitor progress
//! state machine with its step completion ledger, form submissions, an
//! abandonment sweeper and owner analytics, all persisted in SQLite.
//!
//! # Architecture
//!
//! - **Tracker** ([`tracker`]): async façade used by every interface
//! - **State machine** (`state`): pure transitions over one progress record
//! - **Persistence** ([`db`]): rusqlite queries and write transactions
//! - **Domain Models** ([`models`]): plain data with serde derives
//! - **Display** ([`display`]): markdown rendering for terminals and MCP
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use formflow_core::{
//!     models::{Answers, FieldKind, Visitor},
//!     params::{AddField, AddStep, CompleteStep, CreateForm, CreateProcess, Id, StartProcess},
//!     TrackerBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new()
//!     .with_database_path(Some("formflow.db"))
//!     .build()
//!     .await?;
//!
//! let form = tracker
//!     .create_form(&CreateForm {
//!         title: "Contact".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! let email = tracker
//!     .add_field(&AddField {
//!         form_id: form.id,
//!         label: "Email".to_string(),
//!         description: None,
//!         is_required: true,
//!         kind: FieldKind::Email,
//!     })
//!     .await?;
//!
//! let process = tracker
//!     .create_process(&CreateProcess {
//!         title: "Signup".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! let step = tracker
//!     .add_step(&AddStep {
//!         process_id: process.id,
//!         form_id: form.id,
//!         title: "Contact details".to_string(),
//!         description: None,
//!         is_required: true,
//!     })
//!     .await?;
//! tracker.publish_process(&Id { id: process.id }).await?;
//!
//! let progress = tracker
//!     .start(&StartProcess {
//!         process_id: process.id,
//!         visitor: Visitor::anonymous("session-1"),
//!         password: None,
//!     })
//!     .await?;
//! tracker
//!     .complete_step(&CompleteStep {
//!         progress_id: progress.id,
//!         step_id: step.id,
//!         answers: Answers::from([(email.id, serde_json::json!("ada@example.com"))]),
//!     })
//!     .await?;
//! let done = tracker.complete(&Id { id: progress.id }).await?;
//! println!("{done}");
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod models;
pub mod params;
mod state;
pub mod sweeper;
pub mod tracker;
pub mod validation;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Settings;
pub use db::Database;
pub use display::{
    CreateResult, DeleteResult, Forms, LocalDateTime, OperationStatus, Processes, Steps,
    UpdateResult,
};
pub use error::{Result, TrackerError};
pub use models::{
    Completed, CompletionResult, CompletionStatus, Form, Navigation, NavigationMode, Process,
    ProcessStep, Progress, ProgressStatus, StepDescriptor, Submission, Visibility, Visitor,
};
pub use sweeper::{SweepReport, Sweeper};
pub use tracker::{Tracker, TrackerBuilder};
pub use validation::{FieldErrors, FormValidator, RulesValidator};
