//! High-level tracker API for forms, processes and visitor progress.
//!
//! [`Tracker`] is the entry point every interface goes through. Each call
//! opens its own SQLite connection on tokio's blocking pool, so a `Tracker`
//! is cheap to clone and safe to share across tasks.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  CLI / MCP      │    │    Tracker      │    │    Database     │
//! │  (params::*)    │───▶│ (*_ops, clock,  │───▶│   (via db/)     │
//! │                 │    │   validator)    │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for creating [`Tracker`] instances
//! - [`form_ops`]: Form and field definitions
//! - [`process_ops`]: Process definitions and their lifecycle switches
//! - [`step_ops`]: Step management and ordering
//! - [`visitor_ops`]: Starting, navigating and completing processes
//! - [`progress_ops`]: Progress lookups and owner listings
//! - [`submission_ops`]: Standalone form submissions
//! - [`analytics_ops`]: Views, completion rates, drop-off and timings
//!
//! # Example
//!
//! ```rust,no_run
//! use formflow_core::{
//!     models::Visitor,
//!     params::{Id, StartProcess},
//!     TrackerBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new().build().await?;
//!
//! let progress = tracker
//!     .start(&StartProcess {
//!         process_id: 1,
//!         visitor: Visitor::anonymous("session-abc"),
//!         password: None,
//!     })
//!     .await?;
//! let step = tracker.get_current_step(&Id { id: progress.id }).await?;
//! println!("{step}");
//! # Ok(())
//! # }
//! ```

use std::{path::PathBuf, sync::Arc};

use jiff::Timestamp;
use tokio::task;

use crate::{
    clock::Clock,
    config::Settings,
    db::Database,
    error::{Result, TrackerError},
    validation::FormValidator,
};

pub mod analytics_ops;
pub mod builder;
pub mod form_ops;
pub mod process_ops;
pub mod progress_ops;
pub mod step_ops;
pub mod submission_ops;
pub mod visitor_ops;


pub use builder::TrackerBuilder;

/// Main tracker interface.
#[derive(Clone)]
pub struct Tracker {
    pub(crate) db_path: PathBuf,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) validator: Arc<dyn FormValidator>,
    pub(crate) settings: Settings,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("db_path", &self.db_path)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Path of the SQLite database this tracker writes to.
    pub fn database_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Settings the tracker was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current time according to the configured clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Runs `op` against a fresh connection on the blocking pool.
    pub(crate) async fn with_db<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            op(&mut db)
        })
        .await
        .map_err(|e| TrackerError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}

/// Rejects blank text for a required field.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::invalid_input(field).with_reason(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}
