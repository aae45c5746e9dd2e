//! Builder for creating and configuring Tracker instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::task;

use super::Tracker;
use crate::{
    clock::{Clock, SystemClock},
    config::Settings,
    db::Database,
    error::{Result, TrackerError},
    validation::{FormValidator, RulesValidator},
};

/// Builder for creating and configuring Tracker instances.
#[derive(Clone)]
pub struct TrackerBuilder {
    database_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    validator: Arc<dyn FormValidator>,
    settings: Settings,
}

impl TrackerBuilder {
    /// Creates a new builder with the system clock, the built-in field rules
    /// and default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
            clock: Arc::new(SystemClock),
            validator: Arc::new(RulesValidator),
            settings: Settings::default(),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/formflow/formflow.db` or
    /// `~/.local/share/formflow/formflow.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Replaces the clock used to stamp every mutation.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the validator applied to submitted answers.
    pub fn with_validator(mut self, validator: Arc<dyn FormValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the configured tracker instance.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Configuration` if the settings are out of range
    /// Returns `TrackerError::FileSystem` if the database path is invalid
    /// Returns `TrackerError::Database` if database initialization fails
    pub async fn build(self) -> Result<Tracker> {
        self.settings.validate()?;

        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TrackerError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), TrackerError>(())
        })
        .await
        .map_err(|e| TrackerError::Configuration {
            message: format!("Task join error: {e}"),
        })??;

        log::debug!("Tracker database ready at {}", db_path.display());
        Ok(Tracker {
            db_path,
            clock: self.clock,
            validator: self.validator,
            settings: self.settings,
        })
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("formflow")
            .place_data_file("formflow.db")
            .map_err(|e| TrackerError::XdgDirectory(e.to_string()))
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
