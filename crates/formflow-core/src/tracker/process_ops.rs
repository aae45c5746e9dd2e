//! Process operations for the Tracker.

use super::{form_ops::resolve_slug, require_text, Tracker};
use crate::{
    error::{Result, TrackerError},
    models::{NavigationMode, Process, UpdateProcessRequest, Visibility},
    params::{CreateProcess, Id, ListProcesses, SetPassword, Slug, UpdateProcess},
};

impl Tracker {
    /// Creates an active, unpublished process.
    ///
    /// Mode defaults to linear and visibility to public.
    pub async fn create_process(&self, params: &CreateProcess) -> Result<Process> {
        let title = require_text("title", &params.title)?;
        let slug = resolve_slug(params.slug.as_deref(), &title)?;
        let mode = match params.mode.as_deref() {
            Some(mode) => mode
                .parse::<NavigationMode>()
                .map_err(|reason| TrackerError::invalid_input("mode").with_reason(reason))?,
            None => NavigationMode::default(),
        };
        let visibility = match params.visibility.as_deref() {
            Some(visibility) => visibility
                .parse::<Visibility>()
                .map_err(|reason| TrackerError::invalid_input("visibility").with_reason(reason))?,
            None => Visibility::default(),
        };
        let description = params.description.clone();
        let allow_resubmission = params.allow_resubmission;
        let now = self.now();

        let process = self
            .with_db(move |db| {
                db.create_process(
                    &title,
                    &slug,
                    description.as_deref(),
                    mode,
                    visibility,
                    allow_resubmission,
                    now,
                )
            })
            .await?;
        log::debug!("Created process {} ({})", process.id, process.slug);
        Ok(process)
    }

    /// Retrieves a process with its steps.
    pub async fn get_process(&self, params: &Id) -> Result<Option<Process>> {
        let process_id = params.id;
        self.with_db(move |db| db.get_process(process_id)).await
    }

    /// Retrieves a process with its steps by slug.
    pub async fn get_process_by_slug(&self, params: &Slug) -> Result<Option<Process>> {
        let slug = params.slug.clone();
        self.with_db(move |db| db.get_process_by_slug(&slug)).await
    }

    pub async fn list_processes(&self, params: &ListProcesses) -> Result<Vec<Process>> {
        let include_inactive = params.include_inactive;
        self.with_db(move |db| db.list_processes(include_inactive))
            .await
    }

    /// Applies a partial update to a process definition.
    pub async fn update_process(&self, params: &UpdateProcess) -> Result<Process> {
        let process_id = params.id;
        let request = UpdateProcessRequest::try_from(params.clone())?;
        let now = self.now();
        self.with_db(move |db| db.update_process(process_id, request, now))
            .await
    }

    pub async fn activate_process(&self, params: &Id) -> Result<Process> {
        self.set_active(params.id, true).await
    }

    /// Deactivated processes cannot be started; existing progress records
    /// are left as they are.
    pub async fn deactivate_process(&self, params: &Id) -> Result<Process> {
        self.set_active(params.id, false).await
    }

    /// Publishes a process now.
    pub async fn publish_process(&self, params: &Id) -> Result<Process> {
        let process_id = params.id;
        let now = self.now();
        let process = self
            .with_db(move |db| db.set_process_published(process_id, Some(now), now))
            .await?;
        log::info!("Published process {process_id}");
        Ok(process)
    }

    pub async fn unpublish_process(&self, params: &Id) -> Result<Process> {
        let process_id = params.id;
        let now = self.now();
        self.with_db(move |db| db.set_process_published(process_id, None, now))
            .await
    }

    /// Sets the access password of a process, or clears it with `None`.
    pub async fn set_process_password(&self, params: &SetPassword) -> Result<Process> {
        let process_id = params.id;
        let password = match params.password.as_deref() {
            Some(password) if password.is_empty() => {
                return Err(TrackerError::invalid_input("password")
                    .with_reason("Password cannot be empty; omit it to clear the password"));
            }
            password => password.map(String::from),
        };
        let now = self.now();
        self.with_db(move |db| db.set_process_password(process_id, password.as_deref(), now))
            .await
    }

    async fn set_active(&self, process_id: u64, active: bool) -> Result<Process> {
        let now = self.now();
        let process = self
            .with_db(move |db| db.set_process_active(process_id, active, now))
            .await?;
        log::info!(
            "Process {process_id} {}",
            if active { "activated" } else { "deactivated" }
        );
        Ok(process)
    }
}
