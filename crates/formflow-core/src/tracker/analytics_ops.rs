//! Analytics operations for the Tracker.

use super::Tracker;
use crate::{
    error::Result,
    models::{
        AbandonedProgress, ActivityOverTime, CompletionRate, CompletionTimes, DropOffReport,
        FieldSummary, FormDropOff, FormOverview,
    },
    params::{ActivityWindow, FieldReport, Id, TrackFormView, TrackView},
};

/// Window used when no day count is given.
const DEFAULT_ACTIVITY_DAYS: u32 = 30;

impl Tracker {
    /// Records that a session viewed a process.
    pub async fn track_view(&self, params: &TrackView) -> Result<()> {
        let process_id = params.process_id;
        let session_id = params.session_id.clone();
        let now = self.now();
        self.with_db(move |db| db.track_view(process_id, &session_id, now))
            .await
    }

    pub async fn completion_rate(&self, params: &Id) -> Result<CompletionRate> {
        let process_id = params.id;
        self.with_db(move |db| db.completion_rate(process_id)).await
    }

    pub async fn drop_off(&self, params: &Id) -> Result<DropOffReport> {
        let process_id = params.id;
        self.with_db(move |db| db.drop_off(process_id)).await
    }

    pub async fn completion_times(&self, params: &Id) -> Result<CompletionTimes> {
        let process_id = params.id;
        self.with_db(move |db| db.completion_times(process_id)).await
    }

    /// Abandoned records of a process, with hours idle as of now.
    pub async fn abandoned_progress(&self, params: &Id) -> Result<Vec<AbandonedProgress>> {
        let process_id = params.id;
        let now = self.now();
        self.with_db(move |db| db.abandoned_progress(process_id, now))
            .await
    }

    /// Daily views and completions of a process, ending today (UTC).
    pub async fn activity_over_time(&self, params: &ActivityWindow) -> Result<ActivityOverTime> {
        let process_id = params.process_id;
        let days = params.days.unwrap_or(DEFAULT_ACTIVITY_DAYS);
        let now = self.now();
        self.with_db(move |db| db.activity_over_time(process_id, days, now))
            .await
    }

    /// Records that a session viewed a standalone form.
    pub async fn track_form_view(&self, params: &TrackFormView) -> Result<()> {
        let form_id = params.form_id;
        let session_id = params.session_id.clone();
        let now = self.now();
        self.with_db(move |db| db.track_form_view(form_id, &session_id, now))
            .await
    }

    pub async fn form_overview(&self, params: &Id) -> Result<FormOverview> {
        let form_id = params.id;
        self.with_db(move |db| db.form_overview(form_id)).await
    }

    pub async fn form_drop_off(&self, params: &Id) -> Result<FormDropOff> {
        let form_id = params.id;
        self.with_db(move |db| db.form_drop_off(form_id)).await
    }

    /// Answer figures per field over the submitted answers of a form.
    pub async fn field_summary(&self, params: &FieldReport) -> Result<Vec<FieldSummary>> {
        let form_id = params.form_id;
        let field_id = params.field_id;
        self.with_db(move |db| db.field_summary(form_id, field_id))
            .await
    }
}
