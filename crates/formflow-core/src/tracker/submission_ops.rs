//! Standalone form submissions for the Tracker.

use super::Tracker;
use crate::{
    error::{Result, TrackerError},
    models::{Page, Submission, SubmissionStatus},
    params::{Id, ListSubmissions, SubmitForm},
};

impl Tracker {
    /// Validates answers against a form and stores them.
    ///
    /// Drafts skip the required-field check; every other rule still applies.
    pub async fn submit_form(&self, params: &SubmitForm) -> Result<Submission> {
        if params.session_id.trim().is_empty() {
            return Err(TrackerError::invalid_input("session_id")
                .with_reason("Session ID cannot be empty"));
        }

        let form_id = params.form_id;
        let session_id = params.session_id.clone();
        let answers = params.answers.clone();
        let draft = params.draft;
        let validator = self.validator.clone();
        let now = self.now();

        self.with_db(move |db| {
            let form = db.get_form(form_id)?.ok_or(TrackerError::NotFound {
                entity: "Form",
                id: form_id,
            })?;

            let mut fields = form.fields;
            if draft {
                for field in &mut fields {
                    field.is_required = false;
                }
            }
            let cleaned = validator
                .validate(&fields, &answers)
                .map_err(|errors| TrackerError::Validation { errors })?;

            let status = if draft {
                SubmissionStatus::Draft
            } else {
                SubmissionStatus::Submitted
            };
            db.create_submission(form_id, &session_id, status, &cleaned, now)
        })
        .await
    }

    pub async fn get_submission(&self, params: &Id) -> Result<Option<Submission>> {
        let submission_id = params.id;
        self.with_db(move |db| db.get_submission(submission_id))
            .await
    }

    /// Pages through the submissions of a form, newest first.
    pub async fn list_submissions(&self, params: &ListSubmissions) -> Result<Page<Submission>> {
        let form_id = params.form_id;
        let status = params.status;
        let limit = params
            .limit
            .unwrap_or(self.settings.page_size)
            .clamp(1, crate::models::MAX_PAGE_SIZE);
        let offset = params.offset.unwrap_or(0);

        self.with_db(move |db| db.list_submissions(form_id, status, limit, offset))
            .await
    }

    pub async fn archive_submission(&self, params: &Id) -> Result<Submission> {
        let submission_id = params.id;
        let now = self.now();
        self.with_db(move |db| db.archive_submission(submission_id, now))
            .await
    }
}
