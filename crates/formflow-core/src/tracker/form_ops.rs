//! Form operations for the Tracker.

use super::{require_text, Tracker};
use crate::{
    db::utils::{is_valid_slug, slugify},
    error::{Result, TrackerError},
    models::{Form, FormField},
    params::{AddField, CreateForm, Id, Slug},
};

/// The caller's slug, or one derived from `title`.
pub(crate) fn resolve_slug(slug: Option<&str>, title: &str) -> Result<String> {
    let slug = match slug {
        Some(slug) => slug.trim().to_string(),
        None => slugify(title),
    };
    if !is_valid_slug(&slug) {
        return Err(TrackerError::invalid_input("slug").with_reason(format!(
            "'{slug}' is not a valid slug; use lowercase letters, digits and hyphens"
        )));
    }
    Ok(slug)
}

impl Tracker {
    /// Creates a form. Without an explicit slug one is derived from the
    /// title.
    pub async fn create_form(&self, params: &CreateForm) -> Result<Form> {
        let title = require_text("title", &params.title)?;
        let slug = resolve_slug(params.slug.as_deref(), &title)?;
        let description = params.description.clone();
        let now = self.now();

        let form = self
            .with_db(move |db| db.create_form(&title, &slug, description.as_deref(), now))
            .await?;
        log::debug!("Created form {} ({})", form.id, form.slug);
        Ok(form)
    }

    /// Appends a field to a form after checking its rules.
    pub async fn add_field(&self, params: &AddField) -> Result<FormField> {
        let label = require_text("label", &params.label)?;
        params
            .kind
            .check()
            .map_err(|reason| TrackerError::invalid_input("kind").with_reason(reason))?;

        let form_id = params.form_id;
        let description = params.description.clone();
        let is_required = params.is_required;
        let kind = params.kind.clone();
        let now = self.now();

        self.with_db(move |db| {
            db.add_field(
                form_id,
                &label,
                description.as_deref(),
                is_required,
                &kind,
                now,
            )
        })
        .await
    }

    /// Retrieves a form with its fields.
    pub async fn get_form(&self, params: &Id) -> Result<Option<Form>> {
        let form_id = params.id;
        self.with_db(move |db| db.get_form(form_id)).await
    }

    /// Retrieves a form with its fields by slug.
    pub async fn get_form_by_slug(&self, params: &Slug) -> Result<Option<Form>> {
        let slug = params.slug.clone();
        self.with_db(move |db| db.get_form_by_slug(&slug)).await
    }

    /// Lists every form, newest first.
    pub async fn list_forms(&self) -> Result<Vec<Form>> {
        self.with_db(|db| db.list_forms()).await
    }
}
