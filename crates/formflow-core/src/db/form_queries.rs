//! Form and field definitions.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use super::utils::{id, json, timestamp};
use crate::{
    error::{DatabaseResultExt, Result, TrackerError},
    models::{FieldKind, Form, FormField},
};

const INSERT_FORM_SQL: &str = "INSERT INTO forms (title, slug, description, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, 1, ?4, ?4)";
const FORM_COLUMNS: &str = "id, title, slug, description, is_active, created_at, updated_at";
const CHECK_FORM_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM forms WHERE id = ?1)";
const CHECK_FORM_SLUG_SQL: &str = "SELECT EXISTS(SELECT 1 FROM forms WHERE slug = ?1)";
const NEXT_FIELD_ORDER_SQL: &str =
    "SELECT COALESCE(MAX(field_order), -1) + 1 FROM form_fields WHERE form_id = ?1";
const INSERT_FIELD_SQL: &str = "INSERT INTO form_fields (form_id, label, description, is_required, field_order, kind, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)";
const SELECT_FIELDS_SQL: &str = "SELECT id, form_id, label, description, is_required, field_order, kind, created_at, updated_at FROM form_fields WHERE form_id = ?1 ORDER BY field_order";
const TOUCH_FORM_SQL: &str = "UPDATE forms SET updated_at = ?1 WHERE id = ?2";

impl super::Database {
    fn build_form_from_row(row: &rusqlite::Row) -> rusqlite::Result<Form> {
        Ok(Form {
            id: id(row, 0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            is_active: row.get(4)?,
            created_at: timestamp(row, 5)?,
            updated_at: timestamp(row, 6)?,
            fields: Vec::new(),
        })
    }

    fn build_field_from_row(row: &rusqlite::Row) -> rusqlite::Result<FormField> {
        Ok(FormField {
            id: id(row, 0)?,
            form_id: id(row, 1)?,
            label: row.get(2)?,
            description: row.get(3)?,
            is_required: row.get(4)?,
            order: row.get::<_, i64>(5)? as u32,
            kind: json::<FieldKind>(row, 6)?,
            created_at: timestamp(row, 7)?,
            updated_at: timestamp(row, 8)?,
        })
    }

    /// Creates an active form with no fields.
    ///
    /// The slug must be unused; callers derive one from the title when the
    /// user did not supply it.
    pub fn create_form(
        &mut self,
        title: &str,
        slug: &str,
        description: Option<&str>,
        now: Timestamp,
    ) -> Result<Form> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let taken: bool = tx
            .query_row(CHECK_FORM_SLUG_SQL, params![slug], |row| row.get(0))
            .db_context("Failed to check form slug")?;
        if taken {
            return Err(TrackerError::invalid_input("slug")
                .with_reason(format!("Form slug '{slug}' is already in use")));
        }

        tx.execute(
            INSERT_FORM_SQL,
            params![title, slug, description, now.to_string()],
        )
        .db_context("Failed to insert form")?;
        let id = tx.last_insert_rowid() as u64;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Form {
            id,
            title: title.into(),
            slug: slug.into(),
            description: description.map(String::from),
            is_active: true,
            created_at: now,
            updated_at: now,
            fields: Vec::new(),
        })
    }

    /// Appends a field to a form. The kind must already have passed
    /// [`FieldKind::check`].
    pub fn add_field(
        &mut self,
        form_id: u64,
        label: &str,
        description: Option<&str>,
        is_required: bool,
        kind: &FieldKind,
        now: Timestamp,
    ) -> Result<FormField> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let exists: bool = tx
            .query_row(CHECK_FORM_EXISTS_SQL, params![form_id as i64], |row| {
                row.get(0)
            })
            .db_context("Failed to check form existence")?;
        if !exists {
            return Err(TrackerError::NotFound {
                entity: "Form",
                id: form_id,
            });
        }

        let order: i64 = tx
            .query_row(NEXT_FIELD_ORDER_SQL, params![form_id as i64], |row| {
                row.get(0)
            })
            .db_context("Failed to get next field order")?;

        let now_str = now.to_string();
        tx.execute(
            INSERT_FIELD_SQL,
            params![
                form_id as i64,
                label,
                description,
                is_required,
                order,
                serde_json::to_string(kind)?,
                &now_str
            ],
        )
        .db_context("Failed to insert form field")?;
        let id = tx.last_insert_rowid() as u64;

        tx.execute(TOUCH_FORM_SQL, params![&now_str, form_id as i64])
            .db_context("Failed to update form timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(FormField {
            id,
            form_id,
            label: label.into(),
            description: description.map(String::from),
            is_required,
            order: order as u32,
            kind: kind.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Retrieves a form with its fields.
    pub fn get_form(&self, form_id: u64) -> Result<Option<Form>> {
        let mut form = self
            .connection
            .query_row(
                &format!("SELECT {FORM_COLUMNS} FROM forms WHERE id = ?1"),
                params![form_id as i64],
                Self::build_form_from_row,
            )
            .optional()
            .db_context("Failed to query form")?;

        if let Some(ref mut form) = form {
            form.fields = Self::query_fields(&self.connection, form.id)?;
        }
        Ok(form)
    }

    /// Retrieves a form by its slug.
    pub fn get_form_by_slug(&self, slug: &str) -> Result<Option<Form>> {
        let mut form = self
            .connection
            .query_row(
                &format!("SELECT {FORM_COLUMNS} FROM forms WHERE slug = ?1"),
                params![slug],
                Self::build_form_from_row,
            )
            .optional()
            .db_context("Failed to query form")?;

        if let Some(ref mut form) = form {
            form.fields = Self::query_fields(&self.connection, form.id)?;
        }
        Ok(form)
    }

    /// Lists all forms, newest first, without their fields.
    pub fn list_forms(&self) -> Result<Vec<Form>> {
        let mut stmt = self
            .connection
            .prepare(&format!("SELECT {FORM_COLUMNS} FROM forms ORDER BY id DESC"))
            .db_context("Failed to prepare query")?;

        let forms = stmt
            .query_map([], Self::build_form_from_row)
            .db_context("Failed to query forms")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch forms")?;
        Ok(forms)
    }

    /// Fields of a form in order. Works inside an open transaction.
    pub(crate) fn query_fields(conn: &Connection, form_id: u64) -> Result<Vec<FormField>> {
        let mut stmt = conn
            .prepare(SELECT_FIELDS_SQL)
            .db_context("Failed to prepare query")?;

        let fields = stmt
            .query_map(params![form_id as i64], Self::build_field_from_row)
            .db_context("Failed to query form fields")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch form fields")?;
        Ok(fields)
    }

    pub(crate) fn form_exists(conn: &Connection, form_id: u64) -> Result<bool> {
        conn.query_row(CHECK_FORM_EXISTS_SQL, params![form_id as i64], |row| {
            row.get(0)
        })
        .db_context("Failed to check form existence")
    }
}
