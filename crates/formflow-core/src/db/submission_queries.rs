//! Form submissions, standalone and linked to progress records.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use super::utils::{id, json, opt_id, opt_timestamp, parsed, timestamp};
use crate::{
    error::{DatabaseResultExt, Result, TrackerError},
    models::{Answers, Page, Submission, SubmissionStatus},
};

const SUBMISSION_COLUMNS: &str =
    "id, form_id, progress_id, session_id, status, answers, submitted_at, created_at, updated_at";
const INSERT_SUBMISSION_SQL: &str = "INSERT INTO submissions (form_id, progress_id, session_id, status, answers, submitted_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)";
const UPDATE_SUBMISSION_ANSWERS_SQL: &str = "UPDATE submissions SET answers = ?1, status = ?2, submitted_at = ?3, updated_at = ?3 WHERE id = ?4";
const ARCHIVE_SUBMISSION_SQL: &str =
    "UPDATE submissions SET status = 'archived', updated_at = ?1 WHERE id = ?2";

impl super::Database {
    fn build_submission_from_row(row: &rusqlite::Row) -> rusqlite::Result<Submission> {
        Ok(Submission {
            id: id(row, 0)?,
            form_id: id(row, 1)?,
            progress_id: opt_id(row, 2)?,
            session_id: row.get(3)?,
            status: parsed::<SubmissionStatus>(row, 4)?,
            answers: json::<Answers>(row, 5)?,
            submitted_at: opt_timestamp(row, 6)?,
            created_at: timestamp(row, 7)?,
            updated_at: timestamp(row, 8)?,
        })
    }

    /// Stores a standalone submission. Answers must already be validated.
    pub fn create_submission(
        &mut self,
        form_id: u64,
        session_id: &str,
        status: SubmissionStatus,
        answers: &Answers,
        now: Timestamp,
    ) -> Result<Submission> {
        let id = Self::insert_submission(
            &self.connection,
            form_id,
            None,
            session_id,
            status,
            answers,
            now,
        )?;
        Self::query_submission(&self.connection, id)?.ok_or(TrackerError::NotFound {
            entity: "Submission",
            id,
        })
    }

    /// Retrieves a submission by its ID.
    pub fn get_submission(&self, submission_id: u64) -> Result<Option<Submission>> {
        Self::query_submission(&self.connection, submission_id)
    }

    /// Lists the submissions of a form, newest first.
    pub fn list_submissions(
        &self,
        form_id: u64,
        status: Option<SubmissionStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Submission>> {
        let status_filter = status.map(|s| s.as_str());

        let total: i64 = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM submissions WHERE form_id = ?1 AND (?2 IS NULL OR status = ?2)",
                params![form_id as i64, status_filter],
                |row| row.get(0),
            )
            .db_context("Failed to count submissions")?;

        let mut stmt = self
            .connection
            .prepare(&format!(
                "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE form_id = ?1 AND (?2 IS NULL OR status = ?2) ORDER BY id DESC LIMIT ?3 OFFSET ?4"
            ))
            .db_context("Failed to prepare query")?;

        let items = stmt
            .query_map(
                params![form_id as i64, status_filter, limit as i64, offset as i64],
                Self::build_submission_from_row,
            )
            .db_context("Failed to query submissions")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch submissions")?;

        Ok(Page {
            items,
            total: total as u64,
            limit,
            offset,
        })
    }

    /// Archives a submission. Archiving twice is a no-op.
    pub fn archive_submission(&mut self, submission_id: u64, now: Timestamp) -> Result<Submission> {
        let rows = self
            .connection
            .execute(
                ARCHIVE_SUBMISSION_SQL,
                params![now.to_string(), submission_id as i64],
            )
            .db_context("Failed to archive submission")?;
        if rows == 0 {
            return Err(TrackerError::NotFound {
                entity: "Submission",
                id: submission_id,
            });
        }
        Self::query_submission(&self.connection, submission_id)?.ok_or(TrackerError::NotFound {
            entity: "Submission",
            id: submission_id,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_submission(
        conn: &Connection,
        form_id: u64,
        progress_id: Option<u64>,
        session_id: &str,
        status: SubmissionStatus,
        answers: &Answers,
        now: Timestamp,
    ) -> Result<u64> {
        let submitted_at = (status == SubmissionStatus::Submitted).then(|| now.to_string());
        conn.execute(
            INSERT_SUBMISSION_SQL,
            params![
                form_id as i64,
                progress_id.map(|id| id as i64),
                session_id,
                status.as_str(),
                serde_json::to_string(answers)?,
                submitted_at,
                now.to_string()
            ],
        )
        .db_context("Failed to insert submission")?;
        Ok(conn.last_insert_rowid() as u64)
    }

    /// Replaces the answers of a submission and marks it submitted.
    pub(crate) fn resubmit(
        conn: &Connection,
        submission_id: u64,
        answers: &Answers,
        now: Timestamp,
    ) -> Result<()> {
        conn.execute(
            UPDATE_SUBMISSION_ANSWERS_SQL,
            params![
                serde_json::to_string(answers)?,
                SubmissionStatus::Submitted.as_str(),
                now.to_string(),
                submission_id as i64
            ],
        )
        .db_context("Failed to update submission")?;
        Ok(())
    }

    pub(crate) fn query_submission(
        conn: &Connection,
        submission_id: u64,
    ) -> Result<Option<Submission>> {
        conn.query_row(
            &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
            params![submission_id as i64],
            Self::build_submission_from_row,
        )
        .optional()
        .db_context("Failed to query submission")
    }
}
