//! Progress records and the step completion ledger.

use std::collections::BTreeMap;

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use super::utils::{id, opt_id, opt_timestamp, parsed, timestamp};
use crate::{
    error::{DatabaseResultExt, Result, TrackerError},
    models::{
        CompletionStatus, LedgerEntry, Page, Progress, ProgressDetail, ProgressFilter,
        ProgressStatus, ProgressSummary, StepCompletion,
    },
    state::ProgressState,
};

const PROGRESS_COLUMNS: &str = "id, process_id, session_id, user_id, status, current_step_index, completion_percentage, version, started_at, last_activity_at, completed_at";
const COMPLETION_COLUMNS: &str =
    "id, progress_id, step_id, submission_id, status, completed_at, created_at, updated_at";
const SAVE_PROGRESS_SQL: &str = "UPDATE process_progress SET status = ?1, current_step_index = ?2, completion_percentage = ?3, last_activity_at = ?4, completed_at = ?5, version = version + 1 WHERE id = ?6 AND version = ?7";
const UPSERT_COMPLETION_SQL: &str = "INSERT INTO step_completions (progress_id, step_id, submission_id, status, completed_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
     ON CONFLICT (progress_id, step_id) DO UPDATE SET submission_id = excluded.submission_id, status = excluded.status, completed_at = excluded.completed_at, updated_at = excluded.updated_at";
const SELECT_OPEN_ACTIVITY_SQL: &str =
    "SELECT id, last_activity_at FROM process_progress WHERE status = 'in_progress' ORDER BY id";
const ABANDON_IF_IDLE_SQL: &str = "UPDATE process_progress SET status = 'abandoned', version = version + 1 WHERE id = ?1 AND status = 'in_progress' AND last_activity_at = ?2";

impl super::Database {
    fn build_progress_from_row(row: &rusqlite::Row) -> rusqlite::Result<Progress> {
        Ok(Progress {
            id: id(row, 0)?,
            process_id: id(row, 1)?,
            session_id: row.get(2)?,
            user_id: row.get(3)?,
            status: parsed::<ProgressStatus>(row, 4)?,
            current_step_index: row.get::<_, i64>(5)? as u32,
            completion_percentage: row.get(6)?,
            version: row.get::<_, i64>(7)? as u64,
            started_at: timestamp(row, 8)?,
            last_activity_at: timestamp(row, 9)?,
            completed_at: opt_timestamp(row, 10)?,
        })
    }

    fn build_completion_from_row(row: &rusqlite::Row) -> rusqlite::Result<StepCompletion> {
        Ok(StepCompletion {
            id: id(row, 0)?,
            progress_id: id(row, 1)?,
            step_id: id(row, 2)?,
            submission_id: opt_id(row, 3)?,
            status: parsed::<CompletionStatus>(row, 4)?,
            completed_at: opt_timestamp(row, 5)?,
            created_at: timestamp(row, 6)?,
            updated_at: timestamp(row, 7)?,
        })
    }

    /// Retrieves a progress record by its ID.
    pub fn get_progress(&self, progress_id: u64) -> Result<Option<Progress>> {
        Self::query_progress(&self.connection, progress_id)
    }

    /// Latest progress record of a session for a process, in any status.
    pub fn find_progress(&self, process_id: u64, session_id: &str) -> Result<Option<Progress>> {
        self.connection
            .query_row(
                &format!(
                    "SELECT {PROGRESS_COLUMNS} FROM process_progress WHERE process_id = ?1 AND session_id = ?2 ORDER BY id DESC LIMIT 1"
                ),
                params![process_id as i64, session_id],
                Self::build_progress_from_row,
            )
            .optional()
            .db_context("Failed to find progress")
    }

    /// A progress record with its ledger joined to the process steps.
    ///
    /// Steps added after the record started have no ledger row yet and are
    /// reported as pending.
    pub fn get_progress_detail(&self, progress_id: u64) -> Result<Option<ProgressDetail>> {
        let Some(progress) = Self::query_progress(&self.connection, progress_id)? else {
            return Ok(None);
        };
        let process = Self::query_process(&self.connection, progress.process_id)?.ok_or(
            TrackerError::NotFound {
                entity: "Process",
                id: progress.process_id,
            },
        )?;
        let ledger: BTreeMap<u64, StepCompletion> =
            Self::query_ledger(&self.connection, progress_id)?
                .into_iter()
                .map(|c| (c.step_id, c))
                .collect();

        let entries = process
            .steps
            .iter()
            .map(|step| {
                let row = ledger.get(&step.id);
                LedgerEntry {
                    step_id: step.id,
                    step_title: step.title.clone(),
                    order: step.order,
                    is_required: step.is_required,
                    status: row.map_or(CompletionStatus::Pending, |c| c.status),
                    completed_at: row.and_then(|c| c.completed_at),
                    submission_id: row.and_then(|c| c.submission_id),
                }
            })
            .collect();

        Ok(Some(ProgressDetail {
            progress,
            process_title: process.title,
            entries,
        }))
    }

    /// Lists the progress records of a process, newest first.
    pub fn list_progress(
        &self,
        process_id: u64,
        filter: &ProgressFilter,
    ) -> Result<Page<ProgressSummary>> {
        let mut conditions = vec!["process_id = ?"];
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(process_id as i64)];

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params_vec.push(Box::new(status.as_str()));
        }
        if let Some(ref session_id) = filter.session_id {
            conditions.push("session_id = ?");
            params_vec.push(Box::new(session_id.clone()));
        }
        let where_clause = conditions.join(" AND ");

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| &**b).collect();
        let total: i64 = self
            .connection
            .query_row(
                &format!("SELECT COUNT(*) FROM process_progress WHERE {where_clause}"),
                &params_refs[..],
                |row| row.get(0),
            )
            .db_context("Failed to count progress records")?;

        let limit = filter.effective_limit();
        let query = format!(
            "SELECT {PROGRESS_COLUMNS} FROM process_progress WHERE {where_clause} ORDER BY id DESC LIMIT {limit} OFFSET {}",
            filter.offset
        );
        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let items = stmt
            .query_map(&params_refs[..], Self::build_progress_from_row)
            .db_context("Failed to query progress records")?
            .map(|r| r.map(|p| ProgressSummary::from(&p)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch progress records")?;

        Ok(Page {
            items,
            total: total as u64,
            limit,
            offset: filter.offset,
        })
    }

    /// IDs and raw `last_activity_at` values of every open record.
    ///
    /// The raw text is handed back to [`Self::abandon_if_idle`] so the guarded
    /// update compares exactly what was read.
    pub fn open_activity(&self) -> Result<Vec<(u64, String)>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_OPEN_ACTIVITY_SQL)
            .db_context("Failed to prepare query")?;

        let rows = stmt
            .query_map([], |row| Ok((id(row, 0)?, row.get::<_, String>(1)?)))
            .db_context("Failed to query open progress")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch open progress")?;
        Ok(rows)
    }

    /// Abandons a record if it is still open and untouched since
    /// `observed_activity` was read. `last_activity_at` is left as is.
    pub fn abandon_if_idle(&mut self, progress_id: u64, observed_activity: &str) -> Result<bool> {
        let rows = self
            .connection
            .execute(
                ABANDON_IF_IDLE_SQL,
                params![progress_id as i64, observed_activity],
            )
            .db_context("Failed to abandon progress")?;
        Ok(rows == 1)
    }

    pub(crate) fn query_progress(conn: &Connection, progress_id: u64) -> Result<Option<Progress>> {
        conn.query_row(
            &format!("SELECT {PROGRESS_COLUMNS} FROM process_progress WHERE id = ?1"),
            params![progress_id as i64],
            Self::build_progress_from_row,
        )
        .optional()
        .db_context("Failed to query progress")
    }

    pub(crate) fn query_open_progress(
        conn: &Connection,
        process_id: u64,
        session_id: &str,
    ) -> Result<Option<Progress>> {
        conn.query_row(
            &format!(
                "SELECT {PROGRESS_COLUMNS} FROM process_progress WHERE process_id = ?1 AND session_id = ?2 AND status = 'in_progress'"
            ),
            params![process_id as i64, session_id],
            Self::build_progress_from_row,
        )
        .optional()
        .db_context("Failed to query open progress")
    }

    pub(crate) fn query_ledger(conn: &Connection, progress_id: u64) -> Result<Vec<StepCompletion>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COMPLETION_COLUMNS} FROM step_completions WHERE progress_id = ?1"
            ))
            .db_context("Failed to prepare query")?;

        let rows = stmt
            .query_map(params![progress_id as i64], Self::build_completion_from_row)
            .db_context("Failed to query step completions")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch step completions")?;
        Ok(rows)
    }

    pub(crate) fn query_completion(
        conn: &Connection,
        progress_id: u64,
        step_id: u64,
    ) -> Result<Option<StepCompletion>> {
        conn.query_row(
            &format!(
                "SELECT {COMPLETION_COLUMNS} FROM step_completions WHERE progress_id = ?1 AND step_id = ?2"
            ),
            params![progress_id as i64, step_id as i64],
            Self::build_completion_from_row,
        )
        .optional()
        .db_context("Failed to query step completion")
    }

    /// Loads a record with its process and ledger for a transition.
    pub(crate) fn load_state(conn: &Connection, progress_id: u64) -> Result<ProgressState> {
        let progress = Self::query_progress(conn, progress_id)?.ok_or(TrackerError::NotFound {
            entity: "Progress",
            id: progress_id,
        })?;
        let process = Self::query_process(conn, progress.process_id)?.ok_or(
            TrackerError::NotFound {
                entity: "Process",
                id: progress.process_id,
            },
        )?;
        let ledger = Self::query_ledger(conn, progress_id)?
            .into_iter()
            .map(|c| (c.step_id, c.status))
            .collect();

        Ok(ProgressState::new(process, progress, ledger))
    }

    /// Writes the mutable columns of a record if its version is still
    /// `expected_version`, and returns the new version.
    pub(crate) fn save_progress(
        conn: &Connection,
        progress: &Progress,
        expected_version: u64,
    ) -> Result<u64> {
        let rows = conn
            .execute(
                SAVE_PROGRESS_SQL,
                params![
                    progress.status.as_str(),
                    progress.current_step_index as i64,
                    progress.completion_percentage,
                    progress.last_activity_at.to_string(),
                    progress.completed_at.map(|t| t.to_string()),
                    progress.id as i64,
                    expected_version as i64
                ],
            )
            .db_context("Failed to save progress")?;

        if rows == 0 {
            return Err(TrackerError::ConcurrencyConflict {
                message: format!(
                    "Progress {} changed since version {expected_version}",
                    progress.id
                ),
            });
        }
        Ok(expected_version + 1)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn upsert_completion(
        conn: &Connection,
        progress_id: u64,
        step_id: u64,
        submission_id: Option<u64>,
        status: CompletionStatus,
        completed_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<()> {
        conn.execute(
            UPSERT_COMPLETION_SQL,
            params![
                progress_id as i64,
                step_id as i64,
                submission_id.map(|id| id as i64),
                status.as_str(),
                completed_at.map(|t| t.to_string()),
                now.to_string()
            ],
        )
        .db_context("Failed to record step completion")?;
        Ok(())
    }
}
