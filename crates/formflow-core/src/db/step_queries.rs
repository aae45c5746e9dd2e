//! Process step CRUD and ordering.
//!
//! Step order indexes are dense and unique within a process. Shifting a
//! range goes through negative values first, since SQLite checks the
//! `UNIQUE (process_id, step_order)` constraint row by row.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use super::utils::{id, timestamp};
use crate::{
    error::{DatabaseResultExt, Result, TrackerError},
    models::{ProcessStep, UpdateStepRequest},
};

const CHECK_PROCESS_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM processes WHERE id = ?1)";
const COUNT_STEPS_SQL: &str = "SELECT COUNT(*) FROM process_steps WHERE process_id = ?1";
const STEP_COLUMNS: &str =
    "id, process_id, form_id, title, description, step_order, is_required, created_at, updated_at";
const INSERT_STEP_SQL: &str = "INSERT INTO process_steps (process_id, form_id, title, description, step_order, is_required, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)";
const SHIFT_DOWN_PARK_SQL: &str = "UPDATE process_steps SET step_order = -(step_order + 1) WHERE process_id = ?1 AND step_order >= ?2";
const SHIFT_UP_PARK_SQL: &str =
    "UPDATE process_steps SET step_order = -step_order WHERE process_id = ?1 AND step_order > ?2";
const UNPARK_SQL: &str = "UPDATE process_steps SET step_order = -step_order WHERE process_id = ?1 AND step_order < 0";
const UNPARK_SHIFTED_UP_SQL: &str =
    "UPDATE process_steps SET step_order = -step_order - 1 WHERE process_id = ?1 AND step_order < 0";
const UPDATE_STEP_SQL: &str = "UPDATE process_steps SET title = ?1, description = ?2, is_required = ?3, form_id = ?4, updated_at = ?5 WHERE id = ?6";
const SELECT_STEP_ORDER_SQL: &str = "SELECT process_id, step_order FROM process_steps WHERE id = ?1";
const UPDATE_STEP_ORDER_SQL: &str =
    "UPDATE process_steps SET step_order = ?1, updated_at = ?2 WHERE id = ?3";
const DELETE_STEP_SQL: &str = "DELETE FROM process_steps WHERE id = ?1";
const TOUCH_PROCESS_SQL: &str = "UPDATE processes SET updated_at = ?1 WHERE id = ?2";

impl super::Database {
    /// Helper function to construct a ProcessStep from a database row
    fn build_step_from_row(row: &rusqlite::Row) -> rusqlite::Result<ProcessStep> {
        Ok(ProcessStep {
            id: id(row, 0)?,
            process_id: id(row, 1)?,
            form_id: id(row, 2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            order: row.get::<_, i64>(5)? as u32,
            is_required: row.get(6)?,
            created_at: timestamp(row, 7)?,
            updated_at: timestamp(row, 8)?,
        })
    }

    /// Appends a step bound to `form_id` at the end of the process.
    pub fn add_step(
        &mut self,
        process_id: u64,
        form_id: u64,
        title: &str,
        description: Option<&str>,
        is_required: bool,
        now: Timestamp,
    ) -> Result<ProcessStep> {
        self.insert_step(process_id, None, form_id, title, description, is_required, now)
    }

    /// Inserts a step at `position` (or appends it when `None`), shifting
    /// later steps down by one.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_step(
        &mut self,
        process_id: u64,
        position: Option<u32>,
        form_id: u64,
        title: &str,
        description: Option<&str>,
        is_required: bool,
        now: Timestamp,
    ) -> Result<ProcessStep> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let process_exists: bool = tx
            .query_row(CHECK_PROCESS_EXISTS_SQL, params![process_id as i64], |row| {
                row.get(0)
            })
            .db_context("Failed to check process existence")?;
        if !process_exists {
            return Err(TrackerError::NotFound {
                entity: "Process",
                id: process_id,
            });
        }
        if !Self::form_exists(&tx, form_id)? {
            return Err(TrackerError::NotFound {
                entity: "Form",
                id: form_id,
            });
        }

        let step_count: i64 = tx
            .query_row(COUNT_STEPS_SQL, params![process_id as i64], |row| row.get(0))
            .db_context("Failed to count steps")?;
        let step_count = step_count as u32;

        let order = match position {
            None => step_count,
            Some(position) if position > step_count => {
                return Err(TrackerError::invalid_input("position").with_reason(format!(
                    "Position {position} is out of range. Process has {step_count} steps"
                )));
            }
            Some(position) => {
                tx.execute(
                    SHIFT_DOWN_PARK_SQL,
                    params![process_id as i64, position as i64],
                )
                .db_context("Failed to shift step orders")?;
                tx.execute(UNPARK_SQL, params![process_id as i64])
                    .db_context("Failed to shift step orders")?;
                position
            }
        };

        let now_str = now.to_string();
        tx.execute(
            INSERT_STEP_SQL,
            params![
                process_id as i64,
                form_id as i64,
                title,
                description,
                order as i64,
                is_required,
                &now_str
            ],
        )
        .db_context("Failed to insert step")?;
        let id = tx.last_insert_rowid() as u64;

        tx.execute(TOUCH_PROCESS_SQL, params![&now_str, process_id as i64])
            .db_context("Failed to update process timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;

        log::debug!("Added step {id} to process {process_id} at position {order}");
        Ok(ProcessStep {
            id,
            process_id,
            form_id,
            title: title.into(),
            description: description.map(String::from),
            order,
            is_required,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update and returns the updated step.
    pub fn update_step(
        &mut self,
        step_id: u64,
        request: UpdateStepRequest,
        now: Timestamp,
    ) -> Result<ProcessStep> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let current = Self::query_step(&tx, step_id)?.ok_or(TrackerError::NotFound {
            entity: "Step",
            id: step_id,
        })?;

        if request.is_empty() {
            return Ok(current);
        }

        let form_id = request.form_id.unwrap_or(current.form_id);
        if form_id != current.form_id && !Self::form_exists(&tx, form_id)? {
            return Err(TrackerError::NotFound {
                entity: "Form",
                id: form_id,
            });
        }

        let now_str = now.to_string();
        tx.execute(
            UPDATE_STEP_SQL,
            params![
                request.title.as_deref().unwrap_or(&current.title),
                request
                    .description
                    .as_ref()
                    .map_or(current.description.as_deref(), Option::as_deref),
                request.is_required.unwrap_or(current.is_required),
                form_id as i64,
                &now_str,
                step_id as i64
            ],
        )
        .db_context("Failed to update step")?;

        tx.execute(
            TOUCH_PROCESS_SQL,
            params![&now_str, current.process_id as i64],
        )
        .db_context("Failed to update process timestamp")?;

        let updated = Self::query_step(&tx, step_id)?.ok_or(TrackerError::NotFound {
            entity: "Step",
            id: step_id,
        })?;
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(updated)
    }

    /// Retrieves all steps of a process in order.
    pub fn get_steps(&self, process_id: u64) -> Result<Vec<ProcessStep>> {
        Self::query_steps(&self.connection, process_id)
    }

    /// Retrieves a single step by its ID.
    pub fn get_step(&self, step_id: u64) -> Result<Option<ProcessStep>> {
        Self::query_step(&self.connection, step_id)
    }

    /// Swaps the order of two steps within the same process.
    pub fn swap_steps(&mut self, step_id1: u64, step_id2: u64, now: Timestamp) -> Result<()> {
        if step_id1 == step_id2 {
            return Ok(());
        }

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let lookup = |step_id: u64| -> Result<(i64, i64)> {
            tx.query_row(SELECT_STEP_ORDER_SQL, params![step_id as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .db_context("Failed to query step order")?
            .ok_or(TrackerError::NotFound {
                entity: "Step",
                id: step_id,
            })
        };
        let (process_id1, order1) = lookup(step_id1)?;
        let (process_id2, order2) = lookup(step_id2)?;

        if process_id1 != process_id2 {
            return Err(TrackerError::invalid_input("step_ids")
                .with_reason("Steps belong to different processes"));
        }

        let now_str = now.to_string();
        tx.execute(UPDATE_STEP_ORDER_SQL, params![-1, &now_str, step_id1 as i64])
            .db_context("Failed to park step order")?;
        tx.execute(
            UPDATE_STEP_ORDER_SQL,
            params![order1, &now_str, step_id2 as i64],
        )
        .db_context("Failed to update step order")?;
        tx.execute(
            UPDATE_STEP_ORDER_SQL,
            params![order2, &now_str, step_id1 as i64],
        )
        .db_context("Failed to update step order")?;
        tx.execute(TOUCH_PROCESS_SQL, params![&now_str, process_id1])
            .db_context("Failed to update process timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Removes a step and closes the gap in the order indexes.
    ///
    /// Ledger rows of the step are deleted with it.
    pub fn remove_step(&mut self, step_id: u64, now: Timestamp) -> Result<ProcessStep> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let step = Self::query_step(&tx, step_id)?.ok_or(TrackerError::NotFound {
            entity: "Step",
            id: step_id,
        })?;

        tx.execute(DELETE_STEP_SQL, params![step_id as i64])
            .db_context("Failed to delete step")?;
        tx.execute(
            SHIFT_UP_PARK_SQL,
            params![step.process_id as i64, step.order as i64],
        )
        .db_context("Failed to shift step orders")?;
        tx.execute(UNPARK_SHIFTED_UP_SQL, params![step.process_id as i64])
            .db_context("Failed to shift step orders")?;
        tx.execute(
            TOUCH_PROCESS_SQL,
            params![now.to_string(), step.process_id as i64],
        )
        .db_context("Failed to update process timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(step)
    }

    pub(crate) fn query_steps(conn: &Connection, process_id: u64) -> Result<Vec<ProcessStep>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {STEP_COLUMNS} FROM process_steps WHERE process_id = ?1 ORDER BY step_order"
            ))
            .db_context("Failed to prepare query")?;

        let steps = stmt
            .query_map(params![process_id as i64], Self::build_step_from_row)
            .db_context("Failed to query steps")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch steps")?;
        Ok(steps)
    }

    fn query_step(conn: &Connection, step_id: u64) -> Result<Option<ProcessStep>> {
        conn.query_row(
            &format!("SELECT {STEP_COLUMNS} FROM process_steps WHERE id = ?1"),
            params![step_id as i64],
            Self::build_step_from_row,
        )
        .optional()
        .db_context("Failed to get step")
    }
}
