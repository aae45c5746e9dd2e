//! Owner-side reports computed from progress records, the ledger and form
//! submissions.

use std::collections::HashMap;

use jiff::{civil::Date, tz::TimeZone, Span, Timestamp};
use rusqlite::params;

use super::utils::{id, json, opt_timestamp, timestamp};
use crate::{
    error::{DatabaseResultExt, Result, TrackerError},
    models::{
        analytics::{median, percentage, round2, summarize_field},
        AbandonedProgress, ActivityOverTime, Answers, CompletionRate, CompletionTimes, DailyCount,
        DropOffReport, FieldSummary, FormDropOff, FormOverview, StepDropOff,
    },
};

/// Longest window accepted for daily series.
pub const MAX_ACTIVITY_DAYS: u32 = 365;

const INSERT_VIEW_SQL: &str =
    "INSERT INTO process_views (process_id, session_id, viewed_at) VALUES (?1, ?2, ?3)";
const COUNT_VIEWS_SQL: &str = "SELECT COUNT(*) FROM process_views WHERE process_id = ?1";
const STATUS_COUNTS_SQL: &str =
    "SELECT status, COUNT(*) FROM process_progress WHERE process_id = ?1 GROUP BY status";
const STEP_COUNTS_SQL: &str = "SELECT s.id, s.title, s.step_order, \
     COALESCE(SUM(CASE WHEN c.status != 'pending' THEN 1 ELSE 0 END), 0), \
     COALESCE(SUM(CASE WHEN c.status = 'completed' THEN 1 ELSE 0 END), 0) \
     FROM process_steps s LEFT JOIN step_completions c ON c.step_id = s.id \
     WHERE s.process_id = ?1 GROUP BY s.id ORDER BY s.step_order";
const COMPLETED_SPANS_SQL: &str = "SELECT started_at, completed_at FROM process_progress WHERE process_id = ?1 AND status = 'completed' AND completed_at IS NOT NULL";
const SELECT_ABANDONED_SQL: &str = "SELECT id, session_id, user_id, current_step_index, completion_percentage, started_at, last_activity_at FROM process_progress WHERE process_id = ?1 AND status = 'abandoned' ORDER BY id DESC";
const CHECK_PROCESS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM processes WHERE id = ?1)";
const DAILY_VIEWS_SQL: &str = "SELECT substr(viewed_at, 1, 10), COUNT(*) FROM process_views WHERE process_id = ?1 AND viewed_at >= ?2 GROUP BY 1";
const DAILY_COMPLETIONS_SQL: &str = "SELECT substr(completed_at, 1, 10), COUNT(*) FROM process_progress WHERE process_id = ?1 AND status = 'completed' AND completed_at >= ?2 GROUP BY 1";

const INSERT_FORM_VIEW_SQL: &str =
    "INSERT INTO form_views (form_id, session_id, viewed_at) VALUES (?1, ?2, ?3)";
const FORM_VIEW_STATS_SQL: &str =
    "SELECT COUNT(*), MAX(viewed_at) FROM form_views WHERE form_id = ?1";
const FORM_SUBMITTED_STATS_SQL: &str = "SELECT COUNT(*), MAX(submitted_at) FROM submissions WHERE form_id = ?1 AND status = 'submitted'";
const FORM_STARTED_SQL: &str =
    "SELECT COUNT(DISTINCT session_id) FROM submissions WHERE form_id = ?1";
const SUBMITTED_ANSWERS_SQL: &str =
    "SELECT answers FROM submissions WHERE form_id = ?1 AND status = 'submitted' ORDER BY id";

impl super::Database {
    fn ensure_process(&self, process_id: u64) -> Result<()> {
        let exists: bool = self
            .connection
            .query_row(CHECK_PROCESS_SQL, params![process_id as i64], |row| {
                row.get(0)
            })
            .db_context("Failed to check process existence")?;
        if exists {
            Ok(())
        } else {
            Err(TrackerError::NotFound {
                entity: "Process",
                id: process_id,
            })
        }
    }

    /// Records that a session looked at a process.
    pub fn track_view(&mut self, process_id: u64, session_id: &str, now: Timestamp) -> Result<()> {
        self.ensure_process(process_id)?;
        self.connection
            .execute(
                INSERT_VIEW_SQL,
                params![process_id as i64, session_id, now.to_string()],
            )
            .db_context("Failed to record view")?;
        Ok(())
    }

    /// Outcome counts and rates over every record of a process.
    pub fn completion_rate(&self, process_id: u64) -> Result<CompletionRate> {
        self.ensure_process(process_id)?;

        let views: i64 = self
            .connection
            .query_row(COUNT_VIEWS_SQL, params![process_id as i64], |row| row.get(0))
            .db_context("Failed to count views")?;

        let mut stmt = self
            .connection
            .prepare(STATUS_COUNTS_SQL)
            .db_context("Failed to prepare query")?;
        let counts = stmt
            .query_map(params![process_id as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })
            .db_context("Failed to count progress")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch progress counts")?;

        let count_of = |status: &str| {
            counts
                .iter()
                .find(|(s, _)| s == status)
                .map_or(0, |(_, n)| *n)
        };
        let completed = count_of("completed");
        let abandoned = count_of("abandoned");
        let in_progress = count_of("in_progress");
        let started = completed + abandoned + in_progress;

        Ok(CompletionRate {
            process_id,
            total_views: views as u64,
            total_started: started,
            total_completed: completed,
            total_abandoned: abandoned,
            total_in_progress: in_progress,
            completion_rate: percentage(completed, started),
            abandonment_rate: percentage(abandoned, started),
        })
    }

    /// Per-step retention, in step order.
    ///
    /// The first step's retention is relative to all started records, every
    /// later step's to the completions of the step before it.
    pub fn drop_off(&self, process_id: u64) -> Result<DropOffReport> {
        let total_started = self.completion_rate(process_id)?.total_started;

        let mut stmt = self
            .connection
            .prepare(STEP_COUNTS_SQL)
            .db_context("Failed to prepare query")?;
        let rows = stmt
            .query_map(params![process_id as i64], |row| {
                Ok((
                    id(row, 0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? as u32,
                    row.get::<_, i64>(3)? as u64,
                    row.get::<_, i64>(4)? as u64,
                ))
            })
            .db_context("Failed to query step counts")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch step counts")?;

        let mut previous_completed = total_started;
        let mut steps = Vec::with_capacity(rows.len());
        for (step_id, step_title, order, started_count, completed_count) in rows {
            let drop_off_count = started_count.saturating_sub(completed_count);
            steps.push(StepDropOff {
                step_id,
                step_title,
                order,
                started_count,
                completed_count,
                drop_off_count,
                drop_off_percentage: percentage(drop_off_count, started_count),
                retention_rate: percentage(completed_count, previous_completed),
            });
            previous_completed = completed_count;
        }

        Ok(DropOffReport {
            process_id,
            total_started,
            steps,
        })
    }

    /// Start-to-finish durations of completed records.
    pub fn completion_times(&self, process_id: u64) -> Result<CompletionTimes> {
        self.ensure_process(process_id)?;

        let mut stmt = self
            .connection
            .prepare(COMPLETED_SPANS_SQL)
            .db_context("Failed to prepare query")?;
        let minutes = stmt
            .query_map(params![process_id as i64], |row| {
                let started = timestamp(row, 0)?;
                let completed = timestamp(row, 1)?;
                Ok(completed.duration_since(started).as_secs_f64() / 60.0)
            })
            .db_context("Failed to query completion times")?
            .collect::<std::result::Result<Vec<f64>, _>>()
            .db_context("Failed to fetch completion times")?;

        let sample_size = minutes.len() as u64;
        let average = (!minutes.is_empty())
            .then(|| round2(minutes.iter().sum::<f64>() / minutes.len() as f64));

        Ok(CompletionTimes {
            process_id,
            sample_size,
            average_minutes: average,
            min_minutes: minutes.iter().copied().reduce(f64::min).map(round2),
            max_minutes: minutes.iter().copied().reduce(f64::max).map(round2),
            median_minutes: median(&minutes).map(round2),
        })
    }

    /// Abandoned records of a process with their idle time as of `now`.
    pub fn abandoned_progress(
        &self,
        process_id: u64,
        now: Timestamp,
    ) -> Result<Vec<AbandonedProgress>> {
        self.ensure_process(process_id)?;

        let mut stmt = self
            .connection
            .prepare(SELECT_ABANDONED_SQL)
            .db_context("Failed to prepare query")?;
        let records = stmt
            .query_map(params![process_id as i64], |row| {
                let last_activity_at = timestamp(row, 6)?;
                Ok(AbandonedProgress {
                    id: id(row, 0)?,
                    session_id: row.get(1)?,
                    user_id: row.get(2)?,
                    current_step_index: row.get::<_, i64>(3)? as u32,
                    completion_percentage: row.get(4)?,
                    started_at: timestamp(row, 5)?,
                    last_activity_at,
                    hours_inactive: round2(
                        now.duration_since(last_activity_at).as_secs_f64() / 3600.0,
                    ),
                })
            })
            .db_context("Failed to query abandoned progress")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch abandoned progress")?;
        Ok(records)
    }

    /// Daily views and completions of a process over the last `days` days,
    /// today included.
    pub fn activity_over_time(
        &self,
        process_id: u64,
        days: u32,
        now: Timestamp,
    ) -> Result<ActivityOverTime> {
        if !(1..=MAX_ACTIVITY_DAYS).contains(&days) {
            return Err(TrackerError::invalid_input("days")
                .with_reason(format!("Must be between 1 and {MAX_ACTIVITY_DAYS}")));
        }
        self.ensure_process(process_id)?;

        let today = now.to_zoned(TimeZone::UTC).date();
        let first_day = today
            .checked_sub(Span::new().days(i64::from(days) - 1))
            .map_err(|e| TrackerError::invalid_input("days").with_reason(e.to_string()))?;

        let views = self.daily_counts(DAILY_VIEWS_SQL, process_id, first_day, days)?;
        let completions = self.daily_counts(DAILY_COMPLETIONS_SQL, process_id, first_day, days)?;
        Ok(ActivityOverTime {
            process_id,
            days,
            views,
            completions,
        })
    }

    fn daily_counts(
        &self,
        sql: &str,
        process_id: u64,
        first_day: Date,
        days: u32,
    ) -> Result<Vec<DailyCount>> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .db_context("Failed to prepare query")?;
        let buckets = stmt
            .query_map(params![process_id as i64, first_day.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })
            .db_context("Failed to query daily counts")?
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .db_context("Failed to fetch daily counts")?;

        Ok(first_day
            .series(Span::new().days(1))
            .take(days as usize)
            .map(|date| DailyCount {
                date,
                count: buckets.get(&date.to_string()).copied().unwrap_or(0),
            })
            .collect())
    }

    fn ensure_form(&self, form_id: u64) -> Result<()> {
        if Self::form_exists(&self.connection, form_id)? {
            Ok(())
        } else {
            Err(TrackerError::NotFound {
                entity: "Form",
                id: form_id,
            })
        }
    }

    /// Records that a session looked at a standalone form.
    pub fn track_form_view(
        &mut self,
        form_id: u64,
        session_id: &str,
        now: Timestamp,
    ) -> Result<()> {
        self.ensure_form(form_id)?;
        self.connection
            .execute(
                INSERT_FORM_VIEW_SQL,
                params![form_id as i64, session_id, now.to_string()],
            )
            .db_context("Failed to record form view")?;
        Ok(())
    }

    /// View and submission totals of a form.
    pub fn form_overview(&self, form_id: u64) -> Result<FormOverview> {
        self.ensure_form(form_id)?;

        let (views, last_viewed_at) = self
            .connection
            .query_row(FORM_VIEW_STATS_SQL, params![form_id as i64], |row| {
                Ok((row.get::<_, i64>(0)? as u64, opt_timestamp(row, 1)?))
            })
            .db_context("Failed to count form views")?;
        let (submitted, last_submitted_at) = self
            .connection
            .query_row(FORM_SUBMITTED_STATS_SQL, params![form_id as i64], |row| {
                Ok((row.get::<_, i64>(0)? as u64, opt_timestamp(row, 1)?))
            })
            .db_context("Failed to count submissions")?;

        Ok(FormOverview {
            form_id,
            total_views: views,
            total_submissions: submitted,
            conversion_rate: percentage(submitted, views),
            last_viewed_at,
            last_submitted_at,
        })
    }

    /// Views, started sessions and submissions of a form.
    pub fn form_drop_off(&self, form_id: u64) -> Result<FormDropOff> {
        let overview = self.form_overview(form_id)?;
        let started: i64 = self
            .connection
            .query_row(FORM_STARTED_SQL, params![form_id as i64], |row| row.get(0))
            .db_context("Failed to count started sessions")?;
        let started = started as u64;

        Ok(FormDropOff {
            form_id,
            views: overview.total_views,
            started,
            submitted: overview.total_submissions,
            start_rate: percentage(started, overview.total_views),
            completion_rate: percentage(overview.total_submissions, started),
        })
    }

    /// Per-field response figures over the submitted answers of a form, in
    /// field order. With `field_id` set only that field is summarized.
    pub fn field_summary(&self, form_id: u64, field_id: Option<u64>) -> Result<Vec<FieldSummary>> {
        let form = self.get_form(form_id)?.ok_or(TrackerError::NotFound {
            entity: "Form",
            id: form_id,
        })?;
        let fields: Vec<_> = match field_id {
            Some(field_id) => {
                let field = form
                    .fields
                    .into_iter()
                    .find(|f| f.id == field_id)
                    .ok_or(TrackerError::NotFound {
                        entity: "Field",
                        id: field_id,
                    })?;
                vec![field]
            }
            None => form.fields,
        };

        let mut stmt = self
            .connection
            .prepare(SUBMITTED_ANSWERS_SQL)
            .db_context("Failed to prepare query")?;
        let submissions = stmt
            .query_map(params![form_id as i64], |row| json::<Answers>(row, 0))
            .db_context("Failed to query answers")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch answers")?;

        Ok(fields
            .iter()
            .map(|field| summarize_field(field, &submissions))
            .collect())
    }
}
