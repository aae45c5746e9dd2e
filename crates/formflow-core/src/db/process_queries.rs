//! Process definitions: creation, lookup, lifecycle switches and passwords.

use jiff::Timestamp;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rusqlite::{params, Connection, OptionalExtension};

use super::utils::{id, opt_timestamp, parsed, timestamp};
use crate::{
    error::{DatabaseResultExt, Result, TrackerError},
    models::{NavigationMode, Process, UpdateProcessRequest, Visibility},
};

const PROCESS_COLUMNS: &str = "id, title, slug, description, mode, visibility, password_hash IS NOT NULL, is_active, allow_resubmission, published_at, created_at, updated_at";
const INSERT_PROCESS_SQL: &str = "INSERT INTO processes (title, slug, description, mode, visibility, is_active, allow_resubmission, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?7)";
const CHECK_PROCESS_SLUG_SQL: &str = "SELECT EXISTS(SELECT 1 FROM processes WHERE slug = ?1)";
const UPDATE_PROCESS_ACTIVE_SQL: &str =
    "UPDATE processes SET is_active = ?1, updated_at = ?2 WHERE id = ?3";
const UPDATE_PROCESS_PUBLISHED_SQL: &str =
    "UPDATE processes SET published_at = ?1, updated_at = ?2 WHERE id = ?3";
const UPDATE_PROCESS_PASSWORD_SQL: &str =
    "UPDATE processes SET password_hash = ?1, updated_at = ?2 WHERE id = ?3";
const UPDATE_PROCESS_SQL: &str = "UPDATE processes SET title = ?1, description = ?2, mode = ?3, visibility = ?4, allow_resubmission = ?5, updated_at = ?6 WHERE id = ?7";
const SELECT_ACCESS_SQL: &str = "SELECT password_hash FROM processes WHERE id = ?1";

/// Argon2id PHC string with a fresh random salt.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TrackerError::Configuration {
            message: format!("Failed to hash password: {e}"),
        })
}

/// Verifies `given` against a stored PHC string. Unreadable hashes never match.
pub(crate) fn password_matches(stored: &str, given: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(given.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored process password hash is unreadable: {e}");
            false
        }
    }
}

impl super::Database {
    fn build_process_from_row(row: &rusqlite::Row) -> rusqlite::Result<Process> {
        Ok(Process {
            id: id(row, 0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            mode: parsed::<NavigationMode>(row, 4)?,
            visibility: parsed::<Visibility>(row, 5)?,
            password_protected: row.get(6)?,
            is_active: row.get(7)?,
            allow_resubmission: row.get(8)?,
            published_at: opt_timestamp(row, 9)?,
            created_at: timestamp(row, 10)?,
            updated_at: timestamp(row, 11)?,
            steps: Vec::new(),
        })
    }

    /// Creates an active, unpublished process with no steps.
    #[allow(clippy::too_many_arguments)]
    pub fn create_process(
        &mut self,
        title: &str,
        slug: &str,
        description: Option<&str>,
        mode: NavigationMode,
        visibility: Visibility,
        allow_resubmission: bool,
        now: Timestamp,
    ) -> Result<Process> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let taken: bool = tx
            .query_row(CHECK_PROCESS_SLUG_SQL, params![slug], |row| row.get(0))
            .db_context("Failed to check process slug")?;
        if taken {
            return Err(TrackerError::invalid_input("slug")
                .with_reason(format!("Process slug '{slug}' is already in use")));
        }

        tx.execute(
            INSERT_PROCESS_SQL,
            params![
                title,
                slug,
                description,
                mode.as_str(),
                visibility.as_str(),
                allow_resubmission,
                now.to_string()
            ],
        )
        .db_context("Failed to insert process")?;
        let id = tx.last_insert_rowid() as u64;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Process {
            id,
            title: title.into(),
            slug: slug.into(),
            description: description.map(String::from),
            mode,
            visibility,
            password_protected: false,
            is_active: true,
            allow_resubmission,
            published_at: None,
            created_at: now,
            updated_at: now,
            steps: Vec::new(),
        })
    }

    /// Retrieves a process with its steps.
    pub fn get_process(&self, process_id: u64) -> Result<Option<Process>> {
        Self::query_process(&self.connection, process_id)
    }

    /// Retrieves a process with its steps by slug.
    pub fn get_process_by_slug(&self, slug: &str) -> Result<Option<Process>> {
        let mut process = self
            .connection
            .query_row(
                &format!("SELECT {PROCESS_COLUMNS} FROM processes WHERE slug = ?1"),
                params![slug],
                Self::build_process_from_row,
            )
            .optional()
            .db_context("Failed to query process")?;

        if let Some(ref mut process) = process {
            process.steps = Self::query_steps(&self.connection, process.id)?;
        }
        Ok(process)
    }

    /// Lists processes newest first, with their steps.
    pub fn list_processes(&self, include_inactive: bool) -> Result<Vec<Process>> {
        let mut query = format!("SELECT {PROCESS_COLUMNS} FROM processes");
        if !include_inactive {
            query.push_str(" WHERE is_active = 1");
        }
        query.push_str(" ORDER BY id DESC");

        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let mut processes = stmt
            .query_map([], Self::build_process_from_row)
            .db_context("Failed to query processes")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch processes")?;

        for process in &mut processes {
            process.steps = Self::query_steps(&self.connection, process.id)?;
        }
        Ok(processes)
    }

    /// Applies a partial update and returns the updated process.
    pub fn update_process(
        &mut self,
        process_id: u64,
        request: UpdateProcessRequest,
        now: Timestamp,
    ) -> Result<Process> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let current = Self::query_process(&tx, process_id)?.ok_or(TrackerError::NotFound {
            entity: "Process",
            id: process_id,
        })?;

        if !request.is_empty() {
            let mode = request.mode.unwrap_or(current.mode);
            let visibility = request.visibility.unwrap_or(current.visibility);
            tx.execute(
                UPDATE_PROCESS_SQL,
                params![
                    request.title.as_deref().unwrap_or(&current.title),
                    request.description.unwrap_or(current.description),
                    mode.as_str(),
                    visibility.as_str(),
                    request
                        .allow_resubmission
                        .unwrap_or(current.allow_resubmission),
                    now.to_string(),
                    process_id as i64
                ],
            )
            .db_context("Failed to update process")?;
        }

        let updated = Self::query_process(&tx, process_id)?.ok_or(TrackerError::NotFound {
            entity: "Process",
            id: process_id,
        })?;
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(updated)
    }

    /// Activates or deactivates a process.
    pub fn set_process_active(&mut self, process_id: u64, active: bool, now: Timestamp) -> Result<Process> {
        let rows = self
            .connection
            .execute(
                UPDATE_PROCESS_ACTIVE_SQL,
                params![active, now.to_string(), process_id as i64],
            )
            .db_context("Failed to update process state")?;
        self.reload_process(process_id, rows)
    }

    /// Publishes the process at `published_at`, or unpublishes it with `None`.
    pub fn set_process_published(
        &mut self,
        process_id: u64,
        published_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<Process> {
        let rows = self
            .connection
            .execute(
                UPDATE_PROCESS_PUBLISHED_SQL,
                params![
                    published_at.map(|t| t.to_string()),
                    now.to_string(),
                    process_id as i64
                ],
            )
            .db_context("Failed to update process publication")?;
        self.reload_process(process_id, rows)
    }

    /// Sets or clears the access password.
    pub fn set_process_password(
        &mut self,
        process_id: u64,
        password: Option<&str>,
        now: Timestamp,
    ) -> Result<Process> {
        let hash = password.map(hash_password).transpose()?;
        let rows = self
            .connection
            .execute(
                UPDATE_PROCESS_PASSWORD_SQL,
                params![hash, now.to_string(), process_id as i64],
            )
            .db_context("Failed to update process password")?;
        self.reload_process(process_id, rows)
    }

    /// Checks a supplied password against the stored hash.
    ///
    /// Processes without a password accept any input.
    pub(crate) fn verify_password(
        conn: &Connection,
        process_id: u64,
        password: Option<&str>,
    ) -> Result<bool> {
        let hash: Option<String> = conn
            .query_row(SELECT_ACCESS_SQL, params![process_id as i64], |row| {
                row.get(0)
            })
            .db_context("Failed to query process access")?;

        Ok(match (hash, password) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(stored), Some(given)) => password_matches(&stored, given),
        })
    }

    /// Process with steps, usable inside an open transaction.
    pub(crate) fn query_process(conn: &Connection, process_id: u64) -> Result<Option<Process>> {
        let mut process = conn
            .query_row(
                &format!("SELECT {PROCESS_COLUMNS} FROM processes WHERE id = ?1"),
                params![process_id as i64],
                Self::build_process_from_row,
            )
            .optional()
            .db_context("Failed to query process")?;

        if let Some(ref mut process) = process {
            process.steps = Self::query_steps(conn, process.id)?;
        }
        Ok(process)
    }

    fn reload_process(&self, process_id: u64, rows_affected: usize) -> Result<Process> {
        if rows_affected == 0 {
            return Err(TrackerError::NotFound {
                entity: "Process",
                id: process_id,
            });
        }
        self.get_process(process_id)?.ok_or(TrackerError::NotFound {
            entity: "Process",
            id: process_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusqlite::params;
    use tempfile::TempDir;

    use super::{password_matches, SELECT_ACCESS_SQL};
    use crate::{
        db::Database,
        models::{NavigationMode, Visibility},
    };

    fn stored_hash(db: &Database, process_id: u64) -> Option<String> {
        db.connection
            .query_row(SELECT_ACCESS_SQL, params![process_id as i64], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_same_password_gets_distinct_hashes() {
        let dir = TempDir::new().unwrap();
        let mut db = Database::new(dir.path().join("passwords.db")).unwrap();
        let now = Timestamp::UNIX_EPOCH;
        for slug in ["onboarding", "offboarding"] {
            db.create_process(
                slug,
                slug,
                None,
                NavigationMode::Linear,
                Visibility::Private,
                false,
                now,
            )
            .unwrap();
        }
        db.set_process_password(1, Some("secret"), now).unwrap();
        db.set_process_password(2, Some("secret"), now).unwrap();

        let first = stored_hash(&db, 1).unwrap();
        let second = stored_hash(&db, 2).unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("secret"));

        assert!(Database::verify_password(&db.connection, 1, Some("secret")).unwrap());
        assert!(Database::verify_password(&db.connection, 2, Some("secret")).unwrap());
        assert!(!Database::verify_password(&db.connection, 1, Some("Secret")).unwrap());
        assert!(!Database::verify_password(&db.connection, 1, None).unwrap());

        db.set_process_password(1, None, now).unwrap();
        assert_eq!(stored_hash(&db, 1), None);
        assert!(Database::verify_password(&db.connection, 1, None).unwrap());
    }

    #[test]
    fn test_unreadable_hash_never_matches() {
        assert!(!password_matches("not-a-phc-string", "secret"));
    }
}
