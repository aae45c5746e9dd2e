//! Database schema initialization and migrations.

use crate::error::{DatabaseResultExt, Result};

/// Version written to `PRAGMA user_version` once the schema is current.
const SCHEMA_VERSION: i64 = 2;

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        // WAL lets readers proceed while a progress transaction holds the write lock.
        self.connection
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
            .db_context("Failed to enable WAL journal")?;

        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        self.apply_migrations()
    }

    /// Brings databases created by older releases up to [`SCHEMA_VERSION`].
    fn apply_migrations(&self) -> Result<()> {
        let version: i64 = self
            .connection
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .db_context("Failed to read schema version")?;

        if version >= SCHEMA_VERSION {
            return Ok(());
        }

        // Version 1 predates the per-record version counter.
        let has_version_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('process_progress') WHERE name = 'version'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .db_context("Failed to inspect process_progress")?;

        if !has_version_column {
            log::info!("Adding version column to process_progress");
            self.connection
                .execute(
                    "ALTER TABLE process_progress ADD COLUMN version INTEGER NOT NULL DEFAULT 0",
                    [],
                )
                .db_context("Failed to add version column to process_progress")?;
        }

        self.connection
            .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .db_context("Failed to record schema version")?;
        log::debug!("Schema migrated from version {version} to {SCHEMA_VERSION}");

        Ok(())
    }
}
