//! SQLite persistence for forms, processes, progress and submissions.
//!
//! Each query module extends [`Database`] with the statements for one area.
//! Progress mutations run in `IMMEDIATE` transactions so the database write
//! lock serializes concurrent writers to the same record.

use std::{path::Path, time::Duration};

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod analytics_queries;
pub mod execution;
pub mod form_queries;
pub mod migrations;
pub mod process_queries;
pub mod progress_queries;
pub mod step_queries;
pub mod submission_queries;
pub(crate) mod utils;

/// How long a connection waits for the write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .db_context("Failed to set busy timeout")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
