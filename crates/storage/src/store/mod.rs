#![forbid(unsafe_code)]

mod assignments;
mod error;
mod history;
mod issues;
mod projects;
mod reader;
mod rows;
mod schema;
mod unit_of_work;
mod users;

pub use error::StoreError;
pub use history::IssueHistory;
pub use projects::ProjectDeletion;
pub use reader::Reader;
pub use unit_of_work::UnitOfWork;

use crate::StoreConfig;
use rusqlite::Connection;
use schema::{drop_schema, install_schema, preflight_gate};
use tracing::{debug, info, warn};

/// One SQLite connection plus its configuration. Open one store per worker;
/// stores opened on the same file share the database and serialize writes
/// at the unit-of-work boundary.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    config: StoreConfig,
}

impl SqliteStore {
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&config.database_path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!(path = %config.database_path.display(), journal_mode = %mode, "database opened");
        Self::init(conn, config)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, StoreConfig::default())
    }

    fn init(conn: Connection, config: StoreConfig) -> Result<Self, StoreError> {
        conn.busy_timeout(config.busy_timeout())?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;

        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn read(&self) -> Reader<'_> {
        Reader::new(&self.conn, self.config.history_page_size)
    }

    pub fn unit_of_work(&mut self) -> Result<UnitOfWork<'_>, StoreError> {
        UnitOfWork::begin(&mut self.conn, self.config.history_page_size)
    }

    /// Runs `f` in a fresh unit of work: commits on `Ok`, rolls back on `Err`.
    pub fn transact<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<T, StoreError>,
    {
        let mut uow = self.unit_of_work()?;
        match f(&mut uow) {
            Ok(value) => {
                uow.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback() {
                    warn!(error = %rollback_err, "rollback after failed unit of work also failed");
                }
                Err(err)
            }
        }
    }

    /// Drops every table and installs an empty schema.
    pub fn reset_schema(&mut self) -> Result<(), StoreError> {
        let dropped = drop_schema(&mut self.conn)?;
        install_schema(&self.conn)?;
        info!(dropped_tables = dropped, "schema reset");
        Ok(())
    }

    /// Like `open`, but wipes a database that fails the schema check instead
    /// of refusing it.
    pub fn open_or_reset(config: StoreConfig) -> Result<Self, StoreError> {
        match Self::open(config.clone()) {
            Err(err) if err.code() == "RESET_REQUIRED" => {
                warn!(error = %err, "incompatible database, resetting");
                let conn = Connection::open(&config.database_path)?;
                let mut store = Self { conn, config };
                store.conn.busy_timeout(store.config.busy_timeout())?;
                store.reset_schema()?;
                Ok(store)
            }
            other => other,
        }
    }
}
