#![forbid(unsafe_code)]

use super::StoreError;
use super::rows::now_ms;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;

pub(crate) const SCHEMA_VERSION: i64 = 1;

/// Child tables first so drops never trip a foreign key.
const TABLES: [&str; 7] = [
    "change_history",
    "issues",
    "assigned_projects",
    "projects",
    "users",
    "counters",
    "schema_state",
];

pub(crate) fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let tables = existing_tables(conn)?;
    if tables.is_empty() {
        return Ok(());
    }

    let required: BTreeSet<&str> = TABLES.into_iter().collect();
    if tables
        .iter()
        .any(|table| !required.contains(table.as_str()))
    {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: unsupported tables detected",
        ));
    }
    if required.iter().any(|table| !tables.contains(*table)) {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: required table is missing",
        ));
    }

    let version = conn
        .query_row(
            "SELECT schema_version FROM schema_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match version {
        Some(v) if v == SCHEMA_VERSION => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema state row is missing",
        )),
    }
}

pub(crate) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS counters (
          name TEXT PRIMARY KEY,
          value INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
          user_id INTEGER PRIMARY KEY,
          user_name TEXT NOT NULL CHECK(length(trim(user_name)) > 0),
          username TEXT NOT NULL UNIQUE CHECK(length(trim(username)) > 0),
          created_on TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
          project_id INTEGER PRIMARY KEY,
          project_name TEXT NOT NULL CHECK(length(trim(project_name)) > 0),
          target_end_date TEXT NOT NULL,
          actual_end_date TEXT,
          label_json TEXT,
          created_on TEXT NOT NULL,
          created_by INTEGER NOT NULL REFERENCES users(user_id) ON DELETE RESTRICT,
          modified_on TEXT,
          modified_by INTEGER REFERENCES users(user_id) ON DELETE RESTRICT
        );

        CREATE TABLE IF NOT EXISTS assigned_projects (
          user_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE RESTRICT,
          project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
          user_role TEXT NOT NULL CHECK(length(trim(user_role)) > 0),
          PRIMARY KEY(user_id, project_id)
        );

        CREATE INDEX IF NOT EXISTS idx_assigned_projects_project
          ON assigned_projects(project_id, user_id);

        CREATE TABLE IF NOT EXISTS issues (
          issue_id INTEGER PRIMARY KEY,
          issue_summary TEXT NOT NULL CHECK(length(trim(issue_summary)) > 0),
          issue_description TEXT,
          assigned_to INTEGER REFERENCES users(user_id) ON DELETE RESTRICT,
          status TEXT NOT NULL CHECK(status IN ('open', 'in_progress', 'resolved', 'closed')),
          label TEXT,
          priority TEXT NOT NULL CHECK(priority IN ('low', 'medium', 'high', 'critical')),
          target_resolution_date TEXT,
          actual_resolution_date TEXT,
          progress TEXT,
          resolution_summary TEXT,
          created_on TEXT NOT NULL,
          created_by INTEGER NOT NULL REFERENCES users(user_id) ON DELETE RESTRICT,
          last_modification_on TEXT NOT NULL,
          last_modification_by INTEGER NOT NULL REFERENCES users(user_id) ON DELETE RESTRICT,
          project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_issues_project
          ON issues(project_id, issue_id);

        CREATE TABLE IF NOT EXISTS change_history (
          entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
          issue_id INTEGER NOT NULL REFERENCES issues(issue_id) ON DELETE CASCADE,
          changed_field TEXT NOT NULL,
          old_value TEXT,
          new_value TEXT,
          changed_on_ms INTEGER NOT NULL,
          changed_by INTEGER NOT NULL REFERENCES users(user_id) ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_change_history_issue
          ON change_history(issue_id, changed_on_ms, entry_id);

        CREATE TRIGGER IF NOT EXISTS change_history_append_only
        BEFORE UPDATE ON change_history
        BEGIN
          SELECT RAISE(ABORT, 'change_history is append-only');
        END;
        "#,
    )?;

    let now_ms = now_ms();
    conn.execute(
        "INSERT INTO schema_state(singleton, schema_version, created_at_ms, updated_at_ms) \
         VALUES (1, ?1, ?2, ?2) \
         ON CONFLICT(singleton) DO UPDATE \
         SET schema_version=excluded.schema_version, updated_at_ms=excluded.updated_at_ms",
        params![SCHEMA_VERSION, now_ms],
    )?;

    Ok(())
}

/// Drops every user table, including ones this store does not know about.
pub(crate) fn drop_schema(conn: &mut Connection) -> Result<usize, StoreError> {
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let dropped = drop_tables(conn);
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    dropped
}

fn drop_tables(conn: &mut Connection) -> Result<usize, StoreError> {
    let mut tables: Vec<String> = TABLES.iter().map(|table| table.to_string()).collect();
    for table in existing_tables(conn)? {
        if !tables.contains(&table) {
            tables.push(table);
        }
    }

    let tx = conn.transaction()?;
    let mut dropped = 0usize;
    for table in &tables {
        let exists = tx
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
                params![table],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if exists {
            tx.execute_batch(&format!("DROP TABLE \"{}\";", table.replace('"', "\"\"")))?;
            dropped += 1;
        }
    }
    tx.commit()?;
    Ok(dropped)
}

fn existing_tables(conn: &Connection) -> Result<BTreeSet<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }
    Ok(tables)
}
