#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;
use tk_core::ids::{IssueId, ProjectId, UserId};
use tk_core::model::{
    AssignedProject, Issue, IssueField, IssuePriority, IssueStatus, Project, User,
};

pub(crate) const PROJECT_COLUMNS: &str =
    "project_id, project_name, target_end_date, actual_end_date, label_json, \
     created_on, created_by, modified_on, modified_by";

pub(crate) const USER_COLUMNS: &str = "user_id, user_name, username, created_on";

pub(crate) const ASSIGNMENT_COLUMNS: &str = "user_id, project_id, user_role";

pub(crate) const ISSUE_COLUMNS: &str =
    "issue_id, issue_summary, issue_description, assigned_to, status, label, priority, \
     target_resolution_date, actual_resolution_date, progress, resolution_summary, \
     created_on, created_by, last_modification_on, last_modification_by, project_id";

pub(crate) const HISTORY_COLUMNS: &str =
    "entry_id, issue_id, changed_field, old_value, new_value, changed_on_ms, changed_by";

fn conversion_error<E>(index: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

pub(crate) fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let label = row
        .get::<_, Option<String>>(4)?
        .map(|raw| serde_json::from_str(&raw).map_err(|err| conversion_error(4, err)))
        .transpose()?;
    Ok(Project {
        project_id: ProjectId::new(row.get(0)?),
        project_name: row.get(1)?,
        target_end_date: row.get(2)?,
        actual_end_date: row.get(3)?,
        label,
        created_on: row.get(5)?,
        created_by: UserId::new(row.get(6)?),
        modified_on: row.get(7)?,
        modified_by: row.get::<_, Option<i64>>(8)?.map(UserId::new),
    })
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: UserId::new(row.get(0)?),
        user_name: row.get(1)?,
        username: row.get(2)?,
        created_on: row.get(3)?,
    })
}

pub(crate) fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<AssignedProject> {
    Ok(AssignedProject {
        user_id: UserId::new(row.get(0)?),
        project_id: ProjectId::new(row.get(1)?),
        user_role: row.get(2)?,
    })
}

pub(crate) fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let status = row
        .get::<_, String>(4)?
        .parse::<IssueStatus>()
        .map_err(|err| conversion_error(4, err))?;
    let priority = row
        .get::<_, String>(6)?
        .parse::<IssuePriority>()
        .map_err(|err| conversion_error(6, err))?;
    Ok(Issue {
        issue_id: IssueId::new(row.get(0)?),
        issue_summary: row.get(1)?,
        issue_description: row.get(2)?,
        assigned_to: row.get::<_, Option<i64>>(3)?.map(UserId::new),
        status,
        label: row.get(5)?,
        priority,
        target_resolution_date: row.get(7)?,
        actual_resolution_date: row.get(8)?,
        progress: row.get(9)?,
        resolution_summary: row.get(10)?,
        created_on: row.get(11)?,
        created_by: UserId::new(row.get(12)?),
        last_modification_on: row.get(13)?,
        last_modification_by: UserId::new(row.get(14)?),
        project: ProjectId::new(row.get(15)?),
    })
}

pub(crate) fn history_from_row(row: &Row<'_>) -> rusqlite::Result<tk_core::model::ChangeEntry> {
    let changed_field = row
        .get::<_, String>(2)?
        .parse::<IssueField>()
        .map_err(|err| conversion_error(2, err))?;
    let changed_on = from_unix_ms(row.get(5)?).map_err(|err| conversion_error(5, err))?;
    Ok(tk_core::model::ChangeEntry {
        entry_id: row.get(0)?,
        issue_id: IssueId::new(row.get(1)?),
        changed_field,
        old_value: row.get(3)?,
        new_value: row.get(4)?,
        changed_on,
        changed_by: UserId::new(row.get(6)?),
    })
}

pub(crate) fn fetch_project(
    conn: &Connection,
    project_id: ProjectId,
) -> Result<Option<Project>, StoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id=?1"),
            params![project_id.get()],
            project_from_row,
        )
        .optional()?)
}

pub(crate) fn fetch_user(conn: &Connection, user_id: UserId) -> Result<Option<User>, StoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id=?1"),
            params![user_id.get()],
            user_from_row,
        )
        .optional()?)
}

pub(crate) fn fetch_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, StoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username=?1"),
            params![username],
            user_from_row,
        )
        .optional()?)
}

pub(crate) fn fetch_assignment(
    conn: &Connection,
    user_id: UserId,
    project_id: ProjectId,
) -> Result<Option<AssignedProject>, StoreError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {ASSIGNMENT_COLUMNS} FROM assigned_projects \
                 WHERE user_id=?1 AND project_id=?2"
            ),
            params![user_id.get(), project_id.get()],
            assignment_from_row,
        )
        .optional()?)
}

pub(crate) fn fetch_issue(
    conn: &Connection,
    issue_id: IssueId,
) -> Result<Option<Issue>, StoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE issue_id=?1"),
            params![issue_id.get()],
            issue_from_row,
        )
        .optional()?)
}

pub(crate) fn exists_tx(
    conn: &Connection,
    table: &'static str,
    key_column: &'static str,
    key: i64,
) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE {key_column}=?1"),
            params![key],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

/// Foreign key targets must exist; a dangling reference is a constraint
/// violation, not a lookup miss.
pub(crate) fn ensure_user_ref_tx(
    conn: &Connection,
    column: &'static str,
    user_id: UserId,
) -> Result<(), StoreError> {
    if exists_tx(conn, "users", "user_id", user_id.get())? {
        Ok(())
    } else {
        Err(StoreError::ConstraintViolation(format!(
            "{column} references missing user {user_id}"
        )))
    }
}

pub(crate) fn ensure_project_ref_tx(
    conn: &Connection,
    column: &'static str,
    project_id: ProjectId,
) -> Result<(), StoreError> {
    if exists_tx(conn, "projects", "project_id", project_id.get())? {
        Ok(())
    } else {
        Err(StoreError::ConstraintViolation(format!(
            "{column} references missing project {project_id}"
        )))
    }
}

/// Hands out the next identifier for `counter`. An explicit id is accepted
/// as-is and pushes the counter past it, so generated ids never collide with
/// it later.
pub(crate) fn next_id_tx(
    conn: &Connection,
    counter: &'static str,
    field: &'static str,
    explicit: Option<i64>,
) -> Result<i64, StoreError> {
    if let Some(id) = explicit {
        if id <= 0 {
            return Err(tk_core::ValidationError::InvalidValue {
                field,
                value: id.to_string(),
            }
            .into());
        }
    }

    let current: i64 = conn
        .query_row(
            "SELECT value FROM counters WHERE name=?1",
            params![counter],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);
    let id = match explicit {
        Some(id) => id,
        None => current
            .checked_add(1)
            .ok_or(StoreError::InvalidInput("identifier space exhausted"))?,
    };
    conn.execute(
        r#"
        INSERT INTO counters(name, value) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET value=excluded.value
        "#,
        params![counter, current.max(id)],
    )?;
    Ok(id)
}

pub(crate) fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}

pub(crate) fn unix_ms(at: OffsetDateTime) -> i64 {
    i64::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

pub(crate) fn from_unix_ms(ms: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
}

pub(crate) fn now_ms() -> i64 {
    unix_ms(OffsetDateTime::now_utc())
}
