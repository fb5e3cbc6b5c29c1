#![allow(dead_code)]

use rusqlite::Connection;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::macros::{date, datetime};
use tk_core::ids::{ProjectId, UserId};
use tk_core::model::{
    Audit, Issue, IssueDraft, IssuePriority, IssueStatus, Project, ProjectDraft, User, UserDraft,
};
use tk_storage::{SqliteStore, StoreConfig};

pub const T0: OffsetDateTime = datetime!(2024-03-01 09:00 UTC);

pub fn open_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("temp dir must be creatable");
    let store =
        SqliteStore::open(StoreConfig::in_dir(dir.path())).expect("fresh store should open");
    (dir, store)
}

pub fn raw_connection(dir: &TempDir) -> Connection {
    Connection::open(StoreConfig::in_dir(dir.path()).database_path)
        .expect("raw connection should open")
}

pub fn audit(actor: &User, at: OffsetDateTime) -> Audit {
    Audit::new(actor.user_id, at)
}

pub fn add_user(store: &mut SqliteStore, username: &str) -> User {
    store
        .transact(|uow| {
            uow.insert_user(
                UserDraft::new(format!("{username} (display)"), username),
                date!(2024 - 01 - 02),
            )
        })
        .expect("user should be inserted")
}

pub fn add_project(store: &mut SqliteStore, actor: &User, name: &str) -> Project {
    store
        .transact(|uow| {
            uow.insert_project(
                ProjectDraft::new(name, date!(2024 - 12 - 31)),
                &audit(actor, T0),
            )
        })
        .expect("project should be inserted")
}

pub fn add_issue(
    store: &mut SqliteStore,
    actor: &User,
    project: ProjectId,
    summary: &str,
) -> Issue {
    store
        .transact(|uow| {
            uow.insert_issue(
                IssueDraft::new(project, summary, IssueStatus::Open, IssuePriority::High),
                &audit(actor, T0),
            )
        })
        .expect("issue should be inserted")
}

pub fn history_rows(conn: &Connection, issue_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(1) FROM change_history WHERE issue_id=?1",
        [issue_id],
        |row| row.get(0),
    )
    .expect("history count query")
}

pub fn missing_user() -> UserId {
    UserId::new(9_999)
}
