#![forbid(unsafe_code)]

use super::rows::{fetch_user, fetch_user_by_username, next_id_tx};
use super::{StoreError, UnitOfWork};
use rusqlite::{Connection, params};
use time::Date;
use tk_core::ids::UserId;
use tk_core::model::{User, UserDraft};
use tracing::{debug, info};

/// Rows that keep a user alive. Users are never deleted out from under them.
const USER_REFERENCES: [(&str, &str); 4] = [
    (
        "assigned_projects",
        "SELECT COUNT(1) FROM assigned_projects WHERE user_id=?1",
    ),
    (
        "projects",
        "SELECT COUNT(1) FROM projects WHERE created_by=?1 OR modified_by=?1",
    ),
    (
        "issues",
        "SELECT COUNT(1) FROM issues \
         WHERE assigned_to=?1 OR created_by=?1 OR last_modification_by=?1",
    ),
    (
        "change_history",
        "SELECT COUNT(1) FROM change_history WHERE changed_by=?1",
    ),
];

impl UnitOfWork<'_> {
    pub fn insert_user(&mut self, draft: UserDraft, created_on: Date) -> Result<User, StoreError> {
        self.atomic("insert_user", |conn| {
            let explicit = draft.user_id.map(UserId::get);
            let user_id = UserId::new(next_id_tx(conn, "user", "user_id", explicit)?);
            let user = draft.build(user_id, created_on)?;
            ensure_username_free_tx(conn, &user.username, None)?;

            conn.execute(
                "INSERT INTO users(user_id, user_name, username, created_on) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.user_id.get(),
                    user.user_name,
                    user.username,
                    user.created_on
                ],
            )?;
            debug!(user_id = %user.user_id, "user inserted");
            Ok(user)
        })
    }

    /// Persists `user_name` and `username`; `created_on` never changes.
    pub fn update_user(&mut self, user: &User) -> Result<User, StoreError> {
        self.atomic("update_user", |conn| {
            user.validate()?;
            let current = fetch_user(conn, user.user_id)?
                .ok_or_else(|| StoreError::not_found("user", user.user_id))?;
            ensure_username_free_tx(conn, &user.username, Some(user.user_id))?;

            conn.execute(
                "UPDATE users SET user_name=?2, username=?3 WHERE user_id=?1",
                params![user.user_id.get(), user.user_name, user.username],
            )?;
            debug!(user_id = %user.user_id, "user updated");
            Ok(User {
                created_on: current.created_on,
                ..user.clone()
            })
        })
    }

    /// Fails with `ConstraintViolation` while anything still references the
    /// user.
    pub fn delete_user(&mut self, user_id: UserId) -> Result<(), StoreError> {
        self.atomic("delete_user", |conn| {
            if fetch_user(conn, user_id)?.is_none() {
                return Err(StoreError::not_found("user", user_id));
            }
            for (table, query) in USER_REFERENCES {
                let count = conn.query_row(query, params![user_id.get()], |row| {
                    row.get::<_, i64>(0)
                })?;
                if count > 0 {
                    return Err(StoreError::ConstraintViolation(format!(
                        "user {user_id} is still referenced by {count} row(s) in {table}"
                    )));
                }
            }

            conn.execute("DELETE FROM users WHERE user_id=?1", params![user_id.get()])?;
            info!(user_id = %user_id, "user deleted");
            Ok(())
        })
    }
}

fn ensure_username_free_tx(
    conn: &Connection,
    username: &str,
    owner: Option<UserId>,
) -> Result<(), StoreError> {
    match fetch_user_by_username(conn, username)? {
        Some(existing) if Some(existing.user_id) != owner => Err(StoreError::ConstraintViolation(
            format!("username {username:?} is already taken"),
        )),
        _ => Ok(()),
    }
}
