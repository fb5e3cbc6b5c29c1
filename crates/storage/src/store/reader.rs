#![forbid(unsafe_code)]

use super::rows::{
    ASSIGNMENT_COLUMNS, ISSUE_COLUMNS, PROJECT_COLUMNS, assignment_from_row, fetch_assignment,
    fetch_issue, fetch_project, fetch_user, fetch_user_by_username, issue_from_row,
    project_from_row,
};
use super::{IssueHistory, StoreError};
use rusqlite::{Connection, params};
use tk_core::ids::{IssueId, ProjectId, UserId};
use tk_core::model::{AssignedProject, Issue, Project, User};

/// Fetch operations over a store connection or an open unit of work.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'conn> {
    conn: &'conn Connection,
    history_page_size: usize,
}

impl<'conn> Reader<'conn> {
    pub(crate) fn new(conn: &'conn Connection, history_page_size: usize) -> Self {
        Self {
            conn,
            history_page_size,
        }
    }

    pub fn project(&self, project_id: ProjectId) -> Result<Option<Project>, StoreError> {
        fetch_project(self.conn, project_id)
    }

    pub fn user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        fetch_user(self.conn, user_id)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        fetch_user_by_username(self.conn, username)
    }

    pub fn issue(&self, issue_id: IssueId) -> Result<Option<Issue>, StoreError> {
        fetch_issue(self.conn, issue_id)
    }

    pub fn assignment(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<Option<AssignedProject>, StoreError> {
        fetch_assignment(self.conn, user_id, project_id)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY project_id ASC"
        ))?;
        let rows = stmt.query_map([], project_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn project_issues(&self, project_id: ProjectId) -> Result<Vec<Issue>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE project_id=?1 ORDER BY issue_id ASC"
        ))?;
        let rows = stmt.query_map(params![project_id.get()], issue_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn project_members(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<AssignedProject>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assigned_projects \
             WHERE project_id=?1 ORDER BY user_id ASC"
        ))?;
        let rows = stmt.query_map(params![project_id.get()], assignment_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn user_assignments(&self, user_id: UserId) -> Result<Vec<AssignedProject>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assigned_projects \
             WHERE user_id=?1 ORDER BY project_id ASC"
        ))?;
        let rows = stmt.query_map(params![user_id.get()], assignment_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Change history of an issue, oldest first, fetched lazily page by page.
    pub fn history_for(&self, issue_id: IssueId) -> Result<IssueHistory<'conn>, StoreError> {
        if fetch_issue(self.conn, issue_id)?.is_none() {
            return Err(StoreError::not_found("issue", issue_id));
        }
        Ok(IssueHistory::new(self.conn, issue_id, self.history_page_size))
    }
}
