#![forbid(unsafe_code)]

use super::history::{append_change_tx, delete_issue_history_tx};
use super::rows::{ensure_project_ref_tx, ensure_user_ref_tx, fetch_issue, next_id_tx};
use super::{StoreError, UnitOfWork};
use rusqlite::{Connection, params};
use tk_core::ids::IssueId;
use tk_core::model::{Audit, ChangeRecord, Issue, IssueDraft};
use tracing::debug;

impl UnitOfWork<'_> {
    pub fn insert_issue(&mut self, draft: IssueDraft, audit: &Audit) -> Result<Issue, StoreError> {
        self.atomic("insert_issue", |conn| {
            let explicit = draft.issue_id.map(IssueId::get);
            let issue_id = IssueId::new(next_id_tx(conn, "issue", "issue_id", explicit)?);
            let issue = draft.build(issue_id, audit)?;
            ensure_issue_refs_tx(conn, &issue)?;

            conn.execute(
                r#"
                INSERT INTO issues(issue_id, issue_summary, issue_description, assigned_to,
                                   status, label, priority, target_resolution_date,
                                   actual_resolution_date, progress, resolution_summary,
                                   created_on, created_by, last_modification_on,
                                   last_modification_by, project_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                "#,
                params![
                    issue.issue_id.get(),
                    issue.issue_summary,
                    issue.issue_description,
                    issue.assigned_to.map(|id| id.get()),
                    issue.status.as_str(),
                    issue.label,
                    issue.priority.as_str(),
                    issue.target_resolution_date,
                    issue.actual_resolution_date,
                    issue.progress,
                    issue.resolution_summary,
                    issue.created_on,
                    issue.created_by.get(),
                    issue.last_modification_on,
                    issue.last_modification_by.get(),
                    issue.project.get(),
                ],
            )?;
            debug!(issue_id = %issue.issue_id, project_id = %issue.project, "issue inserted");
            Ok(issue)
        })
    }

    /// Writes the editable fields of `issue`, refreshes the modification
    /// stamp and appends one history entry per changed field. The diff is
    /// taken against the row as committed when this unit of work took the
    /// writer lock, so concurrent writers each record their own changes.
    pub fn update_issue(&mut self, issue: &Issue, audit: &Audit) -> Result<Issue, StoreError> {
        self.atomic("update_issue", |conn| {
            issue.validate()?;
            let current = fetch_issue(conn, issue.issue_id)?
                .ok_or_else(|| StoreError::not_found("issue", issue.issue_id))?;
            let next = current.revised(issue, audit);
            ensure_issue_refs_tx(conn, &next)?;

            conn.execute(
                r#"
                UPDATE issues
                SET issue_summary=?2, issue_description=?3, assigned_to=?4, status=?5, label=?6,
                    priority=?7, target_resolution_date=?8, actual_resolution_date=?9, progress=?10,
                    resolution_summary=?11, last_modification_on=?12, last_modification_by=?13,
                    project_id=?14
                WHERE issue_id=?1
                "#,
                params![
                    next.issue_id.get(),
                    next.issue_summary,
                    next.issue_description,
                    next.assigned_to.map(|id| id.get()),
                    next.status.as_str(),
                    next.label,
                    next.priority.as_str(),
                    next.target_resolution_date,
                    next.actual_resolution_date,
                    next.progress,
                    next.resolution_summary,
                    next.last_modification_on,
                    next.last_modification_by.get(),
                    next.project.get(),
                ],
            )?;

            let changes = current.diff(&next);
            let changed = changes.len();
            for change in changes {
                append_change_tx(conn, ChangeRecord::from_change(next.issue_id, change, audit))?;
            }
            debug!(issue_id = %next.issue_id, changed, "issue updated");
            Ok(next)
        })
    }

    /// Deletes an issue and its change history.
    pub fn delete_issue(&mut self, issue_id: IssueId) -> Result<(), StoreError> {
        self.atomic("delete_issue", |conn| {
            if fetch_issue(conn, issue_id)?.is_none() {
                return Err(StoreError::not_found("issue", issue_id));
            }
            let history_entries = delete_issue_history_tx(conn, issue_id)?;
            conn.execute("DELETE FROM issues WHERE issue_id=?1", params![issue_id.get()])?;
            debug!(issue_id = %issue_id, history_entries, "issue deleted");
            Ok(())
        })
    }
}

fn ensure_issue_refs_tx(conn: &Connection, issue: &Issue) -> Result<(), StoreError> {
    ensure_project_ref_tx(conn, "project", issue.project)?;
    ensure_user_ref_tx(conn, "created_by", issue.created_by)?;
    ensure_user_ref_tx(conn, "last_modification_by", issue.last_modification_by)?;
    if let Some(assignee) = issue.assigned_to {
        ensure_user_ref_tx(conn, "assigned_to", assignee)?;
    }
    Ok(())
}
