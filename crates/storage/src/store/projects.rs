#![forbid(unsafe_code)]

use super::history::delete_issue_history_tx;
use super::rows::{ensure_user_ref_tx, fetch_project, next_id_tx};
use super::{StoreError, UnitOfWork};
use rusqlite::{Connection, params};
use tk_core::ids::ProjectId;
use tk_core::model::{Audit, Project, ProjectDraft};
use tracing::{debug, info};

/// What a project deletion took with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectDeletion {
    pub issues: usize,
    pub history_entries: usize,
    pub assignments: usize,
}

impl UnitOfWork<'_> {
    pub fn insert_project(
        &mut self,
        draft: ProjectDraft,
        audit: &Audit,
    ) -> Result<Project, StoreError> {
        self.atomic("insert_project", |conn| {
            let explicit = draft.project_id.map(ProjectId::get);
            let project_id = ProjectId::new(next_id_tx(conn, "project", "project_id", explicit)?);
            let project = draft.build(project_id, audit)?;
            ensure_user_ref_tx(conn, "created_by", project.created_by)?;

            conn.execute(
                r#"
                INSERT INTO projects(project_id, project_name, target_end_date, actual_end_date,
                                     label_json, created_on, created_by, modified_on,
                                     modified_by)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    project.project_id.get(),
                    project.project_name,
                    project.target_end_date,
                    project.actual_end_date,
                    label_json(&project)?,
                    project.created_on,
                    project.created_by.get(),
                    project.modified_on,
                    project.modified_by.map(|id| id.get()),
                ],
            )?;
            debug!(project_id = %project.project_id, "project inserted");
            Ok(project)
        })
    }

    /// Persists the editable fields of `project` and stamps `modified_on/by`.
    pub fn update_project(
        &mut self,
        project: &Project,
        audit: &Audit,
    ) -> Result<Project, StoreError> {
        self.atomic("update_project", |conn| {
            project.validate()?;
            let current = fetch_project(conn, project.project_id)?
                .ok_or_else(|| StoreError::not_found("project", project.project_id))?;
            ensure_user_ref_tx(conn, "modified_by", audit.actor)?;

            let updated = Project {
                project_id: current.project_id,
                created_on: current.created_on,
                created_by: current.created_by,
                modified_on: Some(audit.date()),
                modified_by: Some(audit.actor),
                ..project.clone()
            };
            conn.execute(
                r#"
                UPDATE projects
                SET project_name=?2, target_end_date=?3, actual_end_date=?4, label_json=?5,
                    modified_on=?6, modified_by=?7
                WHERE project_id=?1
                "#,
                params![
                    updated.project_id.get(),
                    updated.project_name,
                    updated.target_end_date,
                    updated.actual_end_date,
                    label_json(&updated)?,
                    updated.modified_on,
                    updated.modified_by.map(|id| id.get()),
                ],
            )?;
            debug!(project_id = %updated.project_id, "project updated");
            Ok(updated)
        })
    }

    /// Deletes a project together with its issues, their history and its
    /// assignments.
    pub fn delete_project(&mut self, project_id: ProjectId) -> Result<ProjectDeletion, StoreError> {
        self.atomic("delete_project", |conn| {
            if fetch_project(conn, project_id)?.is_none() {
                return Err(StoreError::not_found("project", project_id));
            }

            let mut deletion = ProjectDeletion::default();
            for issue_id in project_issue_ids_tx(conn, project_id)? {
                deletion.history_entries += delete_issue_history_tx(conn, issue_id)?;
            }
            deletion.issues = conn.execute(
                "DELETE FROM issues WHERE project_id=?1",
                params![project_id.get()],
            )?;
            deletion.assignments = conn.execute(
                "DELETE FROM assigned_projects WHERE project_id=?1",
                params![project_id.get()],
            )?;
            conn.execute(
                "DELETE FROM projects WHERE project_id=?1",
                params![project_id.get()],
            )?;

            info!(
                project_id = %project_id,
                issues = deletion.issues,
                history_entries = deletion.history_entries,
                assignments = deletion.assignments,
                "project deleted"
            );
            Ok(deletion)
        })
    }
}

fn label_json(project: &Project) -> Result<Option<String>, StoreError> {
    Ok(project
        .label
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}

fn project_issue_ids_tx(
    conn: &Connection,
    project_id: ProjectId,
) -> Result<Vec<tk_core::ids::IssueId>, StoreError> {
    let mut stmt = conn.prepare("SELECT issue_id FROM issues WHERE project_id=?1")?;
    let rows = stmt.query_map(params![project_id.get()], |row| {
        row.get::<_, i64>(0).map(tk_core::ids::IssueId::new)
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
